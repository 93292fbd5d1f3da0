//! XP rewards for in-app activity
//!
//! Trading, quizzes, mini-games and challenges report what happened; the
//! schedule turns that into an XP amount and an audit reason.

use serde::{Deserialize, Serialize};

/// Side of an executed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn name(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// Something the player did that is worth XP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardEvent {
    TradeExecuted { side: TradeSide },
    QuizCompleted { correct: u32, total: u32 },
    MiniGameCompleted { score: u32 },
    ChallengeCompleted,
    DailyLogin,
}

/// XP amounts per activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    pub trade: u64,
    pub quiz_per_correct: u64,
    /// Added when every question was answered correctly
    pub quiz_perfect_bonus: u64,
    /// Mini-game XP is `score / mini_game_divisor`
    pub mini_game_divisor: u32,
    pub mini_game_cap: u64,
    pub challenge: u64,
    pub daily_login: u64,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            trade: 50,
            quiz_per_correct: 20,
            quiz_perfect_bonus: 50,
            mini_game_divisor: 10,
            mini_game_cap: 200,
            challenge: 500,
            daily_login: 25,
        }
    }
}

impl RewardSchedule {
    /// XP earned for `event`; may be zero
    pub fn xp_for(&self, event: &RewardEvent) -> u64 {
        match *event {
            RewardEvent::TradeExecuted { .. } => self.trade,
            RewardEvent::QuizCompleted { correct, total } => {
                let correct = correct.min(total);
                let mut xp = u64::from(correct).saturating_mul(self.quiz_per_correct);
                if total > 0 && correct == total {
                    xp = xp.saturating_add(self.quiz_perfect_bonus);
                }
                xp
            }
            RewardEvent::MiniGameCompleted { score } => {
                let divisor = self.mini_game_divisor.max(1);
                u64::from(score / divisor).min(self.mini_game_cap)
            }
            RewardEvent::ChallengeCompleted => self.challenge,
            RewardEvent::DailyLogin => self.daily_login,
        }
    }

    /// Audit string passed along with the award
    pub fn reason_for(&self, event: &RewardEvent) -> String {
        match event {
            RewardEvent::TradeExecuted { side } => format!("trade: {}", side.name()),
            RewardEvent::QuizCompleted { correct, total } => format!("quiz: {}/{} correct", correct, total),
            RewardEvent::MiniGameCompleted { score } => format!("mini-game: score {}", score),
            RewardEvent::ChallengeCompleted => "trading challenge completed".to_string(),
            RewardEvent::DailyLogin => "daily login".to_string(),
        }
    }
}
