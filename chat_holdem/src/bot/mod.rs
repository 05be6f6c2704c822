//! Scripted opponents.
//!
//! When a table is configured with bots, two scripted players sit in:
//! - "Phil Hellmuth" plays a weak, passive game: he rarely folds and rarely
//!   raises.
//! - "Phil Ivey" plays aggressively: tighter preflop, raising most hands he
//!   continues with, and bluffing now and then.

pub mod decision;

pub use decision::{BotDecisionContext, BotDecisionMaker, StyleParams};

use crate::game::entities::{PlayerId, User};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BotStyle {
    Weak,
    Aggro,
}

impl BotStyle {
    #[must_use]
    pub fn params(self) -> StyleParams {
        match self {
            Self::Weak => StyleParams {
                fold_threshold: 0.08,
                raise_threshold: 0.5,
                aggression_factor: 0.5,
                bluff_frequency: 0.0,
            },
            Self::Aggro => StyleParams {
                fold_threshold: 0.12,
                raise_threshold: 0.2,
                aggression_factor: 2.5,
                bluff_frequency: 0.25,
            },
        }
    }
}

/// A scripted player seated at a table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bot {
    pub user: User,
    pub style: BotStyle,
}

impl Bot {
    #[must_use]
    pub fn new(id: &str, name: &str, style: BotStyle) -> Self {
        Self {
            user: User::new(id, name),
            style,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.user.id
    }
}

/// The bots that join a table when bots are enabled.
#[must_use]
pub fn default_bots() -> Vec<Bot> {
    vec![
        Bot::new("bot-phil-hellmuth", "Phil Hellmuth", BotStyle::Weak),
        Bot::new("bot-phil-ivey", "Phil Ivey", BotStyle::Aggro),
    ]
}
