//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    GameSettings,
    constants::{
        DEFAULT_HAND_INTERVAL_SECS, DEFAULT_SMALL_BLIND, DEFAULT_STASH, DEFAULT_TIMEOUT_SECS,
        MAX_PLAYERS, MIN_PLAYERS,
    },
    entities::{Blinds, Chips},
};

/// Table configuration.
///
/// Field names on the wire are the ones chat users type, e.g.
/// `{"timeout": 30, "smallblind": 10, "initialstash": 1000}`. Missing fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Seconds each player has to act; 0 waits forever
    pub timeout: u64,

    /// Maximum number of seated players, bots included
    #[serde(rename = "maxplayers")]
    pub max_players: usize,

    #[serde(rename = "smallblind")]
    pub small_blind: Chips,

    /// Chips every player starts with
    #[serde(rename = "initialstash")]
    pub initial_stash: Chips,

    /// Whether the scripted opponents sit in
    pub bots: bool,

    /// Display-only; the engine ignores it
    pub show_card_images: bool,

    /// Seconds between hands; 0 waits for an explicit `play_hand`
    pub hand_interval: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Texas Hold'em".to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_players: MAX_PLAYERS,
            small_blind: DEFAULT_SMALL_BLIND,
            initial_stash: DEFAULT_STASH,
            bots: false,
            show_card_images: false,
            hand_interval: DEFAULT_HAND_INTERVAL_SECS,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.initial_stash == 0 {
            return Err("Initial stash must be positive".to_string());
        }

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(format!(
                "Max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }

        if self.initial_stash < self.big_blind() {
            return Err("Initial stash must cover the big blind".to_string());
        }

        let table_chips = Chips::try_from(self.max_players)
            .ok()
            .and_then(|seats| self.initial_stash.checked_mul(seats));
        if table_chips.is_none() {
            return Err(format!(
                "Initial stash is too large for {} players",
                self.max_players
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn big_blind(&self) -> Chips {
        self.blinds().big
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        Blinds::from_small(self.small_blind)
    }

    /// Time each player gets to act, or `None` to wait forever.
    #[must_use]
    pub fn action_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Pause before the next hand starts on its own, or `None` for manual
    /// pacing.
    #[must_use]
    pub fn hand_interval(&self) -> Option<Duration> {
        (self.hand_interval > 0).then(|| Duration::from_secs(self.hand_interval))
    }

    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings::new(self.small_blind, self.max_players)
    }
}
