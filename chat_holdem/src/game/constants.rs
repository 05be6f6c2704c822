use super::entities::Chips;

pub const DEFAULT_SMALL_BLIND: Chips = 4;
pub const DEFAULT_STASH: Chips = 20_000;

/// Most players one deck can serve: two hole cards each plus a full board.
pub const MAX_PLAYERS: usize = 23;
pub const MIN_PLAYERS: usize = 2;

pub const HOLE_CARDS: usize = 2;

pub const DEFAULT_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_HAND_INTERVAL_SECS: u64 = 5;
