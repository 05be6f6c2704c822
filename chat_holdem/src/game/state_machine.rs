//! Errors, events, and the data every game state carries.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use super::{
    constants::{DEFAULT_SMALL_BLIND, MAX_PLAYERS},
    entities::{
        Action, ActionChoices, Bet, Blinds, Card, Chips, Deck, DeckError, Player, PlayerId,
        Street, cards_to_string,
    },
    pot::PotManager,
};

/// Recoverable rejections of something a player or operator asked for.
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("you're already all-in")]
    AlreadyAllIn,
    #[error("you already folded")]
    AlreadyFolded,
    #[error("can't raise, nobody has raised since you acted")]
    BettingNotReopened,
    #[error("can't check, {call} to call")]
    CannotCheck { call: Chips },
    #[error("table is full")]
    CapacityReached,
    #[error("more chips than the table can count")]
    ChipOverflow,
    #[error("illegal {bet}, need at least {min}")]
    InvalidBet { bet: Bet, min: Chips },
    #[error("no action expected right now")]
    NoActionExpected,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("user does not exist")]
    UserDoesNotExist,
}

/// Chip accounting defects. Any of these means the engine itself is wrong,
/// so the table stops instead of carrying on with bad numbers.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("chip total drifted: expected {expected}, found {found}")]
    ChipTotal { expected: Chips, found: Chips },
    #[error("pots hold {pots} chips but players committed {committed}")]
    PotMismatch { pots: Chips, committed: Chips },
    #[error("folded player {0} is eligible for a pot")]
    FoldedEligible(PlayerId),
    #[error("pot of {0} chips has nobody eligible to win it")]
    UnclaimedPot(Chips),
    #[error("chip count overflowed")]
    ChipOverflow,
    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// Where an announcement goes.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Recipient {
    Table,
    Player(PlayerId),
}

fn pot_name(pot: usize) -> String {
    if pot == 0 {
        "the main pot".to_string()
    } else {
        format!("side pot {pot}")
    }
}

/// Things that happened at the table, in the order they happened.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    HandStarted {
        hand_number: u32,
        dealer: String,
        blinds: Blinds,
    },
    PostedBlind {
        name: String,
        amount: Chips,
        big: bool,
        all_in: bool,
    },
    HoleCards {
        id: PlayerId,
        cards: Vec<Card>,
    },
    Prompt {
        id: PlayerId,
        name: String,
        choices: ActionChoices,
    },
    Acted {
        name: String,
        action: Action,
        committed: Chips,
        all_in: bool,
    },
    TimedOut {
        name: String,
        action: Action,
    },
    Dealt {
        street: Street,
        board: Vec<Card>,
    },
    Showed {
        name: String,
        cards: Vec<Card>,
        hand: String,
    },
    Won {
        name: String,
        amount: Chips,
        pot: usize,
        split: bool,
        hand: Option<String>,
    },
    Eliminated(String),
    BlindsIncreased(Blinds),
    QuitRequested,
    NotEnoughPlayers,
    Halted(String),
    GameOver {
        winner: Option<String>,
    },
}

impl GameEvent {
    /// Hole cards are private; everything else is for the whole table.
    #[must_use]
    pub fn recipient(&self) -> Recipient {
        match self {
            Self::HoleCards { id, .. } => Recipient::Player(id.clone()),
            _ => Recipient::Table,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HandStarted {
                hand_number,
                dealer,
                blinds,
            } => format!("Hand #{hand_number}: {dealer} has the button, blinds are {blinds}"),
            Self::PostedBlind {
                name,
                amount,
                big,
                all_in,
            } => {
                let blind = if *big { "big" } else { "small" };
                let all_in = if *all_in { " and is all-in" } else { "" };
                format!("{name} posts the {blind} blind of {amount}{all_in}")
            }
            Self::HoleCards { cards, .. } => format!("Your hand: {}", cards_to_string(cards)),
            Self::Prompt { name, choices, .. } => format!("{name}, it's your turn: {choices}"),
            Self::Acted {
                name,
                action,
                committed,
                all_in,
            } => {
                let verb = match action {
                    Action::Fold => "folds".to_string(),
                    Action::Check => "checks".to_string(),
                    Action::Call => format!("calls {committed}"),
                    Action::Bet(_) => format!("bets {committed}"),
                    Action::Raise(_) => format!("raises to {committed}"),
                };
                let all_in = if *all_in { " and is all-in" } else { "" };
                format!("{name} {verb}{all_in}")
            }
            Self::TimedOut { name, action } => format!("{name} ran out of time and {action}"),
            Self::Dealt { street, board } => {
                format!("Dealing the {street}: {}", cards_to_string(board))
            }
            Self::Showed { name, cards, hand } => {
                format!("{name} shows {} ({hand})", cards_to_string(cards))
            }
            Self::Won {
                name,
                amount,
                pot,
                split,
                hand,
            } => {
                let pot = pot_name(*pot);
                let hand = hand
                    .as_ref()
                    .map(|hand| format!(" with {hand}"))
                    .unwrap_or_default();
                if *split {
                    format!("{name} splits {pot}, taking {amount}{hand}")
                } else {
                    format!("{name} wins {amount} from {pot}{hand}")
                }
            }
            Self::Eliminated(name) => format!("{name} has been eliminated"),
            Self::BlindsIncreased(blinds) => {
                format!("Blinds will be {blinds} starting next hand")
            }
            Self::QuitRequested => "The game will end after this hand".to_string(),
            Self::NotEnoughPlayers => "Not enough players to start a game".to_string(),
            Self::Halted(reason) => format!("The game was stopped: {reason}"),
            Self::GameOver { winner: Some(name) } => format!("{name} wins the game!"),
            Self::GameOver { winner: None } => "The game is over".to_string(),
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub max_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SMALL_BLIND, MAX_PLAYERS)
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(small_blind: Chips, max_players: usize) -> Self {
        Self {
            small_blind,
            max_players,
        }
    }
}

/// Mutable game data shared across all states.
#[derive(Debug)]
pub struct GameData {
    /// Reshuffled at the start of every hand.
    pub(super) deck: Deck,
    /// Seated players in clockwise order. Players are removed once they bust.
    pub players: Vec<Player>,
    /// Community cards shared amongst all players.
    pub board: Vec<Card>,
    pub pot_manager: PotManager,
    pub dealer_idx: usize,
    pub acting_idx: Option<usize>,
    pub(super) big_blind_idx: usize,
    pub hand_number: u32,
    /// Blinds for the next hand. The running hand keeps its own copy in the
    /// pot manager.
    pub blinds: Blinds,
    /// Chips in play, fixed when the game is created.
    pub(super) chip_total: Chips,
    pub(super) quit_requested: bool,
    /// Bumped every time a new turn starts so stale timeouts can be told
    /// apart from live ones.
    pub(super) turn_token: u64,
    pub(super) events: VecDeque<GameEvent>,
    pub(super) halted: Option<InvariantViolation>,
    pub(super) settings: GameSettings,
}

impl GameData {
    #[must_use]
    pub fn new(players: Vec<Player>, settings: GameSettings, dealer_idx: usize) -> Self {
        let blinds = Blinds::from_small(settings.small_blind);
        let chip_total = players
            .iter()
            .fold(0, |total: Chips, p| total.saturating_add(p.chips));
        let dealer_idx = dealer_idx.checked_rem(players.len()).unwrap_or(0);
        Self {
            deck: Deck::default(),
            players,
            board: Vec::with_capacity(5),
            pot_manager: PotManager::new(blinds),
            dealer_idx,
            acting_idx: None,
            big_blind_idx: dealer_idx,
            hand_number: 0,
            blinds,
            chip_total,
            quit_requested: false,
            turn_token: 0,
            events: VecDeque::new(),
            halted: None,
            settings,
        }
    }

    #[must_use]
    pub fn player_idx(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }

    #[must_use]
    pub fn num_live(&self) -> usize {
        self.players.iter().filter(|p| p.is_live()).count()
    }

    #[must_use]
    pub fn chip_total(&self) -> Chips {
        self.chip_total
    }

    #[must_use]
    pub fn turn_token(&self) -> u64 {
        self.turn_token
    }

    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn halted(&self) -> Option<&InvariantViolation> {
        self.halted.as_ref()
    }

    /// Give the turn to the first player at or after `start` who still has
    /// to act this round, or to nobody if the round is over.
    pub(super) fn set_next_actor(&mut self, start: usize) {
        let num_players = self.players.len();
        self.acting_idx = if self.num_live() <= 1 || num_players == 0 {
            None
        } else {
            (0..num_players)
                .map(|offset| (start + offset) % num_players)
                .find(|idx| self.pot_manager.needs_action(&self.players, *idx))
        };
        if let Some(idx) = self.acting_idx {
            self.turn_token += 1;
            let player = &self.players[idx];
            self.events.push_back(GameEvent::Prompt {
                id: player.id().clone(),
                name: player.user.name.clone(),
                choices: self.pot_manager.action_choices(player),
            });
        }
    }

    pub(super) fn record_action(&mut self, idx: usize, action: Action, timed_out: bool) {
        let player = &self.players[idx];
        let name = player.user.name.clone();
        if timed_out {
            self.events.push_back(GameEvent::TimedOut { name, action });
            return;
        }
        self.events.push_back(GameEvent::Acted {
            name,
            action,
            committed: player.committed_this_round,
            all_in: player.is_all_in,
        });
    }
}

/// Read access and event draining, the same for every state.
#[enum_dispatch]
pub trait GameStateManagement {
    fn data(&self) -> &GameData;

    fn data_mut(&mut self) -> &mut GameData;

    fn drain_events(&mut self) -> VecDeque<GameEvent>;
}

/// Operator commands that can arrive at any point in the game.
#[enum_dispatch]
pub trait TableControl {
    /// Ask for the game to end at the next hand boundary. Returns whether
    /// this is a new request.
    fn request_quit(&mut self) -> bool;

    /// Double the blinds for the following hands.
    fn increase_blinds(&mut self) -> Blinds;

    /// Replace the board and/or players' hole cards. Lets tests and replays
    /// pin down a hand without touching engine internals.
    fn override_cards(
        &mut self,
        board: Option<Vec<Card>>,
        hole_cards: &[(PlayerId, Vec<Card>)],
    ) -> Result<(), UserError>;

    fn verify_chips(&self) -> Result<(), InvariantViolation>;
}

/// A poker game with data and logic for running a poker game end-to-end.
#[derive(Debug)]
pub struct Game<T> {
    pub data: GameData,
    pub state: T,
}

impl<T> Game<T> {
    pub(super) fn transition<U>(self, state: U) -> Game<U> {
        Game {
            data: self.data,
            state,
        }
    }
}

impl<T> GameStateManagement for Game<T> {
    fn data(&self) -> &GameData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut GameData {
        &mut self.data
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.data.events)
    }
}

impl<T> TableControl for Game<T> {
    fn request_quit(&mut self) -> bool {
        if self.data.quit_requested {
            return false;
        }
        self.data.quit_requested = true;
        self.data.events.push_back(GameEvent::QuitRequested);
        true
    }

    fn increase_blinds(&mut self) -> Blinds {
        self.data.blinds = self.data.blinds.doubled();
        self.data
            .events
            .push_back(GameEvent::BlindsIncreased(self.data.blinds));
        self.data.blinds
    }

    fn override_cards(
        &mut self,
        board: Option<Vec<Card>>,
        hole_cards: &[(PlayerId, Vec<Card>)],
    ) -> Result<(), UserError> {
        let indices = hole_cards
            .iter()
            .map(|(id, _)| self.data.player_idx(id).ok_or(UserError::UserDoesNotExist))
            .collect::<Result<Vec<_>, _>>()?;
        for (idx, (_, cards)) in indices.into_iter().zip(hole_cards) {
            self.data.players[idx].hole_cards.clone_from(cards);
        }
        if let Some(board) = board {
            self.data.board = board;
        }
        Ok(())
    }

    fn verify_chips(&self) -> Result<(), InvariantViolation> {
        self.data
            .pot_manager
            .verify(&self.data.players, self.data.chip_total)
    }
}
