//! Table actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    PokerState,
    entities::{Blinds, Card, Chips, Phase, PlayerId, PlayerView, User},
    pot::{HandOutcome, Pot},
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Seat the players and start the game. Completed hands are sent to
    /// `outcomes`; the channel closes when the game ends.
    Start {
        players: Vec<User>,
        dealer_idx: usize,
        outcomes: mpsc::UnboundedSender<HandOutcome>,
        response: oneshot::Sender<TableResponse>,
    },

    /// A chat message from a player. Only the acting player's well-formed
    /// actions do anything.
    PlayerMessage {
        player_id: PlayerId,
        text: String,
        response: oneshot::Sender<TableResponse>,
    },

    /// Start the next hand if the table is between hands, and reply once a
    /// hand completes. Replies `None` if the game ends first.
    PlayHand {
        response: oneshot::Sender<Option<HandOutcome>>,
    },

    /// End the game at the next hand boundary.
    Quit {
        response: oneshot::Sender<TableResponse>,
    },

    /// Double the blinds from the next hand on.
    IncreaseBlinds {
        response: oneshot::Sender<Blinds>,
    },

    /// Replace the board and/or hole cards of the running hand.
    OverrideCards {
        board: Option<Vec<Card>>,
        hole_cards: Vec<(PlayerId, Vec<Card>)>,
        response: oneshot::Sender<TableResponse>,
    },

    GetSnapshot {
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Internal: the turn identified by `token` ran out of time.
    TurnExpired { token: u64 },

    /// Internal: the pause after hand `after_hand` is over.
    NextHand { after_hand: u32 },
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Operation failed
    Error(String),

    /// Not your turn
    NotYourTurn,

    /// Invalid action for current game state
    InvalidAction(String),

    /// Not an action, or nothing to act on
    Ignored,

    /// The game has already ended
    GameOver,
}

impl TableResponse {
    /// Check if response is success
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, TableResponse::Success)
    }

    /// Get error message if response is error
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Error(msg) => Some(msg.clone()),
            TableResponse::NotYourTurn => Some("Not your turn".to_string()),
            TableResponse::InvalidAction(msg) => Some(format!("Invalid action: {msg}")),
            TableResponse::GameOver => Some("The game is over".to_string()),
            _ => None,
        }
    }
}

/// Read-only view of a table for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub table_name: String,
    pub phase: Phase,
    pub hand_number: u32,
    pub board: Vec<Card>,
    pub pots: Vec<Pot>,
    pub current_bet: Chips,
    pub blinds: Blinds,
    pub dealer_idx: usize,
    pub acting_player: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub last_outcome: Option<HandOutcome>,
}

impl TableSnapshot {
    #[must_use]
    pub fn new(table_name: &str, state: &PokerState) -> Self {
        let pot_manager = state.pot_manager();
        Self {
            table_name: table_name.to_string(),
            phase: state.phase(),
            hand_number: state.hand_number(),
            board: state.board().to_vec(),
            pots: pot_manager.pots.clone(),
            current_bet: pot_manager.current_bet,
            blinds: state.blinds(),
            dealer_idx: state.dealer_idx(),
            acting_player: state.acting_player().map(|p| p.id().clone()),
            players: state.players().iter().map(PlayerView::from).collect(),
            last_outcome: state.last_outcome().cloned(),
        }
    }

    /// Pot amounts in creation order, main pot first.
    #[must_use]
    pub fn pot_amounts(&self) -> Vec<Chips> {
        self.pots.iter().map(|p| p.amount).collect()
    }

    #[must_use]
    pub fn total_pot(&self) -> Chips {
        self.pots.iter().map(|p| p.amount).sum()
    }

    #[must_use]
    pub fn player(&self, id: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id.as_str() == id)
    }
}
