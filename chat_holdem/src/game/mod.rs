//! Poker game engine: cards, hand evaluation, pot accounting, and the hand
//! state machine.
//!
//! The state machine is a typestate [`Game<T>`] wrapped in [`PokerState`] so
//! a table can hold one value and step it forward. Each transition consumes
//! the game and produces the next state; events describing what happened
//! queue up in the game data until drained.

pub mod constants;
pub mod entities;
pub mod functional;
pub mod pot;
pub mod state_machine;
pub mod states;

mod implementation;

pub use implementation::PokerState;
pub use state_machine::{
    Game, GameData, GameEvent, GameSettings, GameStateManagement, InvariantViolation, Recipient,
    TableControl, UserError,
};
