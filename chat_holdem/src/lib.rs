//! # Chat Hold'em
//!
//! A multiplayer no-limit Texas Hold'em engine driven by chat messages.
//!
//! Players type actions (`check`, `call`, `bet 50`, `raise`, `fold`, ...)
//! into a channel and the table answers with announcements. The engine is
//! a type-safe finite state machine (FSM) using `enum_dispatch` for
//! zero-cost trait dispatch, with side pots, split pots, turn timeouts, and
//! optional scripted opponents.
//!
//! ## Architecture
//!
//! A hand moves through these phases:
//!
//! - **CollectBlinds**: Posting the small and big blinds
//! - **Deal**: Dealing hole cards to players
//! - **TakeAction**: A betting round, once per street
//! - **Flop/Turn/River**: Dealing community cards
//! - **Showdown**: Evaluating hands and paying every pot
//! - **HandComplete**: Eliminating busted players and moving the button
//!
//! ## Core Modules
//!
//! - [`game`]: Game state machine, entities, pots, and hand evaluation
//! - [`table`]: Async table actor, turn timer, and notifications
//! - [`bot`]: Scripted opponents
//!
//! ## Example
//!
//! ```
//! use chat_holdem::{GameSettings, PokerState, entities::{Action, User}};
//!
//! let users = vec![User::new("U1", "alice"), User::new("U2", "bob")];
//! let mut game = PokerState::new(users, 1_000, GameSettings::default(), 0)
//!     .unwrap()
//!     .advance();
//!
//! let acting = game.acting_player().unwrap().id().clone();
//! game.take_action(&acting, &Action::Call).unwrap();
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameEvent, GameSettings, PokerState, Recipient, UserError,
    constants::{self, MAX_PLAYERS},
    entities, functional, pot,
};

/// Async table actor and its collaborators.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle};

/// Scripted opponents.
pub mod bot;
