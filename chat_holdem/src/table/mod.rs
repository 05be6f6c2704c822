//! Table module running one chat-driven game per async actor.
//!
//! This module implements:
//! - TableActor: Async actor owning a single game and its turn timer
//! - TableHandle: Cloneable sender used by the chat layer
//! - Turn timers and notifiers behind small traits so tests can swap them
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Player messages, timer expiries, and operator commands all arrive through
//! that inbox, so they are applied one at a time in arrival order.
//!
//! ## Example
//!
//! ```no_run
//! use chat_holdem::{
//!     game::entities::{PlayerId, User},
//!     table::{TableActor, TableConfig},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let (actor, handle) = TableActor::new(TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let players = vec![User::new("U1", "alice"), User::new("U2", "bob")];
//!     let mut outcomes = handle.start(players, 0).await?;
//!     handle.player_message(&PlayerId::new("U1"), "call").await?;
//!
//!     while let Some(outcome) = outcomes.recv().await {
//!         println!("{} chips changed hands", outcome.total());
//!     }
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;
pub mod notifier;
pub mod timer;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use messages::{TableMessage, TableResponse, TableSnapshot};
pub use notifier::{ChannelNotifier, LogNotifier, Notification, Notifier};
pub use timer::{ManualTurnTimer, TokioTurnTimer, TurnTimer};
