//! Where table announcements go.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::game::Recipient;

/// Fire-and-forget delivery of announcements. The actor never waits on a
/// notifier, and a failed delivery never affects the game.
pub trait Notifier: Send {
    fn notify(&self, recipient: &Recipient, text: &str);
}

/// Writes every announcement to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    table_name: String,
}

impl LogNotifier {
    #[must_use]
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &Recipient, text: &str) {
        match recipient {
            Recipient::Table => log::info!("[{}] {text}", self.table_name),
            Recipient::Player(id) => log::info!("[{} -> {id}] {text}", self.table_name),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub text: String,
}

/// Forwards announcements to a channel, for a chat layer or a test to read.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, recipient: &Recipient, text: &str) {
        let notification = Notification {
            recipient: recipient.clone(),
            text: text.to_string(),
        };
        if self.sender.send(notification).is_err() {
            log::debug!("notification dropped, nobody is listening");
        }
    }
}
