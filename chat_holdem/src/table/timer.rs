//! Turn timers.
//!
//! The actor only ever asks for "tell me when turn `token` has run for this
//! long" and "never mind". Expiry comes back as a [`TableMessage::TurnExpired`]
//! in the table's own inbox, so it is serialized with every other message.

use tokio::{sync::mpsc, task::JoinHandle, time::Duration};

use super::messages::TableMessage;

/// Schedule-and-cancel interface for the per-turn deadline.
pub trait TurnTimer: Send {
    /// Arm the timer for `token`, replacing any deadline already armed.
    fn schedule(&mut self, token: u64, after: Duration);

    /// Disarm the timer. Does nothing if it isn't armed.
    fn cancel(&mut self);
}

/// Timer backed by the tokio clock, so paused-time tests drive it like the
/// real thing.
pub struct TokioTurnTimer {
    inbox: mpsc::WeakSender<TableMessage>,
    task: Option<JoinHandle<()>>,
}

impl TokioTurnTimer {
    /// Holds only a weak handle to the inbox so a pending timer never keeps a
    /// table alive on its own.
    #[must_use]
    pub fn new(inbox: mpsc::WeakSender<TableMessage>) -> Self {
        Self { inbox, task: None }
    }
}

impl TurnTimer for TokioTurnTimer {
    fn schedule(&mut self, token: u64, after: Duration) {
        self.cancel();
        let inbox = self.inbox.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(sender) = inbox.upgrade() {
                if sender
                    .send(TableMessage::TurnExpired { token })
                    .await
                    .is_err()
                {
                    log::debug!("table closed before turn {token} expired");
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Timer that never fires on its own. Tables without a turn limit use it,
/// and tests use it to expire turns by hand.
#[derive(Debug, Default)]
pub struct ManualTurnTimer {
    pub armed: Option<(u64, Duration)>,
}

impl TurnTimer for ManualTurnTimer {
    fn schedule(&mut self, token: u64, after: Duration) {
        self.armed = Some((token, after));
    }

    fn cancel(&mut self) {
        self.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_deadline() {
        let (sender, mut inbox) = mpsc::channel(4);
        let mut timer = TokioTurnTimer::new(sender.downgrade());
        timer.schedule(7, Duration::from_secs(45));

        tokio::time::sleep(Duration::from_secs(44)).await;
        assert!(inbox.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        match inbox.try_recv() {
            Ok(TableMessage::TurnExpired { token }) => assert_eq!(token, 7),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_deadline() {
        let (sender, mut inbox) = mpsc::channel(4);
        let mut timer = TokioTurnTimer::new(sender.downgrade());
        timer.schedule(1, Duration::from_secs(10));
        timer.schedule(2, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(11)).await;
        match inbox.try_recv() {
            Ok(TableMessage::TurnExpired { token }) => assert_eq!(token, 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let (sender, mut inbox) = mpsc::channel(4);
        let mut timer = TokioTurnTimer::new(sender.downgrade());
        timer.schedule(1, Duration::from_secs(10));
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(inbox.try_recv().is_err());
    }
}
