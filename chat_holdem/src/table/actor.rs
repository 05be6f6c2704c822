//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    messages::{TableMessage, TableResponse, TableSnapshot},
    notifier::{LogNotifier, Notifier},
    timer::{TokioTurnTimer, TurnTimer},
};
use crate::{
    bot::{BotDecisionContext, BotDecisionMaker, BotStyle, default_bots},
    game::{
        GameEvent, GameStateManagement, PokerState, Recipient, TableControl, UserError,
        constants::MIN_PLAYERS,
        entities::{Action, Blinds, Card, Phase, PlayerId, User},
        pot::HandOutcome,
    },
};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    name: String,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, name: &str) -> Self {
        Self {
            sender,
            name: name.to_string(),
        }
    }

    /// Get table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, String> {
        let (response, receiver) = oneshot::channel();
        self.send(message(response)).await?;
        receiver
            .await
            .map_err(|_| "Table dropped the request".to_string())
    }

    /// Seat `players` and deal the first hand with `dealer_idx` on the
    /// button. Each completed hand's outcome arrives on the returned
    /// channel, which closes when the game ends.
    pub async fn start(
        &self,
        players: Vec<User>,
        dealer_idx: usize,
    ) -> Result<mpsc::UnboundedReceiver<HandOutcome>, String> {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let response = self
            .request(|response| TableMessage::Start {
                players,
                dealer_idx,
                outcomes,
                response,
            })
            .await?;
        match response {
            TableResponse::Success => Ok(receiver),
            other => Err(other
                .error_message()
                .unwrap_or_else(|| format!("{other:?}"))),
        }
    }

    /// Pass along a chat message from a player.
    pub async fn player_message(
        &self,
        player_id: &PlayerId,
        text: &str,
    ) -> Result<TableResponse, String> {
        self.request(|response| TableMessage::PlayerMessage {
            player_id: player_id.clone(),
            text: text.to_string(),
            response,
        })
        .await
    }

    /// Start the next hand if the table is between hands and wait for a hand
    /// to complete. `None` means the game ended first.
    pub async fn play_hand(&self) -> Result<Option<HandOutcome>, String> {
        self.request(|response| TableMessage::PlayHand { response })
            .await
    }

    pub async fn quit(&self) -> Result<TableResponse, String> {
        self.request(|response| TableMessage::Quit { response })
            .await
    }

    pub async fn increase_blinds(&self) -> Result<Blinds, String> {
        self.request(|response| TableMessage::IncreaseBlinds { response })
            .await
    }

    pub async fn override_cards(
        &self,
        board: Option<Vec<Card>>,
        hole_cards: Vec<(PlayerId, Vec<Card>)>,
    ) -> Result<TableResponse, String> {
        self.request(|response| TableMessage::OverrideCards {
            board,
            hole_cards,
            response,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<TableSnapshot, String> {
        self.request(|response| TableMessage::GetSnapshot { response })
            .await
    }
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table configuration
    config: TableConfig,

    /// Poker game state (FSM)
    state: PokerState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Route back into the inbox for timers. Weak so that the table closes
    /// once every handle is gone.
    self_sender: mpsc::WeakSender<TableMessage>,

    timer: Box<dyn TurnTimer>,

    notifier: Box<dyn Notifier>,

    /// Seated bots and how they play
    bots: HashMap<PlayerId, BotStyle>,

    /// Completed hands go here until the game ends
    outcomes: Option<mpsc::UnboundedSender<HandOutcome>>,

    /// `play_hand` callers waiting for the current hand to finish
    hand_waiters: Vec<oneshot::Sender<Option<HandOutcome>>>,

    /// Last hand number whose outcome was published
    reported_hand: u32,

    started: bool,
}

impl TableActor {
    /// Create a new table actor. Announcements go to the log until a
    /// notifier is attached.
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let self_sender = sender.downgrade();
        let handle = TableHandle::new(sender, &config.name);

        let actor = Self {
            notifier: Box::new(LogNotifier::new(&config.name)),
            timer: Box::new(TokioTurnTimer::new(self_sender.clone())),
            config,
            state: PokerState::default(),
            inbox,
            self_sender,
            bots: HashMap::new(),
            outcomes: None,
            hand_waiters: Vec::new(),
            reported_hand: 0,
            started: false,
        };

        (actor, handle)
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    #[must_use]
    pub fn with_timer(mut self, timer: impl TurnTimer + 'static) -> Self {
        self.timer = Box::new(timer);
        self
    }

    /// Run the actor event loop until every handle is dropped.
    pub async fn run(mut self) {
        log::info!("Table '{}' starting", self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
        }

        self.timer.cancel();
        log::info!("Table '{}' closed", self.config.name);
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Start {
                players,
                dealer_idx,
                outcomes,
                response,
            } => {
                let result = self.handle_start(players, dealer_idx, outcomes);
                let _ = response.send(result);
            }

            TableMessage::PlayerMessage {
                player_id,
                text,
                response,
            } => {
                let result = self.handle_player_message(&player_id, &text);
                let _ = response.send(result);
            }

            TableMessage::PlayHand { response } => self.handle_play_hand(response),

            TableMessage::Quit { response } => {
                let result = self.handle_quit();
                let _ = response.send(result);
            }

            TableMessage::IncreaseBlinds { response } => {
                let blinds = self.state.increase_blinds();
                log::info!(
                    "Table '{}' blinds go to {blinds} next hand",
                    self.config.name
                );
                self.flush_events();
                let _ = response.send(blinds);
            }

            TableMessage::OverrideCards {
                board,
                hole_cards,
                response,
            } => {
                let result = match self.state.override_cards(board, &hole_cards) {
                    Ok(()) => TableResponse::Success,
                    Err(e) => TableResponse::Error(e.to_string()),
                };
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { response } => {
                let _ = response.send(TableSnapshot::new(&self.config.name, &self.state));
            }

            TableMessage::TurnExpired { token } => {
                if let Some(action) = self.state.expire_turn(token) {
                    log::debug!(
                        "Table '{}' turn {token} timed out, applied {action}",
                        self.config.name
                    );
                    self.advance();
                }
            }

            TableMessage::NextHand { after_hand } => {
                if self.state.phase() == Phase::HandComplete
                    && self.state.hand_number() == after_hand
                {
                    self.advance();
                }
            }
        }
    }

    fn handle_start(
        &mut self,
        players: Vec<User>,
        dealer_idx: usize,
        outcomes: mpsc::UnboundedSender<HandOutcome>,
    ) -> TableResponse {
        if self.started {
            return TableResponse::Error("Game already started".to_string());
        }
        if let Err(e) = self.config.validate() {
            log::warn!("Table '{}' refused to start: {e}", self.config.name);
            return TableResponse::Error(e);
        }

        let mut users = players;
        let mut bots = HashMap::new();
        if self.config.bots {
            for bot in default_bots() {
                bots.insert(bot.id().clone(), bot.style);
                users.push(bot.user);
            }
        }

        match PokerState::new(
            users,
            self.config.initial_stash,
            self.config.game_settings(),
            dealer_idx,
        ) {
            Ok(state) => {
                log::info!(
                    "Table '{}' starting a game with {} players",
                    self.config.name,
                    state.players().len()
                );
                self.state = state;
                self.bots = bots;
                self.outcomes = Some(outcomes);
                self.started = true;
                self.advance();
                TableResponse::Success
            }
            Err(e) => TableResponse::Error(e.to_string()),
        }
    }

    fn handle_player_message(&mut self, player_id: &PlayerId, text: &str) -> TableResponse {
        let action = match text.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                log::debug!("Ignoring '{text}' from {player_id}: {e}");
                return TableResponse::Ignored;
            }
        };

        if self.state.is_game_over() {
            return TableResponse::GameOver;
        }

        match self.state.take_action(player_id, &action) {
            Ok(applied) => {
                log::debug!("Table '{}': {player_id} {applied}", self.config.name);
                self.timer.cancel();
                self.advance();
                TableResponse::Success
            }
            Err(UserError::OutOfTurnAction) => TableResponse::NotYourTurn,
            Err(UserError::NoActionExpected | UserError::UserDoesNotExist) => {
                TableResponse::Ignored
            }
            Err(e) => {
                self.notifier
                    .notify(&Recipient::Player(player_id.clone()), &e.to_string());
                TableResponse::InvalidAction(e.to_string())
            }
        }
    }

    fn handle_play_hand(&mut self, response: oneshot::Sender<Option<HandOutcome>>) {
        if !self.started || self.state.is_game_over() {
            let _ = response.send(None);
            return;
        }

        self.hand_waiters.push(response);
        if self.state.phase() == Phase::HandComplete {
            self.advance();
        }
    }

    fn handle_quit(&mut self) -> TableResponse {
        if !self.started {
            return TableResponse::Error("Game hasn't started".to_string());
        }
        if self.state.is_game_over() {
            return TableResponse::GameOver;
        }

        if self.state.request_quit() {
            log::info!("Table '{}' will close after this hand", self.config.name);
        }
        if self.state.phase() == Phase::HandComplete {
            self.advance();
        } else {
            self.flush_events();
        }
        TableResponse::Success
    }

    /// Step the game until it waits on someone, then deal with whatever it
    /// is waiting on.
    fn advance(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.state = state.advance();

        loop {
            self.flush_events();

            match self.state.phase() {
                Phase::HandComplete => {
                    self.report_hand();
                    let data = self.state.data();
                    if data.players.len() < MIN_PLAYERS || data.quit_requested() {
                        let state = std::mem::take(&mut self.state);
                        self.state = state.advance();
                        continue;
                    }
                    self.schedule_next_hand();
                    return;
                }
                Phase::GameOver => {
                    self.finish();
                    return;
                }
                _ => {}
            }

            let Some(player) = self.state.acting_player() else {
                return;
            };
            let player_id = player.id().clone();

            let bot_acted = match self.bots.get(&player_id).copied() {
                Some(style) => self.handle_bot_turn(&player_id, style),
                None => false,
            };
            if !bot_acted {
                if let Some(timeout) = self.config.action_timeout() {
                    self.timer.schedule(self.state.turn_token(), timeout);
                }
                return;
            }

            let state = std::mem::take(&mut self.state);
            self.state = state.advance();
        }
    }

    /// Deliver queued events. Private messages to bots go nowhere.
    fn flush_events(&mut self) {
        for event in self.state.drain_events() {
            let recipient = event.recipient();
            if let Recipient::Player(id) = &recipient {
                if self.bots.contains_key(id) {
                    continue;
                }
            }

            let text = match &event {
                GameEvent::Prompt { .. } if self.config.timeout > 0 => {
                    format!("{event} ({}s to act)", self.config.timeout)
                }
                _ => event.to_string(),
            };
            self.notifier.notify(&recipient, &text);
        }
    }

    fn report_hand(&mut self) {
        let hand_number = self.state.hand_number();
        if hand_number <= self.reported_hand {
            return;
        }
        self.reported_hand = hand_number;

        let Some(outcome) = self.state.last_outcome().cloned() else {
            return;
        };
        log::debug!(
            "Table '{}' hand {hand_number} completed, {} chips paid out",
            self.config.name,
            outcome.total()
        );

        if let Some(outcomes) = &self.outcomes {
            if outcomes.send(outcome.clone()).is_err() {
                log::debug!("Nobody is listening for hand outcomes");
            }
        }
        for waiter in self.hand_waiters.drain(..) {
            let _ = waiter.send(Some(outcome.clone()));
        }
    }

    fn schedule_next_hand(&self) {
        let Some(interval) = self.config.hand_interval() else {
            return;
        };
        let after_hand = self.state.hand_number();
        let inbox = self.self_sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(sender) = inbox.upgrade() {
                let _ = sender.send(TableMessage::NextHand { after_hand }).await;
            }
        });
    }

    fn finish(&mut self) {
        self.timer.cancel();
        if let Some(violation) = self.state.halted() {
            log::error!("Table '{}' halted: {violation}", self.config.name);
        }
        if self.outcomes.take().is_some() {
            log::info!(
                "Table '{}' game over after {} hand(s)",
                self.config.name,
                self.state.hand_number()
            );
        }
        for waiter in self.hand_waiters.drain(..) {
            let _ = waiter.send(None);
        }
    }

    /// Let a bot act. Returns whether an action was applied.
    fn handle_bot_turn(&mut self, player_id: &PlayerId, style: BotStyle) -> bool {
        let Some(action) = self.decide_bot_action(player_id, style) else {
            return false;
        };

        match self.state.take_action(player_id, &action) {
            Ok(applied) => {
                log::debug!("Bot {player_id} {applied}");
                true
            }
            Err(e) => {
                log::debug!("Bot {player_id} tried {action}: {e}");
                self.take_fallback_action(player_id)
            }
        }
    }

    fn decide_bot_action(&self, player_id: &PlayerId, style: BotStyle) -> Option<Action> {
        let players = self.state.players();
        let player = players.iter().find(|p| p.id() == player_id)?;
        let pot_manager = self.state.pot_manager();
        let call_amount = pot_manager.call_amount(player);

        let ctx = BotDecisionContext {
            hole_cards: &player.hole_cards,
            board_cards: self.state.board(),
            pot_size: pot_manager.total_chips(),
            call_amount,
            min_raise: pot_manager
                .min_raise_to()
                .saturating_sub(player.committed_this_round),
            bot_chips: player.chips,
            can_check: call_amount == 0,
            can_raise: pot_manager.can_raise(player),
        };

        Some(BotDecisionMaker::new().decide_action(style, &ctx))
    }

    /// Check if possible, otherwise fold.
    fn take_fallback_action(&mut self, player_id: &PlayerId) -> bool {
        let can_check = self
            .state
            .action_choices()
            .is_some_and(|choices| choices.contains(&Action::Check));
        let action = if can_check { Action::Check } else { Action::Fold };

        log::debug!("Bot {player_id} taking fallback action: {action}");
        match self.state.take_action(player_id, &action) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Bot {player_id} fallback {action} rejected: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{notifier::ChannelNotifier, timer::ManualTurnTimer};

    fn config() -> TableConfig {
        TableConfig {
            timeout: 0,
            hand_interval: 0,
            ..TableConfig::default()
        }
    }

    fn users(n: usize) -> Vec<User> {
        (0..n)
            .map(|i| User::new(&format!("U{i}"), &format!("p{i}")))
            .collect()
    }

    fn spawn(config: TableConfig) -> TableHandle {
        let (actor, handle) = TableActor::new(config);
        tokio::spawn(actor.with_timer(ManualTurnTimer::default()).run());
        handle
    }

    #[tokio::test]
    async fn test_handle_reports_closed_table() {
        let (actor, handle) = TableActor::new(config());
        drop(actor);
        assert_eq!(handle.snapshot().await.unwrap_err(), "Table is closed");
    }

    #[tokio::test]
    async fn test_start_deals_first_hand() {
        let handle = spawn(config());
        let _outcomes = handle.start(users(3), 0).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Preflop);
        assert_eq!(snapshot.hand_number, 1);
        assert_eq!(snapshot.total_pot(), 12);
        assert_eq!(snapshot.acting_player, Some(PlayerId::new("U0")));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let handle = spawn(config());
        let _outcomes = handle.start(users(3), 0).await.unwrap();
        assert_eq!(
            handle.start(users(3), 0).await.unwrap_err(),
            "Game already started"
        );
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let handle = spawn(TableConfig {
            max_players: 30,
            ..config()
        });
        assert_eq!(
            handle.start(users(3), 0).await.unwrap_err(),
            "Max players must be between 2 and 23"
        );

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.hand_number, 0);
        assert!(snapshot.players.is_empty());
    }

    #[tokio::test]
    async fn test_chatter_and_out_of_turn_actions_are_ignored() {
        let handle = spawn(config());
        let _outcomes = handle.start(users(3), 0).await.unwrap();

        let u0 = PlayerId::new("U0");
        let u1 = PlayerId::new("U1");
        assert_eq!(
            handle.player_message(&u0, "nice hand").await.unwrap(),
            TableResponse::Ignored
        );
        assert_eq!(
            handle.player_message(&u1, "call").await.unwrap(),
            TableResponse::NotYourTurn
        );
        assert_eq!(
            handle
                .player_message(&PlayerId::new("stranger"), "fold")
                .await
                .unwrap(),
            TableResponse::Ignored
        );

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.acting_player, Some(u0));
        assert_eq!(snapshot.total_pot(), 12);
    }

    #[tokio::test]
    async fn test_illegal_action_is_reported_privately() {
        let (notifier, mut notifications) = ChannelNotifier::channel();
        let (actor, handle) = TableActor::new(config());
        tokio::spawn(
            actor
                .with_notifier(notifier)
                .with_timer(ManualTurnTimer::default())
                .run(),
        );
        let _outcomes = handle.start(users(3), 0).await.unwrap();

        let u0 = PlayerId::new("U0");
        let response = handle.player_message(&u0, "check").await.unwrap();
        assert!(matches!(response, TableResponse::InvalidAction(_)));

        let mut private = Vec::new();
        while let Ok(notification) = notifications.try_recv() {
            if notification.recipient == Recipient::Player(u0.clone()) {
                private.push(notification.text);
            }
        }
        // Hole cards first, then the rejection.
        assert_eq!(private.len(), 2);
        assert_eq!(private[1], "can't check, 8 to call");
    }

    #[tokio::test]
    async fn test_bots_join_and_never_get_private_messages() {
        let (notifier, mut notifications) = ChannelNotifier::channel();
        let (actor, handle) = TableActor::new(TableConfig {
            bots: true,
            ..config()
        });
        tokio::spawn(
            actor
                .with_notifier(notifier)
                .with_timer(ManualTurnTimer::default())
                .run(),
        );
        let _outcomes = handle.start(users(1), 0).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.players.len(), 3);
        assert!(snapshot.player("bot-phil-hellmuth").is_some());
        assert!(snapshot.player("bot-phil-ivey").is_some());

        while let Ok(notification) = notifications.try_recv() {
            if let Recipient::Player(id) = notification.recipient {
                assert_eq!(id, PlayerId::new("U0"));
            }
        }
    }
}
