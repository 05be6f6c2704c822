//! State transitions and the [`PokerState`] wrapper that drives them.

use enum_dispatch::enum_dispatch;
use log::{debug, error, info, warn};
use std::collections::{HashSet, VecDeque};

use super::{
    constants::{HOLE_CARDS, MIN_PLAYERS},
    entities::{
        Action, ActionChoices, Blinds, Card, Chips, Phase, Player, PlayerId, Street, User,
    },
    functional::{HandStrength, evaluate},
    pot::{HandOutcome, PotManager},
    state_machine::{
        Game, GameData, GameEvent, GameSettings, GameStateManagement, InvariantViolation,
        TableControl, UserError,
    },
    states::{
        AwaitingStart, CollectBlinds, Deal, Flop, GameOver, HandComplete, River, Showdown,
        TakeAction, Turn,
    },
};

impl<T> Game<T> {
    /// Stop the game for good after an accounting defect.
    fn halt(mut self, violation: InvariantViolation) -> Game<GameOver> {
        error!("halting game: {violation}");
        self.data.acting_idx = None;
        self.data
            .events
            .push_back(GameEvent::Halted(violation.to_string()));
        self.data.halted = Some(violation);
        self.transition(GameOver {})
    }

    /// Either start another hand or end the game.
    fn next_hand_or_game_over(mut self) -> PokerState {
        let num_players = self.data.players.len();
        if self.data.quit_requested || num_players < MIN_PLAYERS {
            if self.data.hand_number == 0 && num_players < MIN_PLAYERS {
                self.data.events.push_back(GameEvent::NotEnoughPlayers);
            }
            let winner = match self.data.players.as_slice() {
                [winner] => Some(winner.user.name.clone()),
                _ => None,
            };
            info!(
                "game over after {} hand(s), winner: {winner:?}",
                self.data.hand_number
            );
            self.data.events.push_back(GameEvent::GameOver { winner });
            return self.transition(GameOver {}).into();
        }
        self.transition(CollectBlinds {}).into()
    }

    /// Top the board up to this street's size and open its betting round.
    fn deal_street(mut self, street: Street) -> PokerState {
        let missing = street.board_len().saturating_sub(self.data.board.len());
        match self.data.deck.deal(missing) {
            Ok(cards) => self.data.board.extend(cards),
            Err(err) => return self.halt(err.into()).into(),
        }
        let board = self.data.board[..street.board_len()].to_vec();
        debug!("dealt the {street}");
        self.data.events.push_back(GameEvent::Dealt { street, board });

        let mut game = self.transition(TakeAction { street });
        let first = game.data.dealer_idx + 1;
        game.data.set_next_actor(first);
        game.into()
    }
}

impl Game<CollectBlinds> {
    fn collect_blinds(mut self) -> Game<Deal> {
        let data = &mut self.data;
        data.hand_number += 1;
        data.pot_manager.set_blinds(data.blinds);
        data.pot_manager.start_hand(&mut data.players);
        data.board.clear();
        data.deck.shuffle();
        data.acting_idx = None;

        let num_players = data.players.len();
        let dealer_idx = data.dealer_idx;
        // Heads up, the button posts the small blind.
        let (small_idx, big_idx) = if num_players == 2 {
            (dealer_idx, (dealer_idx + 1) % num_players)
        } else {
            ((dealer_idx + 1) % num_players, (dealer_idx + 2) % num_players)
        };
        data.big_blind_idx = big_idx;

        info!(
            "starting hand #{} with {num_players} players, blinds {}",
            data.hand_number, data.blinds
        );
        data.events.push_back(GameEvent::HandStarted {
            hand_number: data.hand_number,
            dealer: data.players[dealer_idx].user.name.clone(),
            blinds: data.blinds,
        });
        let (small, big) = data
            .pot_manager
            .post_blinds(&mut data.players, small_idx, big_idx);
        for (idx, amount, is_big) in [(small_idx, small, false), (big_idx, big, true)] {
            let player = &data.players[idx];
            data.events.push_back(GameEvent::PostedBlind {
                name: player.user.name.clone(),
                amount,
                big: is_big,
                all_in: player.is_all_in,
            });
        }
        self.transition(Deal {})
    }
}

impl Game<Deal> {
    fn deal_hole_cards(mut self) -> PokerState {
        let num_players = self.data.players.len();
        for offset in 1..=num_players {
            let idx = (self.data.dealer_idx + offset) % num_players;
            let cards = match self.data.deck.deal(HOLE_CARDS) {
                Ok(cards) => cards,
                Err(err) => return self.halt(err.into()).into(),
            };
            let player = &mut self.data.players[idx];
            player.hole_cards.clone_from(&cards);
            self.data.events.push_back(GameEvent::HoleCards {
                id: player.id().clone(),
                cards,
            });
        }
        let mut game = self.transition(TakeAction {
            street: Street::Preflop,
        });
        let first = game.data.big_blind_idx + 1;
        game.data.set_next_actor(first);
        game.into()
    }
}

impl Game<TakeAction> {
    /// Apply an action from the acting player and pass the turn on.
    pub fn take_action(&mut self, id: &PlayerId, action: &Action) -> Result<Action, UserError> {
        let idx = self
            .data
            .player_idx(id)
            .ok_or(UserError::UserDoesNotExist)?;
        if self.data.acting_idx != Some(idx) {
            return Err(UserError::OutOfTurnAction);
        }
        let applied = self
            .data
            .pot_manager
            .apply_action(&mut self.data.players, idx, action)?;
        debug!("{id} {applied}");
        self.data.record_action(idx, applied.clone(), false);
        self.data.set_next_actor(idx + 1);
        Ok(applied)
    }

    /// Act for a player who ran out of time: fold if they owe chips,
    /// otherwise check. Tokens from earlier turns are ignored.
    pub fn expire_turn(&mut self, token: u64) -> Option<Action> {
        if token != self.data.turn_token {
            debug!("ignoring stale timeout {token}");
            return None;
        }
        let idx = self.data.acting_idx?;
        let player = &self.data.players[idx];
        let action = if player.committed_this_round < self.data.pot_manager.current_bet {
            Action::Fold
        } else {
            Action::Check
        };
        match self
            .data
            .pot_manager
            .apply_action(&mut self.data.players, idx, &action)
        {
            Ok(applied) => {
                self.data.record_action(idx, applied.clone(), true);
                self.data.set_next_actor(idx + 1);
                Some(applied)
            }
            Err(err) => {
                warn!("default action rejected: {err}");
                None
            }
        }
    }

    fn close_round(mut self) -> PokerState {
        let data = &mut self.data;
        data.pot_manager.end_betting_round(&mut data.players);
        debug!(
            "{} betting closed, pots: {:?}",
            self.state.street,
            data.pot_manager.pots.iter().map(|p| p.amount).collect::<Vec<_>>()
        );
        if data.num_live() <= 1 {
            return self.transition(Showdown {}).into();
        }
        match self.state.street {
            Street::Preflop => self.transition(Flop {}).into(),
            Street::Flop => self.transition(Turn {}).into(),
            Street::Turn => self.transition(River {}).into(),
            Street::River => self.transition(Showdown {}).into(),
        }
    }
}

impl Game<Showdown> {
    fn showdown(mut self) -> PokerState {
        let data = &mut self.data;
        let num_players = data.players.len();
        let first_seat = (data.dealer_idx + 1) % num_players.max(1);
        let contested = data.num_live() >= MIN_PLAYERS;

        let hands: Vec<Option<HandStrength>> = data
            .players
            .iter()
            .map(|p| (contested && p.is_live()).then(|| evaluate(&p.hole_cards, &data.board)))
            .collect();
        if contested {
            for offset in 0..num_players {
                let idx = (first_seat + offset) % num_players;
                if let Some(hand) = &hands[idx] {
                    let player = &data.players[idx];
                    data.events.push_back(GameEvent::Showed {
                        name: player.user.name.clone(),
                        cards: player.hole_cards.clone(),
                        hand: hand.name(),
                    });
                }
            }
        }

        let outcome = match data
            .pot_manager
            .resolve_showdown(&mut data.players, &hands, first_seat)
        {
            Ok(outcome) => outcome,
            Err(violation) => return self.halt(violation).into(),
        };
        for (pot, result) in outcome.pots.iter().enumerate() {
            for winner in &result.winners {
                data.events.push_back(GameEvent::Won {
                    name: winner.name.clone(),
                    amount: winner.amount,
                    pot,
                    split: result.is_split_pot,
                    hand: result.hand_name.clone(),
                });
            }
        }
        info!(
            "hand #{} complete, {} chip(s) paid from {} pot(s)",
            data.hand_number,
            outcome.total(),
            outcome.pots.len()
        );
        self.transition(HandComplete {}).into()
    }
}

impl Game<HandComplete> {
    /// Remove busted players and move the button to the next player still
    /// holding chips.
    fn settle(&mut self) {
        let data = &mut self.data;
        data.acting_idx = None;
        let num_players = data.players.len();
        let next_dealer = (1..=num_players)
            .map(|offset| (data.dealer_idx + offset) % num_players)
            .find(|idx| data.players[*idx].chips > 0)
            .map(|idx| data.players[idx].id().clone());

        let (kept, busted): (Vec<Player>, Vec<Player>) =
            std::mem::take(&mut data.players)
                .into_iter()
                .partition(|p| p.chips > 0);
        for player in busted {
            info!("{} eliminated", player.user.name);
            data.events
                .push_back(GameEvent::Eliminated(player.user.name));
        }
        data.players = kept;
        data.dealer_idx = next_dealer
            .and_then(|id| data.player_idx(&id))
            .unwrap_or(0);
    }
}

/// The game in whichever state it's currently in.
#[enum_dispatch(GameStateManagement, TableControl)]
#[derive(Debug)]
pub enum PokerState {
    AwaitingStart(Game<AwaitingStart>),
    CollectBlinds(Game<CollectBlinds>),
    Deal(Game<Deal>),
    TakeAction(Game<TakeAction>),
    Flop(Game<Flop>),
    Turn(Game<Turn>),
    River(Game<River>),
    Showdown(Game<Showdown>),
    HandComplete(Game<HandComplete>),
    GameOver(Game<GameOver>),
}

impl Default for PokerState {
    /// An empty table that hasn't started.
    fn default() -> Self {
        Game {
            data: GameData::new(Vec::new(), GameSettings::default(), 0),
            state: AwaitingStart {},
        }
        .into()
    }
}

impl PokerState {
    /// Seat `users` in order, each with `stash` chips. The first hand uses
    /// `dealer_idx` as the button.
    pub fn new(
        users: Vec<User>,
        stash: Chips,
        settings: GameSettings,
        dealer_idx: usize,
    ) -> Result<Self, UserError> {
        let seats = users.into_iter().map(|user| (user, stash)).collect();
        Self::with_stacks(seats, settings, dealer_idx)
    }

    /// Seat players with their own stacks, e.g. to carry chip counts over
    /// from an earlier game.
    pub fn with_stacks(
        seats: Vec<(User, Chips)>,
        settings: GameSettings,
        dealer_idx: usize,
    ) -> Result<Self, UserError> {
        if seats.len() > settings.max_players {
            return Err(UserError::CapacityReached);
        }
        if seats
            .iter()
            .try_fold(0, |total: Chips, (_, chips)| total.checked_add(*chips))
            .is_none()
        {
            return Err(UserError::ChipOverflow);
        }
        let mut seen = HashSet::with_capacity(seats.len());
        if !seats.iter().all(|(user, _)| seen.insert(user.id.clone())) {
            return Err(UserError::UserAlreadyExists);
        }
        let players = seats
            .into_iter()
            .map(|(user, chips)| Player::new(user, chips))
            .collect();
        Ok(Game {
            data: GameData::new(players, settings, dealer_idx),
            state: AwaitingStart {},
        }
        .into())
    }

    /// Make one transition. States that are waiting on a player, between
    /// hands, or over stay where they are.
    #[must_use]
    pub fn step(self) -> Self {
        let next: Self = match self {
            Self::AwaitingStart(game) => game.next_hand_or_game_over(),
            Self::CollectBlinds(game) => game.collect_blinds().into(),
            Self::Deal(game) => game.deal_hole_cards(),
            Self::TakeAction(game) => {
                if game.data.acting_idx.is_some() {
                    game.into()
                } else {
                    game.close_round()
                }
            }
            Self::Flop(game) => game.deal_street(Street::Flop),
            Self::Turn(game) => game.deal_street(Street::Turn),
            Self::River(game) => game.deal_street(Street::River),
            Self::Showdown(game) => {
                let next = game.showdown();
                match next {
                    Self::HandComplete(mut game) => {
                        game.settle();
                        game.into()
                    }
                    other => other,
                }
            }
            Self::HandComplete(game) => game.next_hand_or_game_over(),
            Self::GameOver(game) => game.into(),
        };
        next.checked()
    }

    /// Step until the game needs something from outside: a player's action,
    /// the go-ahead for the next hand, or nothing at all because it's over.
    #[must_use]
    pub fn advance(self) -> Self {
        let mut state = self.step();
        while !state.is_waiting() {
            state = state.step();
        }
        state
    }

    fn is_waiting(&self) -> bool {
        match self {
            Self::TakeAction(game) => game.data.acting_idx.is_some(),
            Self::AwaitingStart(_) | Self::HandComplete(_) | Self::GameOver(_) => true,
            _ => false,
        }
    }

    fn checked(self) -> Self {
        if self.data().halted.is_some() {
            return self;
        }
        match self.verify_chips() {
            Ok(()) => self,
            Err(violation) => self.into_game_over(violation),
        }
    }

    fn into_game_over(self, violation: InvariantViolation) -> Self {
        let game = match self {
            Self::AwaitingStart(game) => game.halt(violation),
            Self::CollectBlinds(game) => game.halt(violation),
            Self::Deal(game) => game.halt(violation),
            Self::TakeAction(game) => game.halt(violation),
            Self::Flop(game) => game.halt(violation),
            Self::Turn(game) => game.halt(violation),
            Self::River(game) => game.halt(violation),
            Self::Showdown(game) => game.halt(violation),
            Self::HandComplete(game) => game.halt(violation),
            Self::GameOver(game) => game.halt(violation),
        };
        game.into()
    }

    /// Apply an action from `id`. Only the acting player may act.
    pub fn take_action(&mut self, id: &PlayerId, action: &Action) -> Result<Action, UserError> {
        match self {
            Self::TakeAction(game) => game.take_action(id, action),
            _ => Err(UserError::NoActionExpected),
        }
    }

    /// Apply the default action for the turn identified by `token`, if that
    /// turn is still running.
    pub fn expire_turn(&mut self, token: u64) -> Option<Action> {
        match self {
            Self::TakeAction(game) => game.expire_turn(token),
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::AwaitingStart(_) => Phase::AwaitingStart,
            Self::CollectBlinds(_) | Self::Deal(_) => Phase::Preflop,
            Self::TakeAction(game) => game.state.street.into(),
            Self::Flop(_) => Phase::Flop,
            Self::Turn(_) => Phase::Turn,
            Self::River(_) => Phase::River,
            Self::Showdown(_) => Phase::Showdown,
            Self::HandComplete(_) => Phase::HandComplete,
            Self::GameOver(_) => Phase::GameOver,
        }
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        matches!(self, Self::GameOver(_))
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.data().board
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.data().players
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players().iter().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn acting_player(&self) -> Option<&Player> {
        match self {
            Self::TakeAction(game) => game.data.acting_idx.map(|idx| &game.data.players[idx]),
            _ => None,
        }
    }

    #[must_use]
    pub fn action_choices(&self) -> Option<ActionChoices> {
        self.acting_player()
            .map(|player| self.pot_manager().action_choices(player))
    }

    #[must_use]
    pub fn pot_manager(&self) -> &PotManager {
        &self.data().pot_manager
    }

    #[must_use]
    pub fn dealer_idx(&self) -> usize {
        self.data().dealer_idx
    }

    #[must_use]
    pub fn turn_token(&self) -> u64 {
        self.data().turn_token()
    }

    #[must_use]
    pub fn hand_number(&self) -> u32 {
        self.data().hand_number
    }

    /// Blinds the next hand will use.
    #[must_use]
    pub fn blinds(&self) -> Blinds {
        self.data().blinds
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<&HandOutcome> {
        self.pot_manager().outcomes.last()
    }

    #[must_use]
    pub fn halted(&self) -> Option<&InvariantViolation> {
        self.data().halted()
    }
}
