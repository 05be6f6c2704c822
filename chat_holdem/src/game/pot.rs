//! Chip accounting for a single hand: commitments, betting legality, side
//! pots, and showdown payouts.
//!
//! Chips committed during a betting round go straight into the last (open)
//! pot. When the round closes, the pots are rebuilt from each player's
//! commitment for the whole hand so an all-in caps what it can win in every
//! later tier.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Action, ActionChoice, ActionChoices, Bet, BetAction, Blinds, Chips, Player, PlayerId},
    functional::HandStrength,
    state_machine::{InvariantViolation, UserError},
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    /// Players who can win this pot, in seat order.
    pub eligible: Vec<PlayerId>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Winner {
    pub id: PlayerId,
    pub name: String,
    /// Chips won from this pot.
    pub amount: Chips,
    /// Stack right after this pot was paid.
    pub chips: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PotResult {
    pub amount: Chips,
    pub winners: Vec<Winner>,
    pub is_split_pot: bool,
    /// Name of the winning hand. `None` when nobody had to show.
    pub hand_name: Option<String>,
}

/// Everything paid out at the end of one hand, one entry per pot.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandOutcome {
    pub pots: Vec<PotResult>,
}

impl HandOutcome {
    /// Result for the main pot.
    #[must_use]
    pub fn main(&self) -> Option<&PotResult> {
        self.pots.first()
    }

    #[must_use]
    pub fn total(&self) -> Chips {
        self.pots.iter().map(|p| p.amount).sum()
    }
}

#[derive(Clone, Debug)]
pub struct PotManager {
    pub pots: Vec<Pot>,
    pub current_bet: Chips,
    /// Size of the last full bet or raise this round.
    last_increment: Chips,
    pub last_aggressor: Option<usize>,
    blinds: Blinds,
    pub outcomes: Vec<HandOutcome>,
}

impl PotManager {
    #[must_use]
    pub fn new(blinds: Blinds) -> Self {
        Self {
            pots: Vec::new(),
            current_bet: 0,
            last_increment: 0,
            last_aggressor: None,
            blinds,
            outcomes: Vec::new(),
        }
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        self.blinds
    }

    /// Takes effect from the next hand's blinds.
    pub fn set_blinds(&mut self, blinds: Blinds) {
        self.blinds = blinds;
    }

    /// Sum of every pot, including chips committed in the current round.
    #[must_use]
    pub fn total_chips(&self) -> Chips {
        self.pots.iter().map(|p| p.amount).sum()
    }

    pub fn start_hand(&mut self, players: &mut [Player]) {
        for player in players.iter_mut() {
            player.reset();
        }
        self.pots = vec![Pot {
            amount: 0,
            eligible: players.iter().map(|p| p.id().clone()).collect(),
        }];
        self.current_bet = 0;
        self.last_increment = self.blinds.big;
        self.last_aggressor = None;
    }

    /// Post both blinds, returning what each player could actually cover.
    /// The bet to call is the nominal big blind even if the big blind is
    /// short.
    pub fn post_blinds(
        &mut self,
        players: &mut [Player],
        small_idx: usize,
        big_idx: usize,
    ) -> (Chips, Chips) {
        let small = self.blinds.small.min(players[small_idx].chips);
        self.commit(players, small_idx, small);
        let big = self.blinds.big.min(players[big_idx].chips);
        self.commit(players, big_idx, big);
        self.current_bet = self.blinds.big;
        self.last_increment = self.blinds.big;
        (small, big)
    }

    fn commit(&mut self, players: &mut [Player], idx: usize, amount: Chips) {
        let player = &mut players[idx];
        player.chips -= amount;
        player.committed_this_round += amount;
        player.total_committed_this_hand += amount;
        if player.chips == 0 {
            player.is_all_in = true;
        }
        match self.pots.last_mut() {
            Some(pot) => pot.amount += amount,
            None => self.pots.push(Pot {
                amount,
                eligible: vec![player.id().clone()],
            }),
        }
    }

    /// Chips the player needs to put in to call, capped at their stack.
    #[must_use]
    pub fn call_amount(&self, player: &Player) -> Chips {
        self.current_bet
            .saturating_sub(player.committed_this_round)
            .min(player.chips)
    }

    /// The smallest legal bet, or the smallest legal raise increment over
    /// the current bet.
    #[must_use]
    pub fn min_raise_amount(&self) -> Chips {
        if self.current_bet == 0 {
            self.blinds.small
        } else {
            self.last_increment.max(1)
        }
    }

    /// The smallest total a bet or raise can take the current bet to.
    #[must_use]
    pub fn min_raise_to(&self) -> Chips {
        self.current_bet.saturating_add(self.min_raise_amount())
    }

    #[must_use]
    pub fn default_bet(&self) -> Chips {
        self.blinds.small
    }

    /// Default raise doubles the current bet.
    #[must_use]
    pub fn default_raise_to(&self) -> Chips {
        self.current_bet
            .saturating_mul(2)
            .max(self.min_raise_to())
    }

    /// Whether betting is open to this player. It closes once they've acted
    /// and nobody has made a full raise since; after that they may only
    /// raise by moving all-in.
    #[must_use]
    pub fn can_raise(&self, player: &Player) -> bool {
        player.can_act()
            && player.chips > self.current_bet.saturating_sub(player.committed_this_round)
            && (self.current_bet == 0 || !player.has_acted)
    }

    #[must_use]
    pub fn action_choices(&self, player: &Player) -> ActionChoices {
        let owed = self.current_bet.saturating_sub(player.committed_this_round);
        let mut choices = Vec::with_capacity(3);
        choices.push(ActionChoice::Fold);
        if owed == 0 {
            choices.push(ActionChoice::Check);
        } else {
            choices.push(ActionChoice::Call(owed.min(player.chips)));
        }
        if self.can_raise(player) {
            let min = (self.min_raise_to() - player.committed_this_round).min(player.chips);
            if self.current_bet == 0 {
                choices.push(ActionChoice::Bet(min));
            } else {
                choices.push(ActionChoice::Raise(min));
            }
        } else if player.can_act() && player.chips > owed {
            choices.push(ActionChoice::Raise(player.chips));
        }
        choices.into()
    }

    /// Whether the player still has to act this round.
    #[must_use]
    pub fn needs_action(&self, players: &[Player], idx: usize) -> bool {
        let player = &players[idx];
        if !player.can_act() {
            return false;
        }
        if player.committed_this_round < self.current_bet {
            return true;
        }
        let num_can_act = players.iter().filter(|p| p.can_act()).count();
        !player.has_acted && num_can_act >= 2
    }

    #[must_use]
    pub fn is_round_closed(&self, players: &[Player]) -> bool {
        !(0..players.len()).any(|idx| self.needs_action(players, idx))
    }

    /// Apply an action for the player at `idx`. On success, returns the
    /// action as it was actually carried out: calls with nothing owed become
    /// checks, bets into a bet become raises, and amounts are filled in and
    /// clamped to the stack.
    pub fn apply_action(
        &mut self,
        players: &mut [Player],
        idx: usize,
        action: &Action,
    ) -> Result<Action, UserError> {
        let player = &players[idx];
        if player.has_folded {
            return Err(UserError::AlreadyFolded);
        }
        if player.is_all_in {
            return Err(UserError::AlreadyAllIn);
        }
        let owed = self.current_bet.saturating_sub(player.committed_this_round);

        match action {
            Action::Fold => {
                self.fold(players, idx);
                Ok(Action::Fold)
            }
            Action::Check | Action::Call if owed == 0 => {
                players[idx].has_acted = true;
                Ok(Action::Check)
            }
            Action::Check => Err(UserError::CannotCheck {
                call: owed.min(player.chips),
            }),
            Action::Call => {
                let amount = owed.min(player.chips);
                self.commit(players, idx, amount);
                players[idx].has_acted = true;
                Ok(Action::Call)
            }
            Action::Bet(amount) | Action::Raise(amount) => {
                let put_in = amount.unwrap_or_else(|| {
                    if self.current_bet == 0 {
                        self.default_bet()
                    } else {
                        self.default_raise_to()
                            .saturating_sub(player.committed_this_round)
                    }
                });
                self.wager(players, idx, put_in)
            }
        }
    }

    fn wager(
        &mut self,
        players: &mut [Player],
        idx: usize,
        put_in: Chips,
    ) -> Result<Action, UserError> {
        let player = &players[idx];
        let put_in = put_in.min(player.chips);
        let is_all_in = put_in == player.chips;
        let to = player.committed_this_round + put_in;
        let kind = if self.current_bet == 0 {
            BetAction::Bet
        } else {
            BetAction::Raise
        };
        let min = self.min_raise_to().saturating_sub(player.committed_this_round);

        if to <= self.current_bet {
            // Shoving for less than the bet is just a call.
            if is_all_in {
                self.commit(players, idx, put_in);
                players[idx].has_acted = true;
                return Ok(Action::Call);
            }
            return Err(UserError::InvalidBet {
                bet: Bet {
                    action: kind,
                    amount: put_in,
                },
                min,
            });
        }
        if kind == BetAction::Raise && player.has_acted && !is_all_in {
            return Err(UserError::BettingNotReopened);
        }
        if to < self.min_raise_to() && !is_all_in {
            return Err(UserError::InvalidBet {
                bet: Bet {
                    action: kind,
                    amount: put_in,
                },
                min,
            });
        }

        let increment = to - self.current_bet;
        self.commit(players, idx, put_in);
        self.current_bet = to;
        if increment >= self.last_increment {
            self.last_increment = increment;
            for (other_idx, other) in players.iter_mut().enumerate() {
                if other_idx != idx {
                    other.has_acted = false;
                }
            }
        }
        self.last_aggressor = Some(idx);
        players[idx].has_acted = true;
        Ok(match kind {
            BetAction::Bet => Action::Bet(Some(put_in)),
            _ => Action::Raise(Some(put_in)),
        })
    }

    fn fold(&mut self, players: &mut [Player], idx: usize) {
        let player = &mut players[idx];
        player.has_folded = true;
        player.has_acted = true;
        let id = player.id().clone();
        for pot in &mut self.pots {
            pot.eligible.retain(|eligible| *eligible != id);
        }
    }

    /// Close the betting round: rebuild the pots and reset per-round state.
    pub fn end_betting_round(&mut self, players: &mut [Player]) {
        self.build_side_pots(players);
        for player in players.iter_mut() {
            player.committed_this_round = 0;
            player.has_acted = false;
        }
        self.current_bet = 0;
        self.last_increment = 0;
        self.last_aggressor = None;
    }

    /// Rebuild the pots from every player's commitment this hand.
    ///
    /// Each live all-in depth caps a pot. A pot holds everyone's
    /// contribution between the previous cap and its own, and can be won by
    /// the live players who reached its cap. Whatever sits above the last
    /// cap forms the open pot for the players still betting. That pot is
    /// kept even when empty while two or more of them can still bet.
    pub fn build_side_pots(&mut self, players: &[Player]) {
        let mut caps: Vec<Chips> = players
            .iter()
            .filter(|p| p.is_live() && p.is_all_in && p.total_committed_this_hand > 0)
            .map(|p| p.total_committed_this_hand)
            .collect();
        caps.sort_unstable();
        caps.dedup();

        let mut pots: Vec<Pot> = Vec::with_capacity(caps.len() + 1);
        let mut prev = 0;
        for cap in caps {
            let amount = players
                .iter()
                .map(|p| {
                    p.total_committed_this_hand.min(cap) - p.total_committed_this_hand.min(prev)
                })
                .sum();
            let eligible = players
                .iter()
                .filter(|p| p.is_live() && p.total_committed_this_hand >= cap)
                .map(|p| p.id().clone())
                .collect();
            pots.push(Pot { amount, eligible });
            prev = cap;
        }

        let excess: Chips = players
            .iter()
            .map(|p| p.total_committed_this_hand.saturating_sub(prev))
            .sum();
        let open: Vec<PlayerId> = players
            .iter()
            .filter(|p| p.can_act())
            .map(|p| p.id().clone())
            .collect();
        if pots.is_empty() || excess > 0 || open.len() >= 2 {
            pots.push(Pot {
                amount: excess,
                eligible: open,
            });
        }

        // Chips nobody live can claim (folded money above the top cap) ride
        // with the pot below them.
        let mut merged: Vec<Pot> = Vec::with_capacity(pots.len());
        for pot in pots {
            match merged.last_mut() {
                Some(last) if pot.eligible.is_empty() => last.amount += pot.amount,
                _ => merged.push(pot),
            }
        }
        self.pots = merged;
    }

    /// Pay out every pot. `hands` is indexed like `players`; folded players
    /// and uncontested hands may be `None`. Tied winners split evenly and
    /// odd chips go one at a time in seat order starting from `first_seat`.
    pub fn resolve_showdown(
        &mut self,
        players: &mut [Player],
        hands: &[Option<HandStrength>],
        first_seat: usize,
    ) -> Result<HandOutcome, InvariantViolation> {
        let num_players = players.len();
        let seat_order: Vec<usize> = (0..num_players)
            .map(|offset| (first_seat + offset) % num_players.max(1))
            .collect();

        let mut results = Vec::with_capacity(self.pots.len());
        for pot in std::mem::take(&mut self.pots) {
            if pot.amount == 0 {
                continue;
            }
            let contenders: Vec<usize> = seat_order
                .iter()
                .copied()
                .filter(|idx| {
                    let player = &players[*idx];
                    player.is_live() && pot.eligible.contains(player.id())
                })
                .collect();
            let best = contenders
                .iter()
                .map(|idx| hands.get(*idx).cloned().flatten())
                .max()
                .ok_or(InvariantViolation::UnclaimedPot(pot.amount))?;
            let winner_indices: Vec<usize> = contenders
                .into_iter()
                .filter(|idx| hands.get(*idx).cloned().flatten() == best)
                .collect();

            let num_winners = winner_indices.len() as Chips;
            let share = pot.amount / num_winners;
            let mut remainder = pot.amount % num_winners;
            let mut winners = Vec::with_capacity(winner_indices.len());
            for idx in winner_indices {
                let mut amount = share;
                if remainder > 0 {
                    amount += 1;
                    remainder -= 1;
                }
                let player = &mut players[idx];
                player.chips += amount;
                winners.push(Winner {
                    id: player.id().clone(),
                    name: player.user.name.clone(),
                    amount,
                    chips: player.chips,
                });
            }
            results.push(PotResult {
                amount: pot.amount,
                is_split_pot: winners.len() > 1,
                winners,
                hand_name: best.map(|hand| hand.name()),
            });
        }

        let outcome = HandOutcome { pots: results };
        self.outcomes.push(outcome.clone());
        Ok(outcome)
    }

    /// Check chip conservation and pot eligibility.
    pub fn verify(&self, players: &[Player], expected_total: Chips) -> Result<(), InvariantViolation> {
        let found = players
            .iter()
            .map(|p| p.chips)
            .chain(self.pots.iter().map(|p| p.amount))
            .try_fold(0, Chips::checked_add)
            .ok_or(InvariantViolation::ChipOverflow)?;
        if found != expected_total {
            return Err(InvariantViolation::ChipTotal {
                expected: expected_total,
                found,
            });
        }
        if !self.pots.is_empty() {
            let committed = players
                .iter()
                .map(|p| p.total_committed_this_hand)
                .try_fold(0, Chips::checked_add)
                .ok_or(InvariantViolation::ChipOverflow)?;
            if committed != self.total_chips() {
                return Err(InvariantViolation::PotMismatch {
                    pots: self.total_chips(),
                    committed,
                });
            }
        }
        for pot in &self.pots {
            if let Some(folded) = players
                .iter()
                .find(|p| p.has_folded && pot.eligible.contains(p.id()))
            {
                return Err(InvariantViolation::FoldedEligible(folded.id().clone()));
            }
        }
        Ok(())
    }
}
