//! Style-driven choices for scripted players.

use rand::Rng;

use super::BotStyle;
use crate::game::{
    entities::{Action, Card, Chips},
    functional::{Rank, eval},
};

/// Per-style thresholds. Hand strengths are floats in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleParams {
    /// Below this the bot folds, or checks when it's free.
    pub fold_threshold: f32,
    /// At or above this the bot looks to bet.
    pub raise_threshold: f32,
    /// Scales how often the bot calls and raises, and how big it bets.
    pub aggression_factor: f32,
    /// Chance of betting a hand it would otherwise fold.
    pub bluff_frequency: f32,
}

/// What a bot sees when it's its turn.
#[derive(Debug, Clone)]
pub struct BotDecisionContext<'a> {
    pub hole_cards: &'a [Card],
    pub board_cards: &'a [Card],

    /// Chips in every pot, this round included
    pub pot_size: Chips,

    /// Chips needed to call, already capped at the bot's stack
    pub call_amount: Chips,

    /// Fewest chips a bet or raise must put in
    pub min_raise: Chips,

    pub bot_chips: Chips,
    pub can_check: bool,

    /// Whether betting is open to the bot
    pub can_raise: bool,
}

pub struct BotDecisionMaker {
    rng: rand::rngs::ThreadRng,
}

impl BotDecisionMaker {
    #[must_use]
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }

    /// Decide the bot's action for its style and what it can see. The
    /// action may still be rejected by the table; callers fall back to a
    /// check or fold.
    pub fn decide_action(&mut self, style: BotStyle, ctx: &BotDecisionContext) -> Action {
        let params = style.params();
        let strength = estimate_hand_strength(ctx.hole_cards, ctx.board_cards);

        if strength < params.fold_threshold {
            if ctx.can_check {
                return Action::Check;
            }
            if ctx.can_raise && self.rng.random_bool(f64::from(params.bluff_frequency)) {
                return Self::wager(ctx, ctx.pot_size.saturating_add(ctx.pot_size / 2));
            }
            return Action::Fold;
        }

        if strength < params.raise_threshold {
            if ctx.can_check {
                return Action::Check;
            }
            // Cheap calls get a nudge.
            let cheap = pot_odds(ctx.pot_size, ctx.call_amount) > 0.75;
            let call_probability =
                0.3 + params.aggression_factor / 5.0 + if cheap { 0.2 } else { 0.0 };
            if self.rng.random_bool(f64::from(call_probability.min(1.0))) {
                return Action::Call;
            }
            return Action::Fold;
        }

        let raise_probability = 0.4 + params.aggression_factor / 4.0;
        if ctx.can_raise && self.rng.random_bool(f64::from(raise_probability.min(1.0))) {
            let amount = self.raise_size(params.aggression_factor, ctx);
            Self::wager(ctx, amount)
        } else if ctx.can_check {
            Action::Check
        } else {
            Action::Call
        }
    }

    /// A bet or raise of at least the minimum, capped at the stack.
    fn wager(ctx: &BotDecisionContext, amount: Chips) -> Action {
        let amount = amount.max(ctx.min_raise).min(ctx.bot_chips);
        if ctx.can_check && ctx.call_amount == 0 {
            Action::Bet(Some(amount))
        } else {
            Action::Raise(Some(amount))
        }
    }

    /// Call plus a share of the pot that grows with aggression, give or
    /// take a fifth.
    fn raise_size(&mut self, aggression_factor: f32, ctx: &BotDecisionContext) -> Chips {
        let share: f32 = if aggression_factor < 1.0 { 0.5 } else { 1.0 };
        let multiplier = share * (1.0 + self.rng.random_range(-0.2..=0.2));
        let pot = ctx.pot_size.saturating_add(ctx.call_amount);
        ctx.call_amount.saturating_add((pot as f32 * multiplier) as Chips)
    }
}

impl Default for BotDecisionMaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Pot odds as pot / (pot + call).
fn pot_odds(pot_size: Chips, call_amount: Chips) -> f32 {
    if call_amount == 0 {
        return 1.0;
    }
    pot_size as f32 / (pot_size as f32 + call_amount as f32)
}

/// Hand strength in `[0.0, 1.0]`: the hand's category plus a small bonus
/// for its top value.
#[must_use]
pub fn estimate_hand_strength(hole_cards: &[Card], board_cards: &[Card]) -> f32 {
    let mut all_cards = Vec::with_capacity(hole_cards.len() + board_cards.len());
    all_cards.extend_from_slice(hole_cards);
    all_cards.extend_from_slice(board_cards);

    if all_cards.len() < 2 {
        return 0.0;
    }

    let hand = eval(&all_cards);
    let base = match hand.rank {
        Rank::HighCard => 0.1,
        Rank::OnePair => 0.25,
        Rank::TwoPair => 0.4,
        Rank::ThreeOfAKind => 0.55,
        Rank::Straight => 0.7,
        Rank::Flush => 0.75,
        Rank::FullHouse => 0.85,
        Rank::FourOfAKind => 0.95,
        Rank::StraightFlush => 0.99,
    };
    let kicker = hand
        .values
        .first()
        .map_or(0.0, |value| f32::from(*value) / 140.0);

    (base + kicker).min(1.0)
}
