//! Hand evaluation.
//!
//! Hands are scored into a [`HandStrength`] whose derived ordering is the
//! poker ordering: category first, then the values that break ties within
//! the category, most significant first.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{ACE, Card, SUITS, Value};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// Best five card hand found in a set of cards.
///
/// `values` holds the category's defining values followed by kickers. For a
/// full house that's the trips value then the pair value; for a straight it's
/// only the top card (5 for a wheel).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct HandStrength {
    pub rank: Rank,
    pub values: Vec<Value>,
}

impl HandStrength {
    #[must_use]
    pub fn name(&self) -> String {
        self.rank.to_string()
    }
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank)
    }
}

const HAND_SIZE: usize = 5;

/// Bit `v` is set when a card of value `v` is present. Aces also set bit 1 so
/// the wheel reads as a straight.
fn value_mask(values: impl IntoIterator<Item = Value>) -> u16 {
    values.into_iter().fold(0u16, |mask, value| {
        let mask = mask | (1 << value);
        if value == ACE { mask | (1 << 1) } else { mask }
    })
}

fn straight_high(mask: u16) -> Option<Value> {
    (5..=ACE).rev().find(|high| {
        let run = 0b1_1111u16 << (high - 4);
        mask & run == run
    })
}

/// Highest values in `values` (already sorted high to low) that aren't in
/// `exclude`, up to `n` of them.
fn kickers(values: &[Value], exclude: &[Value], n: usize) -> Vec<Value> {
    values
        .iter()
        .filter(|v| !exclude.contains(v))
        .take(n)
        .copied()
        .collect()
}

/// Evaluate the best hand available in `cards`. Works for any number of
/// cards; with fewer than five, kickers are limited to what's there.
#[must_use]
pub fn eval(cards: &[Card]) -> HandStrength {
    let mut counts = [0u8; ACE as usize + 1];
    for card in cards {
        counts[card.0 as usize] += 1;
    }
    // Distinct values, high to low.
    let distinct: Vec<Value> = (2..=ACE).rev().filter(|v| counts[*v as usize] > 0).collect();
    let with_count = |n: u8| -> Vec<Value> {
        distinct
            .iter()
            .filter(|v| counts[**v as usize] >= n)
            .copied()
            .collect()
    };

    let flush_values = SUITS.iter().find_map(|suit| {
        let mut values: Vec<Value> = cards
            .iter()
            .filter(|c| c.1 == *suit)
            .map(|c| c.0)
            .collect();
        if values.len() >= HAND_SIZE {
            values.sort_unstable_by(|a, b| b.cmp(a));
            Some(values)
        } else {
            None
        }
    });

    if let Some(values) = &flush_values
        && let Some(high) = straight_high(value_mask(values.iter().copied()))
    {
        return HandStrength {
            rank: Rank::StraightFlush,
            values: vec![high],
        };
    }

    let quads = with_count(4);
    if let Some(&quad) = quads.first() {
        let mut values = vec![quad];
        values.extend(kickers(&distinct, &[quad], 1));
        return HandStrength {
            rank: Rank::FourOfAKind,
            values,
        };
    }

    let trips = with_count(3);
    let pairs = with_count(2);
    if let Some(&trip) = trips.first()
        && let Some(&pair) = pairs.iter().find(|v| **v != trip)
    {
        return HandStrength {
            rank: Rank::FullHouse,
            values: vec![trip, pair],
        };
    }

    if let Some(values) = flush_values {
        return HandStrength {
            rank: Rank::Flush,
            values: values.into_iter().take(HAND_SIZE).collect(),
        };
    }

    if let Some(high) = straight_high(value_mask(distinct.iter().copied())) {
        return HandStrength {
            rank: Rank::Straight,
            values: vec![high],
        };
    }

    if let Some(&trip) = trips.first() {
        let mut values = vec![trip];
        values.extend(kickers(&distinct, &[trip], 2));
        return HandStrength {
            rank: Rank::ThreeOfAKind,
            values,
        };
    }

    if let [high, low, ..] = pairs[..] {
        let mut values = vec![high, low];
        values.extend(kickers(&distinct, &[high, low], 1));
        return HandStrength {
            rank: Rank::TwoPair,
            values,
        };
    }

    if let Some(&pair) = pairs.first() {
        let mut values = vec![pair];
        values.extend(kickers(&distinct, &[pair], 3));
        return HandStrength {
            rank: Rank::OnePair,
            values,
        };
    }

    HandStrength {
        rank: Rank::HighCard,
        values: kickers(&distinct, &[], HAND_SIZE),
    }
}

/// Evaluate a player's hole cards together with the board.
#[must_use]
pub fn evaluate(hole_cards: &[Card], board: &[Card]) -> HandStrength {
    let mut cards = Vec::with_capacity(hole_cards.len() + board.len());
    cards.extend_from_slice(hole_cards);
    cards.extend_from_slice(board);
    eval(&cards)
}

/// Indices of every hand tied for best.
#[must_use]
pub fn argmax(hands: &[HandStrength]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == best)
        .map(|(idx, _)| idx)
        .collect()
}
