//! Typestate markers for each phase of a hand.

use crate::game::entities::Street;

/// Seated, waiting for the first hand.
#[derive(Debug)]
pub struct AwaitingStart {}

/// Resetting for a new hand and posting the blinds.
#[derive(Debug)]
pub struct CollectBlinds {}

/// Dealing hole cards to players
#[derive(Debug)]
pub struct Deal {}

/// A betting round is running.
#[derive(Clone, Copy, Debug)]
pub struct TakeAction {
    pub street: Street,
}

/// Dealing the flop (3 community cards)
#[derive(Debug)]
pub struct Flop {}

/// Dealing the turn (4th community card)
#[derive(Debug)]
pub struct Turn {}

/// Dealing the river (5th community card)
#[derive(Debug)]
pub struct River {}

/// Scoring hands and paying out the pots.
#[derive(Debug)]
pub struct Showdown {}

/// Between hands.
#[derive(Debug)]
pub struct HandComplete {}

#[derive(Debug)]
pub struct GameOver {}
