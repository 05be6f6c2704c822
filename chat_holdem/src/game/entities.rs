use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self},
    hash::{Hash, Hasher},
    mem::discriminant,
    str::FromStr,
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

pub const SUITS: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

impl TryFrom<char> for Suit {
    type Error = CardParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '♣' | 'c' | 'C' => Ok(Self::Club),
            '♠' | 's' | 'S' => Ok(Self::Spade),
            '♦' | 'd' | 'D' => Ok(Self::Diamond),
            '♥' | 'h' | 'H' => Ok(Self::Heart),
            other => Err(CardParseError::Suit(other)),
        }
    }
}

/// Card values run from 2 to 14, with the ace high at 14.
pub type Value = u8;

pub const ACE: Value = 14;

/// A card is a tuple of a value (2..=14) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            13 => "K",
            12 => "Q",
            11 => "J",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum CardParseError {
    #[error("card needs a value and a suit")]
    Empty,
    #[error("unknown card value {0:?}")]
    Value(String),
    #[error("unknown suit {0:?}")]
    Suit(char),
}

/// Parses the short forms used in chat and tests: `A♥`, `Ah`, `10d`, `Td`.
impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let suit = s.chars().last().ok_or(CardParseError::Empty)?;
        let value = &s[..s.len() - suit.len_utf8()];
        let value = match value.to_ascii_uppercase().as_str() {
            "A" => ACE,
            "K" => 13,
            "Q" => 12,
            "J" => 11,
            "T" => 10,
            "" => return Err(CardParseError::Empty),
            other => match other.parse::<Value>() {
                Ok(v @ 2..=10) => v,
                _ => return Err(CardParseError::Value(other.to_string())),
            },
        };
        Ok(Self(value, Suit::try_from(suit)?))
    }
}

pub const DECK_SIZE: usize = 52;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DeckError {
    #[error("can't deal {requested} card(s) with {remaining} left in the deck")]
    EmptyDeck { requested: usize, remaining: usize },
}

#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    pub deck_idx: usize,
}

impl Deck {
    /// A freshly shuffled 52 card deck.
    #[must_use]
    pub fn new_shuffled() -> Self {
        let mut deck = Self::default();
        deck.shuffle();
        deck
    }

    /// A deck that deals the given cards in order. Useful for replaying
    /// a known hand.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, deck_idx: 0 }
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    pub fn deal_card(&mut self) -> Result<Card, DeckError> {
        let card = self
            .cards
            .get(self.deck_idx)
            .copied()
            .ok_or(DeckError::EmptyDeck {
                requested: 1,
                remaining: 0,
            })?;
        self.deck_idx += 1;
        Ok(card)
    }

    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(DeckError::EmptyDeck {
                requested: n,
                remaining,
            });
        }
        let cards = self.cards[self.deck_idx..self.deck_idx + n].to_vec();
        self.deck_idx += n;
        Ok(cards)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for value in 2..=ACE {
            for suit in SUITS {
                cards.push(Card(value, suit));
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole chips. Stacks, bets, and pots are all counted
/// in chips.
pub type Chips = u32;

/// Chat platform user ID.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct User {
    pub id: PlayerId,
    pub name: String,
}

impl User {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
        }
    }
}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl Blinds {
    #[must_use]
    pub fn from_small(small: Chips) -> Self {
        Self {
            small,
            big: small.saturating_mul(2),
        }
    }

    #[must_use]
    pub fn doubled(&self) -> Self {
        Self {
            small: self.small.saturating_mul(2),
            big: self.big.saturating_mul(2),
        }
    }
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.small, self.big)
    }
}

/// A seated player and their state within the current hand.
#[derive(Clone, Debug)]
pub struct Player {
    pub user: User,
    pub chips: Chips,
    pub hole_cards: Vec<Card>,
    pub has_folded: bool,
    pub is_all_in: bool,
    pub committed_this_round: Chips,
    pub total_committed_this_hand: Chips,
    /// Whether the player has acted since the last full bet or raise.
    pub has_acted: bool,
}

impl Player {
    #[must_use]
    pub fn new(user: User, chips: Chips) -> Self {
        Self {
            user,
            chips,
            hole_cards: Vec::with_capacity(2),
            has_folded: false,
            is_all_in: false,
            committed_this_round: 0,
            total_committed_this_hand: 0,
            has_acted: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.user.id
    }

    /// Still contesting the pot.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.has_folded
    }

    /// Still able to put chips in.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.has_folded && !self.is_all_in
    }

    pub fn reset(&mut self) {
        self.hole_cards.clear();
        self.has_folded = false;
        self.is_all_in = false;
        self.committed_this_round = 0;
        self.total_committed_this_hand = 0;
        self.has_acted = false;
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Chips to put in. `None` uses the default bet.
    Bet(Option<Chips>),
    /// Chips to put in. `None` uses the default raise.
    Raise(Option<Chips>),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folds",
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Bet(Some(amount)) => &format!("bets {amount}"),
            Self::Bet(None) => "bets",
            Self::Raise(Some(amount)) => &format!("raises {amount}"),
            Self::Raise(None) => "raises",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum ActionParseError {
    #[error("empty message")]
    Empty,
    #[error("{0:?} is not an action")]
    UnknownVerb(String),
    #[error("{0:?} is not a chip amount")]
    BadAmount(String),
    #[error("unexpected text after the action")]
    TrailingText,
}

/// Parses `fold`, `check`, `call`, `bet [n]`, or `raise [n]` from a chat
/// message. Case and surrounding whitespace are ignored; anything else in the
/// message makes it malformed.
impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let mut words = lowered.split_whitespace();
        let verb = words.next().ok_or(ActionParseError::Empty)?;
        let amount = match words.next() {
            Some(word) => Some(
                word.parse::<Chips>()
                    .map_err(|_| ActionParseError::BadAmount(word.to_string()))?,
            ),
            None => None,
        };
        if words.next().is_some() {
            return Err(ActionParseError::TrailingText);
        }
        let action = match (verb, amount) {
            ("fold", None) => Self::Fold,
            ("check", None) => Self::Check,
            ("call", None) => Self::Call,
            ("bet", amount) => Self::Bet(amount),
            ("raise", amount) => Self::Raise(amount),
            ("fold" | "check" | "call", Some(_)) => return Err(ActionParseError::TrailingText),
            (other, _) => return Err(ActionParseError::UnknownVerb(other.to_string())),
        };
        Ok(action)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BetAction {
    Bet,
    Raise,
    Call,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bet {
    pub action: BetAction,
    pub amount: Chips,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let amount = self.amount;
        let repr = match self.action {
            BetAction::Bet => format!("bet of {amount}"),
            BetAction::Call => format!("call of {amount}"),
            BetAction::Raise => format!("raise of {amount}"),
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum ActionChoice {
    Fold,
    Check,
    Call(Chips),
    /// Minimum chips to put in for a bet.
    Bet(Chips),
    /// Minimum chips to put in for a raise.
    Raise(Chips),
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold".to_string(),
            Self::Check => "check".to_string(),
            Self::Call(amount) => format!("call ({amount})"),
            Self::Bet(amount) => format!("bet (>= {amount})"),
            Self::Raise(amount) => format!("raise (>= {amount})"),
        };
        write!(f, "{repr}")
    }
}

// Only the variant matters when checking whether an action is on offer.
// Amounts are validated by the pot manager.
impl Eq for ActionChoice {}

impl Hash for ActionChoice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
    }
}

impl PartialEq for ActionChoice {
    fn eq(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }
}

/// The choices offered to the acting player, in prompt order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionChoices(pub Vec<ActionChoice>);

impl ActionChoices {
    #[must_use]
    pub fn contains(&self, action: &Action) -> bool {
        let action_choice = match action {
            Action::Fold => ActionChoice::Fold,
            Action::Check => ActionChoice::Check,
            Action::Call => ActionChoice::Call(0),
            Action::Bet(_) => ActionChoice::Bet(0),
            Action::Raise(_) => ActionChoice::Raise(0),
        };
        self.0.contains(&action_choice)
    }
}

impl fmt::Display for ActionChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num_options = self.0.len();
        let repr = self
            .0
            .iter()
            .enumerate()
            .map(|(i, action_choice)| {
                let repr = action_choice.to_string();
                match i {
                    0 if num_options == 1 => repr,
                    0 if num_options == 2 => format!("{repr} "),
                    0 if num_options >= 3 => format!("{repr}, "),
                    i if i == num_options - 1 && num_options != 1 => format!("or {repr}"),
                    _ => format!("{repr}, "),
                }
            })
            .collect::<String>();
        write!(f, "{repr}")
    }
}

impl<I> From<I> for ActionChoices
where
    I: IntoIterator<Item = ActionChoice>,
{
    fn from(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Betting rounds within a hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    /// Number of board cards showing once this street's cards are out.
    #[must_use]
    pub fn board_len(&self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River => 5,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        };
        write!(f, "{repr}")
    }
}

/// Coarse game phase exposed to observers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    AwaitingStart,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    HandComplete,
    GameOver,
}

impl From<Street> for Phase {
    fn from(value: Street) -> Self {
        match value {
            Street::Preflop => Self::Preflop,
            Street::Flop => Self::Flop,
            Street::Turn => Self::Turn,
            Street::River => Self::River,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::AwaitingStart => "awaiting start",
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::HandComplete => "hand complete",
            Self::GameOver => "game over",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub chips: Chips,
    pub committed_this_round: Chips,
    pub has_folded: bool,
    pub is_all_in: bool,
}

impl From<&Player> for PlayerView {
    fn from(value: &Player) -> Self {
        Self {
            id: value.user.id.clone(),
            name: value.user.name.clone(),
            chips: value.chips,
            committed_this_round: value.committed_this_round,
            has_folded: value.has_folded,
            is_all_in: value.is_all_in,
        }
    }
}

/// Formats cards separated by spaces.
#[must_use]
pub fn cards_to_string(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
