/// Property-based tests for hand evaluation using proptest
///
/// These tests verify that the hand evaluation logic is correct
/// across a wide range of randomly generated card combinations.
use chat_holdem::game::{
    entities::{Card, Suit},
    functional::{HandStrength, Rank, argmax, eval, evaluate},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// Strategy to generate a valid card (values 2-14, aces are high)
fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0u8..=3).prop_map(|(value, suit_idx)| {
        let suit = match suit_idx {
            0 => Suit::Club,
            1 => Suit::Diamond,
            2 => Suit::Heart,
            _ => Suit::Spade,
        };
        Card(value, suit)
    })
}

// Strategy to generate a vec of unique cards (no duplicates)
fn unique_cards_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), min..=max).prop_filter("Cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

// Strategy to generate 7 unique cards (like Texas Hold'em: 2 hole + 5 board)
fn seven_card_hand_strategy() -> impl Strategy<Value = Vec<Card>> {
    unique_cards_strategy(7, 7)
}

// Every 5-card subset of `cards`
fn five_card_subsets(cards: &[Card]) -> Vec<Vec<Card>> {
    let n = cards.len();
    let mut subsets = Vec::new();
    for skip_a in 0..n {
        for skip_b in (skip_a + 1)..n {
            subsets.push(
                cards
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip_a && *i != skip_b)
                    .map(|(_, c)| *c)
                    .collect(),
            );
        }
    }
    subsets
}

fn parse(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

proptest! {
    #[test]
    fn test_eval_never_uses_more_than_five_values(cards in seven_card_hand_strategy()) {
        let hand = eval(&cards);
        prop_assert!(!hand.values.is_empty());
        prop_assert!(hand.values.len() <= 5, "eval() should describe at most 5 cards");
    }

    #[test]
    fn test_eval_deterministic(cards in seven_card_hand_strategy()) {
        // Same input should produce same output
        prop_assert_eq!(eval(&cards), eval(&cards), "eval() should be deterministic");
    }

    #[test]
    fn test_eval_ignores_card_order(cards in seven_card_hand_strategy()) {
        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(eval(&cards), eval(&reversed));
    }

    #[test]
    fn test_seven_cards_score_as_best_five(cards in seven_card_hand_strategy()) {
        let best_subset = five_card_subsets(&cards)
            .iter()
            .map(|subset| eval(subset))
            .max()
            .unwrap();
        prop_assert_eq!(eval(&cards), best_subset);
    }

    #[test]
    fn test_evaluate_splits_hole_and_board_freely(cards in seven_card_hand_strategy()) {
        let (hole, board) = cards.split_at(2);
        prop_assert_eq!(evaluate(hole, board), eval(&cards));
        prop_assert_eq!(evaluate(board, hole), eval(&cards));
    }

    #[test]
    fn test_more_cards_never_weaken_a_hand(cards in seven_card_hand_strategy()) {
        prop_assert!(eval(&cards) >= eval(&cards[..5]));
        prop_assert!(eval(&cards[..6]) >= eval(&cards[..5]));
    }

    #[test]
    fn test_argmax_returns_every_tied_hand(cards in seven_card_hand_strategy(), copies in 1usize..6) {
        let hand = eval(&cards);
        let hands: Vec<HandStrength> = std::iter::repeat_n(hand, copies).collect();
        prop_assert_eq!(argmax(&hands), (0..copies).collect::<Vec<_>>());
    }

    #[test]
    fn test_argmax_picks_the_stronger_hand(a in seven_card_hand_strategy(), b in seven_card_hand_strategy()) {
        let hands = [eval(&a), eval(&b)];
        let winners = argmax(&hands);
        match hands[0].cmp(&hands[1]) {
            std::cmp::Ordering::Greater => prop_assert_eq!(winners, vec![0]),
            std::cmp::Ordering::Less => prop_assert_eq!(winners, vec![1]),
            std::cmp::Ordering::Equal => prop_assert_eq!(winners, vec![0, 1]),
        }
    }
}

#[test]
fn test_category_ordering() {
    let ladder = [
        "2c 5d 9h Js Kc",
        "2c 2d 9h Js Kc",
        "2c 2d 9h 9s Kc",
        "2c 2d 2h Js Kc",
        "Ac 2d 3h 4s 5c",
        "2h 5h 9h Jh Kh",
        "2c 2d 2h Ks Kc",
        "2c 2d 2h 2s Kc",
        "9c Tc Jc Qc Kc",
    ];
    let hands: Vec<HandStrength> = ladder.iter().map(|s| eval(&parse(s))).collect();
    for pair in hands.windows(2) {
        assert!(pair[0] < pair[1], "{:?} should lose to {:?}", pair[0], pair[1]);
    }
    assert_eq!(hands[4].rank, Rank::Straight);
    assert_eq!(hands[4].values, vec![5]);
}

#[test]
fn test_board_plays_for_everyone() {
    let board = parse("Ts Js Qs Ks As");
    let a = evaluate(&parse("2c 3d"), &board);
    let b = evaluate(&parse("9s 8s"), &board);
    assert_eq!(a, b);
    assert_eq!(a.rank, Rank::StraightFlush);
    assert_eq!(argmax(&[a, b]), vec![0, 1]);
}

#[test]
fn test_kicker_breaks_pair_tie() {
    let board = parse("Kh Kd 7c 4s 2h");
    let ace_kicker = evaluate(&parse("Ac 9d"), &board);
    let queen_kicker = evaluate(&parse("Qc Jd"), &board);
    assert!(ace_kicker > queen_kicker);
}
