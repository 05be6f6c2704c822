//! Chip conservation under random play.
//!
//! Random action sequences, legal or not, are thrown at a table. After every
//! step the chips behind plus the chips in the pots must equal what the
//! table started with, and the engine must never halt itself.

use chat_holdem::game::{
    GameSettings, PokerState, TableControl,
    entities::{Action, Chips, Phase, User},
};
use proptest::prelude::*;

// One scripted move: which verb, and how much for bets and raises.
fn move_strategy() -> impl Strategy<Value = (u8, Option<Chips>)> {
    (0u8..7, prop::option::of(1u32..600))
}

fn stacks_strategy() -> impl Strategy<Value = Vec<Chips>> {
    prop::collection::vec(1u32..500, 2..=6)
}

fn chips_in_play(state: &PokerState) -> Chips {
    state.players().iter().map(|p| p.chips).sum::<Chips>() + state.pot_manager().total_chips()
}

fn play(stacks: &[Chips], moves: &[(u8, Option<Chips>)], dealer_idx: usize) -> PokerState {
    let seats = stacks
        .iter()
        .enumerate()
        .map(|(i, chips)| (User::new(&format!("U{i}"), &format!("p{i}")), *chips))
        .collect();
    let total: Chips = stacks.iter().sum();
    let mut state = PokerState::with_stacks(seats, GameSettings::default(), dealer_idx)
        .unwrap()
        .advance();

    for (verb, amount) in moves {
        if state.is_game_over() {
            break;
        }
        if state.phase() == Phase::HandComplete {
            state = state.advance();
            continue;
        }
        if *verb == 6 {
            let token = state.turn_token();
            state.expire_turn(token);
        } else {
            let id = state.acting_player().unwrap().id().clone();
            let action = match verb {
                0 => Action::Fold,
                1 => Action::Check,
                2 | 3 => Action::Call,
                4 => Action::Bet(*amount),
                _ => Action::Raise(*amount),
            };
            // Illegal moves are rejected without touching anything.
            let _ = state.take_action(&id, &action);
        }
        state = state.advance();

        assert!(state.halted().is_none(), "{:?}", state.halted());
        assert_eq!(state.verify_chips(), Ok(()));
        assert_eq!(chips_in_play(&state), total);
    }
    state
}

proptest! {
    #[test]
    fn test_chips_are_conserved(
        stacks in stacks_strategy(),
        moves in prop::collection::vec(move_strategy(), 1..300),
        dealer_idx in 0usize..6,
    ) {
        let total: Chips = stacks.iter().sum();
        let state = play(&stacks, &moves, dealer_idx);
        prop_assert_eq!(chips_in_play(&state), total);
    }

    #[test]
    fn test_folded_players_are_never_eligible(
        stacks in stacks_strategy(),
        moves in prop::collection::vec(move_strategy(), 1..120),
    ) {
        let state = play(&stacks, &moves, 0);
        for pot in &state.pot_manager().pots {
            for id in &pot.eligible {
                let player = state.player(id);
                prop_assert!(player.is_some_and(|p| !p.has_folded));
            }
        }
    }

    #[test]
    fn test_all_in_players_never_hold_the_turn(
        stacks in stacks_strategy(),
        moves in prop::collection::vec(move_strategy(), 1..200),
    ) {
        let state = play(&stacks, &moves, 0);
        if let Some(player) = state.acting_player() {
            prop_assert!(!player.is_all_in);
            prop_assert!(!player.has_folded);
        }
    }

    #[test]
    fn test_current_bet_never_drops_within_a_round(
        stacks in stacks_strategy(),
        moves in prop::collection::vec(move_strategy(), 1..200),
    ) {
        let seats = stacks
            .iter()
            .enumerate()
            .map(|(i, chips)| (User::new(&format!("U{i}"), &format!("p{i}")), *chips))
            .collect();
        let mut state = PokerState::with_stacks(seats, GameSettings::default(), 0)
            .unwrap()
            .advance();

        for (verb, amount) in moves {
            let Some(player) = state.acting_player() else { break };
            let id = player.id().clone();
            let (phase, hand, bet) = (state.phase(), state.hand_number(), state.pot_manager().current_bet);
            let action = match verb {
                0 => Action::Fold,
                1 | 2 => Action::Call,
                3 => Action::Check,
                4 => Action::Bet(amount),
                _ => Action::Raise(amount),
            };
            let _ = state.take_action(&id, &action);
            state = state.advance();
            if state.phase() == phase && state.hand_number() == hand {
                prop_assert!(state.pot_manager().current_bet >= bet);
            }
        }
    }
}
