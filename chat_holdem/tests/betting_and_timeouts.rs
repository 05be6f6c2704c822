//! Betting rules and turn timeouts, driven through the state machine.

use chat_holdem::game::{
    GameSettings, PokerState, UserError,
    entities::{Action, Bet, BetAction, Chips, Phase, PlayerId, User},
};

fn table(n: usize, stash: Chips) -> PokerState {
    let users = (1..=n)
        .map(|i| User::new(&format!("U{i}"), &format!("player {i}")))
        .collect();
    PokerState::new(users, stash, GameSettings::default(), 0)
        .unwrap()
        .advance()
}

fn act(state: &mut PokerState, id: &str, text: &str) -> Action {
    let action: Action = text.parse().unwrap();
    let applied = state
        .take_action(&PlayerId::new(id), &action)
        .unwrap_or_else(|e| panic!("{id} {text}: {e}"));
    *state = std::mem::take(state).advance();
    applied
}

fn try_act(state: &mut PokerState, id: &str, text: &str) -> Result<Action, UserError> {
    let action: Action = text.parse().unwrap();
    state.take_action(&PlayerId::new(id), &action)
}

fn time_out(state: &mut PokerState) -> Option<Action> {
    let token = state.turn_token();
    let applied = state.expire_turn(token);
    *state = std::mem::take(state).advance();
    applied
}

fn acting(state: &PokerState) -> String {
    state.acting_player().unwrap().id().to_string()
}

#[test]
fn test_default_bets_and_raises() {
    let mut state = table(5, 400);

    act(&mut state, "U4", "raise");
    assert_eq!(state.pot_manager().current_bet, 16);
    assert_eq!(state.pot_manager().total_chips(), 28);

    act(&mut state, "U5", "raise");
    assert_eq!(state.pot_manager().current_bet, 32);
    assert_eq!(state.pot_manager().total_chips(), 60);

    act(&mut state, "U1", "raise");
    assert_eq!(state.pot_manager().current_bet, 64);
    assert_eq!(state.pot_manager().total_chips(), 124);

    act(&mut state, "U2", "fold");
    act(&mut state, "U3", "fold");

    act(&mut state, "U4", "call");
    assert_eq!(state.pot_manager().current_bet, 64);
    assert_eq!(state.pot_manager().total_chips(), 172);

    act(&mut state, "U5", "call");
    assert_eq!(state.phase(), Phase::Flop);
    assert_eq!(state.pot_manager().current_bet, 0);
    assert_eq!(state.pot_manager().total_chips(), 204);

    assert_eq!(acting(&state), "U4");
    assert_eq!(act(&mut state, "U4", "bet"), Action::Bet(Some(4)));
    assert_eq!(state.pot_manager().current_bet, 4);
    assert_eq!(state.pot_manager().total_chips(), 208);
}

#[test]
fn test_chat_verbs_are_forgiving() {
    let mut state = table(3, 400);

    // Bet into the big blind reads as a raise.
    assert_eq!(act(&mut state, "U1", "  BET 16 "), Action::Raise(Some(16)));
    act(&mut state, "U2", "Call");
    act(&mut state, "U3", "call");
    assert_eq!(state.phase(), Phase::Flop);

    // Call with nothing owed reads as a check, raise with no bet as a bet.
    assert_eq!(act(&mut state, "U2", "call"), Action::Check);
    assert_eq!(act(&mut state, "U3", "raise 10"), Action::Bet(Some(10)));
}

#[test]
fn test_illegal_actions_change_nothing() {
    let mut state = table(3, 400);
    let before = state.pot_manager().total_chips();

    assert_eq!(
        try_act(&mut state, "U2", "call"),
        Err(UserError::OutOfTurnAction)
    );
    assert_eq!(
        try_act(&mut state, "U1", "check"),
        Err(UserError::CannotCheck { call: 8 })
    );
    // A raise to 12 is short of the minimum raise to 16.
    assert_eq!(
        try_act(&mut state, "U1", "raise 12"),
        Err(UserError::InvalidBet {
            bet: Bet {
                action: BetAction::Raise,
                amount: 12
            },
            min: 16
        })
    );
    assert_eq!(
        try_act(&mut state, "nobody", "fold"),
        Err(UserError::UserDoesNotExist)
    );

    assert_eq!(acting(&state), "U1");
    assert_eq!(state.pot_manager().total_chips(), before);
    assert_eq!(state.player(&PlayerId::new("U1")).unwrap().chips, 400);
}

#[test]
fn test_minimum_opening_bet_is_the_small_blind() {
    let mut state = table(2, 400);
    act(&mut state, "U1", "call");
    act(&mut state, "U2", "check");

    assert!(matches!(
        try_act(&mut state, "U2", "bet 3"),
        Err(UserError::InvalidBet { min: 4, .. })
    ));
    assert_eq!(act(&mut state, "U2", "bet 4"), Action::Bet(Some(4)));
}

#[test]
fn test_oversized_bets_are_clamped_to_the_stack() {
    let mut state = table(3, 100);
    assert_eq!(act(&mut state, "U1", "raise 5000"), Action::Raise(Some(100)));
    let u1 = state.player(&PlayerId::new("U1")).unwrap();
    assert!(u1.is_all_in);
    assert_eq!(u1.chips, 0);
    assert_eq!(state.pot_manager().current_bet, 100);
}

#[test]
fn test_all_in_player_is_never_asked_to_act() {
    let mut state = table(3, 100);
    act(&mut state, "U1", "raise 100");
    act(&mut state, "U2", "call");
    act(&mut state, "U3", "fold");

    // Both live players are all-in, so the board runs out on its own.
    assert_eq!(state.phase(), Phase::HandComplete);
    assert_eq!(state.board().len(), 5);
    assert!(state.acting_player().is_none());
}

#[test]
fn test_timeout_folds_a_player_facing_a_bet() {
    let mut state = table(3, 400);
    act(&mut state, "U1", "raise 400");
    assert_eq!(state.pot_manager().current_bet, 400);

    let u2 = state.player(&PlayerId::new("U2")).unwrap();
    assert_eq!(u2.committed_this_round, 4);
    assert_eq!(time_out(&mut state), Some(Action::Fold));
    assert!(state.player(&PlayerId::new("U2")).unwrap().has_folded);
    assert_eq!(acting(&state), "U3");
}

#[test]
fn test_timeout_folds_on_a_fresh_street_bet() {
    let mut state = table(3, 1000);
    act(&mut state, "U1", "call");
    act(&mut state, "U2", "call");
    act(&mut state, "U3", "check");

    // Nothing committed this round against a 400 bet.
    act(&mut state, "U2", "bet 400");
    let u3 = state.player(&PlayerId::new("U3")).unwrap();
    assert_eq!(u3.committed_this_round, 0);
    assert_eq!(state.pot_manager().current_bet, 400);
    assert_eq!(time_out(&mut state), Some(Action::Fold));
}

#[test]
fn test_timeout_checks_for_the_big_blind_option() {
    let mut state = table(3, 400);
    act(&mut state, "U1", "call");
    act(&mut state, "U2", "call");
    assert_eq!(acting(&state), "U3");

    assert_eq!(time_out(&mut state), Some(Action::Check));
    assert_eq!(state.phase(), Phase::Flop);
    assert!(!state.player(&PlayerId::new("U3")).unwrap().has_folded);
}

#[test]
fn test_stale_timeout_after_an_action_is_ignored() {
    let mut state = table(3, 400);
    let stale = state.turn_token();
    act(&mut state, "U1", "call");

    assert_eq!(state.expire_turn(stale), None);
    assert_eq!(acting(&state), "U2");
    assert!(!state.player(&PlayerId::new("U2")).unwrap().has_folded);
}

#[test]
fn test_each_turn_gets_a_new_token() {
    let mut state = table(3, 400);
    let first = state.turn_token();
    act(&mut state, "U1", "call");
    let second = state.turn_token();
    act(&mut state, "U2", "call");
    assert!(first < second);
    assert!(second < state.turn_token());
}

#[test]
fn test_short_big_blind_is_forced_all_in() {
    let users = vec![
        User::new("U1", "player 1"),
        User::new("U2", "player 2"),
        User::new("U3", "player 3"),
    ];
    let seats = users.into_iter().zip([400, 400, 5]).collect();
    let state = PokerState::with_stacks(seats, GameSettings::default(), 0)
        .unwrap()
        .advance();

    let u3 = state.player(&PlayerId::new("U3")).unwrap();
    assert!(u3.is_all_in);
    assert_eq!(u3.committed_this_round, 5);
    // The bet to call is still the full big blind.
    assert_eq!(state.pot_manager().current_bet, 8);
    assert_eq!(state.pot_manager().total_chips(), 9);
}
