use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use chat_holdem::game::{
    GameSettings, GameStateManagement, PokerState,
    entities::{Action, Card, Suit, User},
    functional::{argmax, eval, evaluate},
};

/// Helper to create a game waiting on the first preflop action
fn setup_game_with_players(n_players: usize) -> PokerState {
    let users = (0..n_players)
        .map(|i| User::new(&format!("U{i}"), &format!("player{i}")))
        .collect();
    PokerState::new(users, 1000, GameSettings::default(), 0)
        .expect("table has room")
        .advance()
}

/// Check or call until the hand is over.
fn play_passive_hand(mut game: PokerState) -> PokerState {
    while let Some(player) = game.acting_player() {
        let id = player.id().clone();
        let owes = game
            .action_choices()
            .is_some_and(|choices| choices.contains(&Action::Call));
        let action = if owes { Action::Call } else { Action::Check };
        game.take_action(&id, &action).expect("passive action is legal");
        game = game.advance();
    }
    game
}

/// Benchmark hand evaluation with 2 cards (pocket cards)
fn bench_hand_eval_2_cards(c: &mut Criterion) {
    let cards = vec![Card(14, Suit::Spade), Card(13, Suit::Spade)];

    c.bench_function("hand_eval_2_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark hand evaluation with 7 cards (full hand + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let hole = vec![Card(14, Suit::Spade), Card(13, Suit::Spade)];
    let board = vec![
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| evaluate(&hole, &board));
    });
}

/// Benchmark hand evaluation 100 times with random-ish hands
fn bench_hand_eval_100_iterations(c: &mut Criterion) {
    let suits = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];
    let all_hands: Vec<Vec<Card>> = (0..100u8)
        .map(|i| {
            (0..7u8)
                .map(|j| Card(2 + (i + j * 3) % 13, suits[usize::from(i + j) % 4]))
                .collect()
        })
        .collect();

    c.bench_function("hand_eval_100_iterations", |b| {
        b.iter(|| {
            all_hands
                .iter()
                .map(|cards| eval(cards))
                .collect::<Vec<_>>()
        });
    });
}

/// Benchmark hand comparison (argmax) with multiple hands
fn bench_hand_comparison(c: &mut Criterion) {
    let board = [
        Card(9, Suit::Diamond),
        Card(5, Suit::Heart),
        Card(2, Suit::Club),
    ];
    let hands: Vec<_> = [
        [Card(3, Suit::Club), Card(7, Suit::Heart)],
        [Card(2, Suit::Heart), Card(8, Suit::Spade)],
        [Card(9, Suit::Club), Card(2, Suit::Spade)],
        [Card(2, Suit::Diamond), Card(2, Suit::Heart)],
    ]
    .iter()
    .map(|hole| evaluate(hole, &board))
    .collect();

    c.bench_function("hand_comparison_4_hands", |b| {
        b.iter(|| argmax(&hands));
    });
}

/// Benchmark a whole checked-down hand with different player counts
fn bench_passive_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("passive_hand");

    for n_players in [2, 6, 10, 23].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || setup_game_with_players(n),
                    play_passive_hand,
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark event draining (common operation)
fn bench_drain_events(c: &mut Criterion) {
    c.bench_function("drain_events", |b| {
        b.iter_batched(
            || setup_game_with_players(5),
            |mut g| {
                g.drain_events();
                g
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    hand_evaluation,
    bench_hand_eval_2_cards,
    bench_hand_eval_7_cards,
    bench_hand_eval_100_iterations,
    bench_hand_comparison,
);

criterion_group!(game_operations, bench_passive_hand, bench_drain_events);

criterion_main!(hand_evaluation, game_operations);
