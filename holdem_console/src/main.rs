//! Terminal front end for a single chat Hold'em table.
//!
//! Every line on stdin is a chat message: `<player id> <text>`, e.g.
//! `U1 raise 40`. Lines starting with `/` are operator commands.

use std::path::PathBuf;

use anyhow::{Context, Error, bail};
use chat_holdem::{
    game::{
        Recipient,
        entities::{PlayerId, User},
        pot::HandOutcome,
    },
    table::{Notifier, TableActor, TableConfig, TableHandle, TableResponse},
};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

const HELP: &str = "\
Play a chat Hold'em table from the terminal

USAGE:
  holdem_console [OPTIONS] <ID:NAME>...

OPTIONS:
  --config     PATH        JSON table config (name, timeout, maxplayers,
                           smallblind, initialstash, bots)
  --timeout    SECONDS     Seconds each player gets to act, 0 to disable
  --dealer     SEAT        Seat index of the first button  [default: 0]

FLAGS:
  --bots                   Seat the scripted opponents as well
  -h, --help               Print help information

ENVIRONMENT:
  HOLDEM_CONFIG            Same as --config
  RUST_LOG                 Log filter, e.g. debug

INPUT:
  <player id> <message>    Chat as that player, e.g. `U1 call`
  /status                  Print the table state as JSON
  /blinds                  Double the blinds from the next hand
  /quit                    End the game after this hand
";

struct Args {
    config: Option<PathBuf>,
    timeout: Option<u64>,
    dealer: usize,
    bots: bool,
    players: Vec<User>,
}

/// Prints announcements, marking private ones with their recipient.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, recipient: &Recipient, text: &str) {
        match recipient {
            Recipient::Table => println!("{text}"),
            Recipient::Player(id) => println!("  (to {id}) {text}"),
        }
    }
}

fn parse_player(arg: &str) -> Result<User, Error> {
    match arg.split_once(':') {
        Some((id, name)) if !id.is_empty() && !name.is_empty() => Ok(User::new(id, name)),
        _ => bail!("expected ID:NAME, got '{arg}'"),
    }
}

fn load_config(args: &Args) -> Result<TableConfig, Error> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => TableConfig::default(),
    };
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    config.bots |= args.bots;
    config.validate().map_err(Error::msg)?;
    Ok(config)
}

fn summarize(hand: usize, outcome: &HandOutcome) {
    for (pot, result) in outcome.pots.iter().enumerate() {
        let winners = result
            .winners
            .iter()
            .map(|w| format!("{} (+{}, {} left)", w.name, w.amount, w.chips))
            .collect::<Vec<_>>()
            .join(", ");
        info!("hand {hand} pot {pot}: {} chips to {winners}", result.amount);
    }
}

async fn handle_line(handle: &TableHandle, line: &str) -> Result<(), Error> {
    let line = line.trim();
    match line {
        "" => {}
        "/status" => {
            let snapshot = handle.snapshot().await.map_err(Error::msg)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        "/blinds" => {
            let blinds = handle.increase_blinds().await.map_err(Error::msg)?;
            info!("blinds go to {blinds} next hand");
        }
        "/quit" => {
            let response = handle.quit().await.map_err(Error::msg)?;
            if let Some(message) = response.error_message() {
                println!("{message}");
            }
        }
        _ => {
            let Some((id, text)) = line.split_once(char::is_whitespace) else {
                println!("expected `<player id> <message>`");
                return Ok(());
            };
            let response = handle
                .player_message(&PlayerId::new(id), text)
                .await
                .map_err(Error::msg)?;
            match response {
                TableResponse::NotYourTurn | TableResponse::GameOver => {
                    if let Some(message) = response.error_message() {
                        println!("  (to {id}) {message}");
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let mut args = Args {
        config: pargs
            .opt_value_from_str("--config")?
            .or_else(|| std::env::var("HOLDEM_CONFIG").ok().map(PathBuf::from)),
        timeout: pargs.opt_value_from_str("--timeout")?,
        dealer: pargs.opt_value_from_str("--dealer")?.unwrap_or(0),
        bots: pargs.contains("--bots"),
        players: Vec::new(),
    };
    for arg in pargs.finish() {
        let arg = arg.to_string_lossy();
        args.players.push(parse_player(&arg)?);
    }

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = load_config(&args)?;
    info!(
        "Opening '{}' with blinds {} and {} chips each",
        config.name,
        config.blinds(),
        config.initial_stash
    );

    let (actor, handle) = TableActor::new(config);
    tokio::spawn(actor.with_notifier(ConsoleNotifier).run());

    let mut outcomes = handle
        .start(args.players, args.dealer)
        .await
        .map_err(Error::msg)?;

    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        let mut hands = 0;
        while let Some(outcome) = outcomes.recv().await {
            hands += 1;
            summarize(hands, &outcome);
        }
        info!("Game over after {hands} hand(s)");
        let _ = done_tx.send(()).await;
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => handle_line(&handle, &line).await?,
                None => break,
            },
            _ = done_rx.recv() => break,
        }
    }

    info!("Shutting down...");
    Ok(())
}
