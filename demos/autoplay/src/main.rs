use std::time::Duration;

use clap::Parser;
use nightwatch::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "autoplay")]
#[command(about = "Play a game of Nightwatch against AI seats in the terminal")]
struct Args {
    /// Seats at the table, human included (5-100)
    #[arg(long, default_value_t = 8)]
    players: usize,

    /// Role for the human seat, or "random"
    #[arg(long, default_value_t = RoleChoice::Random)]
    role: RoleChoice,

    /// Seed for a replayable game
    #[arg(long)]
    seed: Option<u64>,

    /// Your display name
    #[arg(long, default_value = "You")]
    name: String,

    /// Let the AI play your seat too
    #[arg(long)]
    autopilot: bool,

    /// Short phase delays
    #[arg(long)]
    fast: bool,

    /// Interactive phase timeout in seconds (0 disables it)
    #[arg(long, default_value_t = 90)]
    timeout: u64,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn table_config(&self) -> TableConfig {
        let mut timings = if self.fast {
            PhaseTimings::fast()
        } else {
            PhaseTimings::default()
        };
        timings.action_timeout = match self.timeout {
            0 => None,
            secs if self.fast => Some(Duration::from_secs(secs).min(Duration::from_secs(2))),
            secs => Some(Duration::from_secs(secs)),
        };
        TableConfig {
            timings,
            seed: self.seed,
            autopilot: self.autopilot,
            ..TableConfig::default()
        }
    }

    fn game_config(&self) -> GameConfig {
        GameConfig {
            human_name: self.name.clone(),
            ..GameConfig::new(self.players, self.role)
        }
    }

    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

// ---------------------------------------------------------------------------
// Player input
// ---------------------------------------------------------------------------

/// One line typed by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Vote(PlayerId),
    Night(NightActionKind, PlayerId),
    Advance,
    Autopilot,
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("type `help` for commands".into());
    };
    let target = |word: Option<&str>| -> Result<PlayerId, String> {
        let word = word.ok_or_else(|| format!("`{verb}` needs a seat number"))?;
        word.trim_start_matches('#')
            .parse::<u64>()
            .map(PlayerId)
            .map_err(|_| format!("`{word}` is not a seat number"))
    };

    let input = match verb.to_ascii_lowercase().as_str() {
        "vote" | "v" => Input::Vote(target(words.next())?),
        "advance" | "next" | "n" => Input::Advance,
        "auto" | "autopilot" => Input::Autopilot,
        "status" | "s" => Input::Status,
        "help" | "h" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => match other.parse::<NightActionKind>() {
            Ok(kind) => Input::Night(kind, target(words.next())?),
            Err(_) => return Err(format!("unknown command `{verb}`")),
        },
    };
    Ok(input)
}

const HELP: &str = "\
commands:
  vote <seat>       vote during the day
  protect <seat>    protector night action
  check <seat>      investigator night action
  disgust <seat>    saboteur night action
  advance           skip the wait in a non-interactive phase
  auto              toggle autopilot for your seat
  status            show the table
  quit";

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_status(state: &GameState) -> String {
    let mut out = format!("Day {} | {}\n", state.current_day, state.current_phase);
    for player in &state.players {
        let you = if player.id == state.human_player_id {
            format!(" ({})", player.role)
        } else {
            String::new()
        };
        let status = if player.is_alive { "alive" } else { "dead" };
        out.push_str(&format!(
            "  #{} {}{} - {}\n",
            player.id.0, player.name, you, status
        ));
    }
    match state.current_phase {
        Phase::DayVoting => out.push_str(&format!("  votes: {}\n", state.vote_progress())),
        Phase::NightAction => {
            out.push_str(&format!("  actions: {}\n", state.night_action_progress()));
        }
        _ => {}
    }
    out
}

/// What the human is expected to type now, if anything.
fn prompt(state: &GameState) -> Option<String> {
    if !state.can_act() {
        return None;
    }
    let human = state.human_player()?;
    let verb = match state.current_phase {
        Phase::DayVoting => "vote".to_string(),
        _ => human.role.night_action()?.to_string(),
    };
    let targets: Vec<String> = state
        .alive_players()
        .filter(|p| p.id != human.id || verb == "protect")
        .map(|p| format!("#{} {}", p.id.0, p.name))
        .collect();
    Some(format!("> {verb} <seat>   [{}]", targets.join(", ")))
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

async fn handle_input(
    game: &GameHandle,
    input: Input,
    autopilot: &mut bool,
) -> Result<bool, NightwatchError> {
    let human = game.snapshot().await?.human_player_id;
    match input {
        Input::Vote(target) => game.submit_vote(human, target).await?,
        Input::Night(kind, target) => game.submit_night_action(human, target, kind).await?,
        Input::Advance => {
            let phase = game.advance_phase().await?;
            println!("-> {phase}");
        }
        Input::Autopilot => {
            *autopilot = !*autopilot;
            game.set_autopilot(*autopilot).await?;
            println!("autopilot {}", if *autopilot { "on" } else { "off" });
        }
        Input::Status => print!("{}", render_status(&game.snapshot().await?)),
        Input::Help => println!("{HELP}"),
        Input::Quit => return Ok(false),
    }
    Ok(true)
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<(), NightwatchError> {
    let args = Args::parse();
    nightwatch::init_tracing(args.log_filter());

    eprintln!(
        "starting nightwatch: {} players, role {}{}",
        args.players,
        args.role,
        if args.autopilot { ", autopilot" } else { "" }
    );

    let mut tables = TableManager::new();
    let game = tables.create_game(args.table_config());
    let mut updates = game.subscribe().await?;
    game.start(args.game_config()).await?;

    let mut autopilot = args.autopilot;
    let mut stdin = spawn_stdin_reader();
    let mut stdin_open = true;
    println!("type `help` for commands");

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                match update {
                    TableUpdate::Narration(entry) => println!("[day {}] {}", entry.day, entry.text),
                    TableUpdate::PhaseChanged { .. } => {
                        if let Some(line) = prompt(&game.snapshot().await?) {
                            println!("{line}");
                        }
                    }
                    TableUpdate::GameOver { winner, reason } => {
                        println!("*** {winner} wins: {reason} ***");
                        break;
                    }
                }
            }
            line = stdin.recv(), if stdin_open => {
                let Some(line) = line else {
                    tracing::debug!("stdin closed, only the timers drive the game now");
                    stdin_open = false;
                    continue;
                };
                match parse_input(&line) {
                    Ok(input) => match handle_input(&game, input, &mut autopilot).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(err) => println!("! {err}"),
                    },
                    Err(message) => println!("! {message}"),
                }
            }
        }
    }

    print!("{}", render_status(&game.snapshot().await?));
    tables.destroy_game(game.game_id()).await?;
    Ok(())
}
