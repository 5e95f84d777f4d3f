//! A pretend game server on stdin, for poking at Warden by hand.
//!
//! ```text
//! join <name> [x y z]      player connects (default position 0 64 0)
//! leave <name>             player quits
//! move <name> <x> <y> <z>  player walks somewhere
//! as <name> <command...>   player types a command
//! op <name> <command...>   operator types a command
//! console <command...>     server console types a command
//! who                      list connected players
//! quit
//! ```
//!
//! Store files go to `./config` unless `WARDEN_DATA_DIR` says otherwise.
//! Log verbosity follows `RUST_LOG`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use warden::prelude::*;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Players live in a plain list; every effect Warden asks for is printed.
#[derive(Default)]
struct ConsoleHost {
    players: Mutex<Vec<OnlinePlayer>>,
}

impl ConsoleHost {
    fn connect(&self, player: OnlinePlayer) {
        let mut players = self.players.lock();
        players.retain(|p| !p.name.eq_ignore_ascii_case(&player.name));
        players.push(player);
    }

    fn remove(&self, name: &str) -> bool {
        let mut players = self.players.lock();
        let before = players.len();
        players.retain(|p| !p.name.eq_ignore_ascii_case(name));
        players.len() != before
    }

    fn set_position(&self, name: &str, position: Position) -> bool {
        match self
            .players
            .lock()
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            Some(p) => {
                p.position = position;
                true
            }
            None => false,
        }
    }
}

impl PlayerHost for ConsoleHost {
    fn online_players(&self) -> Vec<OnlinePlayer> {
        self.players.lock().clone()
    }

    fn set_velocity_zero(&self, _name: &str) {}

    fn teleport(&self, name: &str, position: Position, _orientation: Orientation) {
        if self.set_position(name, position) {
            println!("[host] {name} pulled back to {:.1} {:.1} {:.1}", position.x, position.y, position.z);
        }
    }

    fn set_play_mode(&self, name: &str, mode: PlayMode) {
        println!("[host] {name} is now in {mode:?} mode");
    }

    fn disconnect(&self, name: &str, message: &str) {
        if self.remove(name) {
            println!("[host] {name} disconnected: {message}");
        }
    }

    fn send_message(&self, name: &str, message: &str) {
        println!("[to {name}] {message}");
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn parse_position(args: &[&str]) -> Option<Position> {
    match args {
        [x, y, z] => Some(Position::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?)),
        _ => None,
    }
}

/// Routes a player-typed command the way a real server would: gate
/// first, then Warden's own commands, then "the game".
fn player_command(warden: &Warden<ConsoleHost>, source: CommandSource, raw: &str) {
    let Some(name) = source.player_name() else {
        return;
    };
    if !warden
        .host()
        .online_players()
        .iter()
        .any(|p| p.name.eq_ignore_ascii_case(name))
    {
        println!("{name} is not connected");
        return;
    }
    if warden.on_command_attempt(name, raw).is_blocked() {
        println!("[host] blocked '{raw}' from {name}");
        return;
    }
    match warden.execute(&source, raw) {
        Some(reply) => println!("[to {name}] {reply}"),
        None => println!("[host] {name} ran '{raw}'"),
    }
}

/// Handles one input line. Returns `false` to quit.
fn handle_line(warden: &Warden<ConsoleHost>, line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    let rest_after = |n: usize| -> String { words.get(n..).unwrap_or_default().join(" ") };

    match words.as_slice() {
        [] => {}
        ["quit"] | ["exit"] => return false,
        ["who"] => {
            for p in warden.host().online_players() {
                let authed = IdentityKey::from_name(&p.name)
                    .is_some_and(|k| warden.sessions().is_authenticated(&k));
                println!("  {} ({})", p.name, if authed { "authenticated" } else { "pending" });
            }
        }
        ["join", name, pos @ ..] => {
            let position = parse_position(pos).unwrap_or(Position::new(0.0, 64.0, 0.0));
            let player = OnlinePlayer::new(*name, position, Orientation::default());
            warden.host().connect(player.clone());
            warden.on_join(&player);
        }
        ["leave", name] => {
            warden.host().remove(name);
            warden.on_disconnect(name);
        }
        ["move", name, pos @ ..] => match parse_position(pos) {
            Some(position) => {
                if !warden.host().set_position(name, position) {
                    println!("{name} is not connected");
                }
            }
            None => println!("usage: move <name> <x> <y> <z>"),
        },
        ["as", name, _, ..] => player_command(warden, CommandSource::player(*name), &rest_after(2)),
        ["op", name, _, ..] => player_command(warden, CommandSource::operator(*name), &rest_after(2)),
        ["console", _, ..] => {
            let raw = rest_after(1);
            match warden.execute(&CommandSource::Console, &raw) {
                Some(reply) => println!("[console] {reply}"),
                None => println!("[console] ran '{raw}'"),
            }
        }
        _ => println!("unknown input: {line}"),
    }
    true
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("WARDEN_DATA_DIR").unwrap_or_else(|_| "config".to_string());
    let warden = Arc::new(
        WardenBuilder::new()
            .data_dir(data_dir)
            .build(ConsoleHost::default())?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let heartbeat = Heartbeat::new(warden.config().tick_rate_hz);
    let driver = tokio::spawn(drive(Arc::clone(&warden), heartbeat, shutdown_rx));

    info!("console host ready, type 'quit' to stop");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_line(&warden, line.trim()) {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    shutdown_tx.send(true)?;
    driver.await?;
    Ok(())
}
