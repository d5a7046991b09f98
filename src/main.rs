use std::io::{self, BufRead};

use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};

use torpedo::{
    cli::{self, Input},
    config::{parse_fleet, DEFAULT_FLEET, DEFAULT_RELAY_ADDR},
    init_logging,
    relay::{self, RelayOutcome},
    transport::tcp::TcpTransport,
    ui::TerminalSink,
    Command, PlayerNode, RunOutcome,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair two players and relay one match between them.
    Relay {
        #[arg(long, default_value = DEFAULT_RELAY_ADDR)]
        bind: String,
    },
    /// Join a match through a relay.
    Play {
        #[arg(long, default_value = DEFAULT_RELAY_ADDR)]
        connect: String,
        #[arg(long, help = "Ship lengths to place, e.g. --fleet 5,4,3,3,2")]
        fleet: Option<String>,
        #[arg(long, help = "Place the whole fleet randomly on join")]
        auto_place: bool,
        #[arg(long, help = "Fix RNG seed for reproducible placement (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Relay { bind } => {
            println!("Relay listening on {}...", bind);
            match relay::serve_tcp(&bind).await? {
                RelayOutcome::Finished(winner) => println!("Player {} won.", winner),
                RelayOutcome::Disconnected(player) => {
                    println!("Player {} left before the match ended.", player)
                }
            }
        }
        Commands::Play {
            connect,
            fleet,
            auto_place,
            seed,
        } => {
            let fleet = match fleet {
                Some(text) => parse_fleet(&text)?,
                None => DEFAULT_FLEET.to_vec(),
            };
            let rng = match seed {
                Some(s) => SmallRng::seed_from_u64(s),
                None => {
                    let mut seed_rng = rand::rng();
                    SmallRng::from_rng(&mut seed_rng)
                }
            };
            println!("Connecting to relay at {}...", connect);
            let transport = Box::new(TcpTransport::connect(&connect).await?);
            let sink = Box::new(TerminalSink::new(&fleet));
            let mut node = PlayerNode::join(transport, &fleet, sink, rng).await?;
            println!("Connected as player {}.", node.session().player());

            let (commands_tx, mut commands_rx) = mpsc::channel(16);
            if auto_place {
                commands_tx.send(Command::AutoPlace).await?;
            }
            let (quit_tx, quit_rx) = oneshot::channel();
            spawn_input(commands_tx, quit_tx);
            let shutdown = async {
                // Closed stdin only ends local input; the match may still finish.
                if quit_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
            };

            let outcome = node.run(&mut commands_rx, shutdown).await?;
            match outcome {
                RunOutcome::Finished(winner) if winner == node.session().player() => {
                    println!("Victory!")
                }
                RunOutcome::Finished(winner) => println!("Defeat, player {} won.", winner),
                RunOutcome::Shutdown => println!("Left the game."),
                RunOutcome::Abandoned => println!("The relay ended the match early."),
            }
        }
    }
    Ok(())
}

/// Blocking stdin reads stay on their own thread, off the runtime.
fn spawn_input(commands: mpsc::Sender<Command>, quit: oneshot::Sender<()>) {
    std::thread::spawn(move || {
        println!("{}", cli::HELP);
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match cli::parse_line(&line) {
                Ok(Some(Input::Command(command))) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                Ok(Some(Input::Help)) => println!("{}", cli::HELP),
                Ok(Some(Input::Quit)) => {
                    let _ = quit.send(());
                    return;
                }
                Ok(None) => {}
                Err(e) => println!("{}", e),
            }
        }
    });
}
