//! Gesture Relay CLI
//!
//! Bridges a body-tracking pipeline to a remote controller: detected discrete
//! gestures become HTTP GET commands.

use clap::{Parser, Subcommand};
use gesture_relay::{
    config::Config,
    controller::{BlockingControllerClient, CommandRelay, ControllerConfig},
    dispatch::GestureDispatcher,
    pipeline::ReplaySource,
    relaylog::{create_shared_log_with_persistence, RelayLog},
    VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gesture-relay")]
#[command(version = VERSION)]
#[command(about = "Gesture-to-command relay for body-tracking pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay against a recorded pipeline script
    Run {
        /// Path to a JSONL replay script of pipeline events
        #[arg(long)]
        replay: PathBuf,

        /// Path to the configuration file (defaults to the standard location)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the controller base URL from the configuration
        #[arg(long)]
        controller: Option<String>,

        /// Disable the post-fire pause (cross-gesture throttle)
        #[arg(long)]
        no_pause: bool,
    },

    /// Probe the remote controller's base URL
    Check {
        /// Controller base URL (defaults to the configured one)
        #[arg(long)]
        controller: Option<String>,
    },

    /// Show relay statistics from previous sessions
    Status {
        /// Reset the persisted statistics
        #[arg(long)]
        reset: bool,
    },

    /// Show configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            replay,
            config,
            controller,
            no_pause,
        } => {
            cmd_run(&replay, config, controller, no_pause);
        }
        Commands::Check { controller } => {
            cmd_check(controller);
        }
        Commands::Status { reset } => {
            cmd_status(reset);
        }
        Commands::Config { init } => {
            cmd_config(init);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Config {
    let result = match path {
        Some(p) => Config::load_from(&p),
        None => Config::load(),
    };
    match result {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(
    replay: &Path,
    config_path: Option<PathBuf>,
    controller_override: Option<String>,
    no_pause: bool,
) {
    println!("Gesture Relay v{VERSION}");
    println!();

    let mut config = load_config(config_path);
    if let Some(url) = controller_override {
        config.controller_url = url;
    }
    if no_pause {
        config.pause_after_fire = None;
    }

    // Duplicate action bindings are a configuration error, fatal at startup.
    let table = match config.build_action_table() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("Controller: {}", config.controller_url);
    println!("Actions: {} configured", table.len());
    for entry in table.iter() {
        println!(
            "  {} -> {} (cooldown {:.1}s)",
            entry.gesture_id,
            entry.endpoint,
            entry.cooldown.as_secs_f64()
        );
    }
    match config.pause_after_fire {
        Some(delay) => println!("Post-fire pause: {:.1}s", delay.as_secs_f64()),
        None => println!("Post-fire pause: disabled"),
    }
    println!();

    // Set up relay accounting
    let log = create_shared_log_with_persistence(config.data_path.join("relay_stats.json"));

    // Spawn the HTTP relay worker
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let client = match BlockingControllerClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating HTTP client: {e}");
            std::process::exit(1);
        }
    };
    let relay = CommandRelay::spawn(client, command_rx, log.clone());

    // Load and start the replay source
    let mut source = match ReplaySource::from_path(replay) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error loading replay script: {e}");
            std::process::exit(1);
        }
    };
    println!("Replaying {} pipeline events from {:?}", source.len(), replay);
    println!("Press Ctrl+C to stop");
    println!();

    if let Err(e) = source.start() {
        eprintln!("Error starting replay: {e}");
        std::process::exit(1);
    }

    let (status_tx, status_rx) = crossbeam_channel::unbounded();
    let mut dispatcher =
        GestureDispatcher::new(table, config.pause_after_fire, command_tx, log.clone())
            .with_status_sender(status_tx);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // Main event loop
    let receiver = source.receiver().clone();
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                dispatcher.handle_event(event);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if !source.is_running() && receiver.is_empty() {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                eprintln!("Pipeline source disconnected unexpectedly");
                break;
            }
        }

        // Surface result-view updates
        for status in status_rx.try_iter() {
            println!(
                "[status] tracked: {}, detected: {}, confidence: {:.2}",
                status.tracked, status.detected, status.confidence
            );
        }
    }

    println!();
    println!("Stopping relay...");
    source.stop();

    // Dropping the dispatcher closes the command channel; the relay worker
    // drains what is already queued and exits.
    drop(dispatcher);
    relay.join();

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save relay stats: {e}");
    }

    println!();
    println!("{}", log.summary());
}

fn cmd_check(controller_override: Option<String>) {
    let config = load_config(None);
    let base_url = controller_override.unwrap_or(config.controller_url);
    let controller = ControllerConfig::new(base_url);

    println!("Probing controller at {} ...", controller.base_url);

    let client = match BlockingControllerClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating HTTP client: {e}");
            std::process::exit(1);
        }
    };

    match client.probe(&controller) {
        Ok(body) => {
            println!("Controller reachable.");
            if !body.trim().is_empty() {
                println!("Response: {}", body.trim());
            }
        }
        Err(e) => {
            eprintln!("Controller unreachable: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_status(reset: bool) {
    let config = load_config(None);

    println!("Gesture Relay Status");
    println!("====================");
    println!();
    println!("Controller: {}", config.controller_url);
    println!("Configured actions: {}", config.actions.len());
    println!();

    let stats_path = config.data_path.join("relay_stats.json");
    if stats_path.exists() {
        let log = RelayLog::with_persistence(stats_path);
        if reset {
            log.reset();
            if let Err(e) = log.save() {
                eprintln!("Error saving relay stats: {e}");
                std::process::exit(1);
            }
            println!("Relay statistics reset.");
        } else {
            println!("{}", log.summary());
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config(init: bool) {
    let config = load_config(None);

    if init {
        let config_path = Config::config_path();
        if config_path.exists() {
            println!("Config file already exists: {config_path:?}");
        } else if let Err(e) = config.save() {
            eprintln!("Error writing config file: {e}");
            std::process::exit(1);
        } else {
            println!("Wrote default configuration to {config_path:?}");
        }
        return;
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
