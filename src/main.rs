use anyhow::{Context, Result};
use clap::Parser;
use console::{Emoji, style};
use crossbeam_channel::{Receiver, unbounded};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use seedkit::bus::{Message, MessageBus, MessageName, Role, Routed};
use seedkit::cli::{Args, Command, expand_paths};
use seedkit::config::Config;
use seedkit::models::{ScanEntry, TorrentSpec};
use seedkit::{LifecycleCoordinator, Scanner, TorrentListController, logging};

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "OK ");
static ERROR: Emoji<'_, '_> = Emoji("❌ ", "ERR ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "d ");

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", ERROR, e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(profile) = &args.profile {
        config.apply_profile(profile)?;
    }

    let paths = expand_paths(args.command.paths()).context("Failed to resolve selected paths")?;
    let scanner = Scanner::local(&args.scan_options(&config))?;
    let builder = args.request_builder(&config);

    let result = match &args.command {
        Command::Scan { .. } => {
            let forest = with_spinner("Scanning...", || scanner.scan(&paths))?;
            print_forest(&forest, args.json)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Create { .. } => with_spinner("Scanning...", || {
            builder.create_torrent(&scanner, &paths).map(|spec| vec![spec])
        }),
        Command::Library { .. } => {
            with_spinner("Scanning...", || builder.create_library(&scanner, &paths))
        }
    };

    let (primary_tx, primary_rx) = unbounded();
    let (worker_tx, worker_rx) = unbounded();
    let bus = Arc::new(MessageBus::new(primary_tx, worker_tx));
    let coordinator = Arc::new(LifecycleCoordinator::new(
        Arc::clone(&bus),
        config.save_timeout(),
    ));
    let controller = TorrentListController::new(Arc::clone(&bus));

    let ui = spawn_ui(Arc::clone(&bus), Arc::clone(&coordinator), primary_rx);
    bus.receive("primaryReady", Vec::new(), Role::Primary);
    let worker = spawn_worker(Arc::clone(&bus), worker_rx, args.json);

    match result {
        Ok(specs) => {
            if specs.is_empty() && !args.json {
                eprintln!("No folders with enough files to seed");
            }
            controller.create_torrents(&specs)?;
        }
        Err(e) => controller.report_error(&e),
    }

    coordinator.request_shutdown();
    let errors = ui.join().unwrap_or(1);

    // The worker runs until the last handle on the bus is gone
    drop(controller);
    drop(coordinator);
    drop(bus);
    let _ = worker.join();

    Ok(if errors == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn with_spinner<T>(message: &'static str, f: impl FnOnce() -> T) -> T {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    pb.finish_and_clear();
    out
}

/// Stands in for the UI process: shows error events and answers the save
/// request. Returns the number of errors shown.
fn spawn_ui(
    bus: Arc<MessageBus>,
    coordinator: Arc<LifecycleCoordinator>,
    inbox: Receiver<Message>,
) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut errors = 0;
        for message in inbox {
            match message.name() {
                MessageName::Error => {
                    errors += 1;
                    let text = message
                        .args()
                        .first()
                        .and_then(|event| event["message"].as_str())
                        .unwrap_or("unknown error");
                    eprintln!("{} {}", ERROR, style(text).red());
                }
                MessageName::SaveState => {
                    let reply = bus.receive("savedState", Vec::new(), Role::Primary);
                    if let Routed::Local(ack) = reply {
                        coordinator.handle(&ack);
                    }
                    break;
                }
                _ => {}
            }
        }
        errors
    })
}

/// Stands in for the engine process: announces readiness once started and
/// reports every creation request it receives
fn spawn_worker(bus: Arc<MessageBus>, inbox: Receiver<Message>, json: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        bus.receive("workerReady", Vec::new(), Role::Worker);
        // Holding on would keep the inbox open forever
        drop(bus);

        for message in inbox {
            if *message.name() != MessageName::CreateTorrent {
                continue;
            }
            let (_, args) = message.into_parts();
            let Some(spec) = args
                .get(1)
                .and_then(|value| serde_json::from_value::<TorrentSpec>(value.clone()).ok())
            else {
                continue;
            };

            if json {
                match serde_json::to_string_pretty(&spec) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("{} {}", ERROR, e),
                }
            } else {
                eprintln!(
                    "{} Created: {} ({} files, {})",
                    CHECK,
                    style(&spec.name).bold(),
                    spec.files.len(),
                    style(HumanBytes(spec.total_size())).green()
                );
            }
        }
    })
}

fn print_forest(forest: &[ScanEntry], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(forest).context("Failed to encode scan result")?
        );
        return Ok(());
    }
    for entry in forest {
        print_entry(entry, 0);
    }
    Ok(())
}

fn print_entry(entry: &ScanEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    match entry {
        ScanEntry::File(file) => println!(
            "{}{:<40} {}",
            indent,
            file.name,
            style(HumanBytes(file.size)).dim()
        ),
        ScanEntry::Dir(dir) => {
            println!(
                "{}{}{} {}",
                indent,
                FOLDER,
                style(&dir.name).bold(),
                style(HumanBytes(entry.total_size())).dim()
            );
            for child in &dir.children {
                print_entry(child, depth + 1);
            }
        }
    }
}
