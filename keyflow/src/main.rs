use crate::config::RonStore;
use crate::errors::Result;
use clap::{Arg, ArgAction};
use keyflow_core::config::{Command, Shortcut, Store};
use keyflow_core::hook::{ChannelHook, HookFeed, KeyEvent};
use keyflow_core::ipc::{self, Control, Pipe};
use keyflow_core::service::HotkeyService;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{filter::EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt};

pub mod config;
pub mod errors;
mod tests;

const QUIT_COMMAND: &str = "quit";
const RELOAD_COMMAND: &str = "reload";
const ENABLE_COMMAND: &str = "enable";
const DISABLE_COMMAND: &str = "disable";
const STATS_COMMAND: &str = "stats";
const LIST_COMMAND: &str = "list";
const ADD_COMMAND: &str = "add";
const REMOVE_COMMAND: &str = "remove";
const CONFIG_ARG: &str = "config";

const REAP_INTERVAL: Duration = Duration::from_secs(1);

fn main() {
    setup_logging();
    let matches = get_app().get_matches();
    tracing::info!("keyflow booted!");

    let config_path = matches.get_one::<PathBuf>(CONFIG_ARG).cloned();

    if matches.get_flag(QUIT_COMMAND) {
        send_control(Control::Kill);
    } else if matches.get_flag(RELOAD_COMMAND) {
        send_control(Control::Reload);
    } else if matches.get_flag(ENABLE_COMMAND) {
        send_control(Control::Enable);
    } else if matches.get_flag(DISABLE_COMMAND) {
        send_control(Control::Disable);
    } else if matches.get_flag(STATS_COMMAND) {
        send_control(Control::Stats);
    } else if matches.get_flag(LIST_COMMAND) {
        let store = errors::exit_on_error!(open_store(config_path.as_deref()));
        let config = errors::exit_on_error!(store.read_or_default());
        for shortcut in &config.shortcuts {
            println!("{:<24} {}", shortcut.keys, shortcut.command);
        }
    } else if let Some(values) = matches.get_many::<String>(ADD_COMMAND) {
        let values: Vec<&String> = values.collect();
        let store = errors::exit_on_error!(open_store(config_path.as_deref()));
        let shortcut = errors::exit_on_error!(add(&store, values[0], values[1]));
        println!("Bound {} to {}", shortcut.keys, shortcut.command);
        request_reload();
    } else if let Some(keys) = matches.get_one::<String>(REMOVE_COMMAND) {
        let store = errors::exit_on_error!(open_store(config_path.as_deref()));
        let shortcut = errors::exit_on_error!(remove(&store, keys));
        println!("Removed {} ({})", shortcut.keys, shortcut.command);
        request_reload();
    } else {
        run(config_path.as_deref());
    }
}

fn run(config_path: Option<&Path>) {
    let (config, store) = match config::load(config_path) {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::error!("Unable to load config due to error: {}", err);
            return;
        }
    };

    let hook = Arc::new(ChannelHook::new());
    let feed = hook.feed();
    let service = HotkeyService::with_config(hook, &config);
    service
        .dispatcher()
        .set_observer(|name| tracing::info!("Triggered {}", name));
    errors::return_on_error!(service.start());
    spawn_stdin_feed(feed);

    let rt = errors::return_on_error!(tokio::runtime::Runtime::new());
    let _rt_guard = rt.enter();
    rt.block_on(serve(&service, &store));

    errors::return_on_error!(service.unregister());
    tracing::info!("Completed");
}

async fn serve(service: &HotkeyService, store: &RonStore) {
    let pipe_file = errors::return_on_error!(Pipe::runtime_file());
    let mut pipe = errors::return_on_error!(Pipe::new(pipe_file).await);
    let mut reaper = tokio::time::interval(REAP_INTERVAL);

    loop {
        tokio::select! {
            _ = reaper.tick() => {
                service.launcher().reap();
            }
            control = pipe.get_next_control() => {
                match control {
                    Some(Control::Kill) | None => break,
                    Some(control) => handle_control(service, store, control),
                }
            }
        }
    }
}

fn handle_control(service: &HotkeyService, store: &RonStore, control: Control) {
    tracing::debug!("Control request: {:?}", control);
    match control {
        Control::Enable => {
            if service.start().is_err() {
                tracing::warn!("Hotkeys stay {}", service.state());
            }
        }
        Control::Disable => service.stop(),
        Control::Reload => {
            // Tools installed since the last lookup become usable.
            service.launcher().tools().reset();
            match service.load(store) {
                Ok(count) => tracing::info!("Reloaded {} shortcuts", count),
                Err(err) => tracing::error!("Unable to reload shortcuts: {}", err),
            }
        }
        Control::Stats => {
            let stats = service.statistics();
            tracing::info!(
                "State: {}, shortcuts: {}, events: {}, triggered: {}, last event: {:?}",
                service.state(),
                stats.registered_count,
                stats.events_processed,
                stats.shortcuts_triggered,
                stats.last_event_timestamp
            );
        }
        Control::Kill => {}
    }
}

/// Feeds key events typed on stdin, one per line, into the hook.
fn spawn_stdin_feed(feed: HookFeed) {
    let spawned = std::thread::Builder::new()
        .name("keyflow-stdin".to_owned())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match KeyEvent::parse(&line) {
                    Ok(event) => {
                        if !feed.send(event) {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!("{}", err),
                }
            }
        });
    errors::return_on_error!(spawned);
}

fn open_store(config_path: Option<&Path>) -> Result<RonStore> {
    match config_path {
        Some(path) => Ok(RonStore::new(path)),
        None => RonStore::locate(),
    }
}

/// Binds `keys` to the command named by `action` and saves the config.
fn add(store: &RonStore, keys: &str, action: &str) -> Result<Shortcut> {
    let command: Command = action.parse()?;
    let mut config = store.read_or_default()?;
    let shortcut = config.bind(keys, command)?.clone();
    store.save(&config.shortcuts)?;
    Ok(shortcut)
}

fn remove(store: &RonStore, keys: &str) -> Result<Shortcut> {
    let mut config = store.read()?;
    let shortcut = config.unbind(keys)?;
    store.save(&config.shortcuts)?;
    Ok(shortcut)
}

fn send_control(control: Control) {
    let pipe_file = errors::exit_on_error!(Pipe::runtime_file());
    errors::exit_on_error!(ipc::send(&pipe_file, control));
}

fn request_reload() {
    let sent = Pipe::runtime_file().and_then(|pipe_file| ipc::send(&pipe_file, Control::Reload));
    if let Err(err) = sent {
        tracing::debug!("No running daemon reloaded: {}", err);
    }
}

fn get_app() -> clap::Command {
    clap::command!()
        .arg(
            Arg::new(QUIT_COMMAND)
                .short('q')
                .long(QUIT_COMMAND)
                .action(ArgAction::SetTrue)
                .help("Quit a running daemon instance"),
        )
        .arg(
            Arg::new(RELOAD_COMMAND)
                .short('r')
                .long(RELOAD_COMMAND)
                .action(ArgAction::SetTrue)
                .help("Reload daemon to apply changes to config"),
        )
        .arg(
            Arg::new(ENABLE_COMMAND)
                .short('e')
                .long(ENABLE_COMMAND)
                .action(ArgAction::SetTrue)
                .help("Enable hotkeys of a running daemon"),
        )
        .arg(
            Arg::new(DISABLE_COMMAND)
                .short('d')
                .long(DISABLE_COMMAND)
                .action(ArgAction::SetTrue)
                .help("Disable hotkeys of a running daemon without quitting it"),
        )
        .arg(
            Arg::new(STATS_COMMAND)
                .short('s')
                .long(STATS_COMMAND)
                .action(ArgAction::SetTrue)
                .help("Make a running daemon log its statistics"),
        )
        .arg(
            Arg::new(LIST_COMMAND)
                .long(LIST_COMMAND)
                .action(ArgAction::SetTrue)
                .help("List configured shortcuts"),
        )
        .arg(
            Arg::new(ADD_COMMAND)
                .long(ADD_COMMAND)
                .num_args(2)
                .value_names(["KEYS", "ACTION"])
                .help("Bind KEYS (e.g. Ctrl+F12) to ACTION (e.g. VolumeUp or \"Execute <cmd>\")"),
        )
        .arg(
            Arg::new(REMOVE_COMMAND)
                .long(REMOVE_COMMAND)
                .value_name("KEYS")
                .help("Remove the shortcut bound to KEYS"),
        )
        .arg(
            Arg::new(CONFIG_ARG)
                .short('c')
                .long(CONFIG_ARG)
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Use this config file instead of the default one"),
        )
}

fn setup_logging() {
    let subscriber = fmt::Layer::new().with_writer(std::io::stdout);
    let log_level = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();

    let collector = tracing_subscriber::registry()
        .with(log_level)
        .with(subscriber);

    tracing::subscriber::set_global_default(collector).expect("Couldn't setup logging");
}
