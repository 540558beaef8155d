//! Visa slot dashboard CLI
//!
//! Terminal front end: login gate, live dashboard and one-shot commands.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use visa_slots::{
    error::{AppError, Result},
    models::{Config, Summary, find_record},
    pipeline::{self, DashboardSnapshot, PollSettings, Poller},
    render,
    services::{AvailabilitySource, Credentials, HttpSource, SessionGate, parser_for},
    storage::LocalStorage,
};

/// Visa appointment availability dashboard
#[derive(Parser, Debug)]
#[command(
    name = "visa-slots",
    version,
    about = "Visa appointment availability dashboard"
)]
struct Cli {
    /// Path to storage directory holding config.toml and local state
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and unlock the dashboard
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Live dashboard with periodic refresh
    Watch {
        /// Initial search term
        #[arg(long)]
        search: Option<String>,
    },

    /// Poll once, print the dashboard and exit
    Fetch {
        /// Search term applied before printing
        #[arg(long)]
        search: Option<String>,

        /// Print normalized records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detail view for one country or region
    Show { name: String },

    /// Validate configuration file
    Validate,
}

/// A line typed into the live dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Refresh,
    Search(String),
    ClearSearch,
    Show(String),
    Logout,
    Quit,
    Help,
}

const HELP: &str = "Commands: r refresh | /term search | / clear | 1-9 quick filter | \
show NAME | logout | q quit";

fn parse_input(line: &str, quick_filters: &[String]) -> Option<Input> {
    let line = line.trim();
    match line {
        "" => None,
        "r" | "refresh" => Some(Input::Refresh),
        "q" | "quit" | "exit" => Some(Input::Quit),
        "logout" => Some(Input::Logout),
        "?" | "h" | "help" => Some(Input::Help),
        "/" => Some(Input::ClearSearch),
        _ => {
            if let Some(term) = line.strip_prefix('/') {
                return Some(Input::Search(term.trim().to_string()));
            }
            if let Some(name) = line.strip_prefix("show ") {
                return Some(Input::Show(name.trim().to_string()));
            }
            let index: usize = line.parse().ok()?;
            let filter = quick_filters.get(index.checked_sub(1)?)?;
            Some(Input::Search(filter.clone()))
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}

/// User-facing form of a failed command.
fn error_line(error: &AppError) -> String {
    format!("Error: {}", error)
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::debug!("Loaded configuration from {}", cli.storage_dir.display());

    let store = Arc::new(LocalStorage::new(&cli.storage_dir));
    let gate = SessionGate::with_default_credentials(store);

    match cli.command {
        Command::Login { username, password } => {
            let session = gate.login(&Credentials::new(username, password)).await?;
            println!("Signed in as {}", session.username);
        }

        Command::Logout => {
            gate.logout().await?;
            println!("Signed out");
        }

        Command::Watch { search } => {
            gate.require().await?;
            config.validate()?;
            let source = Arc::new(HttpSource::from_config(&config.source)?);
            watch(&config, source, &gate, search).await?;
        }

        Command::Fetch { search, json } => {
            gate.require().await?;
            config.validate()?;
            let source = HttpSource::from_config(&config.source)?;
            let parser = parser_for(config.source.schema);
            let (mut view, toast) =
                pipeline::run_fetch(&source, parser.as_ref(), config.polling.retain_on_error)
                    .await;
            if let Some(term) = search {
                view.set_search(term);
            }

            if json {
                let visible = view.visible();
                let output = serde_json::json!({
                    "summary": Summary::from_records(
                        visible.iter().copied(),
                        config.display.limited_threshold
                    ),
                    "records": visible,
                    "notification": toast,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", render::render_dashboard(&view, None, &config.display));
                println!("{}", render::render_toast(&toast));
            }
        }

        Command::Show { name } => {
            gate.require().await?;
            config.validate()?;
            let source = HttpSource::from_config(&config.source)?;
            let parser = parser_for(config.source.schema);
            let (view, toast) =
                pipeline::run_fetch(&source, parser.as_ref(), config.polling.retain_on_error)
                    .await;
            let record = find_record(view.records(), &name).ok_or_else(|| {
                log::warn!("{}", toast.message);
                AppError::not_found(format!("No record matching '{}'", name))
            })?;
            println!(
                "{}",
                render::render_detail(record, &config.display, config.source.schema)
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} every {}s, {:?} layout)",
                config.source.base_url,
                config.polling.period_secs,
                config.source.schema
            );
        }
    }

    Ok(())
}

/// Live dashboard loop. Redraws when rows, the loading state or the
/// countdown change; the latest notification is shown under the frame.
async fn watch(
    config: &Config,
    source: Arc<dyn AvailabilitySource>,
    gate: &SessionGate,
    search: Option<String>,
) -> Result<()> {
    let poller = Poller::start(
        source,
        parser_for(config.source.schema),
        PollSettings::from(&config.polling),
    );
    if let Some(term) = search {
        poller.set_search(term);
    }

    let mut snapshots = poller.subscribe();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut drawn: Option<FrameKey> = None;

    println!("{}", HELP);
    let result = loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let key = FrameKey::of(&snapshot);
                if drawn != Some(key) {
                    drawn = Some(key);
                    let mut frame = render::render_snapshot(&snapshot, &config.display);
                    if let Some(toast) = &snapshot.last_toast {
                        frame.push_str("\n\n");
                        frame.push_str(&render::render_toast(toast));
                    }
                    redraw(&frame);
                }
            }
            line = input.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(AppError::Io(e)),
                };
                match parse_input(&line, &config.display.quick_filters) {
                    Some(Input::Refresh) => poller.refresh_now(),
                    Some(Input::Search(term)) => poller.set_search(term),
                    Some(Input::ClearSearch) => poller.set_search(""),
                    Some(Input::Show(name)) => show_detail(&poller, &name, config),
                    Some(Input::Help) => println!("{}", HELP),
                    Some(Input::Logout) => {
                        if let Err(e) = gate.logout().await {
                            break Err(e);
                        }
                        println!("Signed out");
                        break Ok(());
                    }
                    Some(Input::Quit) => break Ok(()),
                    None => {}
                }
            }
        }
    };

    poller.stop().await;
    result
}

fn show_detail(poller: &Poller, name: &str, config: &Config) {
    let snapshot = poller.snapshot();
    match find_record(snapshot.view.records(), name) {
        Some(record) => println!(
            "{}",
            render::render_detail(record, &config.display, config.source.schema)
        ),
        None => println!("No record matching '{}'", name),
    }
}

/// Everything a drawn frame depends on. The countdown is part of it, so the
/// header is redrawn on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameKey {
    generation: u64,
    loading: bool,
    remaining_secs: u64,
}

impl FrameKey {
    fn of(snapshot: &DashboardSnapshot) -> Self {
        Self {
            generation: snapshot.view.generation(),
            loading: snapshot.view.is_loading(),
            remaining_secs: snapshot.remaining_secs,
        }
    }
}

fn redraw(frame: &str) {
    // Clear screen, cursor home.
    print!("\x1b[2J\x1b[H");
    println!("{}", frame);
    println!("{}", HELP);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> Vec<String> {
        vec!["Germany".to_string(), "USA".to_string()]
    }

    #[test]
    fn parses_dashboard_commands() {
        let filters = filters();
        assert_eq!(parse_input("r", &filters), Some(Input::Refresh));
        assert_eq!(parse_input(" q ", &filters), Some(Input::Quit));
        assert_eq!(parse_input("logout", &filters), Some(Input::Logout));
        assert_eq!(parse_input("", &filters), None);
    }

    #[test]
    fn parses_search_and_show() {
        let filters = filters();
        assert_eq!(
            parse_input("/can", &filters),
            Some(Input::Search("can".to_string()))
        );
        assert_eq!(parse_input("/", &filters), Some(Input::ClearSearch));
        assert_eq!(
            parse_input("show United States", &filters),
            Some(Input::Show("United States".to_string()))
        );
    }

    fn snapshot(remaining_secs: u64) -> DashboardSnapshot {
        DashboardSnapshot {
            view: visa_slots::models::ViewState::new(false),
            remaining_secs,
            in_flight: false,
            fetches_started: 1,
            last_toast: None,
        }
    }

    #[test]
    fn countdown_tick_changes_frame() {
        let drawn = FrameKey::of(&snapshot(180));
        assert_eq!(FrameKey::of(&snapshot(180)), drawn);
        assert_ne!(FrameKey::of(&snapshot(179)), drawn);
    }

    #[test]
    fn search_and_loading_change_frame() {
        let mut next = snapshot(120);
        let drawn = FrameKey::of(&next);

        next.view.set_search("can");
        assert_ne!(FrameKey::of(&next), drawn);

        let mut loading = snapshot(120);
        loading.view.begin_refresh();
        assert_ne!(FrameKey::of(&loading), drawn);
    }

    #[test]
    fn errors_print_their_message() {
        assert_eq!(
            error_line(&AppError::NotAuthenticated),
            "Error: Not logged in. Run `visa-slots login` first"
        );
        assert_eq!(
            error_line(&AppError::auth("Invalid credentials")),
            "Error: Authentication failed: Invalid credentials"
        );
    }

    #[test]
    fn numbers_pick_quick_filters() {
        let filters = filters();
        assert_eq!(
            parse_input("2", &filters),
            Some(Input::Search("USA".to_string()))
        );
        assert_eq!(parse_input("0", &filters), None);
        assert_eq!(parse_input("3", &filters), None);
        assert_eq!(parse_input("germany", &filters), None);
    }
}
