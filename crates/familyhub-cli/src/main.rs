//! familyhub - command-line view of a family's shared dashboard.
//!
//! Polls the family and task collections with offline fallback, runs focus
//! sessions, and explains what happens when a member leaves a family.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use familyhub_core::{
    Action, AgeGroup, AuthProvider, CacheStore, Config, Dashboard, DashboardState, FileStore,
    FocusEvent, FocusTimer, HttpDataService, Session, SessionData, Snapshot,
};

// ============================================================================
// Constants
// ============================================================================

/// Subdirectory of the cache dir holding cached collections
const COLLECTIONS_DIR: &str = "collections";

/// Subdirectory of the cache dir holding log files
const LOG_DIR: &str = "logs";

/// Log file name prefix (rotated daily)
const LOG_FILE: &str = "familyhub.log";

/// Print every focus tick once this few seconds remain.
const FOCUS_FINAL_COUNTDOWN_SECS: u32 = 10;

const USAGE: &str = "\
Usage: familyhub [command]

Commands:
  watch                              Poll families and tasks (default)
  advise <family-id>                 What happens if you leave a family
  focus [minutes]                    Run a focus session
  login <user-id> <token> <age-group>
  logout
  clear-cache";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and to a daily-rotated file under `log_dir`. The returned
/// guard flushes the file writer and must live until exit.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_tracing(&cache_dir.join(LOG_DIR));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("watch") => watch(&config, &cache_dir).await,
        Some("advise") => {
            let family_id = args.get(1).context("advise needs a family id")?;
            advise(&config, &cache_dir, family_id).await
        }
        Some("focus") => focus(&config, args.get(1).map(String::as_str)).await,
        Some("login") => login(&cache_dir, &args[1..]),
        Some("logout") => {
            Session::new(cache_dir).clear()?;
            println!("Signed out.");
            Ok(())
        }
        Some("clear-cache") => clear_cache(&cache_dir),
        Some("help" | "--help" | "-h") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn load_session(cache_dir: &Path) -> Session {
    let mut session = Session::new(cache_dir.to_path_buf());
    if let Err(e) = session.load() {
        warn!(error = %e, "Ignoring unreadable session");
    }
    session
}

fn open_cache(cache_dir: &Path) -> Result<CacheStore<FileStore>> {
    let store = FileStore::new(cache_dir.join(COLLECTIONS_DIR))
        .with_context(|| format!("Failed to open cache directory {}", cache_dir.display()))?;
    Ok(CacheStore::new(store))
}

fn build_dashboard(
    config: &Config,
    cache_dir: &Path,
    session: &Session,
) -> Result<Dashboard<HttpDataService, FileStore>> {
    let mut service = HttpDataService::new(config.api_base_url.as_str())?;
    if let Some(token) = session.token() {
        service = service.with_token(token.to_string());
    }
    let (interval, duration) = config.poll_settings();
    Ok(Dashboard::new(
        service,
        Arc::new(open_cache(cache_dir)?),
        config.retry_policy()?,
        interval,
        duration,
    ))
}

// ============================================================================
// Commands
// ============================================================================

async fn watch(config: &Config, cache_dir: &Path) -> Result<()> {
    let session = load_session(cache_dir);
    if !session.is_valid() {
        println!("Not signed in; the service may reject requests. Run `familyhub login`.");
    }

    let user_id = session.current_user_id();
    let mut dashboard = build_dashboard(config, cache_dir, &session)?;
    let mut updates = dashboard.subscribe();
    dashboard.init()?;
    info!(url = %config.api_base_url, "Watching dashboard");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_state(&state, user_id.as_deref());
            }
            _ = dashboard.finished() => break,
        }
    }

    dashboard.teardown();
    println!("Polling window ended.");
    Ok(())
}

async fn advise(config: &Config, cache_dir: &Path, family_id: &str) -> Result<()> {
    let session = load_session(cache_dir);
    let dashboard = build_dashboard(config, cache_dir, &session)?;
    dashboard.refresh().await;

    if let Some(notice) = dashboard.families().and_then(|s| s.notice()) {
        println!("{}", notice);
    }

    let Some(family) = dashboard
        .families()
        .and_then(|s| s.data.into_iter().find(|f| f.id == family_id))
    else {
        bail!("Family '{}' is not in your family list", family_id);
    };
    if let Some(user_id) = session.current_user_id() {
        if !family.has_member(&user_id) {
            bail!("You are not a member of {}", family.name);
        }
    }
    let admins: Vec<&str> = family.admins().map(|m| m.user_id.as_str()).collect();
    println!(
        "{} ({}, admins: {})",
        family.name,
        family.display_member_count(),
        if admins.is_empty() { "none".to_string() } else { admins.join(", ") }
    );

    let Some(rec) = dashboard.advise(family_id, &session) else {
        bail!("Family '{}' is not in your family list", family_id);
    };

    let verdict = match rec.action {
        Action::Leave => "You can leave",
        Action::Delete => "Delete the family",
        Action::TransferFirst => "Transfer admin rights first",
        Action::Blocked => "Not allowed",
    };
    println!("{}: {}", verdict, rec.reason);
    for target in &rec.eligible_transfer_targets {
        println!("  - {} ({})", target.user_id, target.age_group);
    }
    if let Some(age_group) = session.current_user_age_group() {
        info!(%age_group, action = ?rec.action, "Advice given");
    }
    Ok(())
}

async fn focus(config: &Config, minutes: Option<&str>) -> Result<()> {
    let total_seconds = match minutes {
        Some(m) => m
            .parse::<u32>()
            .with_context(|| format!("'{}' is not a number of minutes", m))?
            .saturating_mul(60),
        None => config.focus_seconds(),
    };

    let (timer, mut events) = FocusTimer::new();
    timer.begin(total_seconds).await?;

    while let Some(event) = events.recv().await {
        match event {
            FocusEvent::Started { total_seconds } => {
                println!("Focus session started: {}", format_clock(total_seconds));
            }
            FocusEvent::Tick { remaining_seconds } => {
                if remaining_seconds % 60 == 0 || remaining_seconds <= FOCUS_FINAL_COUNTDOWN_SECS {
                    println!("  {} left", format_clock(remaining_seconds));
                }
            }
            FocusEvent::Completed { total_seconds } => {
                println!("Done! {} of focus.", format_clock(total_seconds));
                break;
            }
            FocusEvent::Cancelled { remaining_seconds } => {
                println!("Stopped with {} left.", format_clock(remaining_seconds));
                break;
            }
        }
    }
    timer.acknowledge().await;
    Ok(())
}

fn login(cache_dir: &Path, args: &[String]) -> Result<()> {
    let [user_id, token, age_group] = args else {
        bail!("login needs <user-id> <token> <age-group>");
    };
    let age_group = AgeGroup::parse(age_group)
        .with_context(|| format!("Unknown age group '{}' (child, teen, adult)", age_group))?;

    let mut session = Session::new(cache_dir.to_path_buf());
    session.update(SessionData::new(user_id.as_str(), token.as_str(), Some(age_group)));
    session.save()?;
    println!("Signed in as {} ({}).", user_id, age_group);
    Ok(())
}

fn clear_cache(cache_dir: &Path) -> Result<()> {
    let cache = open_cache(cache_dir)?;
    let keys = cache.keys();
    for key in &keys {
        cache.clear(key);
    }
    println!("Cleared {} cached collection(s).", keys.len());
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_state(state: &DashboardState, user_id: Option<&str>) {
    println!("{}", describe("Families", state.families.as_ref()));
    println!("{}", describe("Tasks", state.tasks.as_ref()));
    if let Some(tasks) = &state.tasks {
        let open: u32 = tasks.data.iter().map(|t| t.open_points()).sum();
        println!("  {} points up for grabs", open);
        if let Some(user_id) = user_id {
            let mine = tasks
                .data
                .iter()
                .filter(|t| !t.completed && t.is_assigned_to(user_id))
                .count();
            println!("  {} open task(s) assigned to you", mine);
        }
    }
}

fn describe<T>(label: &str, snapshot: Option<&Snapshot<T>>) -> String {
    match snapshot {
        None => format!("{:<9} loading...", label),
        Some(s) => match s.notice() {
            None => format!("{:<9} {:>3} (updated {})", label, s.data.len(), s.age_display()),
            Some(notice) => format!("{:<9} {:>3} - {}", label, s.data.len(), notice),
        },
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
