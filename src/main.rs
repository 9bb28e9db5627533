mod ai;
mod config;
mod db;
mod errors;
mod export;
mod models;
mod onboarding;
mod session;
mod simulator;
mod tui;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use db::Database;
use session::{Session, SessionHandle};
use simulator::AutoApplySimulator;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const NO_PROFILE: &str = "No profile found. Run 'hirebot onboard' first.";

#[derive(Parser)]
#[command(name = "hirebot")]
#[command(about = "Job-hunt assistant - onboard once, auto-apply, prep for interviews")]
struct Cli {
    /// Path to the SQLite state file
    #[arg(long, global = true, env = "HIREBOT_DB")]
    db: Option<PathBuf>,

    /// AI model (gemini-flash, gemini-pro, api-sonnet, api-haiku, gpt-4o, gpt-4o-mini)
    #[arg(long, global = true, env = "HIREBOT_MODEL")]
    model: Option<String>,

    /// Seconds between auto-apply ticks
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the state database
    Init,

    /// Build your profile step by step
    Onboard,

    /// Show the saved profile
    Profile,

    /// Forget the profile and start over
    Reset,

    /// Open the interactive dashboard
    Dashboard,

    /// Run auto-apply headless, printing each application
    Run {
        /// Stop after this many applications
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Export the applications to this CSV file when done
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// List scheduled interviews
    Interviews,

    /// AI suggestions for the saved resume
    Analyze,

    /// AI preparation tips for an interview
    Tips {
        /// Interview ID
        id: String,
    },

    /// Score the saved resume against a job description
    Match {
        /// File containing the job description
        job_file: PathBuf,
    },
}

fn init_logging(config: &Config, to_file: bool) -> Result<()> {
    let default_level = config
        .log_level
        .clone()
        .unwrap_or_else(|| (if to_file { "info" } else { "warn" }).to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), default_level)));

    if to_file {
        let path = config.log_path();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn open_session(config: &Config) -> Result<Session> {
    let db = Database::open(&config.db_path)?;
    let mut session = Session::new(Box::new(db));
    session.load_persisted_profile();
    Ok(session)
}

fn onboarded_session(config: &Config) -> Result<Option<Session>> {
    let session = open_session(config)?;
    if session.onboarded() {
        Ok(Some(session))
    } else {
        println!("{}", NO_PROFILE);
        Ok(None)
    }
}

fn onboard(session: &mut Session) -> Result<bool> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    let Some(profile) = onboarding::run_interactive(&mut input, &mut out)? else {
        println!("\nOnboarding abandoned, nothing saved.");
        return Ok(false);
    };

    let name = profile.name.clone();
    if let Err(e) = session.complete_onboarding(profile) {
        eprintln!("Warning: {}", e);
    }
    println!("\nWelcome, {}! Your profile is ready.", if name.is_empty() { "there" } else { &name });
    Ok(true)
}

fn print_wrapped(text: &str) {
    for line in textwrap::fill(text, 80).lines() {
        println!("  {}", line);
    }
}

fn describe(app: &models::JobApplication) -> String {
    format!(
        "{:<10} {:<24} {:<11} {:>3}%",
        truncate(&app.company_name, 10),
        truncate(&app.role, 24),
        app.platform.as_str(),
        app.match_score
    )
}

async fn run_headless<W: Write>(
    session: SessionHandle,
    period: Duration,
    ticks: Option<u64>,
    out: &mut W,
) -> Result<u64> {
    let mut simulator = AutoApplySimulator::new(tokio::runtime::Handle::current(), session.clone(), period);
    let mut changes = session.subscribe();
    let mut seen = session.read(|s| s.applications().len());
    let mut produced: u64 = 0;
    let done = |produced: u64| ticks.is_some_and(|limit| produced >= limit);

    simulator.set_enabled(true);
    writeln!(out, "Auto-apply running every {}s. Press Ctrl-C to stop.", period.as_secs())?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !done(produced) {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                // newest first in the store, so the unseen ones are the head, printed oldest first
                let fresh: Vec<models::JobApplication> = session.read(|s| {
                    let apps = s.applications();
                    apps[..apps.len().saturating_sub(seen)].iter().rev().cloned().collect()
                });
                seen += fresh.len();
                for app in &fresh {
                    writeln!(out, "[{}] {}", chrono::Local::now().format("%H:%M:%S"), describe(app))?;
                }
                produced += fresh.len() as u64;
            }
            _ = &mut ctrl_c => {
                writeln!(out)?;
                break;
            }
        }
    }

    simulator.set_enabled(false);
    info!(produced, "headless run finished");
    Ok(produced)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.db, cli.model, cli.interval_secs);
    init_logging(&config, matches!(cli.command, Commands::Dashboard))?;

    match cli.command {
        Commands::Init => {
            let db = Database::open(&config.db_path)?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Onboard => {
            let mut session = open_session(&config)?;
            if let Some(profile) = session.profile() {
                println!("Replacing the saved profile for {}.", profile.name);
            }
            onboard(&mut session)?;
        }

        Commands::Profile => {
            let Some(session) = onboarded_session(&config)? else {
                return Ok(());
            };
            if let Some(profile) = session.profile() {
                println!("{} ({})", profile.name, profile.initials());
                println!("Role: {}", profile.role);
                println!("Field: {}", profile.field_label());
                println!("Experience: {} Years", profile.experience);
                println!("Mode: {}", profile.location);
                println!("Job Type: {}", profile.job_type);
                println!("Email: {}", profile.email);
                println!("Phone: {}", profile.phone);
                if let Some(url) = &profile.linkedin_url {
                    println!("LinkedIn: {}", url);
                }
                if let Some(url) = &profile.portfolio_url {
                    println!("Portfolio: {}", url);
                }
                println!("Resume: {} characters", profile.resume_text.chars().count());
            }
        }

        Commands::Reset => {
            let mut session = open_session(&config)?;
            session.reset_session()?;
            println!("Session reset. Run 'hirebot onboard' to start again.");
        }

        Commands::Dashboard => {
            let mut session = open_session(&config)?;
            if !session.onboarded() && !onboard(&mut session)? {
                return Ok(());
            }

            let assistant = Arc::new(ai::Assistant::from_model(&config.model));
            match assistant.model_name() {
                Some(model) => info!(model, "dashboard starting"),
                None => info!("dashboard starting without an AI provider"),
            }
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            let handle = SessionHandle::new(session);
            let exit = tui::run_dashboard(handle, assistant, runtime.handle().clone(), config.tick_interval)?;
            if exit == tui::DashboardExit::Reset {
                println!("Session reset. Run 'hirebot onboard' to start again.");
            }
        }

        Commands::Run { ticks, export } => {
            let Some(session) = onboarded_session(&config)? else {
                return Ok(());
            };
            let handle = SessionHandle::new(session);
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(run_headless(handle.clone(), config.tick_interval, ticks, &mut std::io::stdout()))?;

            let applications = handle.read(|s| s.applications().to_vec());
            println!("{} application(s) sent this session.", applications.len());
            if let Some(path) = export {
                let written = export::write_csv(&applications, Some(&path))?;
                println!("Exported to {}", written.display());
            }
        }

        Commands::Interviews => {
            let Some(session) = onboarded_session(&config)? else {
                return Ok(());
            };
            println!("{:<4} {:<12} {:<22} {:<10} {}", "ID", "COMPANY", "ROLE", "TYPE", "WHEN");
            println!("{}", "-".repeat(72));
            for interview in session.interviews() {
                println!(
                    "{:<4} {:<12} {:<22} {:<10} {} {}",
                    interview.id,
                    truncate(&interview.company_name, 12),
                    truncate(&interview.role, 22),
                    interview.interview_type.as_str(),
                    interview.date,
                    interview.time
                );
                for tip in interview.tips.iter().flatten() {
                    println!("       - {}", tip);
                }
            }
        }

        Commands::Analyze => {
            let Some(session) = onboarded_session(&config)? else {
                return Ok(());
            };
            let Some(profile) = session.profile() else {
                return Ok(());
            };
            let assistant = ai::Assistant::from_model(&config.model);
            println!("Analyzing resume for {}...\n", profile.role);
            print_wrapped(&assistant.analyze_resume(&profile.resume_text, &profile.role));
        }

        Commands::Tips { id } => {
            let Some(session) = onboarded_session(&config)? else {
                return Ok(());
            };
            let interview = session
                .interviews()
                .iter()
                .find(|i| i.id == id)
                .ok_or_else(|| anyhow!("No interview with ID {}", id))?;
            let assistant = ai::Assistant::from_model(&config.model);
            println!("{} interview at {} ({})\n", interview.interview_type, interview.company_name, interview.role);
            print_wrapped(&assistant.interview_tips(
                &interview.company_name,
                &interview.role,
                interview.interview_type.as_str(),
            ));
        }

        Commands::Match { job_file } => {
            let Some(session) = onboarded_session(&config)? else {
                return Ok(());
            };
            let Some(profile) = session.profile() else {
                return Ok(());
            };
            let job_description = std::fs::read_to_string(&job_file)
                .with_context(|| format!("Failed to read {}", job_file.display()))?;
            let assistant = ai::Assistant::from_model(&config.model);
            let result = assistant.match_job(&profile.resume_text, &job_description);
            println!("Match score: {}%", result.score);
            print_wrapped(&result.match_reason);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::memory_session;
    use crate::simulator::TICK_INTERVAL;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Stripe", 10), "Stripe");
        assert_eq!(truncate("Frontend Engineer", 10), "Fronten...");
        assert_eq!(truncate("Zürich Zürich", 8), "Züric...");
    }

    #[test]
    fn test_cli_parses_globals_and_run() {
        let cli = Cli::try_parse_from(["hirebot", "--interval-secs", "2", "run", "--ticks", "3"]).unwrap();
        assert_eq!(cli.interval_secs, Some(2));
        assert!(matches!(cli.command, Commands::Run { ticks: Some(3), export: None }));
    }

    #[test]
    fn test_cli_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["hirebot", "run", "--interval-secs", "0"]).is_err());
    }

    #[test]
    fn test_cli_match_takes_file() {
        let cli = Cli::try_parse_from(["hirebot", "match", "job.txt"]).unwrap();
        match cli.command {
            Commands::Match { job_file } => assert_eq!(job_file, PathBuf::from("job.txt")),
            _ => panic!("expected match"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_headless_stops_after_ticks() {
        let handle = SessionHandle::new(memory_session());
        let mut out = Vec::new();

        let produced = run_headless(handle.clone(), TICK_INTERVAL, Some(3), &mut out).await.unwrap();
        assert_eq!(produced, 3);
        assert_eq!(handle.read(|s| s.applications().len()), 3);
        assert!(!handle.read(|s| s.is_auto_applying()));

        // printed in arrival order, the reverse of the newest-first store
        let printed = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = printed.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        handle.read(|s| {
            for (row, app) in rows.iter().zip(s.applications().iter().rev()) {
                assert!(row.ends_with(&describe(app)), "{row}");
            }
        });

        // the loop is gone once the run returns
        tokio::time::sleep(TICK_INTERVAL * 3).await;
        assert_eq!(handle.read(|s| s.applications().len()), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_headless_zero_ticks_returns_immediately() {
        let handle = SessionHandle::new(memory_session());
        let mut out = Vec::new();

        let produced = run_headless(handle.clone(), TICK_INTERVAL, Some(0), &mut out).await.unwrap();
        assert_eq!(produced, 0);
        assert!(handle.read(|s| s.applications().is_empty()));
        assert!(!handle.read(|s| s.is_auto_applying()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_headless_skips_existing_applications() {
        let mut session = memory_session();
        session.add_application(crate::session::tests::application("old"));
        let handle = SessionHandle::new(session);
        let mut out = Vec::new();

        let produced = run_headless(handle.clone(), TICK_INTERVAL, Some(2), &mut out).await.unwrap();
        assert_eq!(produced, 2);
        handle.read(|s| {
            assert_eq!(s.applications().len(), 3);
            assert_eq!(s.applications()[2].id, "old");
        });
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.lines().count(), 3);
    }
}
