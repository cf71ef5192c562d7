//! ballotbox - command-line client for the ballotbox voting API

mod cli;

use anyhow::{bail, Context, Result};
use ballotbox_core::gating::can_administer;
use ballotbox_core::shell::{self, Route};
use ballotbox_core::types::Role;
use ballotbox_core::{ClientConfig, ClientContext, FlowError};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "ballotbox",
    version,
    about = "Command-line client for the ballotbox voting API",
    long_about = "Log in, list polls, vote, and manage polls against a ballotbox API.\n\
                  \n\
                  The session (token and role) is kept in <state-dir>/session.json and\n\
                  reused by every later command until `ballotbox logout`.\n\
                  \n\
                  Examples:\n\
                    ballotbox register alice --role user     # Create an account\n\
                    ballotbox login alice                    # Start a session\n\
                    ballotbox polls                          # List polls and tallies\n\
                    ballotbox vote p1 o2                     # Vote for option o2 of poll p1\n\
                    ballotbox admin create --question \"Color?\" --option Red --option Blue\n\
                    ballotbox admin delete p1\n\
                  \n\
                  Environment Variables:\n\
                    BALLOTBOX_API_URL                # API base URL\n\
                    BALLOTBOX_STATE_DIR              # Where session.json and config.toml live\n\
                    BALLOTBOX_TIMEOUT_SECS           # Per-request timeout\n\
                    BALLOTBOX_PASSWORD               # Password for register/login\n\
                    BALLOTBOX_NO_COLOR               # Disable ANSI colors\n\
                    RUST_LOG                         # Log filter (logs go to stderr)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API base URL (default: http://localhost:5000/api)
    #[arg(long, global = true, env = "BALLOTBOX_API_URL")]
    api_url: Option<String>,

    /// Directory holding session.json and config.toml
    #[arg(long, global = true, env = "BALLOTBOX_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "BALLOTBOX_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "BALLOTBOX_NO_COLOR")]
    no_color: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account (does not log in)
    Register {
        username: String,
        #[arg(long, env = "BALLOTBOX_PASSWORD", hide_env_values = true)]
        password: String,
        /// user or admin
        #[arg(long, default_value = "user")]
        role: Role,
    },
    /// Log in and store the session
    Login {
        username: String,
        #[arg(long, env = "BALLOTBOX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the current session and reachable pages
    Whoami {
        #[arg(long)]
        json: bool,
    },
    /// List polls with their tallies
    Polls {
        #[arg(long)]
        json: bool,
    },
    /// Vote for an option of a poll
    Vote {
        poll_id: String,
        option_id: String,
    },
    /// Poll management (admin accounts only)
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List polls
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a poll
    Create {
        #[arg(long, short = 'q')]
        question: String,
        /// Option label, repeat for each option
        #[arg(long = "option", short = 'o')]
        options: Vec<String>,
    },
    /// Delete a poll by id
    Delete { poll_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color)?;

    let config = build_config(&cli)?;
    let ctx = ClientContext::open(config).context("Failed to open client state")?;
    let no_color = cli.no_color;

    match cli.command {
        Command::Register {
            username,
            password,
            role,
        } => run_register(&ctx, &username, &password, role).await,
        Command::Login { username, password } => run_login(&ctx, &username, &password).await,
        Command::Logout => run_logout(&ctx),
        Command::Whoami { json } => {
            println!("{}", cli::format_session(&ctx.session.get(), json));
            Ok(())
        }
        Command::Polls { json } => run_polls(&ctx, json, no_color).await,
        Command::Vote { poll_id, option_id } => {
            run_vote(&ctx, &poll_id, &option_id, no_color).await
        }
        Command::Admin { action } => run_admin(&ctx, action, no_color).await,
    }
}

fn init_tracing(verbose: u8, no_color: bool) -> Result<()> {
    tracing::subscriber::set_global_default(log_subscriber(verbose, no_color, std::io::stderr))
        .context("Failed to install log subscriber")
}

/// Logs go to `writer` (stderr in the binary) so stdout stays parseable
fn log_subscriber<W>(
    verbose: u8,
    no_color: bool,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!no_color)
        .finish()
}

/// Defaults < config.toml < flags/environment
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.state_dir {
        Some(dir) => ClientConfig::load(dir.clone()),
        None => ClientConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    if let Some(url) = &cli.api_url {
        config = config
            .with_base_url(url)
            .with_context(|| format!("Invalid --api-url '{}'", url))?;
    }
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

/// Refuse to run a flow whose page the session would be redirected away from
fn require_route(ctx: &ClientContext, route: Route) -> Result<()> {
    let landed = shell::resolve(route, &ctx.session.get());
    if landed == route {
        return Ok(());
    }
    match landed {
        Route::Login => bail!("{} requires a session: run `ballotbox login <username>`", route),
        _ => bail!(
            "{} requires an admin session: redirected to {}",
            route,
            landed
        ),
    }
}

/// Prefer the message the flow put in front of the user
fn flow_failure(err: FlowError, shown: Option<String>) -> anyhow::Error {
    match shown {
        Some(message) => anyhow::Error::new(err).context(message),
        None => anyhow::Error::new(err),
    }
}

// ============================================================================
// Auth
// ============================================================================

async fn run_register(ctx: &ClientContext, username: &str, password: &str, role: Role) -> Result<()> {
    let flow = ctx.auth_flow();
    flow.register(username, password, role)
        .await
        .map_err(|e| flow_failure(e, flow.view().error))?;

    if let Some(notice) = flow.view().notice {
        println!("{}", notice);
    }
    println!("Next: ballotbox login {}", username);
    Ok(())
}

async fn run_login(ctx: &ClientContext, username: &str, password: &str) -> Result<()> {
    let flow = ctx.auth_flow();
    let session = flow
        .login(username, password)
        .await
        .map_err(|e| flow_failure(e, flow.view().error))?;

    let role = session
        .effective_role()
        .map(|r| r.as_str())
        .unwrap_or("no role");
    println!("Logged in as {} ({})", username, role);

    let landing = if can_administer(&session) {
        Route::Admin
    } else {
        Route::Vote
    };
    println!("Landing page: {} {}", landing.title(), landing.path());
    Ok(())
}

fn run_logout(ctx: &ClientContext) -> Result<()> {
    let was_logged_in = ctx.session.get().is_authenticated();
    ctx.auth_flow()
        .logout()
        .context("Failed to remove stored session")?;
    if was_logged_in {
        println!("Logged out");
    } else {
        println!("No session to log out of");
    }
    Ok(())
}

// ============================================================================
// Voting
// ============================================================================

async fn run_polls(ctx: &ClientContext, json: bool, no_color: bool) -> Result<()> {
    require_route(ctx, Route::Vote)?;
    let flow = ctx.voting_flow();
    flow.load()
        .await
        .map_err(|e| flow_failure(e, flow.view().error))?;

    println!("{}", cli::format_poll_table(&flow.view().polls, json, no_color));
    if !json && !flow.voting_enabled() {
        eprintln!("Read-only: only user accounts can vote");
    }
    Ok(())
}

async fn run_vote(ctx: &ClientContext, poll_id: &str, option_id: &str, no_color: bool) -> Result<()> {
    require_route(ctx, Route::Vote)?;
    let flow = ctx.voting_flow();
    flow.vote(poll_id, option_id)
        .await
        .map_err(|e| flow_failure(e, flow.view().error))?;

    let view = flow.view();
    if let Some(notice) = &view.notice {
        println!("{}", notice);
    }
    let voted: Vec<_> = view.polls.into_iter().filter(|p| p.id == poll_id).collect();
    if !voted.is_empty() {
        println!("{}", cli::format_poll_table(&voted, false, no_color));
    }
    Ok(())
}

// ============================================================================
// Admin
// ============================================================================

async fn run_admin(ctx: &ClientContext, action: AdminCommand, no_color: bool) -> Result<()> {
    require_route(ctx, Route::Admin)?;
    let flow = ctx.admin_flow();

    match action {
        AdminCommand::List { json } => {
            flow.load()
                .await
                .map_err(|e| flow_failure(e, flow.view().error))?;
            println!("{}", cli::format_poll_table(&flow.view().polls, json, no_color));
        }
        AdminCommand::Create { question, options } => {
            flow.set_question(question);
            for (i, label) in options.into_iter().enumerate() {
                if i > 0 {
                    flow.add_option();
                }
                flow.set_option(i, label);
            }

            let poll = flow
                .create_poll()
                .await
                .map_err(|e| flow_failure(e, flow.view().error))?;
            if let Some(notice) = flow.view().notice {
                println!("{}", notice);
            }
            println!(
                "{}",
                cli::format_poll_table(std::slice::from_ref(&poll), false, no_color)
            );
        }
        AdminCommand::Delete { poll_id } => {
            flow.delete_poll(&poll_id)
                .await
                .map_err(|e| flow_failure(e, flow.view().error))?;
            if let Some(notice) = flow.view().notice {
                println!("{}", notice);
            }
        }
    }
    Ok(())
}
