//! amc-session - terminal front end for the AMC admin console session.
//!
//! Signs in against the auth authority, inspects the stored token, and can
//! keep a session alive the way an open admin page does.

use std::io::{self, Write};
use std::sync::Arc;

use amc_session_core::auth::{open_store, NavigationEvent, SessionState};
use amc_session_core::config::StoreBackend;
use amc_session_core::{ApiClient, Config, LogoutAction, Navigator, PathNavigator, SessionController, SessionWatcher};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "amc-session", version, about = "Manage the AMC admin console session")]
struct Cli {
    /// Auth server base URL (overrides config and AMC_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the token slot lives
    #[arg(long, global = true, value_enum)]
    store: Option<StoreArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    File,
    Keyring,
    Memory,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::File => StoreBackend::File,
            StoreArg::Keyring => StoreBackend::Keyring,
            StoreArg::Memory => StoreBackend::Memory,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the issued token
    Login {
        #[arg(long)]
        username: Option<String>,
    },
    /// Show the current session
    Status,
    /// Print the raw stored token
    Token,
    /// Print the headers to attach to API requests
    Headers,
    /// Exchange the stored token for a fresh one
    Refresh {
        /// Page the session is viewed from
        #[arg(long, default_value = "/admin/dashboard")]
        path: String,
    },
    /// Clear the stored token
    Logout {
        /// Page the logout happens on
        #[arg(long, default_value = "/admin/dashboard")]
        path: String,
    },
    /// Keep the session alive until Ctrl-C
    Watch {
        /// Page the session is viewed from
        #[arg(long, default_value = "/admin/dashboard")]
        path: String,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(store) = cli.store {
        config.store = store.into();
    }

    let path = match &cli.command {
        Command::Refresh { path } | Command::Logout { path } | Command::Watch { path } => path.clone(),
        _ => "/admin".to_string(),
    };

    let store = open_store(&config)?;
    let api = ApiClient::from_config(&config)?;
    let navigator = Arc::new(PathNavigator::new(path));
    let controller = Arc::new(SessionController::new(store, api, navigator.clone()));

    match cli.command {
        Command::Login { username } => login(&controller, &mut config, username).await?,
        Command::Status => print_status(&controller),
        Command::Token => match controller.token() {
            Some(token) => println!("{}", token),
            None => println!("No token stored"),
        },
        Command::Headers => {
            for (name, value) in controller.auth_headers().iter() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
        }
        Command::Refresh { .. } => {
            controller.refresh().await;
            print_status(&controller);
            print_navigation(&navigator);
        }
        Command::Logout { .. } => {
            let action = controller.logout();
            println!("Signed out");
            if action == LogoutAction::None {
                println!("Staying on {}", navigator.current_path());
            }
            print_navigation(&navigator);
        }
        Command::Watch { .. } => watch(controller, &config, &navigator).await?,
    }

    Ok(())
}

async fn login(
    controller: &SessionController,
    config: &mut Config,
    username: Option<String>,
) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let landing = controller
        .login(&username, &password)
        .await
        .context("Login failed")?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    println!("Signed in, continue at {}", landing);
    Ok(())
}

async fn watch(controller: Arc<SessionController>, config: &Config, navigator: &PathNavigator) -> Result<()> {
    info!(path = %navigator.current_path(), "Watching session");
    println!(
        "Watching session from {} every {}s (Ctrl-C to stop)",
        navigator.current_path(),
        config.check_interval().as_secs()
    );

    let watcher = SessionWatcher::spawn(controller.clone(), config.check_interval());
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    watcher.shutdown().await;

    print_status(&controller);
    print_navigation(navigator);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_status(controller: &SessionController) {
    match controller.session_state() {
        SessionState::Valid(claims) => {
            let minutes_left = (claims.exp - Utc::now().timestamp()).max(0) / 60;
            println!("Signed in as {} ({})", claims.sub, claims.role);
            match claims.expires_at() {
                Some(at) => println!("Expires {} ({}m left)", at.format("%Y-%m-%d %H:%M:%S UTC"), minutes_left),
                None => println!("Expires in {}m", minutes_left),
            }
        }
        SessionState::NoSession if controller.token().is_some() => {
            println!("Stored token is expired or unreadable");
        }
        SessionState::NoSession => println!("Not signed in"),
    }
}

fn print_navigation(navigator: &PathNavigator) {
    for event in navigator.history() {
        match event {
            NavigationEvent::Navigated(path) => println!("-> navigated to {}", path),
            NavigationEvent::Reloaded(path) => println!("-> reloaded {}", path),
        }
    }
}
