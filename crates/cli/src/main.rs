//! Icycon CLI - log in and drive the Icycon API from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check the backend is reachable
//! icycon ping
//!
//! # Log in (password from --password or ICYCON_PASSWORD)
//! icycon login -i user@example.com
//!
//! # Show the current user and available features
//! icycon whoami
//!
//! # Quick-create a record
//! icycon create keyword-cluster --field intent="buy shoes" --field locale=en-GB
//!
//! # POST raw JSON to any endpoint
//! icycon post /api/seo/faqs/ '{"question": "Q", "answer": "A"}'
//! ```
//!
//! # Environment Variables
//!
//! - `ICYCON_API_BASE` - Backend base URL (default `http://127.0.0.1:8000`)
//! - `ICYCON_API_TIMEOUT_SECS` - Optional request timeout
//! - `ICYCON_STATE_DIR` - Where the login is remembered (default `.icycon`)
//!
//! Results are printed to stdout as JSON; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use icycon_client::{ApiClient, ClientConfig, CredentialStore, FileStorage, Session};
use icycon_core::ProfileUpdate;
use secrecy::SecretString;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::create::CreateKind;

#[derive(Parser)]
#[command(name = "icycon")]
#[command(author, version, about = "Icycon API command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the backend is reachable
    Ping,
    /// Log in and remember the credentials
    Login {
        /// Email or username
        #[arg(short, long)]
        identifier: String,

        /// Password
        #[arg(long, env = "ICYCON_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in with it
    Signup {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account username
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(long, env = "ICYCON_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored credentials
    Logout,
    /// Show the current user and their features
    Whoami,
    /// List the features available to the current user
    Features,
    /// Manage the current user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Quick-create a record
    Create {
        /// Kind of record to create
        #[arg(value_enum)]
        kind: CreateKind,

        /// Field as `key=value` (string) or `key:=value` (raw JSON)
        #[arg(short, long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// POST a JSON payload to any endpoint
    Post {
        /// Relative path or absolute URL
        endpoint: String,

        /// JSON payload
        payload: String,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update mutable profile fields
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        plan: Option<String>,

        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        brand_tone: Option<String>,
    },
    /// Upload a new avatar image
    Avatar {
        /// Image file to upload
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "icycon_cli=info,icycon_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let storage = Arc::new(FileStorage::new(config.state_dir.clone()));
    let client = ApiClient::new(&config, Arc::new(CredentialStore::new(storage)))?;
    let session = Session::new(client);

    match cli.command {
        Commands::Ping => commands::print_json(&session.client().ping().await?)?,
        Commands::Login {
            identifier,
            password,
        } => commands::auth::login(&session, &identifier, SecretString::from(password)).await?,
        Commands::Signup {
            email,
            username,
            password,
        } => {
            commands::auth::signup(&session, &email, &username, SecretString::from(password))
                .await?;
        }
        Commands::Logout => commands::auth::logout(&session),
        Commands::Whoami => commands::auth::whoami(&session).await?,
        Commands::Features => commands::auth::features(&session).await?,
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                first_name,
                last_name,
                plan,
                region,
                brand_tone,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    plan,
                    region,
                    brand_tone,
                };
                commands::profile::update(&session, &update).await?;
            }
            ProfileAction::Avatar { file } => commands::profile::avatar(&session, &file).await?,
        },
        Commands::Create { kind, fields } => {
            commands::create::create(session.client(), kind, &fields).await?;
        }
        Commands::Post { endpoint, payload } => {
            commands::create::post(session.client(), &endpoint, &payload).await?;
        }
    }
    Ok(())
}
