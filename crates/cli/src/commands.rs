//! CLI commands

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use kith_http::client::auth::{LoginRequest, SendOtpRequest, VerifyOtpRequest};
use kith_http::{KithClient, KithClientBuilder};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Send one API request through the session layer
    Request {
        /// HTTP method
        #[arg(value_enum, ignore_case = true)]
        method: HttpMethod,

        /// Path relative to the API base URL, e.g. /events/42
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Access token to start the session with
        #[arg(long, env = "KITH_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Sign in with a password
    Login {
        /// Email address or phone number
        #[arg(long)]
        identifier: String,

        #[arg(long, env = "KITH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Fetch this path with the new session afterwards
        #[arg(long)]
        then: Option<String>,
    },

    /// One-time code sign-in
    Otp {
        #[command(subcommand)]
        command: OtpCommands,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum OtpCommands {
    /// Ask the server to send a code
    Send {
        #[arg(long)]
        identifier: String,
    },

    /// Exchange a code for a session
    Verify {
        #[arg(long)]
        identifier: String,

        #[arg(long)]
        code: String,

        /// Fetch this path with the new session afterwards
        #[arg(long)]
        then: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate a client configuration file with default values
    Generate {
        /// Output file path (defaults to DATA_DIR/client.json)
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Commands {
    pub async fn execute(self, data_dir: PathBuf, config_file: Option<PathBuf>) -> Result<()> {
        match self {
            Self::Config { command } => command.execute(&data_dir),
            Self::Request {
                method,
                path,
                body,
                token,
            } => {
                let builder = client_builder(config_file, &data_dir)?;
                let builder = match token {
                    Some(token) => builder.access_token(token),
                    None => builder,
                };
                let body = body.as_deref().map(parse_body).transpose()?;
                let response = send_request(&builder.build()?, method, &path, body).await?;
                print_json(&response)
            }
            Self::Login {
                identifier,
                password,
                then,
            } => {
                let client = client_builder(config_file, &data_dir)?.build()?;
                let response = client
                    .login(&LoginRequest {
                        identifier,
                        password,
                    })
                    .await
                    .context("Sign-in failed")?;
                report_sign_in(&client, response.message.as_deref());
                follow_up(&client, then).await
            }
            Self::Otp { command } => {
                command
                    .execute(client_builder(config_file, &data_dir)?.build()?)
                    .await
            }
        }
    }
}

impl OtpCommands {
    pub async fn execute(self, client: KithClient) -> Result<()> {
        match self {
            Self::Send { identifier } => {
                let response = client
                    .send_otp(&SendOtpRequest { identifier })
                    .await
                    .context("Failed to request a code")?;
                println!(
                    "{}",
                    response.message.as_deref().unwrap_or("Code sent")
                );
                Ok(())
            }
            Self::Verify {
                identifier,
                code,
                then,
            } => {
                let response = client
                    .verify_otp(&VerifyOtpRequest { identifier, code })
                    .await
                    .context("Code verification failed")?;
                report_sign_in(&client, response.message.as_deref());
                follow_up(&client, then).await
            }
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, data_dir: &Path) -> Result<()> {
        match self {
            Self::Generate { output } => {
                let path = output.unwrap_or_else(|| data_dir.join(config::CONFIG_FILE));
                config::generate_default_config(&path)?;
                println!("Configuration written to {}", path.display());
                Ok(())
            }
        }
    }
}

/// Builder seeded from the configuration file and environment
fn client_builder(config_file: Option<PathBuf>, data_dir: &Path) -> Result<KithClientBuilder> {
    let config = config::load_client_config(config_file, data_dir)?;
    info!(base_url = %config.base_url, "Using Kith API");
    Ok(KithClientBuilder::from_config(&config))
}

fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("--body must be valid JSON")
}

async fn send_request(
    client: &KithClient,
    method: HttpMethod,
    path: &str,
    body: Option<Value>,
) -> Result<Value> {
    let body = body.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    let response = match method {
        HttpMethod::Get => client.get(path).await,
        HttpMethod::Delete => client.delete(path).await,
        HttpMethod::Post => client.post(path, &body).await,
        HttpMethod::Put => client.put(path, &body).await,
        HttpMethod::Patch => client.patch(path, &body).await,
    };
    response.with_context(|| format!("{method:?} {path} failed"))
}

fn report_sign_in(client: &KithClient, message: Option<&str>) {
    let tokens = client.session().tokens();
    match tokens.expires_at_ms() {
        Some(expires_at_ms) => info!(expires_at_ms, "Signed in"),
        None if tokens.token().is_some() => info!("Signed in; token expiry unknown"),
        None => info!("Signed in without an access token"),
    }
    if let Some(message) = message {
        println!("{message}");
    }
}

async fn follow_up(client: &KithClient, then: Option<String>) -> Result<()> {
    let Some(path) = then else {
        return Ok(());
    };
    let response = send_request(client, HttpMethod::Get, &path, None).await?;
    print_json(&response)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
