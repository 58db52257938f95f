//! Serenity CLI - bearer token authority for the Serenity API
//!
//! Runs the token-guarded HTTP API and offers operator commands to issue,
//! inspect and rotate tokens.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serenity_api::{ApiServer, ApiServerConfig};
use serenity_auth::{
    parse_algorithm, AuthorityConfig, ClaimValue, ExtraClaims, TokenAuthority,
    DEFAULT_ACCESS_TTL_SECONDS,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SERENITY_GIT_HASH"),
    ", built ",
    env!("SERENITY_BUILD_TIME"),
    ")"
);

/// Serenity - issue and verify bearer tokens for the Serenity API
#[derive(Parser, Debug)]
#[command(name = "serenity")]
#[command(about = "Serenity - issue and verify bearer tokens for the Serenity API")]
#[command(version = VERSION)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Token signing secret (at least 16 bytes, never a placeholder)
    #[arg(long, env = "SERENITY_JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Signing algorithm (HS256, HS384 or HS512)
    #[arg(long, env = "SERENITY_JWT_ALGORITHM", default_value = "HS256")]
    algorithm: String,

    /// Access token lifetime in seconds
    #[arg(long, env = "SERENITY_ACCESS_TTL", default_value_t = DEFAULT_ACCESS_TTL_SECONDS)]
    access_ttl: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (refresh and identity endpoints)
    #[command(long_about = r#"
Run the HTTP API. Protected routes require an "Authorization: Bearer <token>"
header carrying a valid access token.

EXAMPLES:
  serenity --secret "$SERENITY_JWT_SECRET" serve --bind 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  SERENITY_JWT_SECRET     Token signing secret
  SERENITY_JWT_ALGORITHM  Signing algorithm (default HS256)
  SERENITY_ACCESS_TTL     Access token lifetime in seconds (default 86400)
  SERENITY_BIND           Address to bind the API server
    "#)]
    Serve {
        /// Address to bind the API server
        #[arg(long, env = "SERENITY_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Disable CORS for local development origins
        #[arg(long)]
        no_cors: bool,
    },

    /// Issue an access/refresh pair for a subject
    Issue {
        /// Subject (user) identifier
        #[arg(long)]
        subject: String,

        /// Extra access token claim as key=value (repeatable)
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, ClaimValue)>,
    },

    /// Validate a token and print its claims
    Verify {
        /// Token to validate
        #[arg(long)]
        token: String,
    },

    /// Exchange a refresh token for a new pair
    Refresh {
        /// Refresh token to rotate
        #[arg(long)]
        token: String,
    },
}

/// Parse a `key=value` claim argument
fn parse_claim(raw: &str) -> Result<(String, ClaimValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid claim '{}': expected key=value", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid claim '{}': empty key", raw));
    }

    let value = value
        .parse::<ClaimValue>()
        .unwrap_or_else(|never| match never {});

    Ok((key.to_string(), value))
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the authority configuration once at start-up
fn build_authority(cli: &Cli) -> Result<TokenAuthority> {
    let algorithm = parse_algorithm(&cli.algorithm).context("Invalid signing algorithm")?;

    let config = AuthorityConfig::new(cli.secret.as_bytes())
        .with_algorithm(algorithm)
        .with_access_ttl(cli.access_ttl);

    TokenAuthority::new(config).context("Invalid token authority configuration")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let authority = build_authority(&cli)?;

    match cli.command {
        Commands::Serve { bind, no_cors } => {
            info!("Serenity {} starting...", VERSION);
            info!("Signing algorithm: {:?}", authority.config().algorithm());
            info!(
                "Access token TTL: {}s",
                authority.config().access_ttl_seconds()
            );

            let server = ApiServer::new(
                ApiServerConfig {
                    bind_addr: bind,
                    enable_cors: !no_cors,
                },
                Arc::new(authority),
            );

            tokio::select! {
                result = server.start() => {
                    if let Err(e) = result {
                        error!("API server error: {:#}", e);
                        return Err(e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down...");
                }
            }

            info!("Serenity stopped");
            Ok(())
        }
        Commands::Issue { subject, claims } => {
            let extra: ExtraClaims = claims.into_iter().collect();
            let pair = authority
                .issue_pair(&subject, Some(&extra))
                .with_context(|| format!("Failed to issue tokens for '{}'", subject))?;
            print_json(&pair)
        }
        Commands::Verify { token } => match authority.validate(&token) {
            Ok(claims) => {
                info!(
                    "Token valid for {} more seconds",
                    authority.remaining_seconds(&claims)
                );
                print_json(&claims)
            }
            Err(e) => anyhow::bail!("Token rejected: {} ({})", e, e.code()),
        },
        Commands::Refresh { token } => match authority.refresh(&token) {
            Ok(pair) => print_json(&pair),
            Err(e) => anyhow::bail!("Refresh rejected: {} ({})", e, e.code()),
        },
    }
}
