use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{issue_token, Claims};
use crate::cli::output::output_result;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint a signed session token with the configured secret")]
    Mint {
        #[arg(long, help = "User id (uuid)")]
        user: Uuid,
        #[arg(long, help = "Email address")]
        email: String,
        #[arg(long, help = "Lifetime in hours (defaults to AUTH_TOKEN_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

#[derive(Debug, Serialize)]
struct MintedToken {
    token: String,
    expires_at: i64,
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Mint { user, email, hours } => {
            let config = AppConfig::from_env();
            let hours = hours.unwrap_or(config.auth.token_expiry_hours);

            let claims = Claims::new(user, email, hours)?;
            let token = issue_token(&config.auth.jwt_secret, &claims).context("failed to mint token")?;

            output_result(
                output_format,
                &MintedToken {
                    token,
                    expires_at: claims.exp,
                },
                |minted| println!("{}", minted.token),
            )
        }
    }
}
