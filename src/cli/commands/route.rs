use anyhow::Context;
use clap::Subcommand;
use std::time::Duration;

use crate::cli::output::output_result;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::edge::{EdgeRouter, RouteDecision, RoutingTableCache};
use crate::state::routing_source;

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "Show where the edge router would send a request path")]
    Resolve {
        #[arg(help = "Request path, e.g. /inventory/items")]
        path: String,
        #[arg(long, help = "Raw query string without the leading '?'")]
        query: Option<String>,
        #[arg(long, help = "Treat the request as carrying a session")]
        session: bool,
    },
}

pub async fn handle(cmd: RouteCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RouteCommands::Resolve { path, query, session } => {
            let config = AppConfig::from_env();
            let http = reqwest::Client::builder()
                .build()
                .context("failed to build HTTP client")?;

            let source = routing_source(&config, http)?;
            let cache = RoutingTableCache::new(
                source,
                Duration::from_secs(config.routing.cache_ttl_secs),
                Duration::from_millis(config.routing.fetch_timeout_ms),
            );
            let router = EdgeRouter::new(cache, config.routing.unavailable_path.clone());

            let path = if path.starts_with('/') { path } else { format!("/{}", path) };
            let decision = router.decide(&path, query.as_deref(), session).await;
            let origin = router.table().await.origin();

            output_result(output_format, &decision, |decision| match decision {
                RouteDecision::Proxy { prefix, url } => println!("proxy /{} -> {} ({:?} table)", prefix, url, origin),
                RouteDecision::Unavailable { prefix, location } => {
                    println!("unavailable /{} -> redirect {} ({:?} table)", prefix, location, origin)
                }
                RouteDecision::PassThrough => println!("pass-through (handled locally)"),
            })
        }
    }
}
