//! gh-deploy-board CLI

use anyhow::{Context, Result};
use clap::Parser;
use gh_client::{ApiCache, ClientRegistry, DashboardService, SessionId, TokenResolver};
use gh_deploy_board::{logger, render, DashboardController, RefreshOutcome};
use gh_deploy_config::{session_store_path, AppConfig, SessionStore};
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "gh-deploy-board")]
#[command(about = "Deployments and environments of your GitHub repositories", long_about = None)]
struct Cli {
    /// Session to use (defaults to the configured session)
    #[arg(long)]
    session: Option<String>,

    /// GitHub host for Enterprise installations
    #[arg(long, env = "GH_DEPLOY_BOARD_HOST")]
    host: Option<String>,

    /// Repository to show (`owner/name`); repeat to select several
    #[arg(long = "repo", value_name = "OWNER/NAME")]
    repos: Vec<String>,

    /// Ignore cached data and fetch everything again
    #[arg(long)]
    force_refresh: bool,

    /// Print the dashboard state as JSON
    #[arg(long)]
    json: bool,

    /// Also list the repositories available for selection
    #[arg(long)]
    list_repos: bool,

    /// Forget the stored token of the session and exit
    #[arg(long)]
    sign_out: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load();

    let host = cli.host.or(config.host.clone());
    let session = SessionId::new(cli.session.unwrap_or_else(|| config.session.clone()));
    log::info!("Starting gh-deploy-board for session {}", session);

    let store = SessionStore::load(session_store_path()?)?;
    log::debug!("Using session store {:?}", store.path());
    let registry = Arc::new(ClientRegistry::new(host.clone()));
    let cache = Arc::new(Mutex::new(ApiCache::new(config.cache_ttl())));
    let service = DashboardService::new(registry, cache).with_page_size(config.effective_page_size());
    let controller = DashboardController::new(service, session, store);

    if cli.sign_out {
        controller.sign_out();
        println!("Signed out of session {}", controller.session());
        return Ok(());
    }

    let token = match controller.stored_token() {
        Some(token) => token,
        None => TokenResolver::new()
            .get_token(host.as_deref())
            .await
            .context("No GitHub token available")?,
    };

    let result = run(&controller, &token, cli.repos, cli.force_refresh).await;

    let state = controller.state();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render::render(&state, cli.list_repos));
    }

    result.map(|outcome| log::debug!("Finished with {:?}", outcome))
}

async fn run(
    controller: &DashboardController<SessionStore>,
    token: &str,
    repos: Vec<String>,
    force_refresh: bool,
) -> Result<RefreshOutcome> {
    let mut outcome = controller.sign_in(token).await?;

    if !repos.is_empty() {
        outcome = controller.select(repos).await?;
    }

    if force_refresh {
        outcome = controller.force_refresh().await?;
    }

    Ok(outcome)
}
