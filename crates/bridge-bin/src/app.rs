//! Command implementations.

use std::sync::Arc;

use anyhow::{bail, Context};
use bridge_config_and_utils::{Config, Paths};
use clap::Args;
use fb_auth_reconciler::{
    parse_authenticated, render_authenticated, AuthResponse, BridgeResult, ConnectionStatus,
    ExposeFormat, FacebookAuthManager, GraphProfileFetcher, Navigation, Outcome, StatusEvent,
    AUTH_RESPONSE_CHANGE,
};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use crate::navigator::{describe, ReportingNavigator};
use crate::sdk::ScriptedSdk;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Facebook application id
    #[arg(long)]
    pub app_id: String,

    /// Base URL the endpoints are resolved against
    #[arg(long)]
    pub base_url: Option<String>,

    /// Login-check endpoint
    #[arg(long, default_value = "/login_check")]
    pub login_endpoint: String,

    /// Logout endpoint
    #[arg(long, default_value = "/logout")]
    pub logout_endpoint: String,

    /// Where to go after a successful login
    #[arg(long, default_value = "/")]
    pub target_endpoint: String,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// SDK status (connected, not_authorized, unknown)
    #[arg(long)]
    pub status: String,

    /// Provider user id, sent with a connected status
    #[arg(long)]
    pub user_id: Option<String>,

    /// Provider access token, sent with a connected status
    #[arg(long, env = "FB_BRIDGE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Whether the firewall session is authenticated
    #[arg(long, action = clap::ArgAction::Set, conflicts_with = "authenticated_url")]
    pub authenticated: Option<bool>,

    /// Endpoint serving the JSON "is authenticated" fragment
    #[arg(long)]
    pub authenticated_url: Option<Url>,

    /// URL of the page hosting the bridge, for the login-page guard
    #[arg(long)]
    pub current_url: Option<Url>,

    /// Forward the friends list with the profile (needs graph_api_url)
    #[arg(long)]
    pub friends: bool,
}

/// What one reconcile run did.
#[derive(Debug)]
pub struct ReconcileReport {
    pub outcomes: Vec<BridgeResult<Outcome>>,
    pub navigations: Vec<Navigation>,
}

/// Write the config file, keeping settings the flags do not cover.
pub fn init(mut config: Config, paths: &Paths, args: InitArgs) -> anyhow::Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !args.force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            config_file.display()
        );
    }

    config.provider.app_id = Some(args.app_id);
    if args.base_url.is_some() {
        config.routes.base_url = args.base_url;
    }
    config.routes.login_endpoint = Some(args.login_endpoint);
    config.routes.logout_endpoint = Some(args.logout_endpoint);
    config.routes.target_endpoint = Some(args.target_endpoint);

    config.save(paths)?;
    info!(path = %config_file.display(), "Config written");
    println!("Wrote {}", config_file.display());
    Ok(())
}

/// Validate the configuration the same way `load` would.
pub fn check(config: &Config) -> anyhow::Result<()> {
    let manager = FacebookAuthManager::new(
        Arc::new(ScriptedSdk::new(Vec::new())),
        Arc::new(ReportingNavigator::default()),
        false,
    );

    let provider = manager.configure(&config.provider);
    let routes = manager.set_routes(&config.routes);

    match &provider {
        Ok(provider) => {
            println!("Provider");
            println!("  App ID:      {}", provider.app_id);
            println!("  Locale:      {}", provider.locale);
            println!("  Script:      {}", provider.script_url());
            println!("  Auto logout: {}", provider.auto_logout);
        }
        Err(e) => println!("Provider: {}", e),
    }
    match &routes {
        Ok(routes) => {
            println!("Routes");
            println!("  Login:  {}", routes.login_endpoint);
            println!("  Logout: {}", routes.logout_endpoint);
            println!("  Target: {}", routes.target_endpoint);
            if let Some(login_page) = &routes.login_page {
                println!("  Login page: {}", login_page);
            }
        }
        Err(e) => println!("Routes: {}", e),
    }

    if !manager.is_ready() {
        bail!("The bridge is not ready to be loaded");
    }
    println!("Ready");
    Ok(())
}

/// Run one status event through the bridge and print what it did.
pub async fn reconcile(config: &Config, args: ReconcileArgs) -> anyhow::Result<()> {
    let report = run_reconcile(config, args).await?;

    let mut failed = false;
    for outcome in &report.outcomes {
        match outcome {
            Ok(outcome) => println!("{}", describe_outcome(outcome)),
            Err(e) => {
                failed = true;
                println!("error: {}", e);
            }
        }
    }
    for navigation in &report.navigations {
        println!("navigation: {}", describe(navigation));
    }

    if failed {
        bail!("The exchange did not complete");
    }
    Ok(())
}

/// Build the manager, run load and SDK-ready, and deliver one status event.
async fn run_reconcile(config: &Config, args: ReconcileArgs) -> anyhow::Result<ReconcileReport> {
    let http_client = Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let authenticated = match (args.authenticated, &args.authenticated_url) {
        (Some(flag), _) => flag,
        (None, Some(url)) => fetch_authenticated(&http_client, url).await?,
        (None, None) => false,
    };
    let event = status_event(&args.status, args.user_id, args.access_token);
    info!(status = %event.status, authenticated, "Reconciling status event");

    let sdk = Arc::new(ScriptedSdk::new(vec![(
        AUTH_RESPONSE_CHANGE.to_string(),
        event,
    )]));
    let navigator = Arc::new(ReportingNavigator::default());

    let mut manager = FacebookAuthManager::new(sdk.clone(), navigator.clone(), authenticated)
        .with_http_client(http_client.clone());
    if let Some(graph_api_url) = config.graph_api_url()? {
        manager = manager.with_profile_fetcher(Arc::new(
            GraphProfileFetcher::new(http_client, graph_api_url).with_friends(args.friends),
        ));
    } else if args.friends {
        warn!("--friends has no effect without graph_api_url");
    }
    if let Some(current_url) = args.current_url {
        manager = manager.with_current_url(current_url);
    }

    manager.configure(&config.provider)?;
    manager.set_routes(&config.routes)?;
    manager.load()?;
    manager.on_sdk_ready()?;
    sdk.replay();

    let outcomes = manager.process_pending_events().await;
    Ok(ReconcileReport {
        outcomes,
        navigations: navigator.navigations(),
    })
}

/// Print the page fragment.
pub fn expose(authenticated: bool, format: &str) -> anyhow::Result<()> {
    let format: ExposeFormat = format.parse()?;
    println!("{}", render_authenticated(authenticated, format));
    Ok(())
}

async fn fetch_authenticated(http_client: &Client, url: &Url) -> anyhow::Result<bool> {
    let response = http_client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    if !response.status().is_success() {
        bail!("{} answered HTTP {}", url, response.status());
    }
    let body = response.text().await?;
    Ok(parse_authenticated(&body)?)
}

fn status_event(
    status: &str,
    user_id: Option<String>,
    access_token: Option<String>,
) -> StatusEvent {
    let status = ConnectionStatus::from(status.to_string());
    let auth_response = match (user_id, access_token) {
        (Some(user_id), Some(access_token)) => Some(AuthResponse::new(user_id, access_token)),
        (None, None) => None,
        _ => {
            warn!("Both --user-id and --access-token are needed for an auth response");
            None
        }
    };
    StatusEvent {
        status,
        auth_response,
    }
}

fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::NoOp(reason) => format!("no-op: {:?}", reason),
        Outcome::LoggedIn { result, .. } if result.is_registration() => "registered".to_string(),
        Outcome::LoggedIn { .. } => "logged in".to_string(),
        Outcome::LoggedOut(_) => "logged out".to_string(),
        Outcome::Suppressed(state) => format!("suppressed: page is {:?}", state),
    }
}
