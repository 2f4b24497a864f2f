use anyhow::{Context, Result};
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weibo_spyder::constants::DEFAULT_HOT_GROUP;
use weibo_spyder::{Config, Spyder};

/// Number of hot posts printed alongside the boards.
const HOT_POSTS_SHOWN: usize = 10;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(api_base = %config.api_base, search_base = %config.search_base, "Configuration loaded");

    if !config.cookies_path.exists() {
        warn!(
            path = %config.cookies_path.display(),
            "Cookie file not found - log in and save the Cookie header there"
        );
    }
    let spyder = Spyder::from_config(&config).with_context(|| {
        format!(
            "Failed to load session from {}",
            config.cookies_path.display()
        )
    })?;

    let hot_band = spyder
        .hot_band()
        .await
        .context("Failed to fetch trending board")?;
    let topic_band = spyder
        .topic_band()
        .await
        .context("Failed to fetch topic board")?;
    let hot_posts = spyder
        .hot_posts(DEFAULT_HOT_GROUP, HOT_POSTS_SHOWN)
        .await
        .with_context(|| format!("Failed to fetch hot posts of {DEFAULT_HOT_GROUP}"))?;

    info!(
        band = hot_band.band_list.len(),
        topics = topic_band.len(),
        posts = hot_posts.len(),
        "Fetched boards"
    );

    let output = json!({
        "hot_band": hot_band,
        "topic_band": topic_band,
        "hot_posts": hot_posts,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,weibo_spyder=info"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays valid JSON
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
