//! BlogForge - blog article scraping and LLM-assisted rewriting.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must load before anything reads provider credentials
    let _ = dotenvy::dotenv();

    let default_filter = if blogforge::cli::is_verbose() {
        "blogforge=info"
    } else {
        "blogforge=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    blogforge::cli::run().await
}
