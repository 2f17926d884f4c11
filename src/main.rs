use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use postboard::blog::domain::NewGroup;
use postboard::config::{Cli, Command, Config};
use postboard::db;
use postboard::routes;
use postboard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    let state = AppState::new(pool, config.clone());

    match cli.command {
        Some(Command::AddGroup {
            title,
            slug,
            description,
        }) => add_group(&state, &title, &slug, &description).await,
        Some(Command::Serve) | None => serve(state, &config).await,
    }
}

async fn add_group(
    state: &AppState,
    title: &str,
    slug: &str,
    description: &str,
) -> anyhow::Result<()> {
    let group = NewGroup::new(title, slug, description)?;
    let created = state.blog.add_group(&group).await?;
    println!("Created group \"{}\" at /group/{}/", created.title, created.slug);
    Ok(())
}

async fn serve(state: AppState, config: &Config) -> anyhow::Result<()> {
    let app = routes::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
