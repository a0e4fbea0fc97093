use jade_leaderboard::{
    handlers::create_router,
    services::{run_poll_loop, ChainReader, LeaderboardBot, LeaderboardPublisher, TelegramClient},
    utils, Config,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;

    let reader = ChainReader::from_config(&config.chain)?;
    info!(
        "⛓ Reading contract {} through {} RPC endpoints",
        config.chain.contract_address,
        reader.endpoint_count()
    );
    // polling reconnects on its own, so a failed first connect is not fatal
    if let Err(e) = reader.connect().await {
        warn!("Starting without a live RPC endpoint: {}", e);
    }

    let telegram = TelegramClient::from_config(&config.telegram)?;
    let publisher = LeaderboardPublisher::from_config(Arc::new(telegram), &config.telegram);
    let bot = Arc::new(LeaderboardBot::new(Arc::new(reader), publisher, &config.leaderboard));

    info!(
        "📊 Publishing leaderboard to {} every {}s",
        config.telegram.leaderboard_chat_id,
        config.leaderboard.poll_interval.as_secs()
    );
    tokio::spawn(run_poll_loop(bot.clone()));

    let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok();
    let app = create_router(bot, allowed_origins.as_deref());

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", config.port)).await?;
    info!("Server running on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
