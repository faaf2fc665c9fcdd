mod config;
mod health;
mod logging;
mod retry;
mod telegram;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use escrow_bot::BotState;
use escrow_db::Database;

use crate::config::Config;
use crate::telegram::TelegramMessenger;

type EscrowDispatcher = escrow_bot::Dispatcher<TelegramMessenger>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            eprintln!("       Set it in your environment or .env file and restart.");
            std::process::exit(1);
        }
    };

    let _log_guard = logging::init(config.log_dir.as_deref());
    info!("Starting escrow bot v{}", env!("CARGO_PKG_VERSION"));

    // Store
    let db_path = config.database_path.clone();
    let db = retry::retry("Database connection", &config.store_retry, || {
        let path = db_path.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                let db = Database::open(&path)?;
                db.ping()?;
                Ok::<_, anyhow::Error>(db)
            })
            .await?
        }
    })
    .await?;
    info!("Database ready at {}", config.database_path.display());

    // Health sidecar, best effort
    if let Err(e) = health::spawn(&config.health_host, config.health_port).await {
        warn!("Health server unavailable (non-critical): {:#}", e);
    }

    // Bot session
    let bot = Bot::new(&config.bot_token);
    let me = retry::retry("Bot session check", &config.bot_retry, || async {
        bot.get_me().await
    })
    .await?;
    let bot_username = me.user.username.clone();
    info!(
        "Authorized as @{}",
        bot_username.as_deref().unwrap_or("<no username>")
    );

    if let Err(e) = bot.set_my_commands(telegram::command_menu()).await {
        warn!("Could not register the command menu: {}", e);
    }
    if let Err(e) = bot.delete_webhook().drop_pending_updates(true).await {
        warn!("Could not drop pending updates: {}", e);
    }

    let state = BotState::new(Arc::new(db), TelegramMessenger::new(bot.clone()), bot_username);
    let escrow = EscrowDispatcher::new(state);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let mut updates = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![escrow])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build();

    let shutdown = updates.shutdown_token();
    tokio::spawn(async move {
        terminate_signal().await;
        info!("Received SIGTERM, shutting down...");
        if let Ok(stopped) = shutdown.shutdown() {
            stopped.await;
        }
    });

    info!("Polling for updates");
    updates.dispatch().await;
    info!("Bot stopped");

    Ok(())
}

async fn on_message(msg: Message, escrow: EscrowDispatcher) -> ResponseResult<()> {
    if let Some(event) = telegram::inbound_message(&msg) {
        escrow.handle(event).await;
    }
    Ok(())
}

async fn on_callback(query: CallbackQuery, escrow: EscrowDispatcher) -> ResponseResult<()> {
    if let Some(event) = telegram::inbound_callback(&query) {
        escrow.handle(event).await;
    }
    Ok(())
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
