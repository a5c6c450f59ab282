use crate::bot;
use crate::bot::handlers::{get_user_id_safe, get_user_name, is_expense_text, Command};
use crate::bot::UnauthorizedCache;
use crate::config::{
    get_unauthorized_cache_max_size, get_unauthorized_cache_ttl, get_unauthorized_cooldown,
    BotSettings,
};
use anyhow::{anyhow, Context, Result};
use expense_bot_core::config::{ReceiptBackend, TrackerSettings};
use expense_bot_core::google::{self, DriveClient, DriveStorage, GoogleAuth, SheetsClient};
use expense_bot_core::storage::{R2Storage, ReceiptStorage};
use expense_bot_core::tracker::ExpenseTracker;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let tracker = match init_tracker(&settings).await {
        Ok(tracker) => Arc::new(tracker),
        Err(e) => {
            error!("Failed to initialize expense tracker: {e:#}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let unauthorized_cache = init_unauthorized_cache();
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![tracker, unauthorized_cache])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_tracker(settings: &BotSettings) -> Result<ExpenseTracker> {
    let core = settings.core.as_ref();
    let guard = settings.telegram.allowed_users();
    if guard.is_empty() {
        warn!("ALLOWED_USERS is empty: every message will be ignored.");
    } else {
        info!("Access guard allows {} user(s).", guard.len());
    }

    let key = core
        .credential_source()
        .load()
        .context("Failed to load Google service account credentials")?;
    let http = google::http_client().context("Failed to build HTTP client")?;
    let auth = Arc::new(GoogleAuth::new(key, http.clone()));
    info!("Google auth initialized for {}.", auth.client_email());

    let drive = DriveClient::new(Arc::clone(&auth), http.clone());
    let spreadsheet_id = resolve_spreadsheet_id(core, &drive).await?;
    info!("Using spreadsheet {spreadsheet_id}.");

    let storage = init_storage(core, drive).await?;
    let sheet = Arc::new(SheetsClient::new(auth, http, spreadsheet_id));

    Ok(ExpenseTracker::new(core, guard, storage, sheet))
}

async fn resolve_spreadsheet_id(core: &TrackerSettings, drive: &DriveClient) -> Result<String> {
    if let Some(id) = core.google_spreadsheet_id.as_ref().filter(|id| !id.is_empty()) {
        return Ok(id.clone());
    }

    drive
        .find_spreadsheet_by_name(&core.google_sheet_name)
        .await
        .context("Spreadsheet lookup failed")?
        .ok_or_else(|| {
            anyhow!(
                "Spreadsheet '{}' is not shared with the service account",
                core.google_sheet_name
            )
        })
}

async fn init_storage(
    core: &TrackerSettings,
    drive: DriveClient,
) -> Result<Arc<dyn ReceiptStorage>> {
    let storage: Arc<dyn ReceiptStorage> = match core.receipt_backend {
        ReceiptBackend::Drive => {
            let folder_id = core
                .drive_folder_id
                .clone()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| anyhow!("DRIVE_FOLDER_ID is required for the drive backend"))?;
            Arc::new(DriveStorage::new(drive, folder_id))
        }
        ReceiptBackend::R2 => Arc::new(
            R2Storage::new(core)
                .await
                .context("Failed to initialize R2 storage")?,
        ),
    };

    match storage.check_connection().await {
        Ok(()) => info!("Receipt storage ({:?}) reachable.", core.receipt_backend),
        Err(e) => error!("Receipt storage connection check returned error: {e}"),
    }
    Ok(storage)
}

fn init_unauthorized_cache() -> Arc<UnauthorizedCache> {
    let cooldown = get_unauthorized_cooldown();
    let ttl = get_unauthorized_cache_ttl();
    let max_size = get_unauthorized_cache_max_size();

    info!(
        "Initializing UnauthorizedCache (cooldown: {}s, ttl: {}s, max_size: {})",
        cooldown, ttl, max_size
    );

    Arc::new(UnauthorizedCache::new(cooldown, ttl, max_size))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            // Main branch for authorized users
            dptree::filter(|msg: Message, tracker: Arc<ExpenseTracker>| {
                tracker.guard().allows(get_user_id_safe(&msg))
            })
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo))
            .branch(
                dptree::filter(|msg: Message| msg.text().is_some_and(|t| !is_expense_text(t)))
                    .endpoint(handle_unknown_command),
            )
            .branch(
                dptree::filter(|msg: Message| msg.text().is_some_and(is_expense_text))
                    .endpoint(handle_text),
            ),
        )
        // Everyone not matched above: log, never reply
        .branch(dptree::endpoint(handle_unauthorized))
}

async fn handle_unauthorized(
    msg: Message,
    tracker: Arc<ExpenseTracker>,
    cache: Arc<UnauthorizedCache>,
) -> Result<(), teloxide::RequestError> {
    let user_id = get_user_id_safe(&msg);
    // Allowed users end up here with stickers, voice notes and the like
    if tracker.guard().allows(user_id) {
        return respond(());
    }

    let user_name = get_user_name(&msg);
    if cache.should_log(user_id, &user_name).await {
        info!(
            "⛔️ Unauthorized access from user {} ({}). Ignoring.",
            user_id, user_name
        );
    }

    respond(())
}

async fn handle_unknown_command(msg: Message) -> Result<(), teloxide::RequestError> {
    debug!(
        "Ignoring unknown command from user {}: {:?}",
        get_user_id_safe(&msg),
        msg.text()
    );
    respond(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    tracker: Arc<ExpenseTracker>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_command(bot, msg, cmd, tracker).await {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_photo(
    bot: Bot,
    msg: Message,
    tracker: Arc<ExpenseTracker>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_photo(bot, msg, tracker).await {
        error!("Photo handler error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    tracker: Arc<ExpenseTracker>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_text(bot, msg, tracker).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}
