//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI or API.
//! No business logic here.
//!
//! `timetable-sync`        interactive client (cohort picker, week view, reminders)
//! `timetable-sync serve`  JSON API (`/resolve-options`, `/fetch-timetable`)

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use timetable_sync::adapters::http::{AppState, create_router};
use timetable_sync::adapters::notify::TerminalNotifier;
use timetable_sync::adapters::persistence::JsonReminderStore;
use timetable_sync::adapters::portal::{OptionsResolver, PortalClient, TimetableFetcher};
use timetable_sync::adapters::system_clock::SystemClock;
use timetable_sync::adapters::ui::tui::TuiInputPort;
use timetable_sync::ports::{InputPort, OptionsPort, ReminderStatePort, TimetablePort};
use timetable_sync::shared::config::{AppConfig, PortalConfig};
use timetable_sync::usecases::{ReminderService, ScheduleReader, TimetableService};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Single-threaded: every suspension point is a network round-trip or a timer wait.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_default();
    let serve = std::env::args().nth(1).is_some_and(|arg| arg == "serve");

    // --- Portal adapters (one HTTP client, shared) ---
    let portal_config = PortalConfig::from(&cfg);
    info!(base_url = %portal_config.base_url, "timetable portal");
    let client = Arc::new(
        PortalClient::new(portal_config).map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    let options: Arc<dyn OptionsPort> = Arc::new(OptionsResolver::new(Arc::clone(&client)));
    let timetable: Arc<dyn TimetablePort> = Arc::new(TimetableFetcher::new(Arc::clone(&client)));

    if serve {
        return run_server(&cfg, options, timetable).await;
    }

    // --- Reminder state (profile-scoped, shared by every instance on this machine) ---
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let state_path = data_path.join("reminders.json");
    info!(path = %state_path.display(), "reminder state");
    let store_impl = JsonReminderStore::new(&state_path);
    store_impl
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let store: Arc<dyn ReminderStatePort> = Arc::new(store_impl);

    let reminders = Arc::new(ReminderService::new(
        Arc::clone(&timetable),
        Arc::clone(&store),
        Arc::new(TerminalNotifier::new()),
        Arc::new(SystemClock),
    ));

    timetable_sync::adapters::ui::init_ui();

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        options,
        ScheduleReader::new(timetable, Arc::clone(&store)),
        reminders,
        store,
        cfg.lead_minutes_or_default(),
        cfg.profile(),
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

async fn run_server(
    cfg: &AppConfig,
    options: Arc<dyn OptionsPort>,
    timetable: Arc<dyn TimetablePort>,
) -> anyhow::Result<()> {
    let service = Arc::new(TimetableService::new(options, timetable));
    let router = create_router(AppState::new(service));

    let addr = cfg.bind_addr_or_default();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {}: {}", addr, e))?;
    info!(addr = %addr, "JSON API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
