//! Wiring & DI. Entry point: pick the backend adapter, build the pages, run the UI.
//! No business logic here.

use dotenv::dotenv;
use expense_splitter::adapters::http::{HttpClient, RestExpenseApi};
use expense_splitter::adapters::memory::InMemoryExpenseApi;
use expense_splitter::adapters::ui::tui::TuiInputPort;
use expense_splitter::ports::{ExpenseApi, InputPort};
use expense_splitter::shared::config::AppConfig;
use expense_splitter::usecases::{
    BalancesPage, ExpensesPage, GroupDetailPage, GroupsPage, ReceiptsPage,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
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

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        AppConfig::default()
    });

    // --- Backend: HTTP by default, in-memory demo data when offline ---
    let api: Arc<dyn ExpenseApi> = if cfg.is_offline() {
        warn!("EXPENSE_SPLITTER_OFFLINE is set, using the in-memory demo backend");
        Arc::new(InMemoryExpenseApi::demo())
    } else {
        let base_url = cfg.api_base_url();
        let origin = cfg.origin_or_default();
        let timeout = cfg.request_timeout();
        info!(
            base_url = %base_url,
            origin = %origin,
            timeout_ms = timeout.as_millis() as u64,
            "using REST backend"
        );
        let http = HttpClient::new(base_url, origin, timeout)
            .map_err(|e| anyhow::anyhow!("HTTP client setup failed: {}", e))?;
        Arc::new(RestExpenseApi::new(http))
    };

    expense_splitter::adapters::ui::init_ui();

    // --- Pages ---
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        Arc::new(GroupsPage::new(Arc::clone(&api))),
        Arc::new(GroupDetailPage::new(Arc::clone(&api))),
        Arc::new(ExpensesPage::new(Arc::clone(&api))),
        Arc::new(ReceiptsPage::new(Arc::clone(&api))),
        Arc::new(BalancesPage::new(Arc::clone(&api))),
    ));

    // --- Run (main menu -> Groups / Expenses / Receipts / Balances) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("bye");
    Ok(())
}
