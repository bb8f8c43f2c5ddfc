//! Equipment inventory report
//!
//! Loads the collection from the configured backend and logs a summary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_inventory::{
    config::AppConfig,
    domain::listing::{derive_view, insights, integrity_report, FilterCriteria},
    services::EquipmentService,
    transport::HttpTransport,
};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("equipment_inventory={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config);

    tracing::info!("Starting equipment inventory v{}", env!("CARGO_PKG_VERSION"));

    let transport = HttpTransport::new(&config.api)?;
    tracing::info!(base_url = %transport.base_url(), "using backend");
    let service = EquipmentService::new(transport);

    let items = service.list().await?;
    let view = derive_view(&items, &FilterCriteria::default());
    let summary = insights(&items);
    tracing::info!(
        total = view.stats.total,
        in_use = view.stats.by_status.in_use,
        on_loan = view.stats.by_status.on_loan,
        available = view.stats.by_status.available,
        disposed = view.stats.by_status.disposed,
        utilization = format!("{:.1}%", summary.utilization_rate()),
        "inventory loaded"
    );
    for (category, count, share) in summary.category_shares() {
        tracing::info!(%category, count, share = format!("{:.1}%", share), "category");
    }

    let report = integrity_report(&items);
    for item in &report.inconsistent {
        tracing::warn!(id = %item.id(), name = %item.name(), "on loan without a borrower");
    }
    for item in &report.borrower_without_loan {
        tracing::warn!(id = %item.id(), status = %item.status(), "borrower set on an item that is not lent out");
    }
    for item in &report.empty_stock {
        tracing::warn!(id = %item.id(), name = %item.name(), "quantity is zero");
    }
    if !report.has_issues() {
        tracing::info!("no data issues found");
    }

    Ok(())
}
