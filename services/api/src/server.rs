use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use spa_loyalty::config::AppConfig;
use spa_loyalty::error::AppError;
use spa_loyalty::loyalty::promotions::PromotionCatalog;
use spa_loyalty::loyalty::{
    EligibilityPolicy, LoyaltyRepository, LoyaltyService, LoyaltyServiceError, TierLadder,
    TierUpgradeEvaluator,
};
use spa_loyalty::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLoyaltyRepository, InMemoryNotificationPublisher};
use crate::routes::with_loyalty_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryLoyaltyRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());

    if let Some(path) = args.promotions_file.take() {
        let catalog = PromotionCatalog::from_path(&path)?;
        let count = catalog.promotions().len();
        for promotion in catalog.into_promotions() {
            repository
                .upsert_promotion(promotion)
                .map_err(LoyaltyServiceError::Repository)?;
        }
        info!(count, path = %path.display(), "seeded promotion catalog");
    }

    let evaluator = TierUpgradeEvaluator::new(TierLadder::standard());
    let policy = EligibilityPolicy::new(config.loyalty.vip_tier_floor);
    let service = Arc::new(LoyaltyService::new(
        repository,
        notifications,
        evaluator,
        policy,
    ));

    let app = with_loyalty_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loyalty service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
