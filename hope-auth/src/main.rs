use std::sync::Arc;

use hope_auth::config::AppConfig;
use hope_auth::services::otp::SmsNotifier;
use hope_auth::services::verification::RedisVerificationStore;
use hope_auth::store::PgUserStore;
use hope_auth::AppState;
use hope_shared::clients::db::create_pool;
use hope_shared::clients::redis::RedisClient;
use hope_shared::clients::twilio::TwilioClient;
use hope_shared::SessionIssuer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hope_shared::middleware::init_tracing("hope-auth")?;

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url, config.database_pool_size)?;
    let redis = RedisClient::connect(&config.redis_url).await?;
    let metrics = hope_shared::middleware::init_metrics()?;

    let mut twilio = TwilioClient::new(
        &config.twilio_account_sid,
        &config.twilio_auth_token,
        &config.twilio_verify_sid,
    );
    if let Some(sender) = config.sms_sender() {
        twilio = twilio.with_sender(sender);
    }
    let twilio = Arc::new(twilio);
    let sms = twilio
        .has_sender()
        .then(|| twilio.clone() as Arc<dyn SmsNotifier>);
    if sms.is_none() {
        tracing::info!("no sender number configured, welcome SMS disabled");
    }

    let sessions = SessionIssuer::new(&config.jwt_secret, config.session_ttl_secs()?);
    let verifications = RedisVerificationStore::new(redis.clone(), config.verification_window_secs as u64);

    let state = AppState {
        config: Arc::new(config),
        users: Arc::new(PgUserStore::new(db)),
        otp: twilio,
        verifications: Arc::new(verifications),
        sms,
        sessions,
        redis: Some(redis),
        metrics: Some(metrics),
    };

    let app = hope_auth::router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "hope-auth starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("hope-auth stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
