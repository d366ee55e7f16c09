use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ujian_platform_access::AccessGate;
use ujian_server::{
    app,
    auth::{AppState, ProfileBackend, SupabaseClient, db::ProfileRepository},
    config::{BackendStatus, ServerConfig},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from the optional file and the environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let status = config
        .supabase
        .status()
        .expect("invalid backend configuration");

    let (gate, supabase, profiles) = match status {
        BackendStatus::Unconfigured { reason } => (AccessGate::bypass(reason), None, None),
        BackendStatus::Configured(endpoint) => {
            let client = SupabaseClient::new(&endpoint).expect("failed to build backend client");
            if !client.has_service_key() {
                tracing::warn!("SUPABASE__SERVICE_ROLE_KEY is not set; admin operations disabled");
            }

            let postgres_url = config
                .postgres_url()
                .expect("invalid profile backend configuration");
            let profiles = match postgres_url {
                Some(url) => {
                    let pool = PgPoolOptions::new()
                        .max_connections(5)
                        .connect(url)
                        .await
                        .expect("failed to connect to database");
                    ProfileBackend::Postgres(ProfileRepository::new(pool))
                }
                None => ProfileBackend::Rest(client.clone()),
            };
            let profiles = Arc::new(profiles);
            tracing::info!(
                backend = %endpoint.url,
                profiles = profiles.kind(),
                timeout_ms = config.gate.lookup_timeout_ms,
                session_timeout_ms = config.gate.session_timeout().as_millis(),
                "Access gate enforcing"
            );

            let gate = AccessGate::enforcing(
                Arc::new(client.clone()),
                profiles.clone(),
                config.gate.lookup_timeout(),
            )
            .with_session_timeout(config.gate.session_timeout());
            (gate, Some(client), Some(profiles))
        }
    };

    let app_state = Arc::new(AppState::new(
        gate,
        supabase,
        profiles,
        config.session.clone(),
        config.gate.exclusions.clone(),
    ));

    let app = app::router(app_state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down");
}
