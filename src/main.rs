use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use grantdesk::auth::password;
use grantdesk::config::Config;
use grantdesk::db::PgSubmissionRepository;
use grantdesk::rate_limit;
use grantdesk::email::SmtpMailer;
use grantdesk::state::AppState;
use grantdesk::storage::SupabaseStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `grantdesk hash-password <pw>` prints an argon2 hash for GRANTDESK_ADMIN_PASSWORD_HASH
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(plain) = args.get(2) else {
            eprintln!("usage: grantdesk hash-password <password>");
            std::process::exit(2);
        };
        println!("{}", password::hash(plain)?);
        return Ok(());
    }

    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting grantdesk");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database.effective_url())
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {e}"))?;

    tracing::info!("Migrations applied");

    let repo = Arc::new(PgSubmissionRepository::new(pool));
    let store = Arc::new(SupabaseStorage::new(&config.storage)?);
    let mailer = Arc::new(SmtpMailer::new(&config.smtp));

    let addr = SocketAddr::new(config.host, config.port);
    let state = AppState::new(config, repo, store, mailer);

    let limiter_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            limiter_state.login_limiter.cleanup(rate_limit::WINDOW);
        }
    });

    let app = grantdesk::build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
