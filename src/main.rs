use certificate_backend::config::Settings;
use certificate_backend::infrastructure::{database, storage};
use certificate_backend::repositories::{
    SeaOrmAuthenticationRepository, SeaOrmCertificateRepository,
};
use certificate_backend::services::auth_service::AuthService;
use certificate_backend::services::certificate_service::{
    CertificatePermissions, CertificateService,
};
use certificate_backend::services::mail::{HttpMailSender, LogMailSender, MailSender};
use certificate_backend::{AppState, create_app};
use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Require production settings (JWT_SECRET, TLS URLs, secure cookies)
    #[arg(long)]
    production: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certificate_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting certificate backend...");

    let settings = if args.production {
        Settings::production()?
    } else {
        Settings::from_env()
    };
    info!(
        "🛡️  Settings: domain={}, storage={}, max body={}MB",
        settings.full_domain(),
        settings.file_server_root_path,
        settings.max_body_size / 1024 / 1024
    );

    // 2. Infrastructure
    let db = database::setup_database().await?;
    let file_storage = storage::setup_storage(&settings).await?;

    let mailer: Arc<dyn MailSender> = match &settings.mail_relay_url {
        Some(url) => {
            info!("📧 Mail relay: {}", url);
            Arc::new(HttpMailSender::new(url.clone(), settings.mail_from.clone()))
        }
        None => {
            warn!("📧 MAIL_RELAY_URL not set, system mail will only be logged");
            Arc::new(LogMailSender)
        }
    };

    // 3. Use cases
    let auth = Arc::new(AuthService::new(
        Arc::new(SeaOrmAuthenticationRepository::new(db.clone())),
        mailer,
        settings.clone(),
    ));

    let certificate_service = Arc::new(CertificateService::new(
        Arc::new(SeaOrmCertificateRepository::new(db.clone())),
        file_storage.clone(),
        settings.full_domain(),
    ));
    let certificates = Arc::new(CertificatePermissions::new(certificate_service));

    let state = AppState {
        db,
        settings,
        storage: file_storage,
        auth,
        certificates,
    };

    // 4. HTTP server
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
    info!(
        "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
        args.port
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server runtime error: {}", e);
    }

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
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
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
