use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubely::config::AppConfig;
use tubely::api::middleware::request_id::make_request_span;
use tubely::infrastructure::{assets, database, storage};
use tubely::services::ingest::IngestService;
use tubely::services::probe::FfprobeProber;
use tubely::services::remux::FfmpegTranscoder;
use tubely::services::video_store::SeaOrmVideoRepository;
use tubely::{AppState, create_app};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, env = "PORT", default_value_t = 8091)]
    port: u16,

    /// Run with the strict production configuration
    #[arg(long)]
    production: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & Logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubely=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Tubely...");

    let config = if args.production {
        AppConfig::production()?
    } else {
        AppConfig::from_env()
    };
    info!(
        "🎬 Upload Config: Max Size={}MB, Assets={}, ffmpeg={}, ffprobe={}",
        config.max_upload_size / 1024 / 1024,
        config.assets_root.display(),
        config.ffmpeg_path,
        config.ffprobe_path
    );

    // 2. Infrastructure
    assets::ensure_assets_dir(&config.assets_root).await?;
    let db = database::setup_database().await?;
    let storage_service = storage::setup_storage(&config).await;
    let videos = Arc::new(SeaOrmVideoRepository::new(db.clone()));

    // 3. Pipeline
    let ingest = Arc::new(IngestService::new(
        videos.clone(),
        storage_service.clone(),
        Arc::new(FfmpegTranscoder::new(config.ffmpeg_path.clone())),
        Arc::new(FfprobeProber::new(config.ffprobe_path.clone())),
        config.clone(),
    ));

    let state = AppState {
        db,
        videos,
        storage: storage_service,
        ingest,
        config,
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(make_request_span::<axum::body::Body>)
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
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Tubely exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
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
