use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::services::ServeDir;

mod analyzer;
mod drawings;
mod handlers;
mod state;
mod storage;

use crate::analyzer::Analyzer;
use crate::handlers::{analyze_handler, capture_handler, convert_handler, load_handler, save_handler};
use crate::state::AppState;
use crate::storage::{FileStorage, S3Storage, S3StorageConfig, Storage};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory for persisted drawing snapshots (file backend).
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Directory served as the static site root.
    #[arg(long)]
    public_dir: Option<PathBuf>,
    /// Base URL of the external analysis service. Without it the relay
    /// endpoints report a configuration error instead of analyzing.
    #[arg(long, env = "ANALYZER_URL")]
    analyzer_url: Option<String>,
    /// Store snapshots in this S3 bucket instead of the filesystem.
    #[arg(long, env = "INKPAD_S3_BUCKET")]
    s3_bucket: Option<String>,
    #[arg(long, env = "INKPAD_S3_PREFIX")]
    s3_prefix: Option<String>,
    #[arg(long, env = "INKPAD_S3_REGION")]
    s3_region: Option<String>,
    #[arg(long, env = "INKPAD_S3_ENDPOINT")]
    s3_endpoint: Option<String>,
    #[arg(long, default_value_t = false)]
    s3_force_path_style: bool,
    #[arg(long, env = "INKPAD_S3_ACCESS_KEY_ID")]
    s3_access_key_id: Option<String>,
    #[arg(long, env = "INKPAD_S3_SECRET_ACCESS_KEY")]
    s3_secret_access_key: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let storage: Arc<dyn Storage> = if let Some(bucket) = args.s3_bucket {
        let mut config = S3StorageConfig::new(bucket);
        config.prefix = args.s3_prefix;
        config.region = args.s3_region;
        config.endpoint_url = args.s3_endpoint;
        config.force_path_style = args.s3_force_path_style;
        config.access_key_id = args.s3_access_key_id;
        config.secret_access_key = args.s3_secret_access_key;
        eprintln!("Using S3 snapshot storage bucket={}", config.bucket);
        Arc::new(S3Storage::new(config).await)
    } else {
        let snapshot_dir = args
            .snapshot_dir
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../snapshots"));
        if let Err(error) = tokio::fs::create_dir_all(&snapshot_dir).await {
            eprintln!("Failed to create snapshot dir: {error}");
        }
        eprintln!("Using file snapshot storage dir={}", snapshot_dir.display());
        Arc::new(FileStorage::new(snapshot_dir))
    };

    let analyzer = Arc::new(Analyzer::new(args.analyzer_url));
    if !analyzer.is_configured() {
        eprintln!("No analyzer URL configured; /convert, /analyze and /capture will report errors");
    }

    let state = AppState { storage, analyzer };

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));

    let app = Router::new()
        .route("/save", post(save_handler))
        .route("/load/:drawing_id", get(load_handler))
        .route("/convert", post(convert_handler))
        .route("/analyze", post(analyze_handler))
        .route("/capture", post(capture_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Inkpad running at http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    axum::serve(listener, app).await.expect("Server crashed");
}
