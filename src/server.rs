//! Servicio HTTP de subida: recibe un archivo por multipart y responde con su
//! reporte de metadata en JSON.
//!
//! - `POST /upload`: parte multipart `file`.
//! - `GET /health`: comprobación de vida.

use crate::error::ExtractionError;
use crate::metadata::extract_metadata;
use crate::metadata::normalize::to_json;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::{Value, json};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const FILE_FIELD: &str = "file";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Configuración del servidor; cada opción acepta también su variable de entorno.
#[derive(Clone, Debug, Parser)]
#[command(name = "metascope-server", version, about = "File metadata upload service")]
pub struct ServerConfig {
    /// Directorio donde se guardan temporalmente las subidas.
    #[arg(long, env = "METASCOPE_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Dirección de escucha.
    #[arg(long, env = "METASCOPE_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Tamaño máximo aceptado para el cuerpo de la petición.
    #[arg(long, env = "METASCOPE_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("No file part in the request")]
    MissingFilePart,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Storage error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Could not serialize the report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingFilePart | Self::NoFileSelected => StatusCode::BAD_REQUEST,
            Self::Multipart(error) => error.status(),
            Self::Io(_) | Self::Extraction(_) | Self::Serialize(_) | Self::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "upload failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug)]
pub struct ServerState {
    pub upload_dir: PathBuf,
}

pub fn build_router(state: Arc<ServerState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handle_health_check))
        .route("/upload", post(handle_upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[instrument(skip_all)]
async fn handle_upload(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ServerError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or(ServerError::MissingFilePart)?;
    if file_name.trim().is_empty() {
        return Err(ServerError::NoFileSelected);
    }

    // Un subdirectorio por petición: dos subidas con el mismo nombre no chocan.
    let request_dir = state.upload_dir.join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&request_dir).await?;
    let stored = request_dir.join(sanitize_file_name(&file_name));
    tokio::fs::write(&stored, &bytes).await?;
    info!(file = %stored.display(), bytes = bytes.len(), "upload stored");

    let target = stored.clone();
    let outcome = tokio::task::spawn_blocking(move || extract_metadata(&target)).await;

    if let Err(error) = tokio::fs::remove_dir_all(&request_dir).await {
        warn!(%error, dir = %request_dir.display(), "could not remove upload");
    }

    let report = outcome??;
    Ok(Json(to_json(&report)?))
}

/// Nombre seguro para el disco: solo el último componente, con los caracteres
/// fuera de `[A-Za-z0-9._-]` reemplazados por `_`. Un nombre que solo era
/// extensión (`.jpg`) la conserva como `upload.jpg`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else if trimmed.len() != cleaned.len() && !trimmed.contains('.') {
        format!("upload.{trimmed}")
    } else {
        trimmed.to_string()
    }
}

pub async fn prepare_upload_dir(dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    prepare_upload_dir(&config.upload_dir).await?;
    let state = Arc::new(ServerState {
        upload_dir: config.upload_dir.clone(),
    });
    let router = build_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %config.bind,
        upload_dir = %config.upload_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        "metascope server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("metascope server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "could not listen for shutdown signal");
    }
}
