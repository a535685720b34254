//! HTTP endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use engine::{EngineAdapter, EngineError, SearchLimits};

use super::converters::convert_analysis;
use super::schemas::{
    AnalyzeRequest, AnalyzeResponse, EngineInfo, EngineListResponse, EngineStatus, ErrorResponse,
    HealthResponse,
};
use super::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

/// Analyze a position with a named engine and return ranked candidates.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    tracing::info!(
        engine = %request.engine,
        fen = %request.fen,
        nodes = request.nodes,
        depth = ?request.depth,
        num_moves = request.num_moves,
        "POST /analyze"
    );

    if let Err(detail) = request.validate() {
        return Err(error(StatusCode::UNPROCESSABLE_ENTITY, detail));
    }

    let Some(adapter) = state.registry.resolve(&request.engine).await else {
        return Err(error(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("engine '{}' not available", request.engine),
        ));
    };

    // the adapter picks depth-vs-nodes itself, so every budget passes through
    let limits = SearchLimits {
        nodes: Some(request.nodes),
        depth: request.depth,
        movetime_ms: None,
        multipv: Some(request.num_moves),
    };

    match adapter.analyze_position(&request.fen, limits).await {
        Ok(analysis) => Ok(Json(convert_analysis(&request.engine, analysis))),
        Err(e) => {
            tracing::error!(engine = %request.engine, error = %e, "analysis failed");
            Err(analysis_error(&request.engine, e))
        }
    }
}

fn analysis_error(engine_id: &str, e: EngineError) -> ApiError {
    match e {
        EngineError::InvalidPosition(_) => {
            error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        EngineError::NotRunning => error(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("engine '{engine_id}' is not running"),
        ),
        _ => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("analysis failed: {e}"),
        ),
    }
}

/// Service health plus per-engine readiness.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut engines = Vec::new();
    for (id, enabled) in [
        ("lc0", true),
        ("stockfish", state.settings.stockfish_enabled),
        ("maia", state.settings.maia_enabled),
    ] {
        let ready = match state.registry.resolve(id).await {
            Some(adapter) => adapter.is_ready().await,
            None => false,
        };
        engines.push(EngineStatus {
            name: id.to_string(),
            ready,
            enabled,
        });
    }

    let status = if engines.iter().any(|e| e.ready) {
        "healthy"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status: status.to_string(),
        engines,
    })
}

/// Static engine metadata plus current availability.
pub async fn engines(State(state): State<AppState>) -> Json<EngineListResponse> {
    let catalog = [
        (
            "lc0",
            "Leela Chess Zero",
            "Neural network engine (AlphaZero-style)",
            "neural_network",
            true,
        ),
        (
            "stockfish",
            "Stockfish",
            "Strongest traditional engine with NNUE",
            "traditional",
            state.settings.stockfish_enabled,
        ),
        (
            "maia",
            "Maia Chess",
            "Human-like engine (predicts human moves)",
            "neural_network",
            state.settings.maia_enabled,
        ),
    ];

    let mut engines = Vec::new();
    for (id, name, description, kind, enabled) in catalog {
        let available = enabled && state.registry.resolve(id).await.is_some();
        engines.push(EngineInfo {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            kind: kind.to_string(),
            available,
        });
    }
    Json(EngineListResponse { engines })
}
