//! Engine adapter layer: long-lived UCI subprocesses behind a uniform
//! asynchronous analysis contract.
//!
//! Each backend (neural or traditional) is an [`EngineAdapter`] owning one
//! engine process. All protocol traffic for a process is serialized behind
//! the adapter's internal lock; different adapters run fully independently.

pub mod analysis;
pub mod lc0;
pub mod parser;
pub mod process;
pub mod protocol;
pub mod registry;
pub mod stockfish;

pub use analysis::{MoveCandidate, PositionAnalysis, WdlScore};
pub use lc0::{Lc0Adapter, Lc0Config};
pub use process::{EngineProcess, EngineState};
pub use protocol::ProtocolDriver;
pub use registry::EngineRegistry;
pub use stockfish::{StockfishAdapter, StockfishConfig};

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Handshake must complete within this window or startup fails.
pub(crate) const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(10);
/// Deadline for `isready` probes outside a search.
pub(crate) const READY_PROBE_DEADLINE: Duration = Duration::from_secs(5);
/// Ceiling on one search when the caller gave no time budget.
pub(crate) const SEARCH_DEADLINE: Duration = Duration::from_secs(300);

/// Search budget for one analysis request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub nodes: Option<u64>,
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    /// Candidate moves to report (MultiPV); the adapter reconfigures the
    /// engine for the call when this differs from its configured width.
    pub multipv: Option<u32>,
}

/// Capability contract shared by every engine backend.
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Identifier the adapter is registered under ("lc0", "stockfish", ...).
    fn name(&self) -> &str;

    /// Spawn the engine process and run the UCI handshake. Restarts the
    /// process if one is already running.
    async fn start(&self) -> Result<(), EngineError>;

    /// Shut the engine down. Degrades to a forced kill; never fails.
    async fn stop(&self);

    /// Analyze a position and return ranked candidate moves.
    ///
    /// Serialized per adapter: concurrent callers queue in arrival order.
    async fn analyze_position(
        &self,
        fen: &str,
        limits: SearchLimits,
    ) -> Result<PositionAnalysis, EngineError>;

    /// Probe protocol-level readiness. Converts every failure into `false`.
    async fn is_ready(&self) -> bool;

    /// Clear game-carried engine state (transposition data, history) before
    /// analyzing unrelated positions.
    async fn new_game(&self) -> Result<(), EngineError>;

    /// Point-in-time process liveness, independent of readiness.
    async fn is_running(&self) -> bool;
}

/// Failures surfaced by the adapter layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine startup failed: {0}")]
    StartupFailed(String),
    #[error("timed out after {waited_ms}ms waiting for '{sentinel}'")]
    ProtocolTimeout { sentinel: String, waited_ms: u64 },
    #[error("failed to write to engine: {0}")]
    WriteFailed(#[source] std::io::Error),
    #[error("engine output stream closed")]
    StreamClosed,
    #[error("engine is not running, call start() first")]
    NotRunning,
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// One full search under the adapter lock: optional MultiPV override,
/// dispatch, line collection, parse, and the state transition matching the
/// outcome. Both backends funnel through here.
pub(crate) async fn run_search_session(
    process: &Mutex<EngineProcess>,
    configured_multipv: u32,
    fen: &str,
    go_command: &str,
    limits: SearchLimits,
) -> Result<PositionAnalysis, EngineError> {
    chess::parse_fen(fen).map_err(|e| EngineError::InvalidPosition(e.to_string()))?;

    let mut process = process.lock().await;
    if process.state() != EngineState::Ready {
        return Err(EngineError::NotRunning);
    }
    process.set_state(EngineState::Analyzing);

    // widen or narrow the reported candidate set for this call only
    let width = limits.multipv.filter(|w| *w != configured_multipv);
    if let Some(width) = width {
        if let Err(e) = set_multipv(&mut process, width).await {
            process.set_state(state_after_failure(&e));
            return Err(e);
        }
    }

    let result = process.search(fen, go_command, search_deadline(&limits)).await;

    // the configured width is restored even when the search failed; a
    // restore failure is logged rather than clobbering the search outcome
    if width.is_some() {
        if let Err(e) = set_multipv(&mut process, configured_multipv).await {
            tracing::warn!(error = %e, "failed to restore configured MultiPV");
        }
    }

    match result {
        Ok(lines) => {
            process.set_state(EngineState::Ready);
            Ok(parser::parse_analysis(fen, &lines))
        }
        Err(e) => {
            process.set_state(state_after_failure(&e));
            Err(e)
        }
    }
}

async fn set_multipv(process: &mut EngineProcess, width: u32) -> Result<(), EngineError> {
    process
        .driver()?
        .send_command(&format!("setoption name MultiPV value {width}"))
        .await
}

/// Sentinel timeouts leave a retryable engine; transport failures mean the
/// process is gone until the next `start()`.
fn state_after_failure(error: &EngineError) -> EngineState {
    match error {
        EngineError::ProtocolTimeout { .. } => EngineState::Ready,
        _ => EngineState::Crashed,
    }
}

fn search_deadline(limits: &SearchLimits) -> Duration {
    match limits.movetime_ms {
        Some(ms) => Duration::from_millis(ms) + Duration::from_secs(10),
        None => SEARCH_DEADLINE,
    }
}

/// Shared `is_ready` path: `false` for any failure, including "never
/// started". Health checks must not themselves be a failure point.
pub(crate) async fn probe_adapter_ready(process: &Mutex<EngineProcess>) -> bool {
    let mut process = process.lock().await;
    if process.state() != EngineState::Ready {
        return false;
    }
    process.probe_ready(READY_PROBE_DEADLINE).await.is_ok()
}

/// Shared `new_game` path: `ucinewgame` plus a readiness probe.
pub(crate) async fn reset_adapter_game(process: &Mutex<EngineProcess>) -> Result<(), EngineError> {
    let mut process = process.lock().await;
    if process.state() != EngineState::Ready {
        return Err(EngineError::NotRunning);
    }
    process.reset_game(READY_PROBE_DEADLINE).await
}
