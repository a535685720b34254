//! Depth-oriented adapter for the traditional NNUE engine (Stockfish).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::analysis::PositionAnalysis;
use crate::process::EngineProcess;
use crate::{
    probe_adapter_ready, reset_adapter_game, run_search_session, EngineAdapter, EngineError,
    SearchLimits, HANDSHAKE_DEADLINE,
};

/// Default node-budget-to-depth approximation: roughly one depth level per
/// 100k nodes, clamped to a useful band. The curve is engine-version
/// dependent, so configs can swap it out.
pub fn default_node_depth(nodes: u64) -> u32 {
    (10 + nodes / 100_000).clamp(15, 30) as u32
}

#[derive(Debug, Clone)]
pub struct StockfishConfig {
    pub executable: PathBuf,
    pub hash_mb: u32,
    pub threads: u32,
    /// Search width the engine is configured with at startup.
    pub multipv: u32,
    pub use_nnue: bool,
    /// 0-20; 20 is full strength and is not sent to the engine.
    pub skill_level: u8,
    /// Depth to search when the caller supplied only a node budget.
    pub node_depth_policy: fn(u64) -> u32,
}

impl StockfishConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            hash_mb: 2048,
            threads: 4,
            multipv: 10,
            use_nnue: true,
            skill_level: 20,
            node_depth_policy: default_node_depth,
        }
    }

    fn to_uci_options(&self) -> Vec<(String, String)> {
        let mut options = vec![
            ("Hash".to_string(), self.hash_mb.to_string()),
            ("Threads".to_string(), self.threads.to_string()),
            ("MultiPV".to_string(), self.multipv.to_string()),
            ("UCI_AnalyseMode".to_string(), "true".to_string()),
        ];
        if self.use_nnue {
            options.push(("Use NNUE".to_string(), "true".to_string()));
        }
        if self.skill_level < 20 {
            options.push(("Skill Level".to_string(), self.skill_level.to_string()));
        }
        options
    }
}

/// Adapter for a depth-oriented alpha-beta backend.
pub struct StockfishAdapter {
    config: StockfishConfig,
    process: Mutex<EngineProcess>,
}

impl StockfishAdapter {
    pub fn new(config: StockfishConfig) -> Self {
        Self {
            process: Mutex::new(EngineProcess::new("stockfish")),
            config,
        }
    }

    /// Depth-oriented engines search best with an explicit depth; a bare
    /// node budget is translated through the configured policy.
    fn go_command(&self, limits: &SearchLimits) -> String {
        if let Some(depth) = limits.depth {
            format!("go depth {depth}")
        } else if let Some(movetime) = limits.movetime_ms {
            format!("go movetime {movetime}")
        } else if let Some(nodes) = limits.nodes {
            format!("go depth {}", (self.config.node_depth_policy)(nodes))
        } else {
            "go depth 20".to_string()
        }
    }
}

#[async_trait]
impl EngineAdapter for StockfishAdapter {
    fn name(&self) -> &str {
        "stockfish"
    }

    async fn start(&self) -> Result<(), EngineError> {
        let mut process = self.process.lock().await;
        process
            .start(
                &self.config.executable,
                &self.config.to_uci_options(),
                HANDSHAKE_DEADLINE,
            )
            .await?;
        tracing::info!(
            threads = self.config.threads,
            hash_mb = self.config.hash_mb,
            multipv = self.config.multipv,
            "stockfish ready"
        );
        Ok(())
    }

    async fn stop(&self) {
        self.process.lock().await.stop().await;
    }

    async fn analyze_position(
        &self,
        fen: &str,
        limits: SearchLimits,
    ) -> Result<PositionAnalysis, EngineError> {
        let go = self.go_command(&limits);
        run_search_session(&self.process, self.config.multipv, fen, &go, limits).await
    }

    async fn is_ready(&self) -> bool {
        probe_adapter_ready(&self.process).await
    }

    async fn new_game(&self) -> Result<(), EngineError> {
        reset_adapter_game(&self.process).await
    }

    async fn is_running(&self) -> bool {
        self.process.lock().await.is_running()
    }
}
