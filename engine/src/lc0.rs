//! Node-oriented adapter for neural-network engines (LC0 and derivatives).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::analysis::PositionAnalysis;
use crate::process::EngineProcess;
use crate::{
    probe_adapter_ready, reset_adapter_game, run_search_session, EngineAdapter, EngineError,
    SearchLimits, HANDSHAKE_DEADLINE,
};

#[derive(Debug, Clone)]
pub struct Lc0Config {
    pub executable: PathBuf,
    /// Network weights; swapping this file is how human-like variants
    /// (Maia) run on the same binary.
    pub network: PathBuf,
    /// Compute backend, e.g. "cuda-fp16" or "blas".
    pub backend: String,
    pub gpu_ids: Vec<u32>,
    pub threads: u32,
    /// Neural evaluation cache, in entries.
    pub nncache_size: u32,
    /// Search width the engine is configured with at startup.
    pub multipv: u32,
}

impl Lc0Config {
    pub fn new(executable: impl Into<PathBuf>, network: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            network: network.into(),
            backend: "cuda-fp16".to_string(),
            gpu_ids: vec![0],
            threads: 2,
            nncache_size: 2_000_000,
            multipv: 10,
        }
    }

    fn to_uci_options(&self) -> Vec<(String, String)> {
        let mut options = vec![
            ("WeightsFile".to_string(), self.network.display().to_string()),
            ("Backend".to_string(), self.backend.clone()),
            ("Threads".to_string(), self.threads.to_string()),
            ("NNCacheSize".to_string(), self.nncache_size.to_string()),
            ("MultiPV".to_string(), self.multipv.to_string()),
            // native win/draw/loss and per-move priors in search output
            ("UCI_ShowWDL".to_string(), "true".to_string()),
            ("VerboseMoveStats".to_string(), "true".to_string()),
        ];
        if !self.gpu_ids.is_empty() {
            let gpus = self
                .gpu_ids
                .iter()
                .map(|id| format!("gpu={id}"))
                .collect::<Vec<_>>()
                .join(",");
            options.push(("BackendOptions".to_string(), gpus));
        }
        options
    }
}

/// Adapter for a node-oriented neural backend.
pub struct Lc0Adapter {
    name: String,
    config: Lc0Config,
    process: Mutex<EngineProcess>,
}

impl Lc0Adapter {
    /// `name` distinguishes weight variants sharing the binary ("lc0",
    /// "maia").
    pub fn new(name: impl Into<String>, config: Lc0Config) -> Self {
        let name = name.into();
        Self {
            process: Mutex::new(EngineProcess::new(name.clone())),
            name,
            config,
        }
    }

    /// Neural backends budget by visits, so an explicit node count wins.
    fn go_command(&self, limits: &SearchLimits) -> String {
        if let Some(nodes) = limits.nodes {
            format!("go nodes {nodes}")
        } else if let Some(movetime) = limits.movetime_ms {
            format!("go movetime {movetime}")
        } else if let Some(depth) = limits.depth {
            format!("go depth {depth}")
        } else {
            "go nodes 100000".to_string()
        }
    }
}

#[async_trait]
impl EngineAdapter for Lc0Adapter {
    fn name(&self) -> &str {
        &self.name
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
            engine = %self.name,
            network = %self.config.network.display(),
            backend = %self.config.backend,
            "neural engine ready"
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
