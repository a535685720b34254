//! Environment-driven configuration.
//!
//! Every knob has a default suited to the container deployment; values are
//! trusted, and a bad engine path surfaces when that engine starts.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub lc0_path: PathBuf,
    pub lc0_network: PathBuf,
    pub lc0_backend: String,
    pub lc0_gpu_ids: Vec<u32>,
    pub lc0_threads: u32,
    pub lc0_nncache: u32,

    pub maia_network: PathBuf,
    pub maia_enabled: bool,

    pub stockfish_path: PathBuf,
    pub stockfish_hash_mb: u32,
    pub stockfish_threads: u32,
    pub stockfish_enabled: bool,

    pub default_num_moves: u32,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parsed("PORT", 8001),

            lc0_path: PathBuf::from(env_or("LC0_PATH", "/opt/lc0/lc0")),
            lc0_network: PathBuf::from(env_or("LC0_NETWORK", "/app/networks/BT4.pb.gz")),
            lc0_backend: env_or("LC0_BACKEND", "cuda-fp16"),
            lc0_gpu_ids: parse_gpu_ids(&env_or("LC0_GPU_IDS", "0")),
            lc0_threads: env_parsed("LC0_THREADS", 2),
            lc0_nncache: env_parsed("LC0_NNCACHE", 2_000_000),

            maia_network: PathBuf::from(env_or("MAIA_NETWORK", "/app/networks/maia-1900.pb.gz")),
            maia_enabled: env_parsed("MAIA_ENABLED", true),

            stockfish_path: PathBuf::from(env_or("STOCKFISH_PATH", "/opt/stockfish/stockfish")),
            stockfish_hash_mb: env_parsed("STOCKFISH_HASH_MB", 2048),
            stockfish_threads: env_parsed("STOCKFISH_THREADS", 4),
            stockfish_enabled: env_parsed("STOCKFISH_ENABLED", true),

            default_num_moves: env_parsed("DEFAULT_NUM_MOVES", 10),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Comma-separated GPU ids, e.g. "0,1".
fn parse_gpu_ids(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
