//! Request and response bodies for the HTTP boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Position in FEN notation.
    pub fen: String,
    /// Engine identifier to analyze with.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Node budget, preferred by neural backends.
    #[serde(default = "default_nodes")]
    pub nodes: u64,
    /// Depth limit, preferred by traditional backends.
    #[serde(default)]
    pub depth: Option<u32>,
    /// Number of candidate moves to return.
    #[serde(default = "default_num_moves")]
    pub num_moves: u32,
}

fn default_engine() -> String {
    "lc0".to_string()
}

fn default_nodes() -> u64 {
    100_000
}

fn default_num_moves() -> u32 {
    10
}

impl AnalyzeRequest {
    /// Bounds of the public API contract.
    pub fn validate(&self) -> Result<(), String> {
        if self.fen.trim().is_empty() {
            return Err("fen must not be empty".to_string());
        }
        if !(1_000..=10_000_000).contains(&self.nodes) {
            return Err("nodes must be between 1000 and 10000000".to_string());
        }
        if let Some(depth) = self.depth {
            if !(1..=50).contains(&depth) {
                return Err("depth must be between 1 and 50".to_string());
            }
        }
        if !(1..=50).contains(&self.num_moves) {
            return Err("num_moves must be between 1 and 50".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct MoveCandidateResponse {
    /// Move in coordinate notation, e.g. "e2e4".
    #[serde(rename = "move")]
    pub mv: String,
    /// Move in standard algebraic notation, e.g. "e4".
    pub move_san: String,
    pub score_cp: i32,
    /// Win/draw/loss in per-mille.
    pub score_wdl: [u32; 3],
    pub pv: Vec<String>,
    pub pv_san: Vec<String>,
    pub nodes: u64,
    pub depth: u32,
    pub policy: f64,
    pub rank: u32,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub fen: String,
    pub engine: String,
    pub candidates: Vec<MoveCandidateResponse>,
    pub evaluation_cp: i32,
    pub evaluation_wdl: [u32; 3],
    pub total_nodes: u64,
    pub time_ms: u64,
    pub nps: u64,
    pub depth: u32,
    pub seldepth: u32,
    pub multipv: u32,
}

#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub name: String,
    pub ready: bool,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engines: Vec<EngineStatus>,
}

#[derive(Debug, Serialize)]
pub struct EngineInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct EngineListResponse {
    pub engines: Vec<EngineInfo>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"fen": "8/8/8/8/8/8/8/8 w - - 0 1"}"#).unwrap();
        assert_eq!(request.engine, "lc0");
        assert_eq!(request.nodes, 100_000);
        assert_eq!(request.depth, None);
        assert_eq!(request.num_moves, 10);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_bounds() {
        let mut request: AnalyzeRequest =
            serde_json::from_str(r#"{"fen": "x", "nodes": 500}"#).unwrap();
        assert!(request.validate().is_err());

        request.nodes = 100_000;
        request.num_moves = 0;
        assert!(request.validate().is_err());

        request.num_moves = 10;
        request.depth = Some(99);
        assert!(request.validate().is_err());

        request.depth = Some(20);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_fen_rejected() {
        let request: AnalyzeRequest = serde_json::from_str(r#"{"fen": "   "}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_candidate_serializes_move_key() {
        let candidate = MoveCandidateResponse {
            mv: "e2e4".to_string(),
            move_san: "e4".to_string(),
            score_cp: 35,
            score_wdl: [450, 500, 50],
            pv: vec!["e2e4".to_string()],
            pv_san: vec!["e4".to_string()],
            nodes: 1000,
            depth: 10,
            policy: 0.0,
            rank: 1,
        };
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["move"], "e2e4");
        assert_eq!(json["move_san"], "e4");
        assert_eq!(json["score_wdl"], serde_json::json!([450, 500, 50]));
    }
}
