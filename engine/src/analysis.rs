//! Immutable analysis results produced by the output parser.

/// Win/draw/loss probabilities in per-mille, from the side to move's
/// perspective. Components always sum to exactly 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WdlScore {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl WdlScore {
    /// Neutral triple used when a search produced no candidates.
    pub const NEUTRAL: WdlScore = WdlScore {
        win: 333,
        draw: 334,
        loss: 333,
    };

    pub fn sum(&self) -> u32 {
        self.win + self.draw + self.loss
    }
}

/// One ranked move from a single search.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCandidate {
    /// Coordinate notation as reported by the engine, e.g. "e2e4".
    pub mv: String,
    /// SAN rendering of `mv`, derived from the move plus the position.
    pub mv_san: String,
    /// Centipawns from the side to move's perspective. Mate scores are
    /// folded into ±(10000 - distance).
    pub score_cp: i32,
    pub score_wdl: WdlScore,
    /// Principal variation, truncated at the first unplayable move.
    pub pv: Vec<String>,
    pub pv_san: Vec<String>,
    pub nodes: u64,
    pub depth: u32,
    /// Neural prior for the move in [0, 1]; 0 for engines without one.
    pub policy: f64,
    /// 1-based rank, contiguous across the candidate list.
    pub rank: u32,
}

/// Complete result of one search. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionAnalysis {
    /// The position as it was passed in, echoed unmodified.
    pub fen: String,
    /// Candidates in rank order.
    pub candidates: Vec<MoveCandidate>,
    pub evaluation_cp: i32,
    pub evaluation_wdl: WdlScore,
    pub total_nodes: u64,
    pub time_ms: u64,
    pub nps: u64,
    pub depth: u32,
    pub seldepth: u32,
    /// Highest candidate index the engine reported during the search.
    pub multipv: u32,
}

impl PositionAnalysis {
    /// Result for a search that produced no usable candidates.
    pub fn empty(fen: impl Into<String>) -> Self {
        PositionAnalysis {
            fen: fen.into(),
            candidates: Vec::new(),
            evaluation_cp: 0,
            evaluation_wdl: WdlScore::NEUTRAL,
            total_nodes: 0,
            time_ms: 0,
            nps: 0,
            depth: 0,
            seldepth: 0,
            multipv: 0,
        }
    }
}
