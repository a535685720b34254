//! Engine data model → HTTP response conversions.

use engine::{MoveCandidate, PositionAnalysis, WdlScore};

use super::schemas::{AnalyzeResponse, MoveCandidateResponse};

fn wdl_triple(wdl: WdlScore) -> [u32; 3] {
    [wdl.win, wdl.draw, wdl.loss]
}

pub fn convert_candidate(candidate: MoveCandidate) -> MoveCandidateResponse {
    MoveCandidateResponse {
        mv: candidate.mv,
        move_san: candidate.mv_san,
        score_cp: candidate.score_cp,
        score_wdl: wdl_triple(candidate.score_wdl),
        pv: candidate.pv,
        pv_san: candidate.pv_san,
        nodes: candidate.nodes,
        depth: candidate.depth,
        policy: candidate.policy,
        rank: candidate.rank,
    }
}

pub fn convert_analysis(engine_id: &str, analysis: PositionAnalysis) -> AnalyzeResponse {
    AnalyzeResponse {
        fen: analysis.fen,
        engine: engine_id.to_string(),
        candidates: analysis
            .candidates
            .into_iter()
            .map(convert_candidate)
            .collect(),
        evaluation_cp: analysis.evaluation_cp,
        evaluation_wdl: wdl_triple(analysis.evaluation_wdl),
        total_nodes: analysis.total_nodes,
        time_ms: analysis.time_ms,
        nps: analysis.nps,
        depth: analysis.depth,
        seldepth: analysis.seldepth,
        multipv: analysis.multipv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_analysis_converts_to_neutral_response() {
        let response = convert_analysis("lc0", PositionAnalysis::empty("some fen"));
        assert_eq!(response.fen, "some fen");
        assert_eq!(response.engine, "lc0");
        assert!(response.candidates.is_empty());
        assert_eq!(response.evaluation_cp, 0);
        assert_eq!(response.evaluation_wdl, [333, 334, 333]);
    }
}
