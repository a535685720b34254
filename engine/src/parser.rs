//! Converts accumulated UCI search output into a [`PositionAnalysis`].
//!
//! Every field of the `info` line grammar has its own small extraction
//! function, each a pure `&str -> Option<T>`, so the grammar pieces are
//! testable in isolation. A line that yields no playable move is skipped
//! without aborting the whole parse.

use std::collections::BTreeMap;

use chess::ScratchPosition;

use crate::analysis::{MoveCandidate, PositionAnalysis, WdlScore};

/// Mate scores fold into this bound so "mate in N" still orders above any
/// centipawn evaluation, and shorter mates above longer ones.
const MATE_BOUND: i32 = 10_000;

/// Parse the protocol lines collected for one search.
///
/// Later lines for a candidate index replace earlier ones; indices with no
/// playable move are dropped; survivors are re-ranked contiguously 1..N.
/// Telemetry fields are running maxima across every line, since engines
/// stop reporting some fields near the end of a search. Zero surviving
/// candidates still yields a valid, neutral result.
pub fn parse_analysis(fen: &str, lines: &[String]) -> PositionAnalysis {
    let root = chess::parse_fen(fen).ok();

    let mut candidates: BTreeMap<u32, MoveCandidate> = BTreeMap::new();
    let mut policies: Vec<(String, f64)> = Vec::new();
    let mut analysis = PositionAnalysis::empty(fen);

    for line in lines {
        if !line.starts_with("info") {
            continue;
        }
        if line.starts_with("info string") {
            if let Some(entry) = policy_entry(line) {
                policies.push(entry);
            }
            continue;
        }

        if let Some(nodes) = field_u64(line, "nodes") {
            analysis.total_nodes = analysis.total_nodes.max(nodes);
        }
        if let Some(time) = field_u64(line, "time") {
            analysis.time_ms = analysis.time_ms.max(time);
        }
        if let Some(nps) = field_u64(line, "nps") {
            analysis.nps = analysis.nps.max(nps);
        }
        if let Some(depth) = field_u32(line, "depth") {
            analysis.depth = analysis.depth.max(depth);
        }
        if let Some(seldepth) = field_u32(line, "seldepth") {
            analysis.seldepth = analysis.seldepth.max(seldepth);
        }

        let moves = pv_tokens(line);
        if moves.is_empty() {
            continue;
        }

        let score_cp = score_centipawns(line).unwrap_or(0);
        let score_wdl = native_wdl(line).unwrap_or_else(|| estimate_wdl(score_cp));

        // walk the variation against a scratch copy of the position; the
        // prefix before the first unplayable move is kept
        let (pv, pv_san) = match &root {
            Some(board) => walk_variation(ScratchPosition::new(board.clone()), &moves),
            None => (Vec::new(), Vec::new()),
        };
        if pv.is_empty() {
            // no playable move on this line; an earlier line for the same
            // index may still stand
            continue;
        }

        let index = multipv_index(line);
        analysis.multipv = analysis.multipv.max(index);
        candidates.insert(
            index,
            MoveCandidate {
                mv: pv[0].clone(),
                mv_san: pv_san[0].clone(),
                score_cp,
                score_wdl,
                pv,
                pv_san,
                nodes: field_u64(line, "nodes").unwrap_or(0),
                depth: field_u32(line, "depth").unwrap_or(0),
                policy: 0.0,
                rank: index,
            },
        );
    }

    let mut ranked: Vec<MoveCandidate> = candidates.into_values().collect();
    for (position, candidate) in ranked.iter_mut().enumerate() {
        candidate.rank = position as u32 + 1;
        if let Some((_, policy)) = policies.iter().find(|(mv, _)| *mv == candidate.mv) {
            candidate.policy = *policy;
        }
    }

    if let Some(best) = ranked.first() {
        analysis.evaluation_cp = best.score_cp;
        analysis.evaluation_wdl = best.score_wdl;
    }
    analysis.candidates = ranked;
    analysis
}

fn walk_variation(mut scratch: ScratchPosition, moves: &[&str]) -> (Vec<String>, Vec<String>) {
    let mut pv = Vec::new();
    let mut pv_san = Vec::new();
    for text in moves {
        match scratch.push_coordinate(text) {
            Some(san) => {
                pv.push((*text).to_string());
                pv_san.push(san);
            }
            None => break,
        }
    }
    (pv, pv_san)
}

/// Value token right after `key` in a whitespace-tokenized line.
fn token_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == key {
            return tokens.next();
        }
    }
    None
}

pub(crate) fn field_u64(line: &str, key: &str) -> Option<u64> {
    token_after(line, key)?.parse().ok()
}

pub(crate) fn field_u32(line: &str, key: &str) -> Option<u32> {
    token_after(line, key)?.parse().ok()
}

/// Candidate index of a progress line; single-PV engines omit the token,
/// which means candidate 1.
pub(crate) fn multipv_index(line: &str) -> u32 {
    field_u32(line, "multipv").unwrap_or(1)
}

/// `score cp -13` or `score mate 3`, already folded to centipawns.
pub(crate) fn score_centipawns(line: &str) -> Option<i32> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "score" {
            continue;
        }
        let kind = tokens.next()?;
        let value: i32 = tokens.next()?.parse().ok()?;
        return match kind {
            "cp" => Some(value),
            "mate" => Some(fold_mate(value)),
            _ => None,
        };
    }
    None
}

/// Fold a mate distance into the bounded centipawn range: winning mates
/// just under the bound, losing mates just above its negation.
pub(crate) fn fold_mate(mate: i32) -> i32 {
    if mate > 0 {
        MATE_BOUND - mate.abs()
    } else {
        -MATE_BOUND + mate.abs()
    }
}

/// Engine-native `wdl 512 435 53` triple (LC0 with UCI_ShowWDL).
pub(crate) fn native_wdl(line: &str) -> Option<WdlScore> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "wdl" {
            continue;
        }
        let win: u32 = tokens.next()?.parse().ok()?;
        let draw: u32 = tokens.next()?.parse().ok()?;
        let loss: u32 = tokens.next()?.parse().ok()?;
        return Some(WdlScore { win, draw, loss });
    }
    None
}

/// Moves of the `pv` field: every token after the keyword up to the next
/// known keyword. Engines put the variation last, so this is normally the
/// rest of the line.
pub(crate) fn pv_tokens(line: &str) -> Vec<&str> {
    let mut tokens = line.split_whitespace();
    let mut moves = Vec::new();
    while let Some(token) = tokens.next() {
        if token != "pv" {
            continue;
        }
        for token in tokens.by_ref() {
            if is_info_keyword(token) {
                break;
            }
            moves.push(token);
        }
        break;
    }
    moves
}

fn is_info_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "wdl"
            | "string"
    )
}

/// Neural engines report per-move priors on `info string` lines, e.g.
/// `info string e2e4 (293) N: 1234 (+ 0) (P: 9.70%) ...`.
pub(crate) fn policy_entry(line: &str) -> Option<(String, f64)> {
    let rest = line.strip_prefix("info string ")?;
    let mv = rest.split_whitespace().next()?;
    let after_marker = &line[line.find("(P:")? + 3..];
    let percent: f64 = after_marker[..after_marker.find('%')?].trim().parse().ok()?;
    Some((mv.to_string(), percent / 100.0))
}

/// Estimate win/draw/loss per-mille from a centipawn score.
///
/// Win probability is a sigmoid of the score in pawns; the draw share
/// decays exponentially away from equality. Loss is the remainder after
/// win and draw are fixed, which keeps the triple summing to exactly 1000.
pub(crate) fn estimate_wdl(score_cp: i32) -> WdlScore {
    let pawns = f64::from(score_cp) / 100.0;
    let win_prob = 1.0 / (1.0 + (-pawns * 0.5).exp());
    let draw_prob = 0.3 * (-pawns.abs() * 0.3).exp();
    let total = 1.0 + draw_prob;
    let win = ((win_prob / total) * 1000.0) as u32;
    let draw = ((draw_prob / total) * 1000.0) as u32;
    WdlScore {
        win,
        draw,
        loss: 1000 - win - draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_candidate_scenario() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 10 multipv 1 score cp 35 nodes 50000 time 120 nps 400000 pv e2e4 e7e5",
                "bestmove e2e4",
            ]),
        );
        assert_eq!(analysis.fen, START_FEN);
        assert_eq!(analysis.candidates.len(), 1);
        let best = &analysis.candidates[0];
        assert_eq!(best.mv, "e2e4");
        assert_eq!(best.mv_san, "e4");
        assert_eq!(best.score_cp, 35);
        assert_eq!(best.depth, 10);
        assert_eq!(best.rank, 1);
        assert_eq!(best.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(best.pv_san, vec!["e4", "e5"]);
        assert_eq!(analysis.evaluation_cp, 35);
        assert_eq!(analysis.total_nodes, 50000);
        assert_eq!(analysis.time_ms, 120);
        assert_eq!(analysis.nps, 400000);
        assert_eq!(analysis.depth, 10);
        assert_eq!(analysis.multipv, 1);
    }

    #[test]
    fn test_null_bestmove_yields_neutral_result() {
        let analysis = parse_analysis(START_FEN, &lines(&["bestmove 0000"]));
        assert!(analysis.candidates.is_empty());
        assert_eq!(analysis.evaluation_cp, 0);
        assert_eq!(analysis.evaluation_wdl, WdlScore::NEUTRAL);
        assert_eq!(analysis.total_nodes, 0);
        assert_eq!(analysis.multipv, 0);
    }

    #[test]
    fn test_later_line_replaces_same_index() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 8 multipv 1 score cp 10 nodes 1000 pv e2e4",
                "info depth 12 multipv 1 score cp 42 nodes 9000 pv d2d4 d7d5",
                "bestmove d2d4",
            ]),
        );
        assert_eq!(analysis.candidates.len(), 1);
        let best = &analysis.candidates[0];
        assert_eq!(best.mv, "d2d4");
        assert_eq!(best.score_cp, 42);
        assert_eq!(best.depth, 12);
        assert_eq!(analysis.evaluation_cp, 42);
    }

    #[test]
    fn test_index_gap_relabelled_contiguously() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 10 multipv 1 score cp 30 pv e2e4",
                "info depth 10 multipv 3 score cp 5 pv g1f3",
                "bestmove e2e4",
            ]),
        );
        let ranks: Vec<u32> = analysis.candidates.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert_eq!(analysis.candidates[0].mv, "e2e4");
        assert_eq!(analysis.candidates[1].mv, "g1f3");
        // telemetry keeps the engine-reported index, ranks are contiguous
        assert_eq!(analysis.multipv, 3);
    }

    #[test]
    fn test_unplayable_first_move_drops_candidate() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 10 multipv 1 score cp 30 pv e2e4",
                "info depth 10 multipv 2 score cp 20 pv e2e5",
                "bestmove e2e4",
            ]),
        );
        assert_eq!(analysis.candidates.len(), 1);
        assert_eq!(analysis.candidates[0].mv, "e2e4");
        assert_eq!(analysis.candidates[0].rank, 1);
    }

    #[test]
    fn test_pv_truncated_at_first_illegal_move() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                // third move repeats e2e4, illegal after 1.e4 e5
                "info depth 10 multipv 1 score cp 35 pv e2e4 e7e5 e2e4 g8f6",
                "bestmove e2e4",
            ]),
        );
        let best = &analysis.candidates[0];
        assert_eq!(best.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(best.pv_san, vec!["e4", "e5"]);
    }

    #[test]
    fn test_fully_legal_pv_round_trips() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 10 multipv 1 score cp 35 pv e2e4 e7e5 g1f3 b8c6",
                "bestmove e2e4",
            ]),
        );
        let best = &analysis.candidates[0];
        assert_eq!(best.pv.len(), 4);
        assert_eq!(best.pv_san, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_telemetry_is_running_maximum() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 12 seldepth 20 multipv 1 score cp 10 nodes 90000 time 500 nps 180000 pv e2e4",
                "info depth 14 multipv 1 score cp 12 nodes 40000 time 700 pv e2e4",
                "bestmove e2e4",
            ]),
        );
        assert_eq!(analysis.depth, 14);
        assert_eq!(analysis.seldepth, 20);
        assert_eq!(analysis.total_nodes, 90000);
        assert_eq!(analysis.time_ms, 700);
        assert_eq!(analysis.nps, 180000);
    }

    #[test]
    fn test_mate_scores_fold_into_bounded_range() {
        assert_eq!(fold_mate(1), 9999);
        assert_eq!(fold_mate(3), 9997);
        assert_eq!(fold_mate(-3), -9997);
        assert_eq!(fold_mate(0), -10000);
        // a short mate outranks a long one, and any mate outranks material
        assert!(fold_mate(2) > fold_mate(9));
        assert!(fold_mate(30) > 2000);
    }

    #[test]
    fn test_score_extraction() {
        assert_eq!(score_centipawns("info depth 5 score cp -13 pv e2e4"), Some(-13));
        assert_eq!(score_centipawns("info depth 5 score mate 3 pv e2e4"), Some(9997));
        assert_eq!(score_centipawns("info depth 5 score mate -2 pv e2e4"), Some(-9998));
        assert_eq!(score_centipawns("info depth 5 pv e2e4"), None);
    }

    #[test]
    fn test_field_extraction() {
        let line = "info depth 10 seldepth 14 multipv 2 score cp 35 nodes 50000 time 120 nps 400000 pv e2e4";
        assert_eq!(field_u32(line, "depth"), Some(10));
        assert_eq!(field_u32(line, "seldepth"), Some(14));
        assert_eq!(field_u64(line, "nodes"), Some(50000));
        assert_eq!(field_u64(line, "time"), Some(120));
        assert_eq!(field_u64(line, "nps"), Some(400000));
        assert_eq!(multipv_index(line), 2);
        // "depth" must not match inside "seldepth"
        assert_eq!(field_u32("info seldepth 14 pv e2e4", "depth"), None);
    }

    #[test]
    fn test_missing_multipv_defaults_to_one() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&["info depth 10 score cp 35 pv e2e4", "bestmove e2e4"]),
        );
        assert_eq!(analysis.candidates.len(), 1);
        assert_eq!(analysis.candidates[0].rank, 1);
        assert_eq!(analysis.multipv, 1);
    }

    #[test]
    fn test_pv_tokens_stop_at_keywords() {
        assert_eq!(pv_tokens("info depth 3 pv e2e4 e7e5 nps 1000"), vec!["e2e4", "e7e5"]);
        assert_eq!(pv_tokens("info depth 3 score cp 1"), Vec::<&str>::new());
    }

    #[test]
    fn test_native_wdl_preferred_over_estimate() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 10 multipv 1 score cp 35 wdl 512 435 53 pv e2e4",
                "bestmove e2e4",
            ]),
        );
        let wdl = analysis.candidates[0].score_wdl;
        assert_eq!(wdl, WdlScore { win: 512, draw: 435, loss: 53 });
        assert_eq!(analysis.evaluation_wdl, wdl);
    }

    #[test]
    fn test_policy_applied_from_info_string_lines() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info string e2e4  (322 ) N:    9040 (+ 0) (P:  9.70%) (Q: 0.02) (V: 0.05)",
                "info string d2d4  (293 ) N:    4520 (+ 0) (P:  8.10%) (Q: 0.01) (V: 0.04)",
                "info depth 10 multipv 1 score cp 35 wdl 512 435 53 pv e2e4",
                "info depth 10 multipv 2 score cp 20 wdl 470 450 80 pv d2d4",
                "bestmove e2e4",
            ]),
        );
        assert!((analysis.candidates[0].policy - 0.097).abs() < 1e-9);
        assert!((analysis.candidates[1].policy - 0.081).abs() < 1e-9);
    }

    #[test]
    fn test_policy_entry_extraction() {
        assert_eq!(
            policy_entry("info string e2e4  (322 ) N: 10 (P: 12.50%)"),
            Some(("e2e4".to_string(), 0.125))
        );
        assert_eq!(policy_entry("info string NNUE evaluation using nn.bin"), None);
        assert_eq!(policy_entry("info depth 3 pv e2e4"), None);
    }

    #[test]
    fn test_wdl_components_sum_to_1000() {
        for cp in [-2000, -500, -35, 0, 35, 120, 500, 2000, 9999] {
            let wdl = estimate_wdl(cp);
            assert_eq!(wdl.sum(), 1000, "sum broken at {cp}");
        }
    }

    #[test]
    fn test_wdl_symmetric_near_zero() {
        let wdl = estimate_wdl(0);
        assert!(wdl.win.abs_diff(wdl.loss) <= 5, "win {} loss {}", wdl.win, wdl.loss);
    }

    #[test]
    fn test_wdl_win_monotonic_in_score() {
        let scores = [-3000, -1000, -300, -100, -20, 0, 20, 100, 300, 1000, 3000];
        let wins: Vec<u32> = scores.iter().map(|cp| estimate_wdl(*cp).win).collect();
        for pair in wins.windows(2) {
            assert!(pair[0] <= pair[1], "win probability regressed: {wins:?}");
        }
    }

    #[test]
    fn test_wdl_draw_peaks_at_equality() {
        let at_zero = estimate_wdl(0).draw;
        assert!(at_zero > estimate_wdl(300).draw);
        assert!(at_zero > estimate_wdl(-300).draw);
    }

    #[test]
    fn test_invalid_fen_still_returns_result() {
        let analysis = parse_analysis(
            "not a fen",
            &lines(&["info depth 10 multipv 1 score cp 35 pv e2e4", "bestmove e2e4"]),
        );
        assert_eq!(analysis.fen, "not a fen");
        assert!(analysis.candidates.is_empty());
        assert_eq!(analysis.evaluation_cp, 0);
    }

    #[test]
    fn test_rank_one_score_matches_overall_evaluation() {
        let analysis = parse_analysis(
            START_FEN,
            &lines(&[
                "info depth 10 multipv 2 score cp -5 pv d2d4",
                "info depth 10 multipv 1 score cp 28 pv e2e4",
                "bestmove e2e4",
            ]),
        );
        assert_eq!(analysis.candidates[0].rank, 1);
        assert_eq!(analysis.candidates[0].score_cp, analysis.evaluation_cp);
    }
}
