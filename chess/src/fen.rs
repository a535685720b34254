//! FEN handling for analysis positions.

use cozy_chess::Board;

/// Parse a FEN string into a board, rejecting anything cozy-chess cannot
/// load.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let trimmed = fen.trim();
    if trimmed.is_empty() {
        return Err(FenError::Empty);
    }
    trimmed
        .parse()
        .map_err(|_| FenError::Invalid(trimmed.to_string()))
}

/// Format a board back into FEN.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("empty FEN string")]
    Empty,
    #[error("invalid FEN: {0}")]
    Invalid(String),
}
