//! Coordinate (long algebraic) move notation, as spoken by UCI engines.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::position::is_legal_move;

#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("invalid coordinate move: {0}")]
    InvalidMove(String),
}

/// Parse an engine move such as "e2e4" or "e7e8q".
///
/// Only the encoding is checked here; legality belongs to the caller.
pub fn parse_coordinate_move(text: &str) -> Result<Move, NotationError> {
    text.parse()
        .map_err(|_| NotationError::InvalidMove(text.to_string()))
}

/// Format a move in coordinate notation (e.g. "e2e4", "e7e8q").
pub fn format_coordinate_move(mv: Move) -> String {
    mv.to_string()
}

/// Convert UCI castling encoding to cozy_chess encoding.
///
/// UCI moves the king two squares (e1g1, e1c1); cozy_chess encodes castling
/// as king-takes-rook (e1h1, e1a1). The move is rewritten only when the
/// origin square holds the king and the rewritten move is legal in `board`;
/// everything else passes through untouched.
pub fn convert_castling_to_cozy(mv: Move, board: &Board) -> Move {
    let on_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let from_e_file = matches!(mv.from.file(), File::E);
    let to_castle_file = matches!(mv.to.file(), File::G | File::C);
    if !(on_back_rank && from_e_file && to_castle_file && mv.promotion.is_none()) {
        return mv;
    }
    // a queen or rook sliding e1-g1 must not be mistaken for castling
    if board.piece_on(mv.from) != Some(Piece::King) {
        return mv;
    }

    let rook_file = match mv.to.file() {
        File::G => File::H,
        _ => File::A,
    };
    let converted = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };

    if is_legal_move(board, converted) {
        converted
    } else {
        mv
    }
}
