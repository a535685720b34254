//! Standard algebraic notation for engine moves.

use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

use crate::position::legal_moves;

/// Format a legal move as SAN ("e4", "Nf3", "exd5", "O-O", "a8=Q+").
///
/// `mv` must be legal in `board` and use cozy_chess castling encoding
/// (king-takes-rook).
pub fn format_san(board: &Board, mv: Move) -> String {
    let stm = board.side_to_move();
    let piece = board.piece_on(mv.from).unwrap_or(Piece::Pawn);

    let mut san = if piece == Piece::King && board.color_on(mv.to) == Some(stm) {
        // castling: the king "captures" its own rook in cozy encoding
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let is_capture = board.color_on(mv.to) == Some(!stm)
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());
        let mut body = String::new();
        if piece == Piece::Pawn {
            if is_capture {
                body.push(file_char(mv.from.file()));
                body.push('x');
            }
            body.push_str(&square_text(mv.to));
            if let Some(promotion) = mv.promotion {
                body.push('=');
                body.push(piece_char(promotion));
            }
        } else {
            body.push(piece_char(piece));
            body.push_str(&disambiguation(board, piece, mv));
            if is_capture {
                body.push('x');
            }
            body.push_str(&square_text(mv.to));
        }
        body
    };

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won { '#' } else { '+' });
    }
    san
}

/// File, rank, or full-square prefix distinguishing `mv` from other legal
/// moves of the same piece type to the same destination.
fn disambiguation(board: &Board, piece: Piece, mv: Move) -> String {
    let mut rivals: Vec<Square> = Vec::new();
    for other in legal_moves(board) {
        if other.to == mv.to
            && other.from != mv.from
            && board.piece_on(other.from) == Some(piece)
            && !rivals.contains(&other.from)
        {
            rivals.push(other.from);
        }
    }
    if rivals.is_empty() {
        return String::new();
    }
    let file_shared = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let rank_shared = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
    if !file_shared {
        file_char(mv.from.file()).to_string()
    } else if !rank_shared {
        rank_char(mv.from.rank()).to_string()
    } else {
        square_text(mv.from)
    }
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

fn rank_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

fn square_text(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_coordinate_move, parse_fen};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn san(fen: &str, mv: &str) -> String {
        let board = parse_fen(fen).unwrap();
        format_san(&board, parse_coordinate_move(mv).unwrap())
    }

    #[test]
    fn test_pawn_push() {
        assert_eq!(san(START_FEN, "e2e4"), "e4");
    }

    #[test]
    fn test_knight_move() {
        assert_eq!(san(START_FEN, "g1f3"), "Nf3");
    }

    #[test]
    fn test_pawn_capture() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san(fen, "e4d5"), "exd5");
    }

    #[test]
    fn test_en_passant_capture() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert_eq!(san(fen, "e5f6"), "exf6");
    }

    #[test]
    fn test_castling_kingside() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQK2R w KQkq - 0 1";
        assert_eq!(san(fen, "e1h1"), "O-O");
    }

    #[test]
    fn test_castling_queenside() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/R3KBNR w KQkq - 0 1";
        assert_eq!(san(fen, "e1a1"), "O-O-O");
    }

    #[test]
    fn test_promotion() {
        let fen = "8/P6k/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(san(fen, "a7a8q"), "a8=Q");
    }

    #[test]
    fn test_check_suffix() {
        let fen = "4k3/8/8/8/8/8/8/4KQ2 w - - 0 1";
        assert_eq!(san(fen, "f1f8"), "Qf8+");
    }

    #[test]
    fn test_checkmate_suffix() {
        // fool's mate
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san(fen, "d8h4"), "Qh4#");
    }

    #[test]
    fn test_file_disambiguation() {
        let fen = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
        assert_eq!(san(fen, "b1d2"), "Nbd2");
        assert_eq!(san(fen, "f3d2"), "Nfd2");
    }

    #[test]
    fn test_rook_disambiguation() {
        // rooks a1 and h1 share the first rank, so files disambiguate
        let fen = "4k3/8/8/8/8/8/4K3/R6R w - - 0 1";
        assert_eq!(san(fen, "a1d1"), "Rad1");
    }

    #[test]
    fn test_no_disambiguation_for_lone_piece() {
        let fen = "4k3/8/8/8/8/8/8/1N2K3 w - - 0 1";
        assert_eq!(san(fen, "b1d2"), "Nd2");
    }
}
