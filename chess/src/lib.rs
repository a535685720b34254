//! Board, notation, and position utilities shared by the engine adapters
//! and the server.
//!
//! This crate is the move-legality/notation oracle: everything that needs
//! to know the rules of chess (FEN loading, coordinate-move parsing, SAN
//! rendering, walking a variation) lives here, on top of `cozy-chess`.

pub mod fen;
pub mod position;
pub mod san;
pub mod uci;

pub use fen::{parse_fen, FenError};
pub use position::ScratchPosition;
pub use san::format_san;
pub use uci::{convert_castling_to_cozy, format_coordinate_move, parse_coordinate_move, NotationError};
