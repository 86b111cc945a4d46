//! [Zobrist hashing] of a [`Position`] compatible with the [Polyglot] opening
//! book format: the key of a position is the XOR of the precomputed random
//! numbers of its features.
//!
//! - Every piece on every square.
//! - Every castling right that is still available.
//! - The en passant file, but only when a pawn of the side to move could
//!   actually capture en passant (i.e. it stands right next to the pawn that
//!   has just been pushed).
//! - The side to move, when it is White.
//!
//! The move counters do not contribute to the key, so positions reached via
//! different move orders hash identically.
//!
//! [Zobrist hashing]: https://www.chessprogramming.org/Zobrist_Hashing
//! [Polyglot]: http://hgm.nubati.net/book_format.html

use crate::chess::attacks;
use crate::chess::bitboard::Bitboard;
use crate::chess::core::{CastleRights, File, Piece, PieceKind, Player, Square};
use crate::chess::position::Position;
use crate::chess::zobrist_keys::POLYGLOT_KEYS;

/// Hash key of a position.
pub type Key = u64;

const CASTLING_OFFSET: usize = 768;
const EN_PASSANT_OFFSET: usize = 772;
const TURN_OFFSET: usize = 780;

/// Key of the piece standing on the square. Polyglot orders the pieces as
/// black pawn, white pawn, black knight, white knight and so on.
#[must_use]
pub fn piece_key(piece: Piece, square: Square) -> Key {
    let kind = piece.kind as usize - PieceKind::Pawn as usize;
    let white = usize::from(piece.owner == Player::White);
    POLYGLOT_KEYS[64 * (kind * 2 + white) + square.index()]
}

/// XOR of the keys of all given castling rights.
#[must_use]
pub fn castling_key(rights: CastleRights) -> Key {
    [
        CastleRights::WHITE_SHORT,
        CastleRights::WHITE_LONG,
        CastleRights::BLACK_SHORT,
        CastleRights::BLACK_LONG,
    ]
    .into_iter()
    .enumerate()
    .filter(|(_, right)| rights.contains(*right))
    .fold(0, |key, (index, _)| key ^ POLYGLOT_KEYS[CASTLING_OFFSET + index])
}

#[allow(missing_docs)]
#[must_use]
pub fn en_passant_key(file: File) -> Key {
    POLYGLOT_KEYS[EN_PASSANT_OFFSET + file as usize]
}

/// Key that is mixed in when White is to move.
#[must_use]
pub fn white_to_move_key() -> Key {
    POLYGLOT_KEYS[TURN_OFFSET]
}

/// Computes the key of the position from scratch.
#[must_use]
pub fn hash(position: &Position) -> Key {
    let pieces = position.pieces();
    let mut key = 0;
    for player in [Player::White, Player::Black] {
        for square in pieces.player(player) {
            if let Some(piece) = pieces.at(square) {
                key ^= piece_key(piece, square);
            }
        }
    }
    key ^= castling_key(position.castling());
    if let Some(target) = position.en_passant_square() {
        let us = position.side_to_move();
        // Squares from which our pawns could capture onto the target.
        let capturers = attacks::pawn_attacks(Bitboard::from(target), us.opponent());
        if capturers.has_any(pieces.of(us, PieceKind::Pawn)) {
            key ^= en_passant_key(target.file());
        }
    }
    if position.side_to_move() == Player::White {
        key ^= white_to_move_key();
    }
    key
}
