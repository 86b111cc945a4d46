//! [`Bitboard`]-based representation for [`crate::chess::position::Position`].
//! Bitboard utilizes the fact that modern processors operate on 64 bit
//! integers, and the bit operations can be performed simultaneously. This
//! results in very efficient calculation of possible attack vectors: a whole
//! set of pieces can be shifted, filled along a ray or intersected with the
//! occupancy with a handful of word operations. The disadvantage is complexity
//! that comes with bitboard implementation and inefficiency of some operations
//! like "get piece type on given square" (efficiently handled by Square-centric
//! board implementations).
//!
//! [Bitboard]: https://www.chessprogramming.org/Bitboards

use std::fmt::{self, Write};
use std::ops::{
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    BitXor,
    BitXorAssign,
    Not,
    Shl,
    Shr,
    Sub,
    SubAssign,
};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::chess::core::{Direction, File, Piece, PieceKind, Player, Rank, Square};

/// Represents a set of squares and provides common operations (e.g. AND, OR,
/// XOR) over these sets. Each bit corresponds to one of 64 squares of the chess
/// board.
///
/// Mirroring [`Square`] semantics, the least significant
/// bit corresponds to A1, and the most significant bit - to H8.
///
/// Bitboard is a thin wrapper around [u64].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bitboard {
    bits: u64,
}

impl Bitboard {
    /// Constructs Bitboard from pre-calculated bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Constructs a bitboard representing empty set of squares.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_bits(0)
    }

    /// Constructs a bitboard representing the universal set, it contains all
    /// squares by setting all bits to binary one.
    #[must_use]
    pub const fn full() -> Self {
        Self::from_bits(u64::MAX)
    }

    /// Returns raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn from_squares(squares: &[Square]) -> Self {
        let mut result = Self::empty();
        for square in squares {
            result |= Self::from(*square);
        }
        result
    }

    /// Returns true if this bitboard contains given square.
    #[must_use]
    pub const fn contains(self, square: Square) -> bool {
        (self.bits & (1u64 << square as u8)) != 0
    }

    /// Population count.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.bits.count_ones()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Returns true if the sets intersect.
    #[must_use]
    pub const fn has_any(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    /// Returns the lowest set square.
    #[must_use]
    pub const fn first(self) -> Option<Square> {
        if self.bits == 0 {
            return None;
        }
        Some(Square::from_index(self.bits.trailing_zeros() as u8))
    }

    /// An efficient way to iterate over the set squares.
    #[must_use]
    pub const fn iter(self) -> BitboardIterator {
        BitboardIterator { bits: self.bits }
    }

    /// Mirrors the board vertically: rank 1 becomes rank 8 and vice versa.
    #[must_use]
    pub const fn flip_vertical(self) -> Self {
        Self::from_bits(self.bits.swap_bytes())
    }

    /// Converts the set from White's perspective to the given player's
    /// perspective: a no-op for White and [`Bitboard::flip_vertical`] for
    /// Black.
    #[must_use]
    pub const fn orient(self, player: Player) -> Self {
        match player {
            Player::White => self,
            Player::Black => self.flip_vertical(),
        }
    }

    /// Moves every square one step into given direction. Squares that would
    /// leave the board (including wrapping around the A and H files) are
    /// dropped.
    #[must_use]
    pub fn shift(self, direction: Direction) -> Self {
        self.shift_unmasked(direction, 1) & Self::wrap_mask(direction)
    }

    /// Same as [`Bitboard::shift`] but the direction is relative to the given
    /// player: "up" for Black is "down" on the board.
    #[must_use]
    pub fn shift_relative(self, direction: Direction, player: Player) -> Self {
        self.shift(direction.orient(player))
    }

    /// Occluded fill: extends every square of the set into the given direction
    /// for as long as the squares it lands on are in `empty`. The result
    /// includes the original set. Uses [Kogge-Stone] parallel prefix: three
    /// doubling steps reach any distance on the board.
    ///
    /// [Kogge-Stone]: https://www.chessprogramming.org/Kogge-Stone_Algorithm
    #[must_use]
    pub fn fill_occluded(self, direction: Direction, empty: Self) -> Self {
        let mut generator = self;
        let mut propagator = empty & Self::wrap_mask(direction);
        for steps in [1, 2, 4] {
            generator |= propagator & generator.shift_unmasked(direction, steps);
            propagator &= propagator.shift_unmasked(direction, steps);
        }
        generator
    }

    /// Squares attacked by sliding the set into given direction: the occluded
    /// fill shifted one more step, which adds the first blocker on each ray
    /// and drops the sliders themselves.
    #[must_use]
    pub fn attack_occluded(self, direction: Direction, empty: Self) -> Self {
        self.fill_occluded(direction, empty).shift(direction)
    }

    /// Enumerates every subset of the set exactly once (including the empty
    /// set and the set itself) using the [Carry-Rippler] trick.
    ///
    /// [Carry-Rippler]: https://www.chessprogramming.org/Traversing_Subsets_of_a_Set
    #[must_use]
    pub const fn subsets(self) -> Subsets {
        Subsets {
            mask: self.bits,
            next: Some(0),
        }
    }

    fn shift_unmasked(self, direction: Direction, steps: u32) -> Self {
        let offset = direction.offset();
        let amount = u32::from(offset.unsigned_abs()) * steps;
        if offset > 0 {
            self << amount
        } else {
            self >> amount
        }
    }

    /// Squares that can be reached by a single step into the direction
    /// without wrapping around the board edge.
    const fn wrap_mask(direction: Direction) -> Self {
        match direction {
            Direction::Up | Direction::Down => Self::full(),
            Direction::UpRight | Direction::Right | Direction::DownRight => {
                Self::from_bits(!File::A.mask().bits())
            },
            Direction::UpLeft | Direction::Left | Direction::DownLeft => {
                Self::from_bits(!File::H.mask().bits())
            },
        }
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let line = File::iter()
                .map(|file| {
                    if self.contains(Square::new(file, rank)) {
                        '1'
                    } else {
                        '.'
                    }
                })
                .join(SQUARE_SEPARATOR);
            f.write_str(&line)?;
            if rank != Rank::One {
                f.write_str(LINE_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitor(rhs.bits))
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits.bitor_assign(rhs.bits);
    }
}

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitand(rhs.bits))
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits.bitand_assign(rhs.bits);
    }
}

impl BitXor for Bitboard {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitxor(rhs.bits))
    }
}

impl BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.bits.bitxor_assign(rhs.bits);
    }
}

impl Sub for Bitboard {
    type Output = Self;

    /// [Relative component], i.e. Result = LHS \ RHS.
    ///
    /// [Relative component]: https://en.wikipedia.org/wiki/Complement_%28set_theory%29#Relative_complement
    fn sub(self, rhs: Self) -> Self::Output {
        self & !rhs
    }
}

impl SubAssign for Bitboard {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Not for Bitboard {
    type Output = Self;

    /// Returns [complement
    /// set](https://en.wikipedia.org/wiki/Complement_%28set_theory%29) of Self,
    /// i.e. flipping the set squares to unset and vice versa.
    fn not(self) -> Self::Output {
        Self::from_bits(!self.bits)
    }
}

impl Shl<u32> for Bitboard {
    type Output = Self;

    /// Shifts the bits to the left and ignores overflow.
    fn shl(self, rhs: u32) -> Self::Output {
        Self::from_bits(self.bits.checked_shl(rhs).unwrap_or(0))
    }
}

impl Shr<u32> for Bitboard {
    type Output = Self;

    /// Shifts the bits to the right and ignores overflow.
    fn shr(self, rhs: u32) -> Self::Output {
        Self::from_bits(self.bits.checked_shr(rhs).unwrap_or(0))
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Self::from_bits(1u64 << square as u8)
    }
}

impl IntoIterator for Bitboard {
    type IntoIter = BitboardIterator;
    type Item = Square;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterates over set squares in a given [Bitboard] from least significant 1
/// bits (LS1B) to most significant 1 bits (MS1B) through implementing
/// [`BitScan`] forward operation.
///
/// [BitScan]: https://www.chessprogramming.org/BitScan
#[derive(Debug)]
pub struct BitboardIterator {
    bits: u64,
}

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        // Get the LS1B and consume it from the iterator.
        let next_index = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        Some(Square::from_index(next_index as u8))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.bits.count_ones() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for BitboardIterator {}

/// Carry-Rippler enumeration of all subsets of a mask, see
/// [`Bitboard::subsets`].
#[derive(Debug)]
pub struct Subsets {
    mask: u64,
    next: Option<u64>,
}

impl Iterator for Subsets {
    type Item = Bitboard;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let following = current.wrapping_sub(self.mask) & self.mask;
        // The sequence wraps around to the empty set after the full mask.
        self.next = (following != 0).then_some(following);
        Some(Bitboard::from_bits(current))
    }
}

/// Piece-centric placement of all material on the board: one [Bitboard] per
/// [`Player`] and one per [`PieceKind`], sharing a single index space (the
/// discriminants of both enums). A piece on a square sets the bit in both its
/// colour and its kind bitboards. The main user is
/// [`crate::chess::position::Position`], which keeps the two views in sync.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pieces {
    bitboards: [Bitboard; 8],
}

impl Pieces {
    /// Constructs an empty placement to be filled by the position builder.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bitboards: [Bitboard::empty(); 8],
        }
    }

    /// Standard starting placement.
    #[must_use]
    pub fn starting() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut pieces = Self::empty();
        for player in [Player::White, Player::Black] {
            for (file, kind) in File::iter().zip(BACK_RANK) {
                pieces.put(
                    Square::new(file, Rank::One.orient(player)),
                    Piece::new(player, kind),
                );
                pieces.put(
                    Square::new(file, Rank::Two.orient(player)),
                    Piece::new(player, PieceKind::Pawn),
                );
            }
        }
        pieces
    }

    /// All squares occupied by the player.
    #[must_use]
    pub const fn player(&self, player: Player) -> Bitboard {
        self.bitboards[player as usize]
    }

    /// All squares occupied by pieces of the kind, regardless of the owner.
    #[must_use]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.bitboards[kind as usize]
    }

    /// Squares occupied by given player's pieces of the kind.
    #[must_use]
    pub const fn of(&self, player: Player, kind: PieceKind) -> Bitboard {
        Bitboard::from_bits(self.player(player).bits() & self.kind(kind).bits())
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn occupied(&self) -> Bitboard {
        Bitboard::from_bits(self.player(Player::White).bits() | self.player(Player::Black).bits())
    }

    /// Looks the piece up by scanning the colour and kind bitboards.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        let owner = [Player::White, Player::Black]
            .into_iter()
            .find(|player| self.player(*player).contains(square))?;
        let kind = PieceKind::iter().find(|kind| self.kind(*kind).contains(square))?;
        Some(Piece::new(owner, kind))
    }

    /// Places the piece on an empty square.
    pub fn put(&mut self, square: Square, piece: Piece) {
        self.toggle(Bitboard::from(square), piece);
    }

    /// Clears the square in every bitboard.
    pub fn clear(&mut self, square: Square) {
        let mask = !Bitboard::from(square);
        for bitboard in &mut self.bitboards {
            *bitboard &= mask;
        }
    }

    /// Flips membership of given squares in both bitboards of the piece. A
    /// two-square mask moves the piece in a single operation.
    pub fn toggle(&mut self, squares: Bitboard, piece: Piece) {
        self.bitboards[piece.owner as usize] ^= squares;
        self.bitboards[piece.kind as usize] ^= squares;
    }
}

impl fmt::Display for Pieces {
    /// Prints piece placement in FEN format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut empty_squares = 0i32;
            for file in File::iter() {
                let square = Square::new(file, rank);
                if let Some(piece) = self.at(square) {
                    if empty_squares != 0 {
                        write!(f, "{empty_squares}")?;
                        empty_squares = 0;
                    }
                    write!(f, "{piece}")?;
                } else {
                    empty_squares += 1;
                }
            }
            if empty_squares != 0 {
                write!(f, "{empty_squares}")?;
            }
            if rank != Rank::One {
                const RANK_SEPARATOR: char = '/';
                f.write_char(RANK_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Pieces {
    /// Dumps the board in a simple format ('.' for empty square, FEN algebraic
    /// symbol for piece) a-la Stockfish "debug" command in UCI mode.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                match self.at(Square::new(file, rank)) {
                    Some(piece) => write!(f, "{piece}"),
                    None => f.write_char('.'),
                }?;
                if file != File::H {
                    f.write_str(SQUARE_SEPARATOR)?;
                }
            }
            if rank != Rank::One {
                f.write_str(LINE_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

const LINE_SEPARATOR: &str = "\n";
const SQUARE_SEPARATOR: &str = " ";
