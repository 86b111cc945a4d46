//! Mappings of occupied squares to the attacked squares for each piece. The
//! mappings are pre-calculated where possible to provide an efficient way of
//! generating moves.
//!
//! Sliding pieces use a perfect-hash table: the occupancy relevant to the
//! slider on a given square (every square it could traverse, except the board
//! edges which never block anything) is compressed into a dense index with
//! [PEXT] and looked up in a flat array. The table is built from occluded
//! fills on first use and is immutable afterwards, so it can be read from any
//! number of threads without synchronization.
//!
//! [PEXT]: https://www.chessprogramming.org/BMI2#PEXTBitboards

use std::sync::LazyLock;

use strum::IntoEnumIterator;

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Direction, File, Player, Rank, Square, BOARD_SIZE};

const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::UpRight,
    Direction::DownRight,
    Direction::DownLeft,
    Direction::UpLeft,
];
const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

const BISHOP_ATTACKS_COUNT: usize = 5248;
const ROOK_ATTACKS_COUNT: usize = 102_400;

static ATTACKS: LazyLock<AttackTable> = LazyLock::new(AttackTable::new);

/// Builds the attack tables if they were not built yet. Lookups do this
/// implicitly; calling it up front moves the cost out of the first lookup.
pub fn init() {
    let _ = LazyLock::force(&ATTACKS);
}

struct AttackTable {
    bishops: SliderTable,
    rooks: SliderTable,
    knights: [Bitboard; BOARD_SIZE as usize],
    kings: [Bitboard; BOARD_SIZE as usize],
}

impl AttackTable {
    fn new() -> Self {
        let mut knights = [Bitboard::empty(); BOARD_SIZE as usize];
        let mut kings = [Bitboard::empty(); BOARD_SIZE as usize];
        for square in Square::iter() {
            knights[square.index()] = knight_attacks(square.into());
            kings[square.index()] = king_attacks(square.into());
        }
        let table = Self {
            bishops: SliderTable::new(&BISHOP_DIRECTIONS),
            rooks: SliderTable::new(&ROOK_DIRECTIONS),
            knights,
            kings,
        };
        debug_assert_eq!(table.bishops.attacks.len(), BISHOP_ATTACKS_COUNT);
        debug_assert_eq!(table.rooks.attacks.len(), ROOK_ATTACKS_COUNT);
        table
    }
}

struct SliderTable {
    relevant_occupancies: [Bitboard; BOARD_SIZE as usize],
    offsets: [usize; BOARD_SIZE as usize],
    attacks: Vec<Bitboard>,
}

impl SliderTable {
    fn new(directions: &[Direction]) -> Self {
        let mut relevant_occupancies = [Bitboard::empty(); BOARD_SIZE as usize];
        let mut offsets = [0; BOARD_SIZE as usize];
        let mut attacks = Vec::new();
        for square in Square::iter() {
            let mask = relevant_occupancy(square, directions);
            relevant_occupancies[square.index()] = mask;
            offsets[square.index()] = attacks.len();
            attacks.resize(attacks.len() + (1 << mask.count()), Bitboard::empty());
            for occupancy in mask.subsets() {
                let index = offsets[square.index()] + pext(occupancy.bits(), mask.bits()) as usize;
                attacks[index] = slide(square.into(), directions, !occupancy);
            }
        }
        Self {
            relevant_occupancies,
            offsets,
            attacks,
        }
    }

    fn lookup(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        let mask = self.relevant_occupancies[square.index()];
        self.attacks[self.offsets[square.index()] + pext(occupancy.bits(), mask.bits()) as usize]
    }
}

/// Squares a slider could traverse from `square` on an empty board, without
/// the edges: a piece standing on the last square of a ray does not change
/// the attacks.
fn relevant_occupancy(square: Square, directions: &[Direction]) -> Bitboard {
    let edges = ((Rank::One.mask() | Rank::Eight.mask()) - square.rank().mask())
        | ((File::A.mask() | File::H.mask()) - square.file().mask());
    slide(square.into(), directions, Bitboard::full()) - edges
}

fn slide(sliders: Bitboard, directions: &[Direction], empty: Bitboard) -> Bitboard {
    directions
        .iter()
        .fold(Bitboard::empty(), |attacks, direction| {
            attacks | sliders.attack_occluded(*direction, empty)
        })
}

/// Parallel bits extract: gathers the bits of `value` selected by `mask` into
/// the low bits of the result.
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
fn pext(value: u64, mask: u64) -> u64 {
    // The instruction is available: the target feature is enabled at compile
    // time.
    unsafe { std::arch::x86_64::_pext_u64(value, mask) }
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
fn pext(value: u64, mask: u64) -> u64 {
    software_pext(value, mask)
}

#[cfg_attr(all(target_arch = "x86_64", target_feature = "bmi2"), allow(dead_code))]
fn software_pext(value: u64, mask: u64) -> u64 {
    let mut result = 0u64;
    let mut mask = mask;
    let mut scanning_bit = 1u64;
    while mask != 0 {
        let ls1b = mask & mask.wrapping_neg();
        if (value & ls1b) != 0 {
            result |= scanning_bit;
        }
        mask ^= ls1b;
        scanning_bit <<= 1;
    }
    result
}

/// Bishop attacks from the square given full board occupancy. The first
/// blocker on each diagonal is included regardless of its owner.
#[must_use]
pub fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    ATTACKS.bishops.lookup(square, occupancy)
}

/// Rook attacks from the square given full board occupancy.
#[must_use]
pub fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    ATTACKS.rooks.lookup(square, occupancy)
}

#[allow(missing_docs)]
#[must_use]
pub fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

/// Pre-calculated attacks of a knight standing on the square.
#[must_use]
pub fn knight_attacks_from(square: Square) -> Bitboard {
    ATTACKS.knights[square.index()]
}

/// Pre-calculated attacks of a king standing on the square.
#[must_use]
pub fn king_attacks_from(square: Square) -> Bitboard {
    ATTACKS.kings[square.index()]
}

/// All squares attacked by a set of knights.
#[must_use]
pub fn knight_attacks(knights: Bitboard) -> Bitboard {
    let one_file = knights.shift(Direction::Left) | knights.shift(Direction::Right);
    let two_files = knights.shift(Direction::Left).shift(Direction::Left)
        | knights.shift(Direction::Right).shift(Direction::Right);
    one_file.shift(Direction::Up).shift(Direction::Up)
        | one_file.shift(Direction::Down).shift(Direction::Down)
        | two_files.shift(Direction::Up)
        | two_files.shift(Direction::Down)
}

/// All squares attacked by a set of kings.
#[must_use]
pub fn king_attacks(kings: Bitboard) -> Bitboard {
    let row = kings | kings.shift(Direction::Left) | kings.shift(Direction::Right);
    (row | row.shift(Direction::Up) | row.shift(Direction::Down)) - kings
}

/// Squares attacked by the player's pawns: one step diagonally forward.
#[must_use]
pub fn pawn_attacks(pawns: Bitboard, player: Player) -> Bitboard {
    pawns.shift_relative(Direction::UpLeft, player) | pawns.shift_relative(Direction::UpRight, player)
}

/// Diagonal attacks of a whole set of sliders computed with occluded fills.
#[must_use]
pub fn diagonal_attacks(sliders: Bitboard, empty: Bitboard) -> Bitboard {
    slide(sliders, &BISHOP_DIRECTIONS, empty)
}

/// Orthogonal attacks of a whole set of sliders computed with occluded fills.
#[must_use]
pub fn orthogonal_attacks(sliders: Bitboard, empty: Bitboard) -> Bitboard {
    slide(sliders, &ROOK_DIRECTIONS, empty)
}
