//! Chess primitives commonly used within [`crate::chess`].

use std::fmt::{self, Write};
use std::mem;

use anyhow::bail;
use itertools::Itertools;

use crate::chess::bitboard::Bitboard;

#[allow(missing_docs)]
pub const BOARD_WIDTH: u8 = 8;
#[allow(missing_docs)]
pub const BOARD_SIZE: u8 = BOARD_WIDTH * BOARD_WIDTH;

/// Represents any kind of a legal chess move in a compact 16-bit form:
///
/// | Bits   | Meaning        |
/// | ------ | -------------- |
/// | 12..16 | [`MoveFlags`]  |
/// | 6..12  | `from` square  |
/// | 0..6   | `to` square    |
///
/// A move is the only way to mutate [`crate::chess::position::Position`] and
/// change the board state. The flags carry everything
/// [`crate::chess::position::Position::push_move`] needs to know about the
/// move (captures, castling, en passant, promotions), so applying a move never
/// has to re-discover its kind.
///
/// For castling, `from` and `to` correspond to the king. For en passant, `to`
/// is the en passant target square, not the square of the captured pawn.
///
/// ```
/// use flipboard::chess::core::{Move, MoveFlags, Square};
///
/// let double_push = Move::new(Square::E2, Square::E4, MoveFlags::DOUBLE_PAWN_PUSH);
/// assert_eq!(double_push.to_string(), "e2e4");
/// assert_eq!(std::mem::size_of::<Move>(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    packed: u16,
}

impl Move {
    const SQUARE_MASK: u16 = 0b11_1111;
    const FROM_SHIFT: u16 = 6;
    const FLAGS_SHIFT: u16 = 12;

    /// Packs the move.
    #[must_use]
    pub const fn new(from: Square, to: Square, flags: MoveFlags) -> Self {
        Self {
            packed: ((flags.bits() as u16) << Self::FLAGS_SHIFT)
                | ((from as u16) << Self::FROM_SHIFT)
                | to as u16,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn from(self) -> Square {
        Square::from_index(((self.packed >> Self::FROM_SHIFT) & Self::SQUARE_MASK) as u8)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn to(self) -> Square {
        Square::from_index((self.packed & Self::SQUARE_MASK) as u8)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn flags(self) -> MoveFlags {
        MoveFlags::from_bits_retain((self.packed >> Self::FLAGS_SHIFT) as u8)
    }

    /// Returns true for regular captures, en passant and capturing promotions.
    #[must_use]
    pub const fn is_capture(self) -> bool {
        self.flags().contains(MoveFlags::CAPTURE)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_en_passant(self) -> bool {
        self.flags().bits() == MoveFlags::EN_PASSANT_CAPTURE.bits()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_double_pawn_push(self) -> bool {
        self.flags().bits() == MoveFlags::DOUBLE_PAWN_PUSH.bits()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_kingside_castle(self) -> bool {
        self.flags().bits() == MoveFlags::KINGSIDE_CASTLE.bits()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_queenside_castle(self) -> bool {
        self.flags().bits() == MoveFlags::QUEENSIDE_CASTLE.bits()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_castle(self) -> bool {
        self.is_kingside_castle() || self.is_queenside_castle()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_promotion(self) -> bool {
        self.flags().contains(MoveFlags::PROMOTION)
    }

    /// The piece a pawn turns into is stored in the two least significant bits
    /// of the flags.
    #[must_use]
    pub const fn promotion(self) -> Option<Promotion> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.flags().bits() & MoveFlags::PROMOTION_KIND_MASK.bits() {
            0 => Promotion::Knight,
            1 => Promotion::Bishop,
            2 => Promotion::Rook,
            _ => Promotion::Queen,
        })
    }

    /// Encodes the move for a [Polyglot] opening book: to-file, to-rank,
    /// from-file, from-rank (3 bits each, least significant first) and the
    /// promotion piece (none, knight, bishop, rook, queen). Castling moves are
    /// stored as "king captures own rook".
    ///
    /// [Polyglot]: http://hgm.nubati.net/book_format.html
    #[must_use]
    pub fn to_polyglot(self) -> u16 {
        let to = match (self.is_kingside_castle(), self.is_queenside_castle()) {
            (true, _) => Square::new(File::H, self.to().rank()),
            (_, true) => Square::new(File::A, self.to().rank()),
            _ => self.to(),
        };
        let promotion = self.promotion().map_or(0, |promotion| promotion as u16 + 1);
        (to.file() as u16)
            | ((to.rank() as u16) << 3)
            | ((self.from().file() as u16) << 6)
            | ((self.from().rank() as u16) << 9)
            | (promotion << 12)
    }
}

impl fmt::Display for Move {
    /// Serializes a move in [UCI format].
    ///
    /// [UCI format]: http://wbec-ridderkerk.nl/html/UCIProtocol.html
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{}", PieceKind::from(promotion))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?})", self.flags())
    }
}

bitflags::bitflags! {
    /// More information about [`Move`] that makes it possible to make that move
    /// and dump it in human-readable format (e.g. Standard Algebraic Notation).
    ///
    /// Apart from the "regular" or "quiet" moves (simply moving a piece from
    /// one square to the other), there are few important rules:
    ///
    /// - [En passant] is a capture of opponent's pawn "in passing" (when it
    ///   advances two squares from its original position).
    /// - The [Castle] move that will involve a king and a rook "jumping" over
    ///   each other. Technically, castling is a king move, so `from` and `to`
    ///   move squares will correspond to the king.
    ///
    /// The values resemble a common [Move Encoding] technique:
    ///
    /// | Index | Promotion | Capture | MSB Special | LSB Special | Move Kind |
    /// | ----- | --------- | ------- | ----------- | ----------- | --------- |
    /// | 0  | 0 | 0 | 0 | 0 | Quiet move |
    /// | 1  | 0 | 0 | 0 | 1 | Double pawn push |
    /// | 2  | 0 | 0 | 1 | 0 | Kingside castle (short castle or O-O) |
    /// | 3  | 0 | 0 | 1 | 1 | Queenside castle (long castle or O-O-O) |
    /// | 4  | 0 | 1 | 0 | 0 | Capture |
    /// | 5  | 0 | 1 | 0 | 1 | En Passant capture |
    /// | 8  | 1 | 0 | 0 | 0 | Knight promotion |
    /// | 9  | 1 | 0 | 0 | 1 | Bishop promotion |
    /// | 10 | 1 | 0 | 1 | 0 | Rook promotion |
    /// | 11 | 1 | 0 | 1 | 1 | Queen promotion |
    /// | 12 | 1 | 1 | 0 | 0 | Capture and knight promotion |
    /// | 13 | 1 | 1 | 0 | 1 | Capture and bishop promotion |
    /// | 14 | 1 | 1 | 1 | 0 | Capture and rook promotion |
    /// | 15 | 1 | 1 | 1 | 1 | Capture and queen promotion |
    ///
    /// This representation is compact and allows to conveniently query
    /// attributes for a specific kind of move.
    ///
    /// [Castle]: https://en.wikipedia.org/wiki/Castling
    /// [En passant]: https://en.wikipedia.org/wiki/En_passant
    /// [Move Encoding]: https://www.chessprogramming.org/Encoding_Moves
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct MoveFlags: u8 {
        /// Moves that do not change the material balance.
        const QUIET = 0;

        /// Implementation detail.
        const MSB_SPECIAL = 0b0010;
        /// Implementation detail.
        const LSB_SPECIAL = 0b0001;
        /// Implementation detail: selects the promoted piece.
        const PROMOTION_KIND_MASK = Self::MSB_SPECIAL.bits() | Self::LSB_SPECIAL.bits();

        /// Pawn advancement by 2 squares from the original rank (second for
        /// white and seventh for black).
        const DOUBLE_PAWN_PUSH = Self::LSB_SPECIAL.bits();
        /// Short castle or O-O.
        const KINGSIDE_CASTLE = Self::MSB_SPECIAL.bits();
        /// Long castle or O-O-O.
        const QUEENSIDE_CASTLE = Self::MSB_SPECIAL.bits() | Self::LSB_SPECIAL.bits();

        /// Moves that changes the material balance.
        const CAPTURE = 0b0100;
        /// Pawn capturing a pawn that has just made a double push.
        const EN_PASSANT_CAPTURE = Self::CAPTURE.bits() | Self::LSB_SPECIAL.bits();

        /// Pawn move to the opponent's "home" rank and promotion to a queen
        /// (often a default option), knight, bishop or rook.
        const PROMOTION = 0b1000;

        /// Pawn promotion to [`PieceKind::Knight`].
        const KNIGHT_PROMOTION = Self::PROMOTION.bits();
        /// Pawn promotion to [`PieceKind::Bishop`].
        const BISHOP_PROMOTION = Self::PROMOTION.bits() | Self::LSB_SPECIAL.bits();
        /// Pawn promotion to [`PieceKind::Rook`].
        const ROOK_PROMOTION = Self::PROMOTION.bits() | Self::MSB_SPECIAL.bits();
        /// Pawn promotion to [`PieceKind::Queen`].
        const QUEEN_PROMOTION = Self::PROMOTION.bits()
            | Self::MSB_SPECIAL.bits()
            | Self::LSB_SPECIAL.bits();
    }
}

impl From<Promotion> for MoveFlags {
    fn from(promotion: Promotion) -> Self {
        match promotion {
            Promotion::Knight => Self::KNIGHT_PROMOTION,
            Promotion::Bishop => Self::BISHOP_PROMOTION,
            Promotion::Rook => Self::ROOK_PROMOTION,
            Promotion::Queen => Self::QUEEN_PROMOTION,
        }
    }
}

/// Board squares: from left to right, from bottom to the top:
///
/// ```
/// use flipboard::chess::core::Square;
///
/// assert_eq!(Square::A1 as u8, 0);
/// assert_eq!(Square::E1 as u8, 4);
/// assert_eq!(Square::H1 as u8, 7);
/// assert_eq!(Square::A4 as u8, 8 * 3);
/// assert_eq!(Square::H8 as u8, 63);
/// ```
///
/// Square is a compact representation using only one byte.
///
/// ```
/// use flipboard::chess::core::Square;
/// use std::mem;
///
/// assert_eq!(std::mem::size_of::<Square>(), 1);
/// ```
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
#[rustfmt::skip]
#[allow(missing_docs)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

impl Square {
    /// Connects file (column) and rank (row) to form a full square.
    #[must_use]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self::from_index(file as u8 + (rank as u8) * BOARD_WIDTH)
    }

    /// Converts an index that is already known to be within the board.
    pub(crate) const fn from_index(index: u8) -> Self {
        debug_assert!(index < BOARD_SIZE);
        // Masking keeps the value within 0..BOARD_SIZE, every one of which is
        // a valid discriminant.
        unsafe { mem::transmute(index & (BOARD_SIZE - 1)) }
    }

    /// Returns file (column) on which the square is located.
    #[must_use]
    pub const fn file(self) -> File {
        unsafe { mem::transmute(self as u8 % BOARD_WIDTH) }
    }

    /// Returns rank (row) on which the square is located.
    #[must_use]
    pub const fn rank(self) -> Rank {
        unsafe { mem::transmute(self as u8 / BOARD_WIDTH) }
    }

    /// Index of the square for table lookups.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Mirrors the square vertically: A1 becomes A8, E2 becomes E7.
    #[must_use]
    pub const fn flip(self) -> Self {
        Self::from_index(self as u8 ^ 0b11_1000)
    }

    /// Converts a square from White's perspective to the given player's
    /// perspective: a no-op for White and [`Square::flip`] for Black.
    #[must_use]
    pub const fn orient(self, player: Player) -> Self {
        match player {
            Player::White => self,
            Player::Black => self.flip(),
        }
    }

    /// Returns true for the light squares (A1 is dark, H1 is light).
    #[must_use]
    pub const fn is_light(self) -> bool {
        (self.file() as u8 + self.rank() as u8) % 2 == 1
    }

    /// Steps one square into the given direction, or returns [`None`] when
    /// stepping off the board.
    #[must_use]
    pub fn shift(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::UpRight | Direction::Right | Direction::DownRight => {
                if self.file() == File::H {
                    return None;
                }
            },
            Direction::UpLeft | Direction::Left | Direction::DownLeft => {
                if self.file() == File::A {
                    return None;
                }
            },
            Direction::Up | Direction::Down => (),
        }
        let candidate = i16::from(self as u8) + i16::from(direction.offset());
        match u8::try_from(candidate) {
            Ok(index) => Self::try_from(index).ok(),
            Err(_) => None,
        }
    }
}

impl TryFrom<u8> for Square {
    type Error = anyhow::Error;

    /// Creates a square given its position on the board.
    ///
    /// # Errors
    ///
    /// If given square index is outside 0..[`BOARD_SIZE`] range.
    fn try_from(square_index: u8) -> anyhow::Result<Self> {
        // Exclusive range patterns are not allowed:
        // https://github.com/rust-lang/rust/issues/37854
        const MAX_INDEX: u8 = BOARD_SIZE - 1;
        match square_index {
            0..=MAX_INDEX => Ok(Self::from_index(square_index)),
            _ => bail!("square index should be in 0..BOARD_SIZE, got {square_index}"),
        }
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;

    fn try_from(square: &str) -> anyhow::Result<Self> {
        let (file, rank) = match square.chars().collect_tuple() {
            Some((file, rank)) => (file, rank),
            None => bail!(
                "square should be two-char, got {square} with {} chars",
                square.chars().count()
            ),
        };
        Ok(Self::new(file.try_into()?, rank.try_into()?))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

/// Represents a column (vertical row) of the chessboard. In chess notation, it
/// is normally represented with a lowercase letter.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
#[allow(missing_docs)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    /// Returns a pre-calculated bitboard mask with 1s set for squares of the
    /// given file.
    #[must_use]
    pub const fn mask(self) -> Bitboard {
        Bitboard::from_bits(0x0101_0101_0101_0101 << self as u8)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char((b'a' + *self as u8) as char)
    }
}

impl TryFrom<char> for File {
    type Error = anyhow::Error;

    fn try_from(file: char) -> anyhow::Result<Self> {
        match file {
            'a'..='h' => Ok(unsafe { mem::transmute(file as u8 - b'a') }),
            _ => bail!("file should be within 'a'..='h', got '{file}'"),
        }
    }
}

impl TryFrom<u8> for File {
    type Error = anyhow::Error;

    fn try_from(column: u8) -> anyhow::Result<Self> {
        match column {
            0..=7 => Ok(unsafe { mem::transmute(column) }),
            _ => bail!("file should be within 0..BOARD_WIDTH, got {column}"),
        }
    }
}

/// Represents a horizontal row of the chessboard. In chess notation, it is
/// represented with a number. The implementation assumes zero-based values
/// (i.e. rank 1 would be 0).
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
#[allow(missing_docs)]
pub enum Rank {
    One = 0,
    Two = 1,
    Three = 2,
    Four = 3,
    Five = 4,
    Six = 5,
    Seven = 6,
    Eight = 7,
}

impl Rank {
    /// Returns a pre-calculated bitboard mask with 1s set for squares of the
    /// given rank.
    #[must_use]
    pub const fn mask(self) -> Bitboard {
        Bitboard::from_bits(0xFF << (self as u8 * BOARD_WIDTH))
    }

    /// Converts a rank from White's perspective to the given player's
    /// perspective, e.g. the third rank for Black is [`Rank::Six`].
    #[must_use]
    pub const fn orient(self, player: Player) -> Self {
        match player {
            Player::White => self,
            Player::Black => unsafe { mem::transmute(BOARD_WIDTH - 1 - self as u8) },
        }
    }
}

impl TryFrom<char> for Rank {
    type Error = anyhow::Error;

    fn try_from(rank: char) -> anyhow::Result<Self> {
        match rank {
            '1'..='8' => Ok(unsafe { mem::transmute(rank as u8 - b'1') }),
            _ => bail!("rank should be within '1'..='8', got '{rank}'"),
        }
    }
}

impl TryFrom<u8> for Rank {
    type Error = anyhow::Error;

    fn try_from(row: u8) -> anyhow::Result<Self> {
        match row {
            0..=7 => Ok(unsafe { mem::transmute(row) }),
            _ => bail!("rank should be within 0..BOARD_WIDTH, got {row}"),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8 + 1)
    }
}

/// A standard game of chess is played between two players: White (having the
/// advantage of the first turn) and Black.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    White = 0,
    Black = 1,
}

impl Player {
    /// "Flips" the color.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl TryFrom<&str> for Player {
    type Error = anyhow::Error;

    fn try_from(player: &str) -> anyhow::Result<Self> {
        match player {
            "w" => Ok(Self::White),
            "b" => Ok(Self::Black),
            _ => bail!("player should be 'w' or 'b', got '{player}'"),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match &self {
            Self::White => 'w',
            Self::Black => 'b',
        })
    }
}

/// Compile-time [`Player`]: move generation and move application are written
/// once from White's perspective and instantiated for both sides through this
/// trait, so that "forward", "home rank" and the castling squares never have to
/// be spelled out twice.
pub trait Side {
    /// The player this side describes.
    const PLAYER: Player;
    /// The other side.
    type Opponent: Side;
}

/// [`Side`] of [`Player::White`].
#[derive(Debug)]
pub struct White;

/// [`Side`] of [`Player::Black`].
#[derive(Debug)]
pub struct Black;

impl Side for White {
    const PLAYER: Player = Player::White;
    type Opponent = Black;
}

impl Side for Black {
    const PLAYER: Player = Player::Black;
    type Opponent = White;
}

/// Standard [chess pieces]. The discriminants follow the two
/// [`Player`] values so that piece kinds and colours can share one index space
/// of [`crate::chess::bitboard::Pieces`].
///
/// [chess pieces]: https://en.wikipedia.org/wiki/Chess_piece
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
pub enum PieceKind {
    Pawn = 2,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl From<Promotion> for PieceKind {
    fn from(promotion: Promotion) -> Self {
        match promotion {
            Promotion::Queen => Self::Queen,
            Promotion::Rook => Self::Rook,
            Promotion::Bishop => Self::Bishop,
            Promotion::Knight => Self::Knight,
        }
    }
}

impl TryFrom<char> for PieceKind {
    type Error = anyhow::Error;

    fn try_from(kind: char) -> anyhow::Result<Self> {
        match kind {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("piece kind should be within \"pnbrqk\", got '{kind}'"),
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match &self {
            Self::King => 'k',
            Self::Queen => 'q',
            Self::Rook => 'r',
            Self::Bishop => 'b',
            Self::Knight => 'n',
            Self::Pawn => 'p',
        })
    }
}

/// Represents a specific piece owned by a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    #[allow(missing_docs)]
    pub owner: Player,
    #[allow(missing_docs)]
    pub kind: PieceKind,
}

impl Piece {
    #[allow(missing_docs)]
    #[must_use]
    pub const fn new(owner: Player, kind: PieceKind) -> Self {
        Self { owner, kind }
    }
}

impl TryFrom<char> for Piece {
    type Error = anyhow::Error;

    /// Parses FEN piece symbols: uppercase for White, lowercase for Black.
    fn try_from(symbol: char) -> anyhow::Result<Self> {
        let owner = if symbol.is_ascii_uppercase() {
            Player::White
        } else {
            Player::Black
        };
        match PieceKind::try_from(symbol.to_ascii_lowercase()) {
            Ok(kind) => Ok(Self::new(owner, kind)),
            Err(_) => bail!("piece symbol should be within \"KQRBNPkqrbnp\", got '{symbol}'"),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = PieceKind::to_string(&self.kind);
        match self.owner {
            // White player: uppercase symbols.
            Player::White => f.write_str(&symbol.to_ascii_uppercase()),
            // Black player: lowercase symbols.
            Player::Black => f.write_str(&symbol),
        }
    }
}

bitflags::bitflags! {
    /// Track the ability to [castle] each side (kingside is often referred to
    /// as O-O or h-side castle, queenside -- O-O-O or a-side castle). When the
    /// king moves, player loses ability to castle both sides. When the rook
    /// moves or is captured on its original square, player loses ability to
    /// castle its corresponding side.
    ///
    /// - When castling h-side (short), the king ends up on [`File::G`] and the
    ///   rook on [`File::F`]
    /// - When castling a-side (long), the king ends up on [`File::C`] and the
    ///   rook on [`File::D`]
    ///
    /// The full rules are:
    ///
    /// - The king and the castling rook must not have previously moved.
    /// - No square from the king's initial square to its final square may be under
    ///   attack by an enemy piece.
    /// - All the squares between the king's initial and final squares
    ///   (including the final square), and all the squares between the castling
    ///   rook's initial and final squares (including the final square), must be
    ///   vacant except for the king and castling rook.
    ///
    /// [castle]: https://www.chessprogramming.org/Castling
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct CastleRights : u8 {
        #[allow(missing_docs)]
        const NONE = 0;
        #[allow(missing_docs)]
        const WHITE_SHORT = 0b1000;
        #[allow(missing_docs)]
        const WHITE_LONG = 0b0100;
        #[allow(missing_docs)]
        const WHITE_BOTH = Self::WHITE_SHORT.bits() | Self::WHITE_LONG.bits();
        #[allow(missing_docs)]
        const BLACK_SHORT = 0b0010;
        #[allow(missing_docs)]
        const BLACK_LONG = 0b0001;
        #[allow(missing_docs)]
        const BLACK_BOTH = Self::BLACK_SHORT.bits() | Self::BLACK_LONG.bits();
        #[allow(missing_docs)]
        const ALL = Self::WHITE_BOTH.bits() | Self::BLACK_BOTH.bits();
    }
}

impl CastleRights {
    /// Kingside castling right of the given player.
    #[must_use]
    pub const fn short(player: Player) -> Self {
        match player {
            Player::White => Self::WHITE_SHORT,
            Player::Black => Self::BLACK_SHORT,
        }
    }

    /// Queenside castling right of the given player.
    #[must_use]
    pub const fn long(player: Player) -> Self {
        match player {
            Player::White => Self::WHITE_LONG,
            Player::Black => Self::BLACK_LONG,
        }
    }

    /// Both castling rights of the given player.
    #[must_use]
    pub const fn both(player: Player) -> Self {
        Self::short(player).union(Self::long(player))
    }
}

impl TryFrom<&str> for CastleRights {
    type Error = anyhow::Error;

    /// Parses the castling field of FEN: either `-` or a non-empty subset of
    /// `KQkq` in this order.
    ///
    /// # Errors
    ///
    /// Returns [`anyhow::Error`] on unknown symbols, repeated rights and
    /// rights out of order.
    fn try_from(input: &str) -> anyhow::Result<Self> {
        match input {
            "-" => return Ok(Self::NONE),
            "" => bail!("castle rights can not be empty"),
            _ => {},
        }
        input.chars().try_fold(Self::NONE, |rights, symbol| {
            let right = match symbol {
                'K' => Self::WHITE_SHORT,
                'Q' => Self::WHITE_LONG,
                'k' => Self::BLACK_SHORT,
                'q' => Self::BLACK_LONG,
                _ => bail!("unknown castle rights: {input}"),
            };
            // KQkq occupy the bits from high to low.
            if right.bits().trailing_zeros() >= rights.bits().trailing_zeros() {
                bail!("castle rights should follow KQkq order without repeats, got {input}");
            }
            Ok(rights | right)
        })
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return f.write_char('-');
        }
        if self.contains(Self::WHITE_SHORT) {
            f.write_char('K')?;
        }
        if self.contains(Self::WHITE_LONG) {
            f.write_char('Q')?;
        }
        if self.contains(Self::BLACK_SHORT) {
            f.write_char('k')?;
        }
        if self.contains(Self::BLACK_LONG) {
            f.write_char('q')?;
        }
        Ok(())
    }
}

/// A pawn can be promoted to a queen, rook, bishop or a knight. The order
/// matches the promotion bits of [`MoveFlags`].
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
pub enum Promotion {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl TryFrom<char> for Promotion {
    type Error = anyhow::Error;

    fn try_from(symbol: char) -> anyhow::Result<Self> {
        match symbol {
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            _ => bail!("promotion should be within \"nbrq\", got '{symbol}'"),
        }
    }
}

/// Directions on the board from a perspective of White player.
///
/// Traditionally those are North (Up), West (Left), East (Right), South (Down)
/// and their combinations. However, using cardinal directions is confusing,
/// hence they are replaced by relative directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::EnumIter)]
pub enum Direction {
    /// Also known as North.
    Up,
    /// Also known as NorthEast.
    UpRight,
    /// Also known as East.
    Right,
    /// Also known as SouthEast.
    DownRight,
    /// Also known as South.
    Down,
    /// Also known as SouthWest.
    DownLeft,
    /// Also known as West.
    Left,
    /// Also known as NorthWest.
    UpLeft,
}

impl Direction {
    /// Difference between square indices after a single step.
    #[must_use]
    pub const fn offset(self) -> i8 {
        const WIDTH: i8 = BOARD_WIDTH as i8;
        match self {
            Self::Up => WIDTH,
            Self::UpRight => WIDTH + 1,
            Self::Right => 1,
            Self::DownRight => -WIDTH + 1,
            Self::Down => -WIDTH,
            Self::DownLeft => -WIDTH - 1,
            Self::Left => -1,
            Self::UpLeft => WIDTH - 1,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::UpRight => Self::DownLeft,
            Self::Right => Self::Left,
            Self::DownRight => Self::UpLeft,
            Self::Down => Self::Up,
            Self::DownLeft => Self::UpRight,
            Self::Left => Self::Right,
            Self::UpLeft => Self::DownRight,
        }
    }

    /// Converts a direction from White's perspective to the given player's
    /// perspective: "up" for Black is "down" on the board.
    #[must_use]
    pub const fn orient(self, player: Player) -> Self {
        match player {
            Player::White => self,
            Player::Black => match self {
                Self::Up => Self::Down,
                Self::UpRight => Self::DownRight,
                Self::DownRight => Self::UpRight,
                Self::Down => Self::Up,
                Self::DownLeft => Self::UpLeft,
                Self::UpLeft => Self::DownLeft,
                Self::Right | Self::Left => self,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::mem::{size_of, size_of_val};

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn rank() {
        assert_eq!(
            ('1'..='9')
                .filter_map(|ch| Rank::try_from(ch).ok())
                .collect::<Vec<Rank>>(),
            vec![
                Rank::One,
                Rank::Two,
                Rank::Three,
                Rank::Four,
                Rank::Five,
                Rank::Six,
                Rank::Seven,
                Rank::Eight,
            ]
        );
        assert_eq!(
            (0..=BOARD_WIDTH)
                .filter_map(|idx| Rank::try_from(idx).ok())
                .collect::<Vec<Rank>>(),
            Rank::iter().collect::<Vec<_>>()
        );
        assert_eq!(Rank::Two.orient(Player::Black), Rank::Seven);
        assert_eq!(Rank::Eight.orient(Player::Black), Rank::One);
        assert_eq!(Rank::Three.orient(Player::White), Rank::Three);
    }

    #[test]
    #[should_panic(expected = "rank should be within '1'..='8', got '9'")]
    fn rank_from_incorrect_char() {
        let _ = Rank::try_from('9').unwrap();
    }

    #[test]
    #[should_panic(expected = "rank should be within '1'..='8', got '0'")]
    fn rank_from_incorrect_char_zero() {
        let _ = Rank::try_from('0').unwrap();
    }

    #[test]
    #[should_panic(expected = "rank should be within 0..BOARD_WIDTH, got 8")]
    fn rank_from_incorrect_index() {
        let _ = Rank::try_from(BOARD_WIDTH).unwrap();
    }

    #[test]
    fn file() {
        assert_eq!(
            ('a'..='i')
                .filter_map(|ch| File::try_from(ch).ok())
                .collect::<Vec<File>>(),
            vec![
                File::A,
                File::B,
                File::C,
                File::D,
                File::E,
                File::F,
                File::G,
                File::H,
            ]
        );
        assert_eq!(
            (0..=BOARD_WIDTH)
                .filter_map(|idx| File::try_from(idx).ok())
                .collect::<Vec<File>>(),
            File::iter().collect::<Vec<_>>()
        );
    }

    #[test]
    #[should_panic(expected = "file should be within 'a'..='h', got 'i'")]
    fn file_from_incorrect_char() {
        let _ = File::try_from('i').unwrap();
    }

    #[test]
    #[should_panic(expected = "file should be within 0..BOARD_WIDTH, got 8")]
    fn file_from_incorrect_index() {
        let _ = File::try_from(BOARD_WIDTH).unwrap();
    }

    #[test]
    fn masks() {
        assert_eq!(File::A.mask().bits(), 0x0101_0101_0101_0101);
        assert_eq!(File::H.mask().bits(), 0x8080_8080_8080_8080);
        assert_eq!(Rank::One.mask().bits(), 0x0000_0000_0000_00FF);
        assert_eq!(Rank::Eight.mask().bits(), 0xFF00_0000_0000_0000);
        for square in Square::iter() {
            assert!(square.file().mask().contains(square));
            assert!(square.rank().mask().contains(square));
        }
    }

    #[test]
    fn square() {
        let squares: Vec<_> = [
            0u8,
            BOARD_SIZE - 1,
            BOARD_WIDTH - 1,
            BOARD_WIDTH,
            BOARD_WIDTH * 2 + 5,
            BOARD_SIZE,
        ]
        .iter()
        .filter_map(|square| Square::try_from(*square).ok())
        .collect();
        assert_eq!(
            squares,
            vec![Square::A1, Square::H8, Square::H1, Square::A2, Square::F3,]
        );
        let squares: Vec<_> = [
            (File::B, Rank::Three),
            (File::F, Rank::Five),
            (File::H, Rank::Eight),
            (File::E, Rank::Four),
        ]
        .iter()
        .map(|(file, rank)| Square::new(*file, *rank))
        .collect();
        assert_eq!(
            squares,
            vec![Square::B3, Square::F5, Square::H8, Square::E4]
        );
        assert_eq!(Square::try_from("e4").unwrap(), Square::E4);
        assert_eq!(Square::H7.to_string(), "h7");
        assert!(Square::try_from("e").is_err());
        assert!(Square::try_from("e44").is_err());
        assert!(Square::try_from("i1").is_err());
    }

    #[test]
    #[should_panic(expected = "square index should be in 0..BOARD_SIZE, got 64")]
    fn square_from_incorrect_index() {
        let _ = Square::try_from(BOARD_SIZE).unwrap();
    }

    #[test]
    fn square_orientation() {
        assert_eq!(Square::A1.flip(), Square::A8);
        assert_eq!(Square::E2.flip(), Square::E7);
        assert_eq!(Square::H5.flip(), Square::H4);
        assert_eq!(Square::G1.orient(Player::White), Square::G1);
        assert_eq!(Square::G1.orient(Player::Black), Square::G8);
        for square in Square::iter() {
            assert_eq!(square.flip().flip(), square);
            assert_eq!(square.flip().file(), square.file());
        }
    }

    #[test]
    fn square_colors() {
        assert!(!Square::A1.is_light());
        assert!(Square::H1.is_light());
        assert!(Square::A8.is_light());
        assert!(!Square::H8.is_light());
        assert!(Square::D1.is_light());
        assert!(!Square::E1.is_light());
        assert_eq!(Square::iter().filter(|square| square.is_light()).count(), 32);
    }

    #[test]
    fn primitive_size() {
        assert_eq!(size_of::<Square>(), 1);
        assert_eq!(size_of::<Move>(), 2);
        assert_eq!(size_of::<Option<Square>>(), 1);
        // Primitives will have small size thanks to the niche optimizations:
        // https://rust-lang.github.io/unsafe-code-guidelines/layout/enums.html#layout-of-a-data-carrying-enums-without-a-repr-annotation
        assert_eq!(size_of::<PieceKind>(), size_of::<Option<PieceKind>>());
        let square_to_pieces: [Option<PieceKind>; BOARD_SIZE as usize] =
            [None; BOARD_SIZE as usize];
        assert_eq!(size_of_val(&square_to_pieces), BOARD_SIZE as usize);
    }

    #[test]
    fn pieces() {
        assert_eq!(
            Piece::try_from('N').unwrap(),
            Piece::new(Player::White, PieceKind::Knight)
        );
        assert_eq!(
            Piece::try_from('k').unwrap(),
            Piece::new(Player::Black, PieceKind::King)
        );
        assert_eq!(
            "KQRBNPkqrbnp"
                .chars()
                .map(|symbol| Piece::try_from(symbol).unwrap().to_string())
                .join(""),
            "KQRBNPkqrbnp"
        );
    }

    #[test]
    #[should_panic(expected = "piece symbol should be within \"KQRBNPkqrbnp\", got 'x'")]
    fn piece_from_incorrect_symbol() {
        let _ = Piece::try_from('x').unwrap();
    }

    #[test]
    fn move_packing() {
        let quiet = Move::new(Square::G1, Square::F3, MoveFlags::QUIET);
        assert_eq!(quiet.from(), Square::G1);
        assert_eq!(quiet.to(), Square::F3);
        assert_eq!(quiet.flags(), MoveFlags::QUIET);
        assert!(!quiet.is_capture());
        assert!(!quiet.is_promotion());
        assert_eq!(quiet.promotion(), None);

        let en_passant = Move::new(Square::E5, Square::D6, MoveFlags::EN_PASSANT_CAPTURE);
        assert!(en_passant.is_capture());
        assert!(en_passant.is_en_passant());
        assert!(!en_passant.is_double_pawn_push());

        let castle = Move::new(Square::E8, Square::C8, MoveFlags::QUEENSIDE_CASTLE);
        assert!(castle.is_castle());
        assert!(castle.is_queenside_castle());
        assert!(!castle.is_kingside_castle());
        assert!(!castle.is_capture());
        assert_eq!(castle.to_string(), "e8c8");
    }

    #[test]
    fn promotions() {
        for promotion in Promotion::iter() {
            let quiet = Move::new(Square::B7, Square::B8, MoveFlags::from(promotion));
            assert!(quiet.is_promotion());
            assert!(!quiet.is_capture());
            assert_eq!(quiet.promotion(), Some(promotion));

            let capture = Move::new(
                Square::B7,
                Square::A8,
                MoveFlags::from(promotion) | MoveFlags::CAPTURE,
            );
            assert!(capture.is_capture());
            assert!(!capture.is_en_passant());
            assert_eq!(capture.promotion(), Some(promotion));
        }
        assert_eq!(
            Move::new(Square::A2, Square::A1, MoveFlags::KNIGHT_PROMOTION).to_string(),
            "a2a1n"
        );
        assert_eq!(
            Move::new(
                Square::G7,
                Square::H8,
                MoveFlags::QUEEN_PROMOTION | MoveFlags::CAPTURE
            )
            .to_string(),
            "g7h8q"
        );
    }

    #[test]
    fn polyglot_encoding() {
        // e2e4: to (4, 3), from (4, 1).
        assert_eq!(
            Move::new(Square::E2, Square::E4, MoveFlags::DOUBLE_PAWN_PUSH).to_polyglot(),
            4 | (3 << 3) | (4 << 6) | (1 << 9)
        );
        // Castling is stored as "king takes rook".
        assert_eq!(
            Move::new(Square::E1, Square::G1, MoveFlags::KINGSIDE_CASTLE).to_polyglot(),
            Move::new(Square::E1, Square::H1, MoveFlags::QUIET).to_polyglot()
        );
        assert_eq!(
            Move::new(Square::E8, Square::C8, MoveFlags::QUEENSIDE_CASTLE).to_polyglot(),
            Move::new(Square::E8, Square::A8, MoveFlags::QUIET).to_polyglot()
        );
        assert_eq!(
            Move::new(Square::A7, Square::A8, MoveFlags::QUEEN_PROMOTION).to_polyglot() >> 12,
            4
        );
    }

    #[test]
    fn castle_rights() {
        for input in [
            "-", "q", "k", "kq", "Q", "Qq", "Qk", "Qkq", "K", "Kq", "Kk", "Kkq", "KQ", "KQq",
            "KQk", "KQkq",
        ] {
            assert_eq!(CastleRights::try_from(input).unwrap().to_string(), input);
        }
        for input in ["kK", "", "KK", "Kqk", "qq", "K-", "KQkqq", "KQx"] {
            assert!(CastleRights::try_from(input).is_err(), "{input}");
        }
        assert_eq!(
            CastleRights::try_from("KQx").unwrap_err().to_string(),
            "unknown castle rights: KQx"
        );
        assert_eq!(
            CastleRights::try_from("QK").unwrap_err().to_string(),
            "castle rights should follow KQkq order without repeats, got QK"
        );
        assert_eq!(CastleRights::both(Player::Black), CastleRights::BLACK_BOTH);
        assert_eq!(CastleRights::short(Player::White), CastleRights::WHITE_SHORT);
        assert_eq!(CastleRights::long(Player::Black), CastleRights::BLACK_LONG);
    }

    #[test]
    fn within_board_shift() {
        let square = Square::E4;
        assert_eq!(square.shift(Direction::Left), Some(Square::D4));
        assert_eq!(square.shift(Direction::Up), Some(Square::E5));
        assert_eq!(square.shift(Direction::UpLeft), Some(Square::D5));
        assert_eq!(square.shift(Direction::UpRight), Some(Square::F5));
        assert_eq!(square.shift(Direction::Right), Some(Square::F4));
        assert_eq!(square.shift(Direction::Down), Some(Square::E3));
        assert_eq!(square.shift(Direction::DownLeft), Some(Square::D3));
        assert_eq!(square.shift(Direction::DownRight), Some(Square::F3));
    }

    #[test]
    fn border_squares_shift() {
        let square = Square::D1;
        assert_eq!(square.shift(Direction::Up), Some(Square::D2));
        for direction in [Direction::Down, Direction::DownRight, Direction::DownLeft] {
            assert_eq!(square.shift(direction), None);
        }

        let square = Square::A2;
        assert_eq!(square.shift(Direction::UpRight), Some(Square::B3));
        for direction in [Direction::Left, Direction::UpLeft, Direction::DownLeft] {
            assert_eq!(square.shift(direction), None);
        }

        let square = Square::H6;
        assert_eq!(square.shift(Direction::UpLeft), Some(Square::G7));
        for direction in [Direction::UpRight, Direction::DownRight, Direction::Right] {
            assert_eq!(square.shift(direction), None);
        }
    }

    #[test]
    fn corner_squares_shift() {
        for (square, valid) in [
            (Square::A1, [Direction::Up, Direction::UpRight, Direction::Right]),
            (Square::A8, [Direction::Down, Direction::DownRight, Direction::Right]),
            (Square::H8, [Direction::Down, Direction::DownLeft, Direction::Left]),
            (Square::H1, [Direction::Up, Direction::UpLeft, Direction::Left]),
        ] {
            for direction in Direction::iter() {
                assert_eq!(
                    square.shift(direction).is_some(),
                    valid.contains(&direction),
                    "{square} {direction:?}"
                );
            }
        }
    }

    #[test]
    fn direction_orientation() {
        for direction in Direction::iter() {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(
                direction.orient(Player::Black).orient(Player::Black),
                direction
            );
            assert_eq!(direction.orient(Player::White), direction);
            // Shifting a flipped square into the oriented direction is the same
            // as flipping the shifted square.
            for square in Square::iter() {
                assert_eq!(
                    square.flip().shift(direction.orient(Player::Black)),
                    square.shift(direction).map(Square::flip)
                );
            }
        }
    }
}
