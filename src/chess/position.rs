//! Provides fully-specified [Chess Position] implementation: stores information
//! about the board and tracks the state of castling, 50-move rule draw, etc.
//!
//! The core of Move Generator and move making is also implemented here as a way
//! to produce ways of mutating [`Position`].
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;
use std::num::NonZeroU16;

use anyhow::{bail, Context};
use arrayvec::ArrayVec;
use strum::IntoEnumIterator;

use crate::chess::attacks;
use crate::chess::bitboard::{Bitboard, Pieces};
use crate::chess::core::{
    Black,
    CastleRights,
    Direction,
    File,
    Move,
    MoveFlags,
    Piece,
    PieceKind,
    Player,
    Promotion,
    Rank,
    Side,
    Square,
    White,
    BOARD_WIDTH,
};
use crate::chess::zobrist;

/// Piece placement, side to move, castling rights, en passant square and move
/// counters of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Upper bound on the pseudo-legal moves of a position that passes
/// [`Position::check_invariants`]: nine queens, two rooks, two bishops, two
/// knights, the king and both castlings. A pawn never has more than 12 moves,
/// so trading queens for pawns does not raise it. Reachable positions have
/// far fewer moves (218 at most).
pub const MAX_MOVES: usize = 9 * 27 + 2 * 14 + 2 * 13 + 2 * 8 + 8 + 2;

/// Moves are stored on the stack: [`Position::legal_moves`] does not allocate.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

// Squares the king walks through and the squares that have to be empty for
// castling, from White's perspective.
const SHORT_CASTLE_KING_WALK: Bitboard = Bitboard::from_bits(0x70); // E1 F1 G1
const SHORT_CASTLE_EMPTY: Bitboard = Bitboard::from_bits(0x60); // F1 G1
const LONG_CASTLE_KING_WALK: Bitboard = Bitboard::from_bits(0x1C); // C1 D1 E1
const LONG_CASTLE_EMPTY: Bitboard = Bitboard::from_bits(0x0E); // B1 C1 D1

/// Root cause of a failure to resolve move text into a [`Move`]. It is
/// attached to the [`anyhow::Error`] returned by the parsing methods of
/// [`Position`] and can be recovered with [`anyhow::Error::downcast_ref`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// The text is not a move in the expected notation.
    Malformed {
        #[allow(missing_docs)]
        notation: String,
    },
    /// No legal move matches the description.
    NoMatch {
        #[allow(missing_docs)]
        notation: String,
    },
    /// More than one legal move matches the description.
    Ambiguous {
        #[allow(missing_docs)]
        notation: String,
    },
    /// The move is well-formed but can not be played in the position.
    Illegal {
        #[allow(missing_docs)]
        notation: String,
    },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { notation } => write!(f, "malformed move '{notation}'"),
            Self::NoMatch { notation } => write!(f, "no legal move matches '{notation}'"),
            Self::Ambiguous { notation } => write!(f, "move '{notation}' is ambiguous"),
            Self::Illegal { notation } => write!(f, "illegal move '{notation}'"),
        }
    }
}

impl std::error::Error for MoveParseError {}

/// State of the chess game: board, half-move counters and castling rights,
/// etc. It has 1:1 relationship with [Forsyth-Edwards Notation] (FEN).
///
/// [`Position::try_from()`] provides a convenient interface for creating a
/// [`Position`]. It will clean up the input (trim newlines and whitespace and
/// an optional `fen`/`epd` prefix) and parse the rest as FEN.
///
/// The position is a small value type: it is copied freely and "unmaking" a
/// move is simply discarding the copy the move was applied to.
///
/// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pieces: Pieces,
    castling: CastleRights,
    side_to_move: Player,
    /// [Halfmove Clock][^ply] keeps track of the number of (half-)moves
    /// since the last capture or pawn move and is used to enforce
    /// fifty[^fifty]-move draw rule.
    ///
    ///
    /// [Halfmove Clock]: https://www.chessprogramming.org/Halfmove_Clock
    /// [^ply]: "Half-move" or ["ply"](https://www.chessprogramming.org/Ply) means a move of only
    ///     one side.
    /// [^fifty]: 50 __full__ moves
    halfmove_clock: u16,
    fullmove_counter: NonZeroU16,
    en_passant_square: Option<Square>,
}

impl Position {
    /// Creates the starting position of the standard chess variant.
    ///
    /// ```
    /// use flipboard::chess::position::Position;
    ///
    /// let starting_position = Position::starting();
    /// assert_eq!(
    ///     &starting_position.to_string(),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        Self {
            pieces: Pieces::starting(),
            castling: CastleRights::ALL,
            ..Self::empty()
        }
    }

    // Creates an empty board to be filled by parser.
    const fn empty() -> Self {
        Self {
            pieces: Pieces::empty(),
            castling: CastleRights::NONE,
            side_to_move: Player::White,
            halfmove_clock: 0,
            fullmove_counter: NonZeroU16::MIN,
            en_passant_square: None,
        }
    }

    /// Piece placement.
    #[must_use]
    pub const fn pieces(&self) -> &Pieces {
        &self.pieces
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces.at(square)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn castling(&self) -> CastleRights {
        self.castling
    }

    /// The square "behind" the pawn that has just made a double push, if any.
    #[must_use]
    pub const fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn fullmove_counter(&self) -> u16 {
        self.fullmove_counter.get()
    }

    /// Polyglot-compatible Zobrist key of the position.
    #[must_use]
    pub fn zobrist_hash(&self) -> zobrist::Key {
        zobrist::hash(self)
    }

    const fn us(&self) -> Player {
        self.side_to_move
    }

    const fn they(&self) -> Player {
        self.us().opponent()
    }

    /// Parses board from Forsyth-Edwards Notation.
    ///
    /// FEN ::=
    ///       Piece Placement
    ///   ' ' Side to move
    ///   ' ' Castling ability
    ///   ' ' En passant target square
    ///   ' ' Halfmove clock
    ///   ' ' Fullmove counter
    ///
    /// All six parts are required. On top of the syntax, the parser checks
    /// that the position is consistent (see [`Position::check_invariants`])
    /// and that the side that is not to move is not in check.
    ///
    /// NOTE: This expects properly-formatted inputs: no extra symbols or
    /// additional whitespace. Use [`Position::try_from`] for cleaning up the
    /// input if it is coming from untrusted source and is likely to contain
    /// extra symbols.
    ///
    /// # Errors
    ///
    /// Describes the first problem found in the input.
    pub fn from_fen(input: &str) -> anyhow::Result<Self> {
        let mut parts = input.split(' ');
        // Parse Piece Placement.
        let mut result = Self::empty();
        let pieces_placement = match parts.next() {
            Some(placement) => placement,
            None => bail!("incorrect FEN: missing pieces placement"),
        };
        let ranks = pieces_placement.split('/');
        let mut rank_id: u8 = 8;
        for rank_fen in ranks {
            if rank_id == 0 {
                bail!("incorrect FEN: expected 8 ranks, got {pieces_placement}");
            }
            rank_id -= 1;
            let rank = Rank::try_from(rank_id)?;
            let mut file: u8 = 0;
            for symbol in rank_fen.chars() {
                if file >= BOARD_WIDTH {
                    bail!("incorrect FEN: rank {rank_fen} is longer than {BOARD_WIDTH} squares");
                }
                match symbol {
                    '1'..='8' => {
                        file += symbol as u8 - b'0';
                        continue;
                    },
                    '0' | '9' => {
                        bail!("incorrect FEN: empty square count should be in 1..=8, got {symbol}")
                    },
                    _ => (),
                }
                let piece = Piece::try_from(symbol)?;
                result
                    .pieces
                    .put(Square::new(File::try_from(file)?, rank), piece);
                file += 1;
            }
            if file != BOARD_WIDTH {
                bail!(
                    "incorrect FEN: rank size should be exactly {BOARD_WIDTH}, got {rank_fen} of length {file}"
                );
            }
        }
        if rank_id != 0 {
            bail!("incorrect FEN: there should be 8 ranks, got {pieces_placement}");
        }
        result.side_to_move = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect FEN: missing side to move"),
        };
        result.castling = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect FEN: missing castling rights"),
        };
        result.en_passant_square = match parts.next() {
            Some("-") => None,
            Some(value) => Some(value.try_into()?),
            None => bail!("incorrect FEN: missing en passant square"),
        };
        result.halfmove_clock = match parts.next() {
            Some(value) => {
                if !value.bytes().all(|c| c.is_ascii_digit()) {
                    bail!("halfmove clock can not contain anything other than digits");
                }
                value.parse::<u16>().with_context(|| {
                    format!("incorrect FEN: halfmove clock can not be parsed {value}")
                })?
            },
            None => bail!("incorrect FEN: missing halfmove clock"),
        };
        result.fullmove_counter = match parts.next() {
            Some(value) => {
                if !value.bytes().all(|c| c.is_ascii_digit()) {
                    bail!("fullmove counter can not contain anything other than digits");
                }
                let counter = value.parse::<u16>().with_context(|| {
                    format!("incorrect FEN: fullmove counter can not be parsed {value}")
                })?;
                // Some producers start counting from 0.
                NonZeroU16::new(counter).unwrap_or(NonZeroU16::MIN)
            },
            None => bail!("incorrect FEN: missing fullmove counter"),
        };
        if parts.next().is_some() {
            bail!("trailing symbols are not allowed in FEN");
        }
        result
            .check_invariants()
            .with_context(|| format!("incorrect FEN: inconsistent position {input}"))?;
        if result.is_in_check(result.they()) {
            bail!(
                "incorrect FEN: {} can not be in check when it is not their move",
                result.they()
            );
        }
        log::trace!("parsed position {result}");
        Ok(result)
    }

    /// Verifies that the position is internally consistent:
    ///
    /// - No square is claimed by both players or by more than one piece kind.
    /// - Every square claimed by a piece kind is claimed by exactly one player
    ///   and vice versa.
    /// - Each player has exactly one king and there are no pawns on the back
    ///   ranks.
    /// - Each player has at most 16 pieces and 8 pawns, and no more promoted
    ///   pieces than missing pawns. This keeps [`MAX_MOVES`] an upper bound.
    /// - The en passant square (if any) is on the third rank of the player who
    ///   has just moved, it is empty and the pushed pawn is right in front of
    ///   it.
    ///
    /// Checks are not validated: [`Position::push_move`] is also used to try
    /// out moves that leave the king in check. Castling rights are not matched
    /// against the placement either: a right without the king and the rook on
    /// their original squares simply never produces a castling move.
    ///
    /// # Errors
    ///
    /// Describes the first violation.
    pub fn check_invariants(&self) -> anyhow::Result<()> {
        let white = self.pieces.player(Player::White);
        let black = self.pieces.player(Player::Black);
        if white.has_any(black) {
            bail!("squares claimed by both players:\n{:?}", white & black);
        }
        let mut kinds = Bitboard::empty();
        for kind in PieceKind::iter() {
            let squares = self.pieces.kind(kind);
            if kinds.has_any(squares) {
                bail!(
                    "squares claimed by more than one piece kind:\n{:?}",
                    kinds & squares
                );
            }
            kinds |= squares;
        }
        if kinds != white | black {
            bail!(
                "piece kinds and owners disagree on occupied squares:\n{:?}",
                kinds ^ (white | black)
            );
        }
        for player in [Player::White, Player::Black] {
            let kings = self.pieces.of(player, PieceKind::King).count();
            if kings != 1 {
                bail!("{player} should have exactly one king, got {kings}");
            }
        }
        for player in [Player::White, Player::Black] {
            self.check_material(player)?;
        }
        if self
            .pieces
            .kind(PieceKind::Pawn)
            .has_any(Rank::One.mask() | Rank::Eight.mask())
        {
            bail!("pawns can not be placed on backranks");
        }
        if let Some(target) = self.en_passant_square {
            let pushed_by = self.they();
            if target.rank() != Rank::Three.orient(pushed_by) {
                bail!(
                    "en passant square should be on the third rank of {pushed_by}, got {target}"
                );
            }
            let pushed = Square::new(target.file(), Rank::Four.orient(pushed_by));
            if self.pieces.at(pushed) != Some(Piece::new(pushed_by, PieceKind::Pawn)) {
                bail!("en passant square {target} is not behind a pawn of {pushed_by}");
            }
            if self.pieces.occupied().contains(target) {
                bail!("en passant square {target} is occupied");
            }
        }
        Ok(())
    }

    /// Every piece above the initial set has to be a promoted pawn.
    fn check_material(&self, player: Player) -> anyhow::Result<()> {
        let pieces = self.pieces.player(player).count();
        if pieces > 16 {
            bail!("{player} can not have more than 16 pieces, got {pieces}");
        }
        let pawns = self.pieces.of(player, PieceKind::Pawn).count();
        if pawns > 8 {
            bail!("{player} can not have more than 8 pawns, got {pawns}");
        }
        let promoted: u32 = [
            (PieceKind::Queen, 1),
            (PieceKind::Rook, 2),
            (PieceKind::Bishop, 2),
            (PieceKind::Knight, 2),
        ]
        .into_iter()
        .map(|(kind, initial)| {
            self.pieces
                .of(player, kind)
                .count()
                .saturating_sub(initial)
        })
        .sum();
        let missing = 8 - pawns;
        if promoted > missing {
            bail!("{player} has {promoted} promoted pieces but only {missing} missing pawns");
        }
        Ok(())
    }

    /// Calculates a list of legal moves (i.e. the moves that do not leave our
    /// king in check).
    ///
    /// Moves are generated for the side to move as if it was White: Black's
    /// pawns and castling squares are flipped vertically at the point of use.
    /// Every candidate is then played on a copy of the position and kept only
    /// if our king is not attacked afterwards (copy-make), so there is no pin
    /// or check-ray bookkeeping.
    ///
    /// This is a performance and correctness-critical path: every modification
    /// should be benchmarked and carefully tested.
    #[must_use]
    pub fn legal_moves(&self) -> MoveList {
        self.legal_moves_masked(Bitboard::full(), Bitboard::full())
    }

    /// Same as [`Position::legal_moves`] but only produces moves starting
    /// within `from_mask` and ending within `to_mask`.
    #[must_use]
    pub fn legal_moves_masked(&self, from_mask: Bitboard, to_mask: Bitboard) -> MoveList {
        let candidates = match self.side_to_move {
            Player::White => self.generate_pseudo_legal::<White>(from_mask, to_mask),
            Player::Black => self.generate_pseudo_legal::<Black>(from_mask, to_mask),
        };
        candidates
            .into_iter()
            .filter(|candidate| self.keeps_king_safe(*candidate))
            .collect()
    }

    fn keeps_king_safe(&self, candidate: Move) -> bool {
        let mut next = *self;
        next.push_move(candidate);
        !next.is_in_check(self.us())
    }

    fn generate_pseudo_legal<S: Side>(&self, from_mask: Bitboard, to_mask: Bitboard) -> MoveList {
        let us = S::PLAYER;
        let they = <S::Opponent as Side>::PLAYER;
        let mut moves = MoveList::new();
        let own = self.pieces.player(us);
        let enemy = self.pieces.player(they);
        let occupied = own | enemy;
        let targets = to_mask - own;

        self.generate_pawn_moves::<S>(from_mask, to_mask, &mut moves);
        for from in self.pieces.of(us, PieceKind::Knight) & from_mask {
            add_piece_moves(
                &mut moves,
                from,
                attacks::knight_attacks_from(from) & targets,
                enemy,
            );
        }
        for from in self.pieces.of(us, PieceKind::Bishop) & from_mask {
            add_piece_moves(
                &mut moves,
                from,
                attacks::bishop_attacks(from, occupied) & targets,
                enemy,
            );
        }
        for from in self.pieces.of(us, PieceKind::Rook) & from_mask {
            add_piece_moves(
                &mut moves,
                from,
                attacks::rook_attacks(from, occupied) & targets,
                enemy,
            );
        }
        for from in self.pieces.of(us, PieceKind::Queen) & from_mask {
            add_piece_moves(
                &mut moves,
                from,
                attacks::queen_attacks(from, occupied) & targets,
                enemy,
            );
        }
        let king = self.pieces.of(us, PieceKind::King);
        if let Some(king_square) = (king & from_mask).first() {
            // The king does not shield the squares behind it from sliders.
            let danger = self.attacked_squares(they, occupied - king);
            add_piece_moves(
                &mut moves,
                king_square,
                attacks::king_attacks_from(king_square) & (targets - danger),
                enemy,
            );
            self.generate_castling::<S>(danger, occupied, to_mask, &mut moves);
        }
        moves
    }

    fn generate_pawn_moves<S: Side>(
        &self,
        from_mask: Bitboard,
        to_mask: Bitboard,
        moves: &mut MoveList,
    ) {
        let us = S::PLAYER;
        // Everything below is expressed as if White was to move.
        let pawns = (self.pieces.of(us, PieceKind::Pawn) & from_mask).orient(us);
        let empty = (!self.pieces.occupied()).orient(us);
        let enemy = self.pieces.player(us.opponent()).orient(us);
        let to_mask = to_mask.orient(us);

        let single_pushes = pawns.shift(Direction::Up) & empty;
        let double_pushes =
            (single_pushes & Rank::Three.mask()).shift(Direction::Up) & empty & to_mask;
        let single_pushes = single_pushes & to_mask;
        for (from, to) in single_pushes
            .shift(Direction::Down)
            .iter()
            .zip(single_pushes)
        {
            add_pawn_moves(moves, from, to, MoveFlags::QUIET, us);
        }
        for (from, to) in double_pushes
            .shift(Direction::Down)
            .shift(Direction::Down)
            .iter()
            .zip(double_pushes)
        {
            moves.push(Move::new(
                from.orient(us),
                to.orient(us),
                MoveFlags::DOUBLE_PAWN_PUSH,
            ));
        }
        for direction in [Direction::UpLeft, Direction::UpRight] {
            let captures = pawns.shift(direction) & enemy & to_mask;
            for (from, to) in captures.shift(direction.opposite()).iter().zip(captures) {
                add_pawn_moves(moves, from, to, MoveFlags::CAPTURE, us);
            }
        }
        if let Some(target) = self.en_passant_square {
            let target = target.orient(us);
            if to_mask.contains(target) {
                let capturers = pawns
                    & (Bitboard::from(target).shift(Direction::DownLeft)
                        | Bitboard::from(target).shift(Direction::DownRight));
                for from in capturers {
                    moves.push(Move::new(
                        from.orient(us),
                        target.orient(us),
                        MoveFlags::EN_PASSANT_CAPTURE,
                    ));
                }
            }
        }
    }

    fn generate_castling<S: Side>(
        &self,
        danger: Bitboard,
        occupied: Bitboard,
        to_mask: Bitboard,
        moves: &mut MoveList,
    ) {
        let us = S::PLAYER;
        let king_from = Square::E1.orient(us);
        if !self.pieces.of(us, PieceKind::King).contains(king_from) {
            return;
        }
        let rooks = self.pieces.of(us, PieceKind::Rook);
        for (right, rook_from, king_walk, must_be_empty, king_to, flags) in [
            (
                CastleRights::short(us),
                Square::H1,
                SHORT_CASTLE_KING_WALK,
                SHORT_CASTLE_EMPTY,
                Square::G1,
                MoveFlags::KINGSIDE_CASTLE,
            ),
            (
                CastleRights::long(us),
                Square::A1,
                LONG_CASTLE_KING_WALK,
                LONG_CASTLE_EMPTY,
                Square::C1,
                MoveFlags::QUEENSIDE_CASTLE,
            ),
        ] {
            let king_to = king_to.orient(us);
            if self.castling.contains(right)
                && rooks.contains(rook_from.orient(us))
                && to_mask.contains(king_to)
                && !danger.has_any(king_walk.orient(us))
                && !occupied.has_any(must_be_empty.orient(us))
            {
                moves.push(Move::new(king_from, king_to, flags));
            }
        }
    }

    /// All squares attacked by the player's pieces given the occupancy.
    fn attacked_squares(&self, attacker: Player, occupancy: Bitboard) -> Bitboard {
        let empty = !occupancy;
        let queens = self.pieces.of(attacker, PieceKind::Queen);
        attacks::pawn_attacks(self.pieces.of(attacker, PieceKind::Pawn), attacker)
            | attacks::knight_attacks(self.pieces.of(attacker, PieceKind::Knight))
            | attacks::king_attacks(self.pieces.of(attacker, PieceKind::King))
            | attacks::diagonal_attacks(
                self.pieces.of(attacker, PieceKind::Bishop) | queens,
                empty,
            )
            | attacks::orthogonal_attacks(self.pieces.of(attacker, PieceKind::Rook) | queens, empty)
    }

    /// Returns true if the player's king is attacked by any of the opponent's
    /// pieces.
    #[must_use]
    pub fn is_in_check(&self, player: Player) -> bool {
        let Some(king) = self.pieces.of(player, PieceKind::King).first() else {
            return false;
        };
        let they = player.opponent();
        let occupied = self.pieces.occupied();
        let queens = self.pieces.of(they, PieceKind::Queen);
        attacks::bishop_attacks(king, occupied)
            .has_any(self.pieces.of(they, PieceKind::Bishop) | queens)
            || attacks::rook_attacks(king, occupied)
                .has_any(self.pieces.of(they, PieceKind::Rook) | queens)
            || attacks::knight_attacks_from(king).has_any(self.pieces.of(they, PieceKind::Knight))
            || attacks::king_attacks_from(king).has_any(self.pieces.of(they, PieceKind::King))
            || attacks::pawn_attacks(Bitboard::from(king), player)
                .has_any(self.pieces.of(they, PieceKind::Pawn))
    }

    /// Returns true if the side to move is in check.
    #[must_use]
    pub fn is_check(&self) -> bool {
        self.is_in_check(self.us())
    }

    /// Returns true if the side to move is checkmated.
    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal_moves().is_empty()
    }

    /// Returns true if the side to move has no legal moves but is not in
    /// check.
    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    /// Fifty-move rule: the halfmove clock has reached 50.
    #[must_use]
    pub const fn is_draw_50_move(&self) -> bool {
        self.halfmove_clock >= 50
    }

    /// Neither side can deliver a mate: bare kings, a single minor piece
    /// against a bare king or one bishop each on the squares of the same
    /// color.
    #[must_use]
    pub fn is_draw_insufficient_material(&self) -> bool {
        let occupied = self.pieces.occupied();
        match occupied.count() {
            2 => true,
            3 => (self.pieces.kind(PieceKind::Bishop) | self.pieces.kind(PieceKind::Knight))
                .has_any(occupied),
            4 => {
                let white = self.pieces.of(Player::White, PieceKind::Bishop);
                let black = self.pieces.of(Player::Black, PieceKind::Bishop);
                match (white.first(), black.first()) {
                    (Some(white), Some(black)) => white.is_light() == black.is_light(),
                    _ => false,
                }
            },
            _ => false,
        }
    }

    /// Returns true if the game is drawn by the fifty-move rule or by
    /// insufficient material.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.is_draw_50_move() || self.is_draw_insufficient_material()
    }

    /// Applies the move. The move has to be pseudo-legal in this position
    /// (e.g. one of [`Position::legal_moves`]), otherwise the result is not a
    /// valid position.
    ///
    /// In debug builds the postconditions of the move and
    /// [`Position::check_invariants`] are verified after every call.
    ///
    /// # Panics
    ///
    /// If there is no piece of the side to move on the origin square.
    pub fn push_move(&mut self, next_move: Move) {
        match self.side_to_move {
            Player::White => self.make_move::<White>(next_move),
            Player::Black => self.make_move::<Black>(next_move),
        }
    }

    fn make_move<S: Side>(&mut self, next_move: Move) {
        let us = S::PLAYER;
        let they = <S::Opponent as Side>::PLAYER;
        let (from, to) = (next_move.from(), next_move.to());
        let moving = match self.pieces.at(from) {
            Some(piece) if piece.owner == us => piece.kind,
            _ => panic!("{us} has no piece to move from {from} in {self}"),
        };
        let captured_square = if next_move.is_en_passant() {
            Square::new(to.file(), Rank::Five.orient(us))
        } else {
            to
        };

        if next_move.is_capture() {
            if let Some(captured) = self.pieces.at(captured_square) {
                self.pieces.toggle(captured_square.into(), captured);
            }
            if captured_square == Square::H8.orient(us) {
                self.castling.remove(CastleRights::short(they));
            }
            if captured_square == Square::A8.orient(us) {
                self.castling.remove(CastleRights::long(they));
            }
        }

        self.pieces.toggle(
            Bitboard::from(from) | Bitboard::from(to),
            Piece::new(us, moving),
        );
        if let Some(promotion) = next_move.promotion() {
            self.pieces
                .toggle(to.into(), Piece::new(us, PieceKind::Pawn));
            self.pieces
                .toggle(to.into(), Piece::new(us, promotion.into()));
        }
        let rook = Piece::new(us, PieceKind::Rook);
        if next_move.is_kingside_castle() {
            self.pieces.toggle(
                Bitboard::from(Square::H1.orient(us)) | Bitboard::from(Square::F1.orient(us)),
                rook,
            );
        }
        if next_move.is_queenside_castle() {
            self.pieces.toggle(
                Bitboard::from(Square::A1.orient(us)) | Bitboard::from(Square::D1.orient(us)),
                rook,
            );
        }

        match moving {
            PieceKind::King => self.castling.remove(CastleRights::both(us)),
            PieceKind::Rook if from == Square::H1.orient(us) => {
                self.castling.remove(CastleRights::short(us));
            },
            PieceKind::Rook if from == Square::A1.orient(us) => {
                self.castling.remove(CastleRights::long(us));
            },
            _ => (),
        }

        self.en_passant_square = next_move
            .is_double_pawn_push()
            .then(|| Square::new(to.file(), Rank::Three.orient(us)));
        if next_move.is_capture() || moving == PieceKind::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Player::Black {
            self.fullmove_counter = self.fullmove_counter.saturating_add(1);
        }
        self.side_to_move = they;

        if cfg!(debug_assertions) {
            let consistency = self
                .check_move_postconditions(next_move, moving, captured_square)
                .and_then(|()| self.check_invariants());
            assert!(
                consistency.is_ok(),
                "applying {next_move:?} produced an inconsistent position {self}: {consistency:?}"
            );
        }
    }

    fn check_move_postconditions(
        &self,
        applied: Move,
        moved: PieceKind,
        captured_square: Square,
    ) -> anyhow::Result<()> {
        let mover = self.they();
        if let Some(piece) = self.pieces.at(applied.from()) {
            bail!("origin square {} still holds {piece}", applied.from());
        }
        let expected = Piece::new(mover, applied.promotion().map_or(moved, PieceKind::from));
        if self.pieces.at(applied.to()) != Some(expected) {
            bail!("destination square {} should hold {expected}", applied.to());
        }
        if captured_square != applied.to() && self.pieces.occupied().contains(captured_square) {
            bail!("captured square {captured_square} is not empty");
        }
        if let Some(target) = self.en_passant_square {
            if target.rank() != Rank::Three.orient(mover) {
                bail!("en passant square {target} is not on the third rank of {mover}");
            }
        }
        Ok(())
    }

    /// Builds a fully-flagged move from bare squares: double pawn pushes, en
    /// passant captures, castling (the king moving two squares from its
    /// original square) and captures are detected from the position.
    ///
    /// # Errors
    ///
    /// If the origin square does not hold a piece of the side to move, the
    /// destination holds our own piece or the promotion does not make sense
    /// for the move.
    pub fn parse_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> anyhow::Result<Move> {
        let us = self.us();
        let piece = match self.pieces.at(from) {
            Some(piece) if piece.owner == us => piece,
            Some(piece) => bail!("{from} holds {piece} which does not belong to {us}"),
            None => bail!("there is no piece on {from}"),
        };
        let mut flags = match self.pieces.at(to) {
            Some(target) if target.owner == us => bail!("{to} is occupied by our own {target}"),
            Some(_) => MoveFlags::CAPTURE,
            None => MoveFlags::QUIET,
        };
        if promotion.is_some() && piece.kind != PieceKind::Pawn {
            bail!("only pawns can be promoted, got {piece} on {from}");
        }
        match piece.kind {
            PieceKind::Pawn => {
                if Some(to) == self.en_passant_square {
                    flags = MoveFlags::EN_PASSANT_CAPTURE;
                } else if from.rank() == Rank::Two.orient(us)
                    && to.rank() == Rank::Four.orient(us)
                {
                    flags = MoveFlags::DOUBLE_PAWN_PUSH;
                }
                match (promotion, to.rank() == Rank::Eight.orient(us)) {
                    (Some(promotion), true) => flags |= MoveFlags::from(promotion),
                    (None, true) => bail!("pawn reaching {to} has to be promoted"),
                    (Some(_), false) => bail!("pawn can not be promoted on {to}"),
                    (None, false) => (),
                }
            },
            PieceKind::King if from == Square::E1.orient(us) && to == Square::G1.orient(us) => {
                flags = MoveFlags::KINGSIDE_CASTLE;
            },
            PieceKind::King if from == Square::E1.orient(us) && to == Square::C1.orient(us) => {
                flags = MoveFlags::QUEENSIDE_CASTLE;
            },
            _ => (),
        }
        Ok(Move::new(from, to, flags))
    }

    /// Parses a move in [UCI format] (e.g. `e2e4` or `e7e8q`). The move is not
    /// checked for legality: use [`Position::push_uci`] for that.
    ///
    /// # Errors
    ///
    /// [`MoveParseError::Malformed`] if the text is not a UCI move and
    /// [`MoveParseError::Illegal`] if the move does not fit the position.
    ///
    /// [UCI format]: http://wbec-ridderkerk.nl/html/UCIProtocol.html
    pub fn parse_uci(&self, uci: &str) -> anyhow::Result<Move> {
        let malformed = || MoveParseError::Malformed {
            notation: uci.to_string(),
        };
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            bail!(malformed());
        }
        let from = Square::try_from(&uci[0..2]).map_err(|_| malformed())?;
        let to = Square::try_from(&uci[2..4]).map_err(|_| malformed())?;
        let promotion = match uci[4..].chars().next() {
            Some(symbol) => Some(Promotion::try_from(symbol).map_err(|_| malformed())?),
            None => None,
        };
        self.parse_move(from, to, promotion)
            .context(MoveParseError::Illegal {
                notation: uci.to_string(),
            })
    }

    /// Parses a move in [Standard Algebraic Notation] (e.g. `Nf3`, `exd5`,
    /// `O-O`, `e8=Q+`) by matching the description against the legal moves.
    ///
    /// # Errors
    ///
    /// [`MoveParseError::Malformed`] if the text is not SAN,
    /// [`MoveParseError::NoMatch`] if no legal move fits the description and
    /// [`MoveParseError::Ambiguous`] if several do.
    ///
    /// [Standard Algebraic Notation]: https://www.chessprogramming.org/Algebraic_Chess_Notation#SAN
    pub fn parse_san(&self, san: &str) -> anyhow::Result<Move> {
        let malformed = || MoveParseError::Malformed {
            notation: san.to_string(),
        };
        let no_match = || MoveParseError::NoMatch {
            notation: san.to_string(),
        };
        let text = san
            .strip_suffix('+')
            .or_else(|| san.strip_suffix('#'))
            .unwrap_or(san);
        if !text.is_ascii() {
            bail!(malformed());
        }
        let castle = match text {
            "O-O" | "0-0" => Some(MoveFlags::KINGSIDE_CASTLE),
            "O-O-O" | "0-0-0" => Some(MoveFlags::QUEENSIDE_CASTLE),
            _ => None,
        };
        let legal_moves = self.legal_moves();
        if let Some(flags) = castle {
            return match legal_moves.iter().find(|m| m.flags() == flags) {
                Some(castle) => Ok(*castle),
                None => bail!(no_match()),
            };
        }

        let mut rest = text;
        let mut promotion = None;
        if let Some(symbol) = rest.chars().last().filter(|c| "nbrqkNBRQK".contains(*c)) {
            promotion = Some(PieceKind::try_from(symbol.to_ascii_lowercase())?);
            rest = &rest[..rest.len() - 1];
        }
        rest = rest.strip_suffix('=').unwrap_or(rest);
        if rest.len() < 2 {
            bail!(malformed());
        }
        let (prefix, destination) = rest.split_at(rest.len() - 2);
        let to = Square::try_from(destination).map_err(|_| malformed())?;
        let mut prefix = prefix.chars().peekable();
        let kind = match prefix.next_if(|c| "NBKRQ".contains(*c)) {
            Some(symbol) => PieceKind::try_from(symbol.to_ascii_lowercase())?,
            None => PieceKind::Pawn,
        };
        let from_file = prefix
            .next_if(|c| ('a'..='h').contains(c))
            .map(File::try_from)
            .transpose()?;
        let from_rank = prefix
            .next_if(|c| ('1'..='8').contains(c))
            .map(Rank::try_from)
            .transpose()?;
        let _ = prefix.next_if(|c| *c == '-' || *c == 'x');
        if prefix.next().is_some() {
            bail!(malformed());
        }

        let mut candidates = legal_moves.iter().filter(|m| {
            m.to() == to
                && self.pieces.kind(kind).contains(m.from())
                && from_file.map_or(true, |file| m.from().file() == file)
                && from_rank.map_or(true, |rank| m.from().rank() == rank)
                && m.promotion().map(PieceKind::from) == promotion
        });
        match (candidates.next(), candidates.next()) {
            (Some(found), None) => Ok(*found),
            (None, _) => bail!(no_match()),
            (Some(_), Some(_)) => bail!(MoveParseError::Ambiguous {
                notation: san.to_string()
            }),
        }
    }

    /// Finds the legal move with given [Polyglot] encoding.
    ///
    /// # Errors
    ///
    /// [`MoveParseError::Malformed`] for an unknown promotion code and
    /// [`MoveParseError::NoMatch`] if no legal move has this encoding.
    ///
    /// [Polyglot]: http://hgm.nubati.net/book_format.html
    pub fn parse_polyglot(&self, raw: u16) -> anyhow::Result<Move> {
        let notation = format!("{raw:#06x}");
        if (raw >> 12) & 0b111 > 4 {
            bail!(MoveParseError::Malformed { notation });
        }
        let encoded = raw & 0x7FFF;
        match self
            .legal_moves()
            .into_iter()
            .find(|m| m.to_polyglot() == encoded)
        {
            Some(found) => Ok(found),
            None => bail!(MoveParseError::NoMatch { notation }),
        }
    }

    /// Parses a UCI move and plays it.
    ///
    /// # Errors
    ///
    /// If the move can not be parsed or is not legal: the position is left
    /// unchanged.
    pub fn push_uci(&mut self, uci: &str) -> anyhow::Result<Move> {
        let next_move = self.parse_uci(uci)?;
        if !self.legal_moves().contains(&next_move) {
            bail!(MoveParseError::Illegal {
                notation: uci.to_string()
            });
        }
        self.push_move(next_move);
        Ok(next_move)
    }

    /// Parses a SAN move and plays it.
    ///
    /// # Errors
    ///
    /// If the move can not be resolved: the position is left unchanged.
    pub fn push_san(&mut self, san: &str) -> anyhow::Result<Move> {
        let next_move = self.parse_san(san)?;
        self.push_move(next_move);
        Ok(next_move)
    }
}

fn add_piece_moves(moves: &mut MoveList, from: Square, destinations: Bitboard, enemy: Bitboard) {
    for to in destinations {
        let flags = if enemy.contains(to) {
            MoveFlags::CAPTURE
        } else {
            MoveFlags::QUIET
        };
        moves.push(Move::new(from, to, flags));
    }
}

/// Adds a pawn move given in White's perspective. Reaching the last rank
/// expands into all four promotions.
fn add_pawn_moves(moves: &mut MoveList, from: Square, to: Square, flags: MoveFlags, us: Player) {
    let (from_square, to_square) = (from.orient(us), to.orient(us));
    if to.rank() == Rank::Eight {
        for promotion in [
            Promotion::Queen,
            Promotion::Rook,
            Promotion::Bishop,
            Promotion::Knight,
        ] {
            moves.push(Move::new(
                from_square,
                to_square,
                flags | MoveFlags::from(promotion),
            ));
        }
    } else {
        moves.push(Move::new(from_square, to_square, flags));
    }
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    /// Trims the whitespace and an optional `fen ` or `epd ` prefix before
    /// parsing the input with [`Position::from_fen`].
    fn try_from(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        for prefix in ["fen ", "epd "] {
            if let Some(stripped) = input.strip_prefix(prefix) {
                return Self::from_fen(stripped.trim_start());
            }
        }
        Self::from_fen(input)
    }
}

impl fmt::Display for Position {
    /// Prints board in Forsyth-Edwards Notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", &self.pieces)?;
        write!(f, "{} ", &self.side_to_move)?;
        write!(f, "{} ", &self.castling)?;
        match self.en_passant_square {
            Some(square) => write!(f, "{square} "),
            None => write!(f, "- "),
        }?;
        write!(f, "{} ", &self.halfmove_clock)?;
        write!(f, "{}", &self.fullmove_counter)?;
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", &self.pieces)?;
        writeln!(f, "Player to move: {:?}", &self.side_to_move)?;
        writeln!(f, "Fullmove counter: {:?}", &self.fullmove_counter)?;
        writeln!(f, "En Passant: {:?}", &self.en_passant_square)?;
        // bitflags' default fmt::Debug implementation is not very convenient:
        // dump FEN instead.
        writeln!(f, "Castling rights: {}", &self.castling)?;
        writeln!(f, "FEN: {self}")?;
        Ok(())
    }
}
