use flipboard::chess::core::Move;
use flipboard::chess::position::Position;
use flipboard::perft::{perft, perft_cache, perft_parallel};
use itertools::Itertools;
use pretty_assertions::assert_eq;
use shakmaty::{CastlingMode, Chess, Position as ShakmatyPosition};

fn setup(input: &str) -> Position {
    Position::try_from(input).expect("parsing legal position: {input}")
}

fn get_moves(position: &Position) -> Vec<String> {
    position
        .legal_moves()
        .iter()
        .map(Move::to_string)
        .sorted()
        .collect::<Vec<_>>()
}

fn sorted_moves(moves: &[&str]) -> Vec<String> {
    moves
        .iter()
        .map(|m| (*m).to_string())
        .sorted()
        .collect::<Vec<_>>()
}

fn reference_position(fen: &str) -> Chess {
    let setup: shakmaty::fen::Fen = fen.parse().unwrap();
    setup.into_position(CastlingMode::Standard).unwrap()
}

fn reference_moves(fen: &str) -> Vec<String> {
    reference_position(fen)
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .sorted()
        .collect::<Vec<_>>()
}

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const COMPLEX: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const COMPLEX_MIRRORED: &str = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
const FIFTH: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
const SIXTH: &str = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";

// Artifacts from the fuzzer.
#[test]
fn fuzzing_artifact_moves() {
    assert_eq!(
        get_moves(&setup(
            "2r3r1/3p3k/1p3pp1/1B5p/5P2/2P2pP1/PP4KP/3R4 w - - 0 34"
        )),
        sorted_moves(&["g2f1", "g2f2", "g2f3", "g2g1", "g2h1", "g2h3"])
    );
    assert_eq!(
        get_moves(&setup(
            "2r3r1/p3k3/pp3p2/1B5p/5P2/2P1p1P1/PP4Kr/3R4 w - - 0 1"
        )),
        sorted_moves(&["g2f1", "g2f3", "g2g1", "g2h2"])
    );
    assert_eq!(
        get_moves(&setup(
            "2r3r1/p3k3/pp3p2/1B5p/5P2/2pqp1P1/PPK4P/3R4 w - - 0 34"
        )),
        sorted_moves(&["b5d3", "c2b3", "c2c1", "c2d3", "d1d3"])
    );
    assert_eq!(
        get_moves(&setup("4k1r1/8/8/4PpP1/6K1/8/8/8 w - f6 0 1")),
        sorted_moves(&["g4f4", "g4f3", "g4f5", "g4g3", "g4h3", "g4h4", "g4h5", "e5f6"])
    );
}

#[test]
fn castle_through_attacks() {
    // Castling short blocked by a check on the king walk.
    assert_eq!(
        get_moves(&setup("r3k2r/8/8/8/8/8/6R1/4K3 b k - 0 1")),
        sorted_moves(&[
            "a8a7", "a8a6", "a8a5", "a8a4", "a8a3", "a8a2", "a8a1", "a8b8", "a8c8", "a8d8", "h8f8",
            "h8g8", "h8h7", "h8h6", "h8h5", "h8h4", "h8h3", "h8h2", "h8h1", "e8e7", "e8d8", "e8d7",
            "e8f8", "e8f7"
        ])
    );
    // The attacked square is not the one the king will walk through.
    assert_eq!(
        get_moves(&setup("r3k2r/8/8/8/8/8/1R6/4K3 b q - 0 1")),
        sorted_moves(&[
            "a8a7", "a8a6", "a8a5", "a8a4", "a8a3", "a8a2", "a8a1", "a8b8", "a8c8", "a8d8", "h8f8",
            "h8g8", "h8h7", "h8h6", "h8h5", "h8h4", "h8h3", "h8h2", "h8h1", "e8e7", "e8d8", "e8d7",
            "e8f8", "e8f7", "e8c8"
        ])
    );
}

#[test]
fn matches_reference_implementation() {
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        KIWIPETE,
        ENDGAME,
        COMPLEX,
        COMPLEX_MIRRORED,
        FIFTH,
        SIXTH,
        "2r3r1/3p3k/1p3pp1/1B5P/5P2/2P1pqP1/PP4KP/3R4 w - - 0 34",
        "r3k3/r7/8/5pP1/5QKN/8/8/6RR w - f6 0 1",
        "8/8/3p4/1Pp4r/1K3p2/6k1/4P1P1/1R6 w - c6 0 3",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
        "7k/6pp/8/QQQQQQQQ/8/8/8/4K3 w - - 0 1",
    ] {
        assert_eq!(get_moves(&setup(fen)), reference_moves(fen), "{fen}");
    }
}

/// Plays a deterministic pseudo-random game and compares every position along
/// the way against the reference implementation.
#[test]
fn playouts_match_reference_implementation() {
    for (start, seed) in [
        ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 7),
        (KIWIPETE, 13),
        (ENDGAME, 29),
        (FIFTH, 31),
        (SIXTH, 101),
    ] {
        let mut position = setup(start);
        let mut state: u64 = seed;
        for _ in 0..120 {
            let fen = position.to_string();
            let moves = position.legal_moves();
            assert_eq!(get_moves(&position), reference_moves(&fen), "{fen}");
            assert_eq!(position.is_check(), reference_position(&fen).is_check());
            if moves.is_empty() {
                break;
            }
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            position.push_move(moves[(state >> 33) as usize % moves.len()]);
        }
    }
}

#[test]
fn perft_against_reference() {
    for fen in [KIWIPETE, ENDGAME, COMPLEX_MIRRORED, FIFTH] {
        assert_eq!(
            perft(&setup(fen), 3),
            shakmaty::perft(&reference_position(fen), 3),
            "{fen}"
        );
    }
}

#[test]
fn perft_starting_position() {
    let position = Position::starting();
    assert_eq!(perft(&position, 0), 1);
    assert_eq!(perft(&position, 1), 20);
    assert_eq!(perft(&position, 2), 400);
    assert_eq!(perft(&position, 3), 8902);
    assert_eq!(perft(&position, 4), 197_281);
}

// This test is very expensive in the Debug setting: run it with
// `cargo test --release -- --ignored`.
#[ignore]
#[test]
fn perft_starting_position_deep() {
    let position = Position::starting();
    assert_eq!(perft(&position, 5), 4_865_609);
    assert_eq!(perft_cache(&position, 5), 4_865_609);
    assert_eq!(perft_parallel(&position, 5), 4_865_609);
}

// Position 2.
#[test]
fn perft_kiwipete() {
    let position = setup(KIWIPETE);
    assert_eq!(perft(&position, 1), 48);
    assert_eq!(perft(&position, 2), 2039);
    assert_eq!(perft(&position, 3), 97862);
}

#[ignore]
#[test]
fn perft_kiwipete_deep() {
    let position = setup(KIWIPETE);
    assert_eq!(perft_parallel(&position, 4), 4_085_603);
    assert_eq!(perft_parallel(&position, 5), 193_690_690);
}

// Position 3.
#[test]
fn perft_endgame() {
    let position = setup(ENDGAME);
    assert_eq!(perft(&position, 1), 14);
    assert_eq!(perft(&position, 2), 191);
    assert_eq!(perft(&position, 3), 2812);
    assert_eq!(perft(&position, 4), 43238);
    assert_eq!(perft_cache(&position, 5), 674_624);
}

// Position 4.
#[test]
fn perft_complex() {
    for fen in [COMPLEX, COMPLEX_MIRRORED] {
        let position = setup(fen);
        assert_eq!(perft(&position, 1), 6);
        assert_eq!(perft(&position, 2), 264);
        assert_eq!(perft(&position, 3), 9467);
    }
}

#[ignore]
#[test]
fn perft_complex_deep() {
    let position = setup(COMPLEX_MIRRORED);
    assert_eq!(perft_parallel(&position, 4), 422_333);
    assert_eq!(perft_parallel(&position, 5), 15_833_292);
}

// Position 5.
#[test]
fn perft_fifth() {
    let position = setup(FIFTH);
    assert_eq!(perft(&position, 1), 44);
    assert_eq!(perft(&position, 2), 1486);
    assert_eq!(perft(&position, 3), 62379);
}

#[ignore]
#[test]
fn perft_fifth_deep() {
    let position = setup(FIFTH);
    assert_eq!(perft_parallel(&position, 4), 2_103_487);
    assert_eq!(perft_parallel(&position, 5), 89_941_194);
}

// Position 6.
#[test]
fn perft_sixth() {
    let position = setup(SIXTH);
    assert_eq!(perft(&position, 1), 46);
    assert_eq!(perft(&position, 2), 2079);
    assert_eq!(perft(&position, 3), 89890);
}

#[ignore]
#[test]
fn perft_sixth_deep() {
    let position = setup(SIXTH);
    assert_eq!(perft_parallel(&position, 4), 3_894_594);
    assert_eq!(perft_parallel(&position, 5), 164_075_551);
}
