//! iai benchmarks are measuring projected processor cycles spent on executing a
//! piece of code. They are less noisy and give a better understanding of
//! whether the performance is "objectively" changing between different
//! versions.
//!
//! It doesn't eliminate the necessity of measuring the time, though, because
//! knowing the absolute values is very important, too. Hence, the two sets of
//! benchmarks are very similar but complement each other.
//!
//! Another problem is that there seems to be no way to benchmark a specific
//! piece of code with iai: the measurements include the whole function
//! execution.

use flipboard::chess::position::Position;
use flipboard::perft::perft;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn parse_positions() {
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        KIWIPETE,
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    ] {
        let _ = iai::black_box(Position::from_fen(fen).expect("benchmarks are given valid positions"));
    }
}

fn generate_kiwipete_moves() {
    let position = Position::from_fen(KIWIPETE).expect("benchmarks are given valid positions");
    let _ = iai::black_box(position.legal_moves());
}

fn hash_kiwipete() {
    let position = Position::from_fen(KIWIPETE).expect("benchmarks are given valid positions");
    let _ = iai::black_box(position.zobrist_hash());
}

fn perft_starting_position() {
    let _ = iai::black_box(perft(&Position::starting(), 3));
}

iai::main!(
    parse_positions,
    generate_kiwipete_moves,
    hash_kiwipete,
    perft_starting_position
);
