use flipboard::chess::core::{Player, Square};
use flipboard::chess::position::{MoveParseError, Position};
use pretty_assertions::assert_eq;

fn setup(input: &str) -> Position {
    Position::try_from(input).expect("parsing legal position: {input}")
}

fn legal_position(input: &str) {
    let position = Position::from_fen(input).expect("we are parsing valid position: {input}");
    assert_eq!(position.to_string(), input);
    assert_eq!(Position::from_fen(&position.to_string()).unwrap(), position);
}

#[test]
fn basic_positions() {
    legal_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    legal_position("2r3r1/p3k3/1p3pp1/1B5p/5P2/2P1p1P1/PP4KP/3R4 w - - 0 34");
    legal_position("rnbqk1nr/p3bppp/1p2p3/2ppP3/3P4/P7/1PP1NPPP/R1BQKBNR w KQkq c6 0 7");
    legal_position("r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7");
    legal_position("r3k3/5p2/2p5/p7/P3r3/2N2n2/1PP2P2/2K2B2 w q - 0 24");
    legal_position("r1b1qrk1/ppp2pbp/n2p1np1/4p1B1/2PPP3/2NB1N1P/PP3PP1/R2QK2R w KQ e6 0 9");
    legal_position("8/8/8/8/2P5/3k4/8/KB6 b - c3 0 1");
    legal_position("rnbq1rk1/pp4pp/1b1ppn2/2p2p2/2PP4/1P2PN2/PB2BPPP/RN1Q1RK1 w - c6 0 9");
    legal_position("rnb1qknr/pppp2pp/7N/3Qp3/1PP2P2/B3P3/P3P1PP/RN2KB1R w KQq - 9 13");
}

#[test]
#[should_panic(expected = "w should have exactly one king, got 0")]
fn no_white_king() {
    let _ = Position::try_from("3k4/8/8/8/8/8/8/8 w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "b should have exactly one king, got 0")]
fn no_black_king() {
    let _ = Position::try_from("8/8/8/8/8/8/8/3K4 w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "w should have exactly one king, got 3")]
fn too_many_kings() {
    let _ = Position::try_from("1kkk4/8/8/8/8/8/8/1KKK4 w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "pawns can not be placed on backranks")]
fn pawns_on_backranks() {
    let _ = Position::try_from("3kr3/8/8/8/8/5Q2/8/1KP5 w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "w can not have more than 8 pawns, got 9")]
fn too_many_pawns() {
    let _ = Position::try_from("4k3/8/8/8/8/P7/PPPPPPPP/4K3 w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "w can not have more than 16 pieces, got 25")]
fn too_many_pieces() {
    let _ = Position::try_from("1QQQQQ1Q/Q6Q/Q6Q/Q2Q3Q/Q6Q/Q6Q/nnQ4Q/knQQQQQK w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "w has 2 promoted pieces but only 1 missing pawns")]
fn too_many_promotions() {
    let _ = Position::try_from("QQQ5/8/8/8/3k4/8/PPPPPPP1/4K3 w - - 0 1").unwrap();
}

#[test]
#[should_panic(expected = "en passant square should be on the third rank of b, got e3")]
fn wrong_en_passant_player() {
    let _ = Position::try_from("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1")
        .unwrap();
}

#[test]
#[should_panic(expected = "en passant square d3 is not behind a pawn of w")]
fn en_passant_not_behind_pawn() {
    let _ = Position::try_from("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq d3 0 1")
        .unwrap();
}

#[test]
#[should_panic(expected = "b can not be in check when it is not their move")]
fn opponent_in_check() {
    let _ = Position::try_from("4k3/8/8/8/8/8/8/3KR3 w - - 0 1").unwrap();
}

#[test]
fn malformed_fen() {
    for (input, error) in [
        (
            "8/8/8/8/8/8/8/8/8 w - - 0 1",
            "incorrect FEN: expected 8 ranks, got 8/8/8/8/8/8/8/8/8",
        ),
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR",
            "incorrect FEN: missing side to move",
        ),
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "incorrect FEN: missing halfmove clock",
        ),
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0",
            "incorrect FEN: missing fullmove counter",
        ),
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "player should be 'w' or 'b', got 'x'",
        ),
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 extra",
            "trailing symbols are not allowed in FEN",
        ),
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - -1 1",
            "halfmove clock can not contain anything other than digits",
        ),
    ] {
        let error_message = Position::from_fen(input).unwrap_err().to_string();
        assert_eq!(error_message, error, "input: {input:?}");
    }
    // A zero full-move counter is read as the first move.
    assert_eq!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0")
            .unwrap()
            .to_string(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
    assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 ").is_err());
    // Out of range placement.
    assert!(Position::from_fen("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
    assert!(Position::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
    assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1").is_err());
}

#[test]
fn clean_board_str() {
    assert!(Position::try_from(
        "fen rn1qkb1r/pp3ppp/2p1pn2/3p1b2/2PP4/5NP1/PP2PPBP/RNBQK2R w KQkq - 0 1"
    )
    .is_ok());
    assert!(Position::try_from(
        "epd rnbqkb1r/ppp1pp1p/5np1/3p4/3P1B2/5N2/PPP1PPPP/RN1QKB1R w KQkq - 0 1"
    )
    .is_ok());
    assert!(Position::try_from(
        "\n rnbqkbnr/pp2pppp/8/3p4/3P4/3B4/PPP2PPP/RNBQK1NR b KQkq - 0 1\n"
    )
    .is_ok());
    // Don't crash on unicode symbols.
    assert!(Position::try_from("8/8/8/8/8/8/8/8 b 88 🔠 🔠 ").is_err());
    assert!(Position::from_fen(
        "\n rnbqkb1r/ppp1pp1p/5np1/3p4/3P1B2/5N2/PPP1PPPP/RN1QKB1R w KQkq - 0 1"
    )
    .is_err());
}

#[test]
fn move_application_regression() {
    let mut position = setup("rnb1qknr/pppp2pp/7N/3Qp3/1PP2P2/B3P3/P3P1PP/RN2KB1R w KQq - 9 13");
    let _ = position.push_uci("a3c1").unwrap();
    assert_eq!(
        position.to_string(),
        "rnb1qknr/pppp2pp/7N/3Qp3/1PP2P2/4P3/P3P1PP/RNB1KB1R b KQq - 10 13"
    );
}

#[test]
fn zobrist_follows_moves() {
    let mut position = Position::starting();
    assert_eq!(position.zobrist_hash(), 0x463b_9618_1691_fc9c);
    for (uci, key) in [
        ("e2e4", 0x823c_9b50_fd11_4196),
        ("d7d5", 0x0756_b944_61c5_0fb0),
        ("e4e5", 0x662f_afb9_65db_29d4),
        ("f7f5", 0x22a4_8b5a_8e47_ff78),
        ("e1e2", 0x652a_607c_a3f2_42c1),
        ("e8f7", 0x00fd_d303_c946_bdd9),
    ] {
        let _ = position.push_uci(uci).unwrap();
        assert_eq!(position.zobrist_hash(), key, "after {uci}");
    }

    let mut position = Position::starting();
    for uci in ["a2a4", "b7b5", "h2h4", "b5b4", "c2c4"] {
        let _ = position.push_uci(uci).unwrap();
    }
    assert_eq!(position.zobrist_hash(), 0x3c81_23ea_7b06_7637);
    let en_passant = position.push_uci("b4c3").unwrap();
    assert!(en_passant.is_en_passant());
    let _ = position.push_uci("a1a3").unwrap();
    assert_eq!(position.zobrist_hash(), 0x5c3f_9b82_9b27_9560);
}

#[test]
fn transpositions_hash_identically() {
    let mut first = Position::starting();
    for uci in ["g1f3", "g8f6", "b1c3", "b8c6"] {
        let _ = first.push_uci(uci).unwrap();
    }
    let mut second = Position::starting();
    for uci in ["b1c3", "b8c6", "g1f3", "g8f6"] {
        let _ = second.push_uci(uci).unwrap();
    }
    assert_eq!(first, second);
    assert_eq!(first.zobrist_hash(), second.zobrist_hash());
    assert_ne!(first.zobrist_hash(), Position::starting().zobrist_hash());
}

#[test]
fn san_game() {
    let mut position = Position::starting();
    for san in ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"] {
        let _ = position.push_san(san).unwrap();
    }
    assert_eq!(
        position.to_string(),
        "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4"
    );
    assert_eq!(position.side_to_move(), Player::Black);
    assert!(position.is_check());
    assert!(position.is_checkmate());
    assert!(position.legal_moves().is_empty());
}

#[test]
fn san_errors_are_typed() {
    let position = setup("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
    let error = position.parse_san("Nd2").unwrap_err();
    assert_eq!(
        error.downcast_ref::<MoveParseError>(),
        Some(&MoveParseError::Ambiguous {
            notation: "Nd2".to_string()
        })
    );
    assert_eq!(position.parse_san("Nbd2").unwrap().to_string(), "b1d2");
    assert_eq!(position.parse_san("Nfd2").unwrap().to_string(), "f1d2");

    let error = position.parse_san("Nf6").unwrap_err();
    assert_eq!(
        error.downcast_ref::<MoveParseError>(),
        Some(&MoveParseError::NoMatch {
            notation: "Nf6".to_string()
        })
    );
    let error = position.parse_san("Zz9").unwrap_err();
    assert_eq!(
        error.downcast_ref::<MoveParseError>(),
        Some(&MoveParseError::Malformed {
            notation: "Zz9".to_string()
        })
    );
    assert_eq!(error.to_string(), "malformed move 'Zz9'");

    let mut position = Position::starting();
    let error = position.push_uci("e2e5").unwrap_err();
    assert!(matches!(
        error.downcast_ref::<MoveParseError>(),
        Some(MoveParseError::Illegal { .. })
    ));
    assert_eq!(position, Position::starting());
}

#[test]
fn accessors() {
    let position = setup("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
    assert_eq!(position.side_to_move(), Player::White);
    assert_eq!(position.en_passant_square(), Some(Square::F6));
    assert_eq!(position.halfmove_clock(), 0);
    assert_eq!(position.fullmove_counter(), 3);
    assert_eq!(position.castling().to_string(), "KQkq");
    assert_eq!(position.piece_at(Square::E5).unwrap().to_string(), "P");
    assert_eq!(position.piece_at(Square::E4), None);
    assert!(position
        .legal_moves()
        .iter()
        .any(|m| m.is_en_passant() && m.to_string() == "e5f6"));
}

#[test]
fn draws() {
    assert!(setup("8/8/4k3/8/8/3K4/8/8 w - - 0 1").is_draw_insufficient_material());
    assert!(setup("8/8/4k3/8/8/3KN3/8/8 w - - 0 1").is_draw_insufficient_material());
    assert!(setup("8/8/4kb2/8/8/3KB3/8/8 w - - 0 1").is_draw_insufficient_material());
    assert!(!setup("8/8/4k1b1/8/8/3KB3/8/8 w - - 0 1").is_draw_insufficient_material());
    assert!(!setup("8/8/4k3/8/8/3K4/8/R7 w - - 0 1").is_draw());
    assert!(setup("8/8/4k3/8/8/3K4/8/R7 w - - 50 80").is_draw_50_move());
    assert!(!setup("8/8/4k3/8/8/3K4/8/R7 w - - 49 80").is_draw());
    let stalemate = setup("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1");
    assert!(stalemate.is_stalemate());
    assert!(!stalemate.is_checkmate());
}
