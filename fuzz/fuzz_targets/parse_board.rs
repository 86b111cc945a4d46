#![no_main]
use flipboard::chess::position::Position;
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(position) = Position::try_from(input) {
        let fen = position.to_string();
        assert_eq!(Position::from_fen(&fen).unwrap(), position);
        assert_eq!(Position::from_fen(&fen).unwrap().to_string(), fen);
    }
});
