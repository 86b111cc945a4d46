//! Bitboard chess position core: legal move generation, move application,
//! [perft] and [Polyglot] Zobrist hashing. For more information, see [README].
//!
//! Move generation is written once, from White's point of view, and
//! monomorphized for Black through [`chess::core::Side`].
//!
//! [perft]: https://www.chessprogramming.org/Perft
//! [Polyglot]: http://hgm.nubati.net/book_format.html
//! [README]: https://github.com/kirillbobyrev/flipboard/blob/main/README.md

// Rustdoc lints that are not configurable through Cargo.toml.
#![warn(
    rustdoc::missing_crate_level_docs,
    rustdoc::private_doc_tests,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::bare_urls
)]
// Performance is extremely important.
#![deny(clippy::perf)]

pub mod chess;
pub mod perft;

mod shell;
pub use shell::Shell;
use shadow_rs::shadow;

shadow!(build);

/// Build type and target. Produced by `build.rs`.
const FEATURES: &str = include_str!(concat!(env!("OUT_DIR"), "/features"));

/// Returns the full version that can be used to identify how the binary was
/// built in the first place.
fn engine_version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Prints the version and GitHub repository on startup.
pub fn print_engine_info() {
    println!("flipboard {}", engine_version());
    println!("<https://github.com/kirillbobyrev/flipboard>");
}

/// Prints information the build type, features and whether the build is clean
/// on startup.
pub fn print_binary_info() {
    println!("Release build: {}", !shadow_rs::is_debug());
    println!("Features: {FEATURES}");
    if !shadow_rs::git_clean() {
        println!("Warning: built with uncommitted changes");
    }
    println!();
}
