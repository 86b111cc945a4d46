//! [Perft] (*per*formance *t*esting) is a technique for checking correctness of
//! move generation (tested functions are generate move, make move and unmake
//! move).
//!
//! The node counts at fixed depths from well-known positions are published, so
//! any difference from them points to a bug in the move generator. [`divide`]
//! splits the count by root move, which narrows the search for the offending
//! move down when comparing against another implementation.
//!
//! [Perft]: https://www.chessprogramming.org/Perft

use std::collections::HashMap;
use std::panic;
use std::thread;
use std::time::Instant;

use crate::chess::attacks;
use crate::chess::core::Move;
use crate::chess::position::Position;
use crate::chess::zobrist::Key;

/// Counts the leaf nodes of the legal move tree of given depth.
///
/// ```
/// use flipboard::chess::position::Position;
/// use flipboard::perft::perft;
///
/// assert_eq!(perft(&Position::starting(), 3), 8902);
/// ```
#[must_use]
pub fn perft(position: &Position, depth: u8) -> u64 {
    match depth {
        0 => 1,
        // Bulk counting: the leaves do not have to be visited.
        1 => position.legal_moves().len() as u64,
        _ => position
            .legal_moves()
            .into_iter()
            .map(|next_move| {
                let mut next_position = *position;
                next_position.push_move(next_move);
                perft(&next_position, depth - 1)
            })
            .sum(),
    }
}

/// Same as [`perft`] but remembers the counts of the visited subtrees by
/// `(Zobrist key, depth)`, so transpositions are only counted once.
#[must_use]
pub fn perft_cache(position: &Position, depth: u8) -> u64 {
    let start = Instant::now();
    let mut cache = HashMap::new();
    let nodes = cached_perft(position, depth, &mut cache);
    log::debug!(
        "perft_cache({depth}) = {nodes}: {} cached subtrees, {:?}",
        cache.len(),
        start.elapsed()
    );
    nodes
}

fn cached_perft(position: &Position, depth: u8, cache: &mut HashMap<(Key, u8), u64>) -> u64 {
    if depth <= 1 {
        return perft(position, depth);
    }
    let key = (position.zobrist_hash(), depth);
    if let Some(nodes) = cache.get(&key) {
        return *nodes;
    }
    let nodes: u64 = position
        .legal_moves()
        .into_iter()
        .map(|next_move| {
            let mut next_position = *position;
            next_position.push_move(next_move);
            cached_perft(&next_position, depth - 1, cache)
        })
        .sum();
    let _ = cache.insert(key, nodes);
    nodes
}

/// Same as [`perft`] but every root move is counted on its own thread. Each
/// thread works on its own copy of the position.
///
/// # Panics
///
/// If any of the workers panics, the panic is propagated to the caller: a
/// partial count is meaningless.
#[must_use]
pub fn perft_parallel(position: &Position, depth: u8) -> u64 {
    if depth <= 1 {
        return perft(position, depth);
    }
    // The table is built before the workers start reading it.
    attacks::init();
    let start = Instant::now();
    let nodes: u64 = thread::scope(|scope| {
        let workers: Vec<_> = position
            .legal_moves()
            .into_iter()
            .map(|next_move| {
                scope.spawn(move || {
                    let mut next_position = *position;
                    next_position.push_move(next_move);
                    let nodes = perft(&next_position, depth - 1);
                    log::trace!("{next_move}: {nodes}");
                    nodes
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| match worker.join() {
                Ok(nodes) => nodes,
                Err(payload) => panic::resume_unwind(payload),
            })
            .sum()
    });
    log::debug!("perft_parallel({depth}) = {nodes}: {:?}", start.elapsed());
    nodes
}

/// Perft node counts of the subtrees of every root move, sorted by the UCI
/// text of the move. The counts add up to `perft(position, depth)`.
#[must_use]
pub fn divide(position: &Position, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return vec![];
    }
    let start = Instant::now();
    let mut counts: Vec<_> = position
        .legal_moves()
        .into_iter()
        .map(|next_move| {
            let mut next_position = *position;
            next_position.push_move(next_move);
            let nodes = perft(&next_position, depth - 1);
            log::trace!("{next_move}: {nodes}");
            (next_move, nodes)
        })
        .collect();
    counts.sort_by_cached_key(|(next_move, _)| next_move.to_string());
    log::debug!(
        "divide({depth}) = {}: {:?}",
        counts.iter().map(|(_, nodes)| nodes).sum::<u64>(),
        start.elapsed()
    );
    counts
}
