//! Perft drivers: per-move node counts at the root, and a root-parallel
//! variant that splits the root move list across worker threads.

use crate::board::{Board, Move};

/// Count nodes per root move at `depth`, in move order.
///
/// Unlike [`Board::perft`], this also reports the move that led to each
/// subtree, which is what `go perft` "divide" output and the `perft_divide`
/// binary need.
pub fn divide(board: &mut Board, depth: usize) -> Vec<(Move, u64)> {
    let moves = board.generate_moves();
    let mut results = Vec::with_capacity(moves.len());

    for m in &moves {
        let info = board.make_move(*m);
        let nodes = if depth <= 1 { 1 } else { board.perft(depth - 1) };
        board.unmake_move(*m, info);
        results.push((*m, nodes));
    }

    results
}

/// Perft at `depth`, splitting root moves across up to `n_threads` workers.
///
/// Each worker walks its own clone of `board`, so the only shared state is
/// the root move list itself. Falls back to the serial driver for small
/// workloads or when only one thread is requested.
pub fn perft_parallel(board: &Board, depth: usize, n_threads: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut root = board.clone();
    let moves = root.generate_moves();

    let n_threads = n_threads.max(1);
    if n_threads == 1 || moves.len() < 2 * n_threads {
        return root.perft(depth);
    }

    let chunk_size = moves.len().div_ceil(n_threads);
    let move_chunks: Vec<Vec<Move>> = moves
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .chunks(chunk_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = move_chunks
            .into_iter()
            .map(|chunk| {
                let mut worker_board = board.clone();
                scope.spawn(move || {
                    let mut total = 0u64;
                    for m in chunk {
                        let info = worker_board.make_move(m);
                        total += if depth == 1 { 1 } else { worker_board.perft(depth - 1) };
                        worker_board.unmake_move(m, info);
                    }
                    total
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap_or(0)).sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_sums_to_perft() {
        let mut board = Board::new();
        let total: u64 = divide(&mut board, 3).iter().map(|(_, n)| *n).sum();
        assert_eq!(total, board.perft(3));
    }

    #[test]
    fn parallel_matches_serial() {
        let board = Board::new();
        let serial = board.clone().perft(4);
        let parallel = perft_parallel(&board, 4, 4);
        assert_eq!(serial, parallel);
    }
}
