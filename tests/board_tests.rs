use chess_engine::board::Board;

struct TestPosition {
    name: &'static str,
    fen: &'static str,
    depths: &'static [(usize, u64)],
}

const TEST_POSITIONS: &[TestPosition] = &[
    TestPosition {
        name: "Initial Position",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        depths: &[(1, 20), (2, 400), (3, 8902), (4, 197281)],
    },
    TestPosition {
        name: "Kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        depths: &[(1, 48), (2, 2039), (3, 97862)],
    },
];

#[test]
fn perft_positions() {
    for position in TEST_POSITIONS {
        let mut board = Board::from_fen(position.fen);
        for &(depth, expected) in position.depths {
            let nodes = board.perft(depth);
            assert_eq!(
                nodes, expected,
                "perft mismatch for {} at depth {}",
                position.name, depth
            );
        }
    }
}

#[test]
fn fifty_move_counter_at_limit_is_a_draw() {
    let board = Board::from_fen("8/8/8/8/8/8/8/K6k w - - 100 1");
    assert!(board.is_draw());
}

#[test]
fn fresh_position_is_not_a_draw() {
    let board = Board::new();
    assert!(!board.is_draw());
}

#[test]
fn checkmate_position_has_no_legal_moves() {
    // Back-rank mate: white rook on b8, black king boxed in by its own pawns.
    let mut board = Board::from_fen("1R4k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    assert!(board.is_checkmate());
    assert!(board.generate_moves().is_empty());
}
