//! Integration tests for the `EngineController` public API.

use std::sync::mpsc;
use std::time::Duration;

use chess_engine::engine::{EngineController, SearchParams};

#[test]
fn engine_depth_search_returns_move() {
    let mut controller = EngineController::new(16);
    let params = SearchParams {
        depth: Some(1),
        ..SearchParams::default()
    };

    let (tx, rx) = mpsc::channel();
    controller.start_search(params, move |result| {
        let _ = tx.send(result.best_move);
    });

    let best_move = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("search did not complete");
    assert!(best_move.is_some(), "depth-1 search from startpos should find a move");
}

#[test]
fn engine_time_limited_search_returns_within_budget() {
    let mut controller = EngineController::new(16);
    let params = SearchParams {
        soft_time_ms: 50,
        hard_time_ms: 200,
        ..SearchParams::default()
    };

    let (tx, rx) = mpsc::channel();
    let started = std::time::Instant::now();
    controller.start_search(params, move |result| {
        let _ = tx.send(result.best_move);
    });

    let best_move = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("time-limited search did not complete");
    assert!(best_move.is_some());
    assert!(started.elapsed() < Duration::from_secs(2), "search overran its time budget");
}

#[test]
fn engine_stop_search_halts_active_job() {
    let mut controller = EngineController::new(16);
    let params = SearchParams {
        infinite: true,
        ..SearchParams::default()
    };

    let (tx, rx) = mpsc::channel();
    controller.start_search(params, move |result| {
        let _ = tx.send(result.best_move);
    });
    assert!(controller.is_searching());
    std::thread::sleep(Duration::from_millis(20));

    controller.stop_search();
    let best_move = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("stopped search should still report a result");
    assert!(best_move.is_some());
    assert!(!controller.is_searching());
}
