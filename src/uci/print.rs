use std::time::Duration;

use crate::board::SearchIterationInfo;

/// Format a completed search iteration as a UCI `info` line.
#[must_use]
pub fn format_iteration_info(info: &SearchIterationInfo) -> String {
    let mut parts = vec![format!("depth {}", info.depth)];
    if info.seldepth > 0 {
        parts.push(format!("seldepth {}", info.seldepth));
    }
    if info.multipv > 1 {
        parts.push(format!("multipv {}", info.multipv));
    }
    match info.mate_in {
        Some(mate) => parts.push(format!("score mate {mate}")),
        None => parts.push(format!("score cp {}", info.score)),
    }
    parts.push(format!("nodes {}", info.nodes));
    parts.push(format!("nps {}", info.nps));
    parts.push(format!("time {}", info.time_ms));
    parts.push(format!("pv {}", info.pv));
    format!("info {}", parts.join(" "))
}

pub fn format_time_setting(value_ms: u64) -> String {
    if value_ms == u64::MAX {
        "inf".to_string()
    } else {
        value_ms.to_string()
    }
}

pub fn print_time_info(
    soft_time_ms: u64,
    hard_time_ms: u64,
    overhead_ms: u64,
    nodes: u64,
    ponder: bool,
    depth: u32,
) {
    println!(
        "info string time soft={} hard={} overhead={} nodes={} ponder={} depth={}",
        format_time_setting(soft_time_ms),
        format_time_setting(hard_time_ms),
        overhead_ms,
        nodes,
        ponder,
        depth
    );
}

pub fn print_perft_info(depth: usize, nodes: u64, elapsed: Duration) {
    println!(
        "info string perft depth {} nodes {} time {:?}",
        depth, nodes, elapsed
    );
}
