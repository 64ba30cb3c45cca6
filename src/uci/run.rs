//! Blocking UCI command loop, reading from stdin and writing to stdout.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use crate::engine::{EngineController, SearchParams as EngineSearchParams};
use crate::engine::time::{build_search_request, TimeConfig, TimeControl};

use super::command::{parse_go_params, parse_uci_command, UciCommand};
use super::options::{parse_setoption, UciOptionAction, UciOptions};
use super::print::{format_iteration_info, print_perft_info};
use super::report::{print_bestmove, print_ready};
use super::try_parse_position_command;

fn time_config(options: &UciOptions) -> TimeConfig {
    TimeConfig {
        move_overhead_ms: options.move_overhead_ms,
        soft_time_percent: options.soft_time_percent,
        hard_time_percent: options.hard_time_percent,
        default_max_nodes: options.default_max_nodes,
    }
}

/// Run the UCI command loop until `quit` or end of input.
#[allow(clippy::too_many_lines)]
pub fn run_uci_loop() {
    let mut controller = EngineController::new(crate::board::DEFAULT_TT_MB);
    let mut options = UciOptions::new(crate::board::DEFAULT_TT_MB);

    controller.set_info_callback(Some(Arc::new(|info| {
        println!("{}", format_iteration_info(info));
    })));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(command) = parse_uci_command(&line) else {
            continue;
        };

        match command {
            UciCommand::Uci => {
                controller.with_search_state_ref(|state| options.print(state.params()));
            }
            UciCommand::IsReady => print_ready(),
            UciCommand::UciNewGame => controller.new_game(),
            UciCommand::Position(parts) => {
                controller.stop_search();
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                try_parse_position_command(controller.board_mut(), &refs);
            }
            UciCommand::Go(parts) => {
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                let go = parse_go_params(&refs);

                let white_to_move = controller.board().white_to_move();
                let time_control = if let Some(movetime) = go.movetime {
                    TimeControl::MoveTime { time_ms: movetime }
                } else if go.depth.is_some() && !go.ponder && !go.infinite {
                    TimeControl::Depth
                } else {
                    let (time_left_ms, inc_ms) = if white_to_move {
                        (go.wtime, go.winc.unwrap_or(0))
                    } else {
                        (go.btime, go.binc.unwrap_or(0))
                    };
                    match time_left_ms {
                        Some(time_left_ms) => TimeControl::Incremental {
                            time_left_ms,
                            inc_ms,
                            movestogo: go.movestogo,
                        },
                        None => TimeControl::Infinite,
                    }
                };

                let config = time_config(&options);
                let (request, _) = build_search_request(
                    time_control,
                    go.depth,
                    go.nodes,
                    go.ponder,
                    go.infinite,
                    &config,
                );

                controller.set_max_nodes(request.max_nodes);

                let search_params = EngineSearchParams {
                    depth: request.depth,
                    soft_time_ms: request.soft_time_ms,
                    hard_time_ms: request.hard_time_ms,
                    ponder: request.ponder,
                    infinite: request.infinite,
                    multi_pv: options.multi_pv,
                };

                controller.start_search(search_params, |result| {
                    match (result.best_move, result.ponder_move) {
                        (Some(best), Some(ponder)) => println!(
                            "bestmove {} ponder {}",
                            super::format_uci_move(&best),
                            super::format_uci_move(&ponder)
                        ),
                        (best, _) => print_bestmove(best),
                    }
                    let _ = io::stdout().flush();
                });
            }
            UciCommand::Perft(depth) => {
                let start = Instant::now();
                let nodes = controller.board_mut().perft(depth);
                print_perft_info(depth, nodes, start.elapsed());
            }
            UciCommand::SetOption(parts) => {
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                if let Some((name, value)) = parse_setoption(&refs) {
                    let action = controller
                        .with_search_state(|state| {
                            options.apply_setoption(&name, value.as_deref(), state)
                        })
                        .flatten();
                    match action {
                        Some(UciOptionAction::ReinitHash(mb)) => controller.resize_hash(mb),
                        Some(UciOptionAction::SetThreads(n)) => controller.set_threads(n),
                        None => {}
                    }
                }
            }
            UciCommand::Debug(arg) => {
                let on = matches!(arg.as_deref(), Some("on"));
                controller.set_trace(on);
            }
            UciCommand::Stop => controller.signal_stop(),
            UciCommand::PonderHit => controller.ponderhit(),
            UciCommand::Quit => break,
            UciCommand::Unknown(_) => {}
        }

        let _ = stdout.flush();
    }

    controller.stop_search();
}
