use crate::core::race::{EngineCommand, GamePhase, RaceEngine};
use crate::interfaces::race_interface::{RaceState, MAX_UPDATE_FREQUENCY};
use crate::post::race_result::ProgramResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::{Receiver, Sender};
use helpers::general::InputValueError;
use std::thread::sleep;
use std::time::Instant;
use tracing::{debug, warn};

/// handle_program creates an engine, generates a program and simulates all of its rounds, then
/// returns the results for post-processing. The engine does not continue with the next round on
/// its own, so this function starts every round once the previous one is finished.
pub fn handle_program(
    sim_pars: &SimPars,
    print_debug: bool,
    tx: Option<&Sender<RaceState>>,
    rx_cmd: Option<&Receiver<EngineCommand>>,
    realtime_factor: f64,
) -> anyhow::Result<ProgramResult> {
    let mut engine = match sim_pars.seed {
        Some(seed) => RaceEngine::with_seed(sim_pars.engine_pars.to_owned(), seed),
        None => RaceEngine::new(sim_pars.engine_pars.to_owned()),
    }
    .context("Failed to create race engine!")?;

    engine.generate_program();

    // check if sender was inserted -> in that case use real-time simulation
    match tx {
        None => simulate_headless(&mut engine, print_debug)?,
        Some(tx) => simulate_realtime(&mut engine, tx, rx_cmd, realtime_factor)?,
    }

    Ok(ProgramResult::from_engine(&engine))
}

/// Simulates tick after tick without waiting for the wall clock.
fn simulate_headless(engine: &mut RaceEngine, print_debug: bool) -> anyhow::Result<()> {
    while engine.phase() != GamePhase::Finished {
        engine.start_game();
        let round_no = engine.current_round_index() + 1;
        let mut t_race_update_print = 0.0;

        while engine.tick() {
            enforce_round_time(engine);

            if print_debug && engine.elapsed_seconds() > t_race_update_print + 0.9999 {
                debug!(
                    "Simulating... Current race time in round {} is {:.3}s",
                    round_no,
                    engine.elapsed_seconds()
                );
                t_race_update_print = engine.elapsed_seconds();
            }
        }
    }

    Ok(())
}

/// Simulates in real-time, sends race states to the consumer and applies its commands.
fn simulate_realtime(
    engine: &mut RaceEngine,
    tx: &Sender<RaceState>,
    rx_cmd: Option<&Receiver<EngineCommand>>,
    realtime_factor: f64,
) -> anyhow::Result<()> {
    if !(realtime_factor > 0.0) {
        return Err(InputValueError::new("realtime_factor", "must be positive"))
            .context("Cannot simulate in real-time!");
    }

    let period = engine.tick_period();
    let t_update_interval = 1.0 / MAX_UPDATE_FREQUENCY - 0.001;
    let mut t_since_update = f64::INFINITY;

    while engine.phase() != GamePhase::Finished {
        let t_start = Instant::now();

        if let Some(rx_cmd) = rx_cmd {
            for cmd in rx_cmd.try_iter() {
                debug!("Applying command {:?}", cmd);
                engine.apply(cmd);
            }
        }

        // next round, unless the consumer asked to hold
        if engine.phase() == GamePhase::Ready && !engine.is_game_stopped() {
            engine.start_game();
        }

        engine.advance_time(period);
        enforce_round_time(engine);

        t_since_update += engine.pars().tick_delta;
        if t_since_update >= t_update_interval {
            tx.send(RaceState::from_engine(engine)?)
                .context("Failed to send race state to consumer!")?;
            t_since_update = 0.0;
        }

        // sleep until time step is finished in real-time as well
        match period.div_f64(realtime_factor).checked_sub(t_start.elapsed()) {
            Some(t_sleep) if !t_sleep.is_zero() => sleep(t_sleep),
            _ => warn!("Could not keep up with real-time!"),
        }
    }

    // after real-time loop finishes, send final result once
    let mut final_msg = RaceState::from_engine(engine)?;
    final_msg.final_result = Some(ProgramResult::from_engine(engine));
    tx.send(final_msg)
        .context("Failed to send final program result to consumer!")?;

    Ok(())
}

/// Abandons a round that runs longer than `max_round_time`, its unfinished horses end up as DNF
/// in the results.
fn enforce_round_time(engine: &mut RaceEngine) {
    if engine.is_game_started() && engine.elapsed_seconds() > engine.pars().max_round_time {
        engine.abandon_round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pre::read_sim_pars::{EnginePars, MAX_ROUNDS};

    #[test]
    fn headless_program_runs_all_rounds() {
        let sim_pars = SimPars {
            engine_pars: EnginePars {
                speed_jitter: 0.0,
                ..EnginePars::default()
            },
            seed: Some(41),
        };
        let result = handle_program(&sim_pars, true, None, None, 1.0).unwrap();

        assert_eq!(result.rounds.len(), MAX_ROUNDS);
        for (idx, round) in result.rounds.iter().enumerate() {
            assert_eq!(round.round_no as usize, idx + 1);
            assert_eq!(round.standings.len(), 10);
            assert!(round.standings.iter().all(|p| p.finished));
            assert!(round.standings.iter().all(|p| p.elapsed >= round.round_length as f64));
        }
        assert_eq!(result.winners().len(), MAX_ROUNDS);
    }

    #[test]
    fn headless_program_is_reproducible_with_seed() {
        let sim_pars = SimPars {
            engine_pars: EnginePars::default(),
            seed: Some(42),
        };
        let result_a = handle_program(&sim_pars, false, None, None, 1.0).unwrap();
        let result_b = handle_program(&sim_pars, false, None, None, 1.0).unwrap();
        assert_eq!(result_a, result_b);
    }

    #[test]
    fn rounds_over_time_limit_are_abandoned() {
        let sim_pars = SimPars {
            engine_pars: EnginePars {
                max_round_time: 1.0,
                ..EnginePars::default()
            },
            seed: Some(43),
        };
        let result = handle_program(&sim_pars, false, None, None, 1.0).unwrap();

        assert_eq!(result.rounds.len(), MAX_ROUNDS);
        for round in result.rounds.iter() {
            assert_eq!(round.standings.len(), 10);
            assert!(round.standings.iter().all(|p| !p.finished));
            assert!(round.winner().is_none());
        }
        assert!(result.winners().is_empty());
    }

    #[test]
    fn stalled_rounds_do_not_fail_the_program() {
        // horses lose nearly all speed within a few ticks and never reach the finish
        let sim_pars = SimPars {
            engine_pars: EnginePars {
                speed_jitter: 0.0,
                fatigue_rate: 50.0,
                condition_range: [1, 1],
                max_round_time: 30.0,
                ..EnginePars::default()
            },
            seed: Some(46),
        };
        let result = handle_program(&sim_pars, false, None, None, 1.0).unwrap();

        assert_eq!(result.rounds.len(), MAX_ROUNDS);
        for round in result.rounds.iter() {
            assert!(round
                .standings
                .iter()
                .all(|p| !p.finished && p.elapsed > 0.0 && p.elapsed < round.round_length as f64));
        }
        let text = result.format_round_results().unwrap();
        assert!(text.contains("DNF"));
    }

    #[test]
    fn realtime_program_sends_states_and_final_result() {
        let sim_pars = SimPars {
            engine_pars: EnginePars {
                max_rounds: 1,
                first_round_length: 0,
                round_length_step: 20,
                ..EnginePars::default()
            },
            seed: Some(44),
        };
        let (tx, rx) = flume::unbounded();

        let result = handle_program(&sim_pars, false, Some(&tx), None, 50.0).unwrap();
        drop(tx);

        let states: Vec<RaceState> = rx.drain().collect();
        assert!(states.len() >= 2);
        let last = states.last().unwrap();
        assert_eq!(last.phase, GamePhase::Finished);
        assert_eq!(last.final_result.as_ref(), Some(&result));
        assert!(states[..states.len() - 1]
            .iter()
            .all(|s| s.final_result.is_none()));
    }

    #[test]
    fn realtime_program_holds_after_stop_command() {
        let sim_pars = SimPars {
            engine_pars: EnginePars {
                max_rounds: 1,
                first_round_length: 0,
                round_length_step: 20,
                ..EnginePars::default()
            },
            seed: Some(45),
        };
        let (tx, rx) = flume::unbounded();
        let (tx_cmd, rx_cmd) = flume::unbounded();

        // stop before the first tick, resume right away, the program must still finish
        tx_cmd.send(EngineCommand::StopGame).unwrap();
        tx_cmd.send(EngineCommand::ResumeGame).unwrap();

        let result = handle_program(&sim_pars, false, Some(&tx), Some(&rx_cmd), 50.0).unwrap();
        assert_eq!(result.rounds.len(), 1);
        assert!(rx.drain().any(|s| s.final_result.is_some()));
    }

    #[test]
    fn realtime_factor_must_be_positive() {
        let (tx, _rx) = flume::unbounded();
        let err = handle_program(&SimPars::default(), false, Some(&tx), None, 0.0).unwrap_err();
        assert!(format!("{:#}", err).contains("realtime_factor"));
    }
}
