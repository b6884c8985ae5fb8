use anyhow::Context;
use clap::Parser;
use horserace::core::handle_race::handle_program;
use horserace::core::race::EngineCommand;
use horserace::interfaces::race_interface::RaceState;
use horserace::post::race_result::{BatchSummary, ProgramResult};
use horserace::pre::read_sim_pars::{read_sim_pars, SimPars};
use horserace::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::io::BufRead;
use std::thread;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn parse_command(input: &str) -> Option<EngineCommand> {
    match input.trim().to_lowercase().as_str() {
        "" | "t" | "toggle" => Some(EngineCommand::ToggleGame),
        "s" | "stop" => Some(EngineCommand::StopGame),
        "r" | "resume" => Some(EngineCommand::ResumeGame),
        "g" | "generate" => Some(EngineCommand::GenerateProgram),
        _ => None,
    }
}

fn print_race_state(race_state: &RaceState) {
    let leader = race_state
        .leader()
        .map(|h| format!("{} ({:.0}%)", h.name, h.race_prog * 100.0))
        .unwrap_or_else(|| "-".to_owned());
    let no_finished = race_state.horse_states.iter().filter(|h| h.finished).count();

    println!(
        "Round {} ({}m) | {:7.2}s | {:?} | leader: {} | finished: {}/{}",
        race_state.round_no,
        race_state.round_length,
        race_state.elapsed_seconds,
        race_state.phase,
        leader,
        no_finished,
        race_state.horse_states.len()
    );
}

fn export_results(result: &ProgramResult, sim_opts: &SimOpts) -> anyhow::Result<()> {
    result.print_round_results()?;

    if let Some(csv_path) = &sim_opts.csv_path {
        result.write_results_to_csv(csv_path)?;
        info!("Results written to {:?}", csv_path);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if sim_opts.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber!")?;

    // get simulation parameters
    let mut sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        info!("Reading simulation parameters from {:?}", parfile_path);
        read_sim_pars(parfile_path)?
    } else {
        info!("No parameter file provided, using default parameters");
        SimPars::default()
    };
    if sim_opts.seed.is_some() {
        sim_pars.seed = sim_opts.seed;
    }

    info!(
        "Simulating {} rounds of {} horses with a tick size of {:.3}s",
        sim_pars.engine_pars.max_rounds,
        sim_pars.engine_pars.lineup_size,
        sim_pars.engine_pars.tick_delta
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.realtime {
        let no_sim_runs = sim_opts.no_sim_runs.max(1);
        info!("Running {} program(s) without real-time pacing...", no_sim_runs);
        let t_start = Instant::now();

        // every run gets its own seed so that seeded batches stay reproducible
        let results = (0..no_sim_runs)
            .into_par_iter()
            .map(|run| {
                let run_pars = SimPars {
                    seed: sim_pars.seed.map(|seed| seed.wrapping_add(run as u64)),
                    ..sim_pars.clone()
                };
                handle_program(&run_pars, sim_opts.debug && no_sim_runs == 1, None, None, 1.0)
            })
            .collect::<anyhow::Result<Vec<ProgramResult>>>()?;

        info!("Execution time: {}ms", t_start.elapsed().as_millis());

        if let Some(first_result) = results.first() {
            export_results(first_result, &sim_opts)?;
        }
        if results.len() > 1 {
            BatchSummary::from_results(&results).print_summary();
        }
    } else {
        info!("Starting real-time simulation...");
        info!("Commands: [t]oggle (or Enter), [s]top, [r]esume, [g]enerate new program");

        // channels between the simulator thread and this consumer
        let (tx, rx) = flume::unbounded();
        let (tx_cmd, rx_cmd) = flume::unbounded();

        let sim_pars_thread = sim_pars.clone();
        let realtime_factor = sim_opts.realtime_factor;
        let sim_handle = thread::spawn(move || {
            handle_program(
                &sim_pars_thread,
                false,
                Some(&tx),
                Some(&rx_cmd),
                realtime_factor,
            )
        });

        // forward console input as engine commands, detached since stdin blocks
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                match parse_command(&line) {
                    Some(cmd) => {
                        if tx_cmd.send(cmd).is_err() {
                            break;
                        }
                    }
                    None => warn!("Unknown command {:?}", line.trim()),
                }
            }
        });

        for race_state in rx.iter() {
            print_race_state(&race_state);
            if race_state.final_result.is_some() {
                info!("Program finished");
            }
        }

        let result = match sim_handle.join() {
            Ok(result) => result?,
            Err(_) => anyhow::bail!("Simulation thread panicked!"),
        };
        export_results(&result, &sim_opts)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_input_maps_to_commands() {
        assert_eq!(parse_command(""), Some(EngineCommand::ToggleGame));
        assert_eq!(parse_command(" S \n"), Some(EngineCommand::StopGame));
        assert_eq!(parse_command("resume"), Some(EngineCommand::ResumeGame));
        assert_eq!(parse_command("g"), Some(EngineCommand::GenerateProgram));
        assert_eq!(parse_command("jump"), None);
    }
}
