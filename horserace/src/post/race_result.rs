use crate::core::horse::Horse;
use crate::core::race::RaceEngine;
use anyhow::Context;
use helpers::general::{argmin, argsort, mean, SortOrder};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Placing of one horse in a round.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Placing {
    pub position: u32,
    pub id: u32,
    pub name: String,
    pub color: String,
    pub condition: u32,
    pub time: f64,
    pub speed: f64,
    pub elapsed: f64,
    pub finished: bool,
}

/// RoundResult contains the standings of one round, built from its lap table.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RoundResult {
    pub round_no: u32,
    pub round_length: u32,
    pub standings: Vec<Placing>,
}

impl RoundResult {
    /// Finished horses are ranked by race time, ties go to the horse that covered more distance.
    /// Unfinished horses (round captured mid-run) are ranked behind them by distance.
    pub fn from_lap_table(round_idx: usize, round_length: u32, lap_table: &[Horse]) -> RoundResult {
        let keys: Vec<(bool, f64, f64)> = lap_table
            .iter()
            .map(|h| {
                if h.finished {
                    (false, h.time, -h.elapsed)
                } else {
                    (true, -h.elapsed, 0.0)
                }
            })
            .collect();

        let standings = argsort(&keys, SortOrder::Ascending)
            .into_iter()
            .enumerate()
            .map(|(i, idx)| {
                let horse = &lap_table[idx];
                Placing {
                    position: i as u32 + 1,
                    id: horse.id,
                    name: horse.name.to_owned(),
                    color: horse.color.to_owned(),
                    condition: horse.condition,
                    time: horse.time,
                    speed: horse.speed,
                    elapsed: horse.elapsed,
                    finished: horse.finished,
                }
            })
            .collect();

        RoundResult {
            round_no: round_idx as u32 + 1,
            round_length,
            standings,
        }
    }

    pub fn winner(&self) -> Option<&Placing> {
        self.standings.first().filter(|p| p.finished)
    }
}

/// Flat CSV record, one per placing.
#[derive(Debug, Serialize)]
struct PlacingRecord<'a> {
    round_no: u32,
    round_length: u32,
    position: u32,
    id: u32,
    name: &'a str,
    color: &'a str,
    condition: u32,
    time: f64,
    speed: f64,
    elapsed: f64,
    finished: bool,
}

/// ProgramResult contains all round information that is required for post-processing the results.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct ProgramResult {
    pub rounds: Vec<RoundResult>,
}

impl ProgramResult {
    pub fn from_engine(engine: &RaceEngine) -> ProgramResult {
        ProgramResult {
            rounds: engine
                .lap_tables()
                .iter()
                .enumerate()
                .map(|(idx, lap_table)| {
                    RoundResult::from_lap_table(idx, engine.pars().round_length(idx), lap_table)
                })
                .collect(),
        }
    }

    /// Winner of every round that has one.
    pub fn winners(&self) -> Vec<&Placing> {
        self.rounds.iter().filter_map(RoundResult::winner).collect()
    }

    /// format_round_results renders the standings of all rounds as text tables.
    pub fn format_round_results(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();

        for round in self.rounds.iter() {
            writeln!(
                &mut out,
                "RESULT: Round {} ({}m)",
                round.round_no, round.round_length
            )?;
            writeln!(
                &mut out,
                "pos,  id, {:12}, cond,     time,   speed",
                "name"
            )?;
            for placing in round.standings.iter() {
                let time = if placing.finished {
                    format!("{:7.2}s", placing.time)
                } else {
                    "     DNF".to_owned()
                };
                writeln!(
                    &mut out,
                    "{:3}, {:3}, {:12}, {:4}, {}, {:7.2}",
                    placing.position,
                    placing.id,
                    placing.name,
                    placing.condition,
                    time,
                    placing.speed
                )?;
            }
            writeln!(&mut out)?;
        }

        Ok(out)
    }

    /// print_round_results prints the standings of all rounds to the console output.
    pub fn print_round_results(&self) -> anyhow::Result<()> {
        let out = self
            .format_round_results()
            .context("Failed to format round results!")?;
        print!("{}", out);
        Ok(())
    }

    /// write_results_to_csv writes one row per placing and round to the given file.
    pub fn write_results_to_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .context(format!("Failed to create result file {}!", path.display()))?;

        for round in self.rounds.iter() {
            for placing in round.standings.iter() {
                writer
                    .serialize(PlacingRecord {
                        round_no: round.round_no,
                        round_length: round.round_length,
                        position: placing.position,
                        id: placing.id,
                        name: &placing.name,
                        color: &placing.color,
                        condition: placing.condition,
                        time: placing.time,
                        speed: placing.speed,
                        elapsed: placing.elapsed,
                        finished: placing.finished,
                    })
                    .context("Failed to write result row!")?;
            }
        }

        writer
            .flush()
            .context(format!("Failed to flush result file {}!", path.display()))?;
        Ok(())
    }
}

/// BatchSummary aggregates the winning times of several independently simulated programs.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub no_programs: usize,
    pub mean_winner_times: Vec<f64>,
    pub best_winner_times: Vec<f64>,
}

impl BatchSummary {
    pub fn from_results(results: &[ProgramResult]) -> BatchSummary {
        let no_rounds = results.iter().map(|r| r.rounds.len()).max().unwrap_or(0);
        let mut mean_winner_times = Vec::with_capacity(no_rounds);
        let mut best_winner_times = Vec::with_capacity(no_rounds);

        for round_idx in 0..no_rounds {
            let winner_times: Vec<f64> = results
                .iter()
                .filter_map(|r| r.rounds.get(round_idx))
                .filter_map(RoundResult::winner)
                .map(|p| p.time)
                .collect();

            mean_winner_times.push(mean(&winner_times).unwrap_or(f64::NAN));
            best_winner_times.push(
                argmin(&winner_times)
                    .map(|idx| winner_times[idx])
                    .unwrap_or(f64::NAN),
            );
        }

        BatchSummary {
            no_programs: results.len(),
            mean_winner_times,
            best_winner_times,
        }
    }

    pub fn print_summary(&self) {
        println!("RESULT: Winning times over {} programs", self.no_programs);
        println!("round,     mean,     best");
        for (i, (mean_time, best_time)) in self
            .mean_winner_times
            .iter()
            .zip(self.best_winner_times.iter())
            .enumerate()
        {
            println!("{:5}, {:7.3}s, {:7.3}s", i + 1, mean_time, best_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raced_horse(id: u32, time: f64, elapsed: f64, finished: bool) -> Horse {
        Horse {
            id,
            name: format!("Horse {}", id),
            color: "#FF0055".to_owned(),
            condition: 50,
            speed: 80.0,
            time,
            elapsed,
            finished,
        }
    }

    #[test]
    fn standings_rank_by_time_then_distance() {
        let lap_table = vec![
            raced_horse(1, 18.0, 1401.0, true),
            raced_horse(2, 17.5, 1400.5, true),
            raced_horse(3, 18.0, 1403.0, true),
            raced_horse(4, 18.2, 1300.0, false),
            raced_horse(5, 18.2, 1350.0, false),
        ];

        let result = RoundResult::from_lap_table(0, 1400, &lap_table);
        let order: Vec<u32> = result.standings.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![2, 3, 1, 5, 4]);

        let positions: Vec<u32> = result.standings.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.round_no, 1);
        assert_eq!(result.winner().map(|p| p.id), Some(2));
    }

    #[test]
    fn round_without_finisher_has_no_winner() {
        let lap_table = vec![raced_horse(1, 1.0, 80.0, false)];
        let result = RoundResult::from_lap_table(2, 1800, &lap_table);
        assert!(result.winner().is_none());
        assert_eq!(result.round_no, 3);
    }

    #[test]
    fn formatted_results_contain_every_round() {
        let result = ProgramResult {
            rounds: vec![
                RoundResult::from_lap_table(0, 1400, &[raced_horse(7, 17.0, 1400.2, true)]),
                RoundResult::from_lap_table(1, 1600, &[raced_horse(8, 5.0, 400.0, false)]),
            ],
        };

        let text = result.format_round_results().unwrap();
        assert!(text.contains("RESULT: Round 1 (1400m)"));
        assert!(text.contains("RESULT: Round 2 (1600m)"));
        assert!(text.contains("Horse 7"));
        assert!(text.contains("DNF"));
        assert_eq!(result.winners().len(), 1);
    }

    #[test]
    fn batch_summary_aggregates_winner_times() {
        let program = |t0: f64, t1: f64| ProgramResult {
            rounds: vec![
                RoundResult::from_lap_table(0, 1400, &[raced_horse(1, t0, 1400.0, true)]),
                RoundResult::from_lap_table(1, 1600, &[raced_horse(2, t1, 1600.0, true)]),
            ],
        };
        let summary = BatchSummary::from_results(&[program(16.0, 20.0), program(18.0, 19.0)]);

        assert_eq!(summary.no_programs, 2);
        assert_eq!(summary.mean_winner_times, vec![17.0, 19.5]);
        assert_eq!(summary.best_winner_times, vec![16.0, 19.0]);
    }
}
