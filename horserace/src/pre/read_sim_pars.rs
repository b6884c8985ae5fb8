use crate::core::horse::ROSTER_SIZE;
use anyhow::Context;
use helpers::general::InputValueError;
use serde::Deserialize;
use std::convert::TryFrom;
use std::fs::OpenOptions;
use std::path::Path;

/// Number of rounds in a program.
pub const MAX_ROUNDS: usize = 6;
/// Base distance every round length is derived from.
pub const FIRST_ROUND_LENGTH: u32 = 1200;

/// * `max_rounds` - Number of rounds per program
/// * `first_round_length` - Base distance, round `i` requires `first_round_length + (i + 1) * round_length_step`
/// * `round_length_step` - Distance added per round
/// * `lineup_size` - Number of horses drawn from the roster for every round
/// * `tick_delta` - (s) Simulated time per tick, also the real-time period of the tick timer
/// * `speed_jitter` - Half-width of the uniform multiplicative speed jitter applied every tick
/// * `fatigue_rate` - Coefficient of the condition-based speed decay
/// * `speed_range` - Inclusive range of the base speed drawn at roster generation
/// * `condition_range` - Inclusive range of the condition drawn at roster generation
/// * `max_round_time` - (s) Simulated time after which the program runner gives up on a round
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EnginePars {
    pub max_rounds: usize,
    pub first_round_length: u32,
    pub round_length_step: u32,
    pub lineup_size: usize,
    pub tick_delta: f64,
    pub speed_jitter: f64,
    pub fatigue_rate: f64,
    pub speed_range: [u32; 2],
    pub condition_range: [u32; 2],
    pub max_round_time: f64,
}

impl Default for EnginePars {
    fn default() -> Self {
        EnginePars {
            max_rounds: MAX_ROUNDS,
            first_round_length: FIRST_ROUND_LENGTH,
            round_length_step: 200,
            lineup_size: 10,
            tick_delta: 0.01,
            speed_jitter: 0.02,
            fatigue_rate: 0.008,
            speed_range: [70, 100],
            condition_range: [1, 100],
            max_round_time: 3600.0,
        }
    }
}

impl EnginePars {
    /// validate checks the parameters against the ranges the engine can simulate.
    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.max_rounds == 0 {
            return Err(InputValueError::new("max_rounds", "at least one round is required"));
        }
        let last_round_length = u32::try_from(self.max_rounds)
            .ok()
            .and_then(|no_rounds| no_rounds.checked_mul(self.round_length_step))
            .and_then(|length| length.checked_add(self.first_round_length));
        if last_round_length.is_none() {
            return Err(InputValueError::new(
                "round_length_step",
                "round lengths exceed the supported distance",
            ));
        }
        if self.first_round_length == 0 && self.round_length_step == 0 {
            return Err(InputValueError::new(
                "round_length_step",
                "round lengths must be positive",
            ));
        }
        if self.lineup_size == 0 || self.lineup_size > ROSTER_SIZE {
            return Err(InputValueError::new(
                "lineup_size",
                &format!("must be in the range [1, {}]", ROSTER_SIZE),
            ));
        }
        if !(0.001..=1.0).contains(&self.tick_delta) {
            return Err(InputValueError::new(
                "tick_delta",
                "must be in the range [0.001, 1.0]",
            ));
        }
        if !(0.0..1.0).contains(&self.speed_jitter) {
            return Err(InputValueError::new("speed_jitter", "must be in the range [0.0, 1.0)"));
        }
        // fatigue is at most 1, the per-tick decay factor must stay positive
        if !(self.fatigue_rate >= 0.0) || self.fatigue_rate * self.tick_delta >= 1.0 {
            return Err(InputValueError::new(
                "fatigue_rate",
                "must be non-negative with fatigue_rate * tick_delta below 1",
            ));
        }
        if self.speed_range[0] == 0 || self.speed_range[0] > self.speed_range[1] {
            return Err(InputValueError::new(
                "speed_range",
                "must be a non-empty range of positive speeds",
            ));
        }
        // conditions above 100 would turn fatigue into acceleration
        if self.condition_range[0] > self.condition_range[1] || self.condition_range[1] > 100 {
            return Err(InputValueError::new(
                "condition_range",
                "must be a non-empty range within [0, 100]",
            ));
        }
        if !(self.max_round_time > 0.0) {
            return Err(InputValueError::new("max_round_time", "must be positive"));
        }
        Ok(())
    }

    /// Distance the horses have to cover in the round with the given (0-based) index.
    pub fn round_length(&self, round_idx: usize) -> u32 {
        let no_steps = u32::try_from(round_idx + 1).unwrap_or(u32::MAX);
        self.first_round_length
            .saturating_add(no_steps.saturating_mul(self.round_length_step))
    }
}

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimPars {
    pub engine_pars: EnginePars,
    pub seed: Option<u64>,
}

/// read_sim_pars reads the JSON file, decodes it into the simulation parameters struct and checks
/// the engine parameters.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars: SimPars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    pars.engine_pars
        .validate()
        .context(format!("Invalid parameters in {}!", filepath.display()))?;
    Ok(pars)
}
