use crate::core::race::{GamePhase, RaceEngine};
use crate::post::race_result::ProgramResult;
use anyhow::Context;

pub const MAX_UPDATE_FREQUENCY: f64 = 20.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub fn from_hex(hex: &str) -> anyhow::Result<RgbColor> {
        let tmp_color = hex
            .parse::<css_color_parser::Color>()
            .context(format!("Could not parse hex color {}!", hex))?;
        Ok(RgbColor {
            r: tmp_color.r,
            g: tmp_color.g,
            b: tmp_color.b,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct HorseState {
    pub id: u32,
    pub name: String,
    pub color: RgbColor,
    pub race_prog: f64, // fraction of the round length, [0, 1]
    pub speed: f64,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct RaceState {
    pub round_no: u32,
    pub round_length: u32,
    pub elapsed_seconds: f64,
    pub phase: GamePhase,
    pub horse_states: Vec<HorseState>,

    // final results payload (sent once when the program finishes)
    pub final_result: Option<ProgramResult>,
}

impl RaceState {
    /// from_engine takes a read-only snapshot of the current round for consumers.
    pub fn from_engine(engine: &RaceEngine) -> anyhow::Result<RaceState> {
        let round_length = engine.get_current_round_length();
        let mut horse_states = Vec::with_capacity(engine.in_game_horses().len());

        for horse in engine.in_game_horses() {
            horse_states.push(HorseState {
                id: horse.id,
                name: horse.name.to_owned(),
                color: RgbColor::from_hex(&horse.color)?,
                race_prog: (horse.elapsed / round_length as f64).clamp(0.0, 1.0),
                speed: horse.speed,
                finished: horse.finished,
            });
        }

        Ok(RaceState {
            round_no: engine.current_round_index() as u32 + 1,
            round_length,
            elapsed_seconds: engine.elapsed_seconds(),
            phase: engine.phase(),
            horse_states,
            final_result: None,
        })
    }

    /// Horse with the largest race progress, if any horse is in the race.
    pub fn leader(&self) -> Option<&HorseState> {
        self.horse_states.iter().max_by(|a, b| {
            a.race_prog
                .partial_cmp(&b.race_prog)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}
