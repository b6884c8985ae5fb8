use crate::pre::read_sim_pars::EnginePars;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::Serialize;

/// Number of horses in a roster.
pub const ROSTER_SIZE: usize = 20;

/// Name pool. It holds one entry more than the roster needs, so one name stays unused in every
/// generation.
pub const NAMES: [&str; 21] = [
    "Thunderbolt",
    "Shadowfax",
    "Windrunner",
    "Rüzgar",
    "Blaze",
    "Nightmare",
    "Silverwind",
    "Firestorm",
    "Gülbatur",
    "Eclipse",
    "Majestic",
    "Phantom",
    "Comet",
    "Tornado",
    "Şahbatur",
    "Avalanche",
    "Hurricane",
    "Güllü",
    "Whirlwind",
    "Tempest",
    "Vortex",
];

/// Color pool, one hex color per roster slot.
pub const COLORS: [&str; ROSTER_SIZE] = [
    "#FF0055", "#FF6FA8", "#D400FF", "#8C00FF", "#5100FF", "#003CFF", "#0080FF", "#00C4FF",
    "#006A8F", "#002B40", "#FF3F00", "#FF7B00", "#FF95CC", "#C70039", "#7A001F", "#A0A0FF",
    "#174400", "#006c5a", "#270049", "#754000",
];

/// * `id` - Roster number, 1..=20, unique within a generation
/// * `name` - Drawn without replacement from `NAMES`
/// * `color` - Hex color drawn without replacement from `COLORS`
/// * `condition` - Long-run stamina, fixed for the generation
/// * `speed` - (m/s) Base speed at generation, live value once the horse races
/// * `time` - (s) Race time in the current round, frozen once the horse finishes
/// * `elapsed` - (m) Distance covered in the current round
/// * `finished` - Set once `elapsed` reaches the round length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Horse {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub condition: u32,
    pub speed: f64,
    pub time: f64,
    pub elapsed: f64,
    pub finished: bool,
}

impl Horse {
    /// Returns an independent copy with the per-round progress reset, as loaded into a race.
    pub fn reset_for_round(&self) -> Horse {
        Horse {
            time: 0.0,
            elapsed: 0.0,
            finished: false,
            ..self.clone()
        }
    }

    /// Fatigue factor, lower condition means faster speed decay.
    pub fn fatigue(&self) -> f64 {
        1.0 - self.condition as f64 / 100.0
    }

    /// drive_timestep advances the horse by one tick: random speed jitter, fatigue decay, then
    /// progress. The horse finishes once it covers `round_length`.
    pub fn drive_timestep<R: Rng + ?Sized>(
        &mut self,
        cur_racetime: f64,
        timestep_size: f64,
        round_length: f64,
        fatigue_rate: f64,
        jitter: &Uniform<f64>,
        rng: &mut R,
    ) {
        if self.finished {
            return;
        }

        self.time = cur_racetime;

        // live random walk, compounds tick over tick
        self.speed *= 1.0 + jitter.sample(rng);
        self.speed *= 1.0 - self.fatigue() * fatigue_rate * timestep_size;

        self.elapsed += self.speed * timestep_size;

        if self.elapsed >= round_length {
            self.finished = true;
        }
    }
}

/// generate_horses creates a fresh roster: names and colors are shuffled and handed out in id
/// order, condition and base speed are drawn uniformly from the configured inclusive ranges.
pub fn generate_horses<R: Rng + ?Sized>(pars: &EnginePars, rng: &mut R) -> Vec<Horse> {
    let mut names = NAMES.to_vec();
    names.shuffle(rng);
    let mut colors = COLORS.to_vec();
    colors.shuffle(rng);

    let mut horses = Vec::with_capacity(ROSTER_SIZE);

    for id in 1..=ROSTER_SIZE as u32 {
        // both pools hold at least ROSTER_SIZE entries
        let name = names.pop().unwrap_or_default();
        let color = colors.pop().unwrap_or_default();

        horses.push(Horse {
            id,
            name: name.to_owned(),
            color: color.to_owned(),
            condition: rng.gen_range(pars.condition_range[0]..=pars.condition_range[1]),
            speed: rng.gen_range(pars.speed_range[0]..=pars.speed_range[1]) as f64,
            time: 0.0,
            elapsed: 0.0,
            finished: false,
        });
    }

    horses
}
