use crate::core::horse::{generate_horses, Horse};
use crate::core::program::{build_program_table, load_in_race_set, sync_lineup, RoundLineup};
use crate::core::timer::IntervalTimer;
use crate::pre::read_sim_pars::EnginePars;
use helpers::general::InputValueError;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of a program as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,     // no program generated
    Ready,    // program generated, round not running
    Running,  // tick timer armed
    Paused,   // round started, tick timer suspended
    Finished, // last round completed
}

/// Commands a consumer can route to the engine, e.g. over a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    GenerateProgram,
    StartGame,
    StopGame,
    ResumeGame,
    ToggleGame,
}

pub struct RaceEngine {
    pars: EnginePars,
    horses: Vec<Horse>,
    in_game_horses: Vec<Horse>,
    current_round_index: usize,
    is_game_started: bool,
    is_game_stopped: bool,
    is_program_generated: bool,
    is_program_finished: bool,
    elapsed_seconds: f64,
    program_table: Vec<RoundLineup>,
    lap_tables: Vec<Vec<Horse>>,
    timer: Option<IntervalTimer>,
    jitter: Uniform<f64>,
    rng: Box<dyn RngCore + Send>,
}

impl fmt::Debug for RaceEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RaceEngine")
            .field("pars", &self.pars)
            .field("current_round_index", &self.current_round_index)
            .field("is_game_started", &self.is_game_started)
            .field("is_game_stopped", &self.is_game_stopped)
            .field("is_program_generated", &self.is_program_generated)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl RaceEngine {
    /// Creates an engine drawing from an entropy-seeded random number generator.
    pub fn new(pars: EnginePars) -> Result<RaceEngine, InputValueError> {
        RaceEngine::with_rng(pars, Box::new(StdRng::from_entropy()))
    }

    /// Creates an engine whose runs are reproducible for the same seed and parameters.
    pub fn with_seed(pars: EnginePars, seed: u64) -> Result<RaceEngine, InputValueError> {
        RaceEngine::with_rng(pars, Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    pub fn with_rng(
        pars: EnginePars,
        mut rng: Box<dyn RngCore + Send>,
    ) -> Result<RaceEngine, InputValueError> {
        pars.validate()?;

        let jitter = Uniform::new_inclusive(-pars.speed_jitter, pars.speed_jitter);
        let horses = generate_horses(&pars, &mut *rng);

        Ok(RaceEngine {
            pars,
            horses,
            in_game_horses: Vec::new(),
            current_round_index: 0,
            is_game_started: false,
            is_game_stopped: false,
            is_program_generated: false,
            is_program_finished: false,
            elapsed_seconds: 0.0,
            program_table: Vec::new(),
            lap_tables: Vec::new(),
            timer: None,
            jitter,
            rng,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // COMMANDS ------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// generate_program replaces the roster, draws a lineup for every round and loads the first
    /// one. Ignored while a round is started.
    pub fn generate_program(&mut self) {
        if self.is_game_started {
            debug!("Ignoring program generation, a round is in progress");
            return;
        }

        self.clear_interval();
        self.horses = generate_horses(&self.pars, &mut *self.rng);
        self.lap_tables.clear();
        self.current_round_index = 0;
        self.elapsed_seconds = 0.0;
        self.is_program_finished = false;

        self.program_table = build_program_table(
            &self.horses,
            self.pars.max_rounds,
            self.pars.lineup_size,
            &mut *self.rng,
        );
        self.in_game_horses = self
            .program_table
            .first()
            .map(|lineup| load_in_race_set(lineup))
            .unwrap_or_default();
        self.is_program_generated = true;

        info!(
            "Generated a program of {} rounds with {} horses each",
            self.program_table.len(),
            self.pars.lineup_size
        );
    }

    /// start_game starts the current round from zero race time. Ignored without a program, while
    /// started, and after the last round.
    pub fn start_game(&mut self) {
        if self.is_game_started || !self.is_program_generated {
            debug!(
                "Ignoring start (started: {}, program generated: {})",
                self.is_game_started, self.is_program_generated
            );
            return;
        }
        if self.is_program_finished {
            debug!("Ignoring start, all rounds of the program are finished");
            return;
        }

        self.is_game_started = true;
        self.is_game_stopped = false;
        self.elapsed_seconds = 0.0;

        let snapshot = self.in_game_horses.clone();
        self.store_lap_table(snapshot);

        info!(
            "Starting round {} over {}m",
            self.current_round_index + 1,
            self.get_current_round_length()
        );
        self.setup_interval();
    }

    /// stop_game suspends the tick timer, all race state stays as it is.
    pub fn stop_game(&mut self) {
        self.is_game_stopped = true;
        self.clear_interval();
    }

    /// resume_game re-arms the tick timer of a started round, race time continues where it was.
    /// Without a started round it only clears the stopped flag, `start_game` arms the timer then.
    pub fn resume_game(&mut self) {
        self.is_game_stopped = false;

        if !self.is_game_started {
            debug!("Ignoring resume, no round is started");
            return;
        }
        self.setup_interval();
    }

    /// toggle_game starts, stops or resumes depending on the current phase.
    pub fn toggle_game(&mut self) {
        match self.phase() {
            GamePhase::Ready => self.start_game(),
            GamePhase::Running => self.stop_game(),
            GamePhase::Paused => self.resume_game(),
            GamePhase::Idle | GamePhase::Finished => {
                debug!("Ignoring toggle in phase {:?}", self.phase())
            }
        }
    }

    /// abandon_round ends a started round before every horse has finished. The lap table keeps
    /// the unfinished horses with their last progress and the program moves on as after a regular
    /// finish.
    pub fn abandon_round(&mut self) {
        if !self.is_game_started {
            debug!("Ignoring abandon, no round is started");
            return;
        }

        let no_unfinished = self.in_game_horses.iter().filter(|h| !h.finished).count();
        warn!(
            "Abandoning round {} after {:.2}s with {} unfinished horses",
            self.current_round_index + 1,
            self.elapsed_seconds,
            no_unfinished
        );
        self.finish_round();
    }

    pub fn apply(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::GenerateProgram => self.generate_program(),
            EngineCommand::StartGame => self.start_game(),
            EngineCommand::StopGame => self.stop_game(),
            EngineCommand::ResumeGame => self.resume_game(),
            EngineCommand::ToggleGame => self.toggle_game(),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // TIME ----------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// advance_time lets `dt` pass on the tick timer and processes every tick that falls due. Time
    /// passes without effect while the timer is not armed, and ticking stops as soon as the timer
    /// gets cleared, e.g. by a finished round.
    pub fn advance_time(&mut self, dt: Duration) {
        match self.timer.as_mut() {
            Some(timer) => timer.elapse(dt),
            None => return,
        }

        while self.timer.as_mut().map_or(false, |timer| timer.take_due()) {
            self.simulate_timestep();
        }
    }

    /// tick processes a single tick right away if the timer is armed and reports whether it did.
    pub fn tick(&mut self) -> bool {
        if self.timer.is_none() {
            return false;
        }
        self.simulate_timestep();
        true
    }

    /// Real-time period of the tick timer.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(self.pars.tick_delta)
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method simulates one time step of the current round.
    fn simulate_timestep(&mut self) {
        let timestep_size = self.pars.tick_delta;
        self.elapsed_seconds += timestep_size;

        let cur_racetime = self.elapsed_seconds;
        let round_length = self.get_current_round_length() as f64;

        for horse in self.in_game_horses.iter_mut() {
            horse.drive_timestep(
                cur_racetime,
                timestep_size,
                round_length,
                self.pars.fatigue_rate,
                &self.jitter,
                &mut *self.rng,
            );
        }

        let snapshot = self.in_game_horses.clone();
        self.store_lap_table(snapshot);

        if self.in_game_horses.iter().all(|horse| horse.finished) {
            self.finish_round();
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn finish_round(&mut self) {
        self.clear_interval();
        self.is_game_started = false;

        let round_idx = self.current_round_index;
        if let Some(lineup) = self.program_table.get_mut(round_idx) {
            sync_lineup(lineup, &self.in_game_horses);
        }

        info!(
            "Round {} finished after {:.2}s",
            round_idx + 1,
            self.elapsed_seconds
        );

        if round_idx + 1 >= self.pars.max_rounds {
            self.is_program_finished = true;
            info!("All {} rounds of the program are finished", self.pars.max_rounds);
            return;
        }

        self.current_round_index += 1;
        self.in_game_horses = self
            .program_table
            .get(self.current_round_index)
            .map(|lineup| load_in_race_set(lineup))
            .unwrap_or_default();
    }

    fn store_lap_table(&mut self, snapshot: Vec<Horse>) {
        let round_idx = self.current_round_index;

        if round_idx < self.lap_tables.len() {
            self.lap_tables[round_idx] = snapshot;
        } else {
            self.lap_tables.resize(round_idx, Vec::new());
            self.lap_tables.push(snapshot);
        }
    }

    fn setup_interval(&mut self) {
        if self.timer.is_some() {
            return;
        }
        self.timer = Some(IntervalTimer::new(self.tick_period()));
    }

    fn clear_interval(&mut self) {
        self.timer = None;
    }

    // ---------------------------------------------------------------------------------------------
    // QUERIES -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Distance the horses of the current round have to cover.
    pub fn get_current_round_length(&self) -> u32 {
        self.pars.round_length(self.current_round_index)
    }

    pub fn phase(&self) -> GamePhase {
        if !self.is_program_generated {
            GamePhase::Idle
        } else if self.is_game_started {
            if self.timer.is_some() {
                GamePhase::Running
            } else {
                GamePhase::Paused
            }
        } else if self.is_program_finished {
            GamePhase::Finished
        } else {
            GamePhase::Ready
        }
    }

    pub fn pars(&self) -> &EnginePars {
        &self.pars
    }

    pub fn horses(&self) -> &[Horse] {
        &self.horses
    }

    pub fn in_game_horses(&self) -> &[Horse] {
        &self.in_game_horses
    }

    pub fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    pub fn is_game_started(&self) -> bool {
        self.is_game_started
    }

    pub fn is_game_stopped(&self) -> bool {
        self.is_game_stopped
    }

    pub fn is_program_generated(&self) -> bool {
        self.is_program_generated
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn program_table(&self) -> &[RoundLineup] {
        &self.program_table
    }

    pub fn lap_tables(&self) -> &[Vec<Horse>] {
        &self.lap_tables
    }
}
