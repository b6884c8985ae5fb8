use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "HORSERACE",
    about = "A tick-driven multi-round horse race simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Simulate the program in real-time and print live race updates
    #[clap(long)]
    pub realtime: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of programs to simulate (only for non-realtime mode, ignored in realtime mode)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file (OPTIONAL: if not set, default parameters are used)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set real-time factor (only relevant in realtime mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Seed the random number generator, overrides the seed from the parameter file
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Write the round results of the (first) program to this CSV file
    #[clap(short, long)]
    pub csv_path: Option<PathBuf>,
}
