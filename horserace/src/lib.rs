pub mod core {
    pub mod handle_race;
    pub mod horse;
    pub mod program;
    pub mod race;
    pub mod timer;
}
pub mod interfaces {
    pub mod race_interface;
}
pub mod post {
    pub mod race_result;
}
pub mod pre {
    pub mod read_sim_pars;
    pub mod sim_opts;
}
