//! Logging setup for the binary. Core crates only ever call through the
//! `log` facade; this is the one place a concrete subscriber gets wired
//! up, the way a standalone server binary in this ecosystem does it.

pub fn init(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).format_timestamp_millis().init();
}
