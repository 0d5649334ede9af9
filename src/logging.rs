use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger from `RUST_LOG`.
///
/// Without `RUST_LOG`, `verbose` selects debug output, otherwise info and above.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    // Fails only when a logger is already installed.
    let _ = Builder::from_env(env).try_init();
}
