use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The default level can be overridden through the given environment
/// variable (e.g. `AUGUR_LOG=debug`). Log output goes to stderr so issue
/// streams on stdout stay machine-readable.
pub fn initialize_logger(default_level: LevelFilter, env_var: &str) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(env_var)
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}
