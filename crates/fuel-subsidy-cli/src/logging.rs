use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Send engine events to stderr so stdout stays machine-readable.
///
/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "fuel_subsidy_core=info,fsub=info",
        _ => "fuel_subsidy_core=debug,fsub=debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
