use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter, e.g. `envcascade=debug`.
pub const LOG_ENV_VAR: &str = "ENVCASCADE_LOG";

/// Initialize a tracing subscriber writing compact logs to stderr.
///
/// The filter comes from `ENVCASCADE_LOG`, defaulting to `default_level`.
/// Stdout is left alone so resolved output can be piped.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let fmt_layer = fmt::layer()
		.with_writer(std::io::stderr)
		.with_target(true)
		.with_level(true)
		.compact();

	let filter_layer =
		EnvFilter::try_from_env(LOG_ENV_VAR).or_else(|_| EnvFilter::try_new(default_level))?;

	tracing_subscriber::registry()
		.with(filter_layer)
		.with(fmt_layer)
		.try_init()?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracing::{debug, warn};

	#[test]
	fn test_logging_init() {
		// We can only init once per process, so ignore the second result
		let _ = init("warn");
		assert!(init("warn").is_err());

		debug!("This is a debug message");
		warn!("This is a warning message");
	}
}
