//! Tracing setup. Logs go to stderr so stdout stays `eval`-safe.

use crate::config::keys;
use crate::env::Environment;
use tracing_subscriber::{EnvFilter, prelude::*};

const DEFAULT_FILTER: &str = "pyswitch=info";
const QUIET_FILTER: &str = "pyswitch=warn";

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// Filter directive chosen from `--quiet`, `PYSWITCH_QUIET` and `PYSWITCH_LOG_LEVEL`.
/// `RUST_LOG` still wins when set.
pub fn filter_directive(quiet: bool, env: &Environment) -> String {
    let quiet = quiet || env.get_var(keys::QUIET).is_some_and(is_truthy);
    if quiet {
        return QUIET_FILTER.to_string();
    }
    env.get_var(keys::LOG_LEVEL)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            if l.contains('=') {
                l.to_string()
            } else {
                format!("pyswitch={}", l)
            }
        })
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initialize tracing. Call once at process startup.
pub fn init_tracing(quiet: bool, env: &Environment) {
    let directive = filter_directive(quiet, env);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_overrides() {
        let mut env = Environment::with_path("");
        assert_eq!(filter_directive(false, &env), "pyswitch=info");
        assert_eq!(filter_directive(true, &env), "pyswitch=warn");

        env.set_var(keys::LOG_LEVEL, "debug");
        assert_eq!(filter_directive(false, &env), "pyswitch=debug");

        env.set_var(keys::LOG_LEVEL, "pyswitch=trace,warn");
        assert_eq!(filter_directive(false, &env), "pyswitch=trace,warn");

        env.set_var(keys::QUIET, "1");
        assert_eq!(filter_directive(false, &env), "pyswitch=warn");

        env.set_var(keys::QUIET, "off");
        assert_eq!(filter_directive(false, &env), "pyswitch=trace,warn");
    }
}
