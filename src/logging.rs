//! Logging bootstrap.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to binaries and tests. [`init`] wires up a `fmt` subscriber filtered by
//! `YOMU_LOG` (or `RUST_LOG`) and may be called more than once: the first call
//! wins.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

const ENV_FILTER_VARS: [&str; 2] = ["YOMU_LOG", "RUST_LOG"];

static INIT: OnceLock<()> = OnceLock::new();

/// Builds the filter used by [`init`].
///
/// An explicit directive from the environment takes precedence. Otherwise the
/// crate logs at `debug` when `verbose` is set and at `warn` when it is not.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let directive = first_directive(ENV_FILTER_VARS.iter().map(|var| std::env::var(var).ok()));

    match directive {
        Some(directive) => EnvFilter::new(directive),
        None if verbose => EnvFilter::new("yomu=debug,info"),
        None => EnvFilter::new("warn"),
    }
}

/// First set, non-blank directive. A blank variable does not shadow later ones.
fn first_directive<I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    values
        .into_iter()
        .flatten()
        .find(|directive| !directive.trim().is_empty())
}

/// Installs the global subscriber.
///
/// Returns `true` only for the call that actually installed it. Later calls,
/// or a subscriber installed by someone else, yield `false`.
pub fn init(verbose: bool) -> bool {
    let mut installed = false;
    INIT.get_or_init(|| {
        installed = tracing_subscriber::fmt()
            .with_env_filter(env_filter(verbose))
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok();
    });
    installed
}
