//! CLI command implementations

pub mod analysis;
pub mod process;
pub mod remote;
pub mod table;

use anyhow::Result;
use recondash_client::ApiError;

use crate::output;

/// Passes `result` through unless it is a network failure and demo mode is
/// on, in which case `demo` supplies the value. The flag reports whether demo
/// data was used.
pub(crate) fn with_demo_fallback<T>(
    result: Result<T, ApiError>,
    demo_mode: bool,
    what: &str,
    demo: impl FnOnce() -> T,
) -> Result<(T, bool)> {
    match result {
        Ok(value) => Ok((value, false)),
        Err(e) if demo_mode && e.is_network() => {
            tracing::warn!(error = %e, "{what} unavailable, using demo data");
            output::warning(&format!("Backend unreachable ({e}); showing demo {what} data"));
            Ok((demo(), true))
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("{what} failed"))),
    }
}
