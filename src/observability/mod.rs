//! Observability and logging.
//!
//! The engine emits structured `tracing` events (repost detections, admin
//! operations, store anomalies) and `metrics` facade counters. This module
//! wires a subscriber for the CLI binary; embedding applications install
//! their own.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the tracing subscriber for the binary.
///
/// Respects `RUST_LOG`; `verbose` lowers the default level to `debug`.
/// Logs go to stderr so command output stays clean. Idempotent: repeated
/// calls are no-ops.
pub fn init(verbose: bool) {
    INIT.get_or_init(|| {
        let default_directive = if verbose { "dejavu=debug" } else { "dejavu=info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
