//! Structured logging for the protocol pipeline.
//!
//! A thin wrapper over `tracing`: one-time console subscriber initialization plus a
//! [`LogCategory`] tag used when a call site wants to make its pipeline stage explicit
//! in the emitted event.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Ensure a console `tracing` subscriber is installed. Safe to call repeatedly and
/// from multiple threads; only the first call has any effect. Called at the top of
/// [`crate::protocol::run_protocol_with_rng`] so every pipeline stage's `info!` events
/// actually reach a subscriber in real library use, not just under a test harness.
pub fn init_tracing() {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).try_init().ok();
    }
}

/// Which pipeline stage a log event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    Protocol,
    Channel,
    Eve,
    Qber,
    Crypto,
    System,
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogCategory::Protocol => "protocol",
            LogCategory::Channel => "channel",
            LogCategory::Eve => "eve",
            LogCategory::Qber => "qber",
            LogCategory::Crypto => "crypto",
            LogCategory::System => "system",
        };
        write!(f, "{s}")
    }
}
