use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use ctxlog_config::ContextConfig;
use ctxlog_core::{ContextEngine, ContextOperations, ManualClock};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Start instant used by every fixture clock.
pub fn fixed_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0)
        .single()
        .expect("valid start instant")
}

/// Engine over a temporary storage root, driven by a manual clock.
pub struct TestEngine {
    root: TempDir,
    clock: ManualClock,
    config: ContextConfig,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        let root = tempfile::tempdir().expect("create storage root");
        Self {
            root,
            clock: ManualClock::new(fixed_start()),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.clock.advance(delta);
    }

    /// Open an engine over the fixture root. Each call loads from disk.
    pub fn open(&self) -> ContextEngine {
        ContextEngine::with_clock(
            self.root.path(),
            self.config.clone(),
            Arc::new(self.clock.clone()),
        )
        .expect("open engine")
    }

    pub fn operations(&self) -> ContextOperations {
        ContextOperations::new(self.open())
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}
