//! Console output for decoded telemetry

use tracing::{info, warn};

use super::TelemetrySink;
use crate::crsf::decoder::Diagnostic;
use crate::crsf::protocol::TelemetryEvent;
use crate::error::Result;

/// Logs events at `info` and diagnostics at `warn`
#[derive(Debug, Default)]
pub struct ConsoleSink {
    events: u64,
    diagnostics: u64,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn diagnostics(&self) -> u64 {
        self.diagnostics
    }
}

impl TelemetrySink for ConsoleSink {
    fn on_event(&mut self, event: &TelemetryEvent) -> Result<()> {
        self.events += 1;
        info!("{}", event);
        Ok(())
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        self.diagnostics += 1;
        warn!("{}", diagnostic);
        Ok(())
    }
}
