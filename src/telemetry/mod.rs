//! # Telemetry Module
//!
//! Moves decoded telemetry from a byte source to its consumers.
//!
//! This module handles:
//! - Reading raw bytes from any async source and decoding frames in order
//! - Delivering events and diagnostics to a [`TelemetrySink`]
//! - Console output through `tracing`
//! - Writing JSONL (JSON Lines) logs with file rotation

pub mod console;
pub mod logger;
pub mod reader;

pub use console::ConsoleSink;
pub use logger::JsonlLogger;
pub use reader::{pump, PumpSummary, TelemetryReader};

use crate::crsf::decoder::Diagnostic;
use crate::crsf::protocol::TelemetryEvent;
use crate::error::Result;

/// Consumer of decoded telemetry
///
/// What a sink does with events (print, store, forward) is its own concern.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink {
    /// Called once per successfully decoded frame
    fn on_event(&mut self, event: &TelemetryEvent) -> Result<()>;

    /// Called once per frame that failed validation or decoding
    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()>;
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    fn on_event(&mut self, event: &TelemetryEvent) -> Result<()> {
        (**self).on_event(event)
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        (**self).on_diagnostic(diagnostic)
    }
}

/// Every sink sees every item; the first failure is reported after all ran
impl<S: TelemetrySink> TelemetrySink for Vec<S> {
    fn on_event(&mut self, event: &TelemetryEvent) -> Result<()> {
        let mut result = Ok(());
        for sink in self.iter_mut() {
            let outcome = sink.on_event(event);
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        let mut result = Ok(());
        for sink in self.iter_mut() {
            let outcome = sink.on_diagnostic(diagnostic);
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }
}
