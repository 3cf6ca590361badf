//! Progress logging over defmt

use defmt::*;

use gantry_core::traits::{DiagnosticsSink, Progress};

/// Sink that logs every event; faults at warn level
pub struct DefmtSink;

impl DiagnosticsSink for DefmtSink {
    fn record(&mut self, event: &Progress) {
        if event.is_fault() {
            warn!("{}", Display2Format(event));
        } else {
            info!("{}", Display2Format(event));
        }
    }
}
