//! Waypoint table

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::runner::RunnerTiming;
use crate::motion::Point;

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Display label of a waypoint pair
pub type Label = String<MAX_LABEL_LEN>;

/// Maximum waypoint pairs per table
pub const MAX_WAYPOINTS: usize = 32;

/// One pick-and-place job: where to pick, where to place
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaypointPair {
    /// Part pickup position
    pub load: Point,
    /// Part placement position
    pub hole: Point,
    /// Optional display label
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Label,
}

impl WaypointPair {
    /// Create an unlabelled pair
    pub fn new(load: Point, hole: Point) -> Self {
        Self {
            load,
            hole,
            label: Label::new(),
        }
    }

    /// Attach a display label, cut to [`MAX_LABEL_LEN`] bytes
    pub fn with_label(mut self, label: &str) -> Self {
        self.label.clear();
        for c in label.chars() {
            if self.label.push(c).is_err() {
                break;
            }
        }
        self
    }
}

/// Sequence configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceConfig {
    /// Position assumed at power-on
    pub home: Point,
    /// Pause after every move and effector operation (ms)
    pub settle_ms: u32,
    /// Pause after a full pass over the table (ms)
    pub cycle_pause_ms: u32,
    /// Ordered waypoint pairs
    pub waypoints: Vec<WaypointPair, MAX_WAYPOINTS>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            home: Point::new(0.0, 0.0),
            settle_ms: 250,
            cycle_pause_ms: 5000,
            waypoints: Vec::new(),
        }
    }
}

impl SequenceConfig {
    /// Runner timings
    pub fn timing(&self) -> RunnerTiming {
        RunnerTiming {
            settle_ms: self.settle_ms,
            cycle_pause_ms: self.cycle_pause_ms,
        }
    }
}
