//! Diagnostics sink
//!
//! The core reports progress at state-transition points. Where the text
//! ends up (RTT, UART, nowhere) is up to the sink implementation.

use core::fmt;

use crate::effector::EffectorError;
use crate::motion::{AxisId, MotionError, Point};
use crate::sequence::Label;

/// Which half of a waypoint pair a stop belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopKind {
    /// Part pickup position
    Load,
    /// Part placement position
    Hole,
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopKind::Load => f.write_str("load"),
            StopKind::Hole => f.write_str("hole"),
        }
    }
}

/// Progress events emitted by the sequence runner
///
/// `index` is the zero-based position in the waypoint table; the
/// human-readable rendering is one-based ("load 1", "hole 1") and carries
/// the pair's label when it has one ("load 1 [left rail]").
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// A pass over the waypoint table is starting
    CycleStarted { cycle: u32 },
    /// Moving towards a stop
    Heading {
        kind: StopKind,
        index: u16,
        label: Label,
        from: Point,
        to: Point,
    },
    /// Arrived at a stop (position as tracked after the move)
    Arrived {
        kind: StopKind,
        index: u16,
        label: Label,
        position: Point,
    },
    /// An axis target was outside its travel bounds and was skipped
    AxisSkipped { axis: AxisId, target_mm: f32 },
    /// Pick choreography finished
    Picked { index: u16 },
    /// Place choreography finished
    Placed { index: u16 },
    /// A move could not be started
    MoveFailed {
        kind: StopKind,
        index: u16,
        error: MotionError,
    },
    /// The effector rejected an operation
    EffectorFailed {
        kind: StopKind,
        index: u16,
        error: EffectorError,
    },
    /// A pass over the waypoint table finished
    CycleComplete { cycle: u32, pairs: u16 },
}

impl Progress {
    /// Check if this event reports a failure
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Progress::MoveFailed { .. } | Progress::EffectorFailed { .. }
        )
    }
}

fn write_stop(f: &mut fmt::Formatter<'_>, kind: StopKind, index: u16, label: &str) -> fmt::Result {
    write!(f, "{} {}", kind, index + 1)?;
    if !label.is_empty() {
        write!(f, " [{}]", label)?;
    }
    Ok(())
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::CycleStarted { cycle } => write!(f, "cycle {} start", cycle),
            Progress::Heading {
                kind,
                index,
                label,
                from,
                to,
            } => {
                write_stop(f, *kind, *index, label)?;
                write!(f, ": current {} target {}", from, to)
            }
            Progress::Arrived {
                kind,
                index,
                label,
                position,
            } => {
                write_stop(f, *kind, *index, label)?;
                write!(f, ": at {}", position)
            }
            Progress::AxisSkipped { axis, target_mm } => {
                write!(f, "{:?} target {} mm out of range, skipped", axis, target_mm)
            }
            Progress::Picked { index } => write!(f, "load {}: picked", index + 1),
            Progress::Placed { index } => write!(f, "hole {}: placed", index + 1),
            Progress::MoveFailed { kind, index, error } => {
                write!(f, "{} {}: move failed: {:?}", kind, index + 1, error)
            }
            Progress::EffectorFailed { kind, index, error } => {
                write!(f, "{} {}: effector failed: {:?}", kind, index + 1, error)
            }
            Progress::CycleComplete { cycle, pairs } => {
                write!(f, "cycle {} complete, {} pairs", cycle, pairs)
            }
        }
    }
}

/// Receiver for progress events
pub trait DiagnosticsSink {
    /// Record one event
    fn record(&mut self, event: &Progress);
}

/// No sink attached
impl DiagnosticsSink for () {
    fn record(&mut self, _event: &Progress) {}
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for &mut T {
    fn record(&mut self, event: &Progress) {
        (**self).record(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String;

    fn render(event: &Progress) -> String<96> {
        let mut s = String::new();
        write!(s, "{}", event).unwrap();
        s
    }

    #[test]
    fn test_stage_labels_are_one_based() {
        let event = Progress::Arrived {
            kind: StopKind::Load,
            index: 0,
            label: Label::new(),
            position: Point::new(90.0, 10.0),
        };
        assert!(render(&event).starts_with("load 1"));

        let event = Progress::Placed { index: 2 };
        assert_eq!(render(&event).as_str(), "hole 3: placed");
    }

    #[test]
    fn test_heading_shows_current_and_target() {
        let event = Progress::Heading {
            kind: StopKind::Hole,
            index: 0,
            label: Label::new(),
            from: Point::new(90.0, 10.0),
            to: Point::new(182.0, 40.5),
        };
        assert_eq!(
            render(&event).as_str(),
            "hole 1: current (90.0, 10.0) target (182.0, 40.5)"
        );
    }

    #[test]
    fn test_labelled_stops_name_the_pair() {
        let label = Label::try_from("pair 2").unwrap();
        let event = Progress::Heading {
            kind: StopKind::Load,
            index: 1,
            label: label.clone(),
            from: Point::new(0.0, 0.0),
            to: Point::new(90.0, 10.0),
        };
        assert_eq!(
            render(&event).as_str(),
            "load 2 [pair 2]: current (0.0, 0.0) target (90.0, 10.0)"
        );

        let event = Progress::Arrived {
            kind: StopKind::Hole,
            index: 1,
            label,
            position: Point::new(182.0, 40.5),
        };
        assert_eq!(render(&event).as_str(), "hole 2 [pair 2]: at (182.0, 40.5)");
    }

    #[test]
    fn test_fault_classification() {
        assert!(Progress::EffectorFailed {
            kind: StopKind::Load,
            index: 0,
            error: EffectorError::InvalidTransition,
        }
        .is_fault());
        assert!(!Progress::CycleStarted { cycle: 1 }.is_fault());
    }

    #[test]
    fn test_unit_sink_accepts_events() {
        let mut sink = ();
        sink.record(&Progress::CycleStarted { cycle: 0 });
    }
}
