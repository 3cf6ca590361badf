//! Effector state machine
//!
//! Every servo command of a pick or place passes through a guarded
//! transition. The machine only returns to `Idle` after a rack move, so an
//! operation always ends retracted.

/// Effector states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectorState {
    /// No operation in progress
    #[default]
    Idle,
    /// Rack servo is travelling
    RackMoving,
    /// Screw gripper is being driven
    ScrewActuating,
}

/// Events that drive the effector state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectorEvent {
    /// A rack stage is starting
    StartRack,
    /// A screw stage is starting
    StartScrew,
    /// The last stage of an operation finished
    Finish,
    /// An operation failed part way; outputs are left where they are
    Abort,
}

impl EffectorState {
    /// Check if an operation is in progress
    pub fn is_busy(&self) -> bool {
        !matches!(self, EffectorState::Idle)
    }

    /// Process an event and return the next state
    ///
    /// Returns `None` if the event is not allowed in this state.
    pub fn transition(self, event: EffectorEvent) -> Option<Self> {
        use EffectorEvent::*;
        use EffectorState::*;

        match (self, event) {
            (_, StartRack) => Some(RackMoving),
            (_, StartScrew) => Some(ScrewActuating),
            (RackMoving, Finish) => Some(Idle),
            (_, Abort) => Some(Idle),
            (Idle | ScrewActuating, Finish) => None,
        }
    }
}
