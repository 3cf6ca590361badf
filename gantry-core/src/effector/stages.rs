//! Pick and place choreographies
//!
//! Each operation is a fixed list of stages executed in order.

/// Named rack positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RackTarget {
    /// Fully retracted
    Top,
    /// Partly lowered
    Middle,
    /// Fully extended, gripper at the part
    Bottom,
}

/// Screw gripper modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrewMode {
    /// Stopped
    Off,
    /// Driving the part in (placing)
    In,
    /// Driving out to engage the part (picking)
    Out,
}

/// Which configured speed a rack ramp uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampSpeed {
    Pickup,
    Place,
}

/// One step of an effector operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Set the rack target directly
    RackTo(RackTarget),
    /// Sweep the rack one unit at a time
    RackRamp(RackTarget, RampSpeed),
    /// Set the screw mode
    Screw(ScrewMode),
    /// Wait for the mechanism to settle
    Hold,
}

/// Effector operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    PickUp,
    PutDown,
}

impl Operation {
    /// Stage list of this operation
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Operation::PickUp => PICK_UP_STAGES,
            Operation::PutDown => PUT_DOWN_STAGES,
        }
    }
}

/// Pick: drop onto the part, engage it, lift it clear
pub const PICK_UP_STAGES: &[Stage] = &[
    Stage::RackTo(RackTarget::Bottom),
    Stage::Hold,
    Stage::Screw(ScrewMode::Out),
    Stage::Hold,
    Stage::RackRamp(RackTarget::Middle, RampSpeed::Pickup),
    Stage::Screw(ScrewMode::Off),
    Stage::RackTo(RackTarget::Top),
];

/// Place: drive the part in while lowering, then retract
///
/// The release and retract are issued twice. The gripper can stay caught
/// on the part after the first retract, and nothing senses that. The hold
/// between the two retracts is added on top of the plain release sequence
/// so the repeat is not issued back to back.
pub const PUT_DOWN_STAGES: &[Stage] = &[
    Stage::Screw(ScrewMode::In),
    Stage::RackTo(RackTarget::Middle),
    Stage::RackRamp(RackTarget::Bottom, RampSpeed::Place),
    Stage::Screw(ScrewMode::Off),
    Stage::RackTo(RackTarget::Top),
    Stage::Hold,
    // Workaround: second retract
    Stage::Screw(ScrewMode::Off),
    Stage::RackTo(RackTarget::Top),
];
