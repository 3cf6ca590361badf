//! Board pin map
//!
//! Step and direction lines are taken from a pool of free GPIOs, so
//! machine.toml decides which motor sits on which pin. The two effector
//! servos share PWM slice 1 and are fixed to GPIO18/GPIO19.

use defmt::*;
use embassy_rp::gpio::Output;

use gantry_core::config::{AxisHwConfig, MachineConfig, ServosConfig};
use gantry_core::motion::AxisId;
use gantry_drivers::stepper::{AxisController, MotorBinding, StepPulseGenerator};

/// Lowest GPIO in the motor pool
pub const FIRST_MOTOR_GPIO: u8 = 2;

/// GPIO2..=GPIO15
pub const MOTOR_GPIO_COUNT: usize = 14;

/// Rack servo output (PWM slice 1, channel A)
pub const RACK_SERVO_GPIO: u8 = 18;

/// Screw servo output (PWM slice 1, channel B)
pub const SCREW_SERVO_GPIO: u8 = 19;

/// PWM clock divider for the servo slice
pub const SERVO_PWM_DIVIDER: u8 = 64;

/// Servo frame rate
const SERVO_FRAME_HZ: u32 = 50;

/// Axis built from board outputs
pub type Axis = AxisController<Output<'static>, Output<'static>>;

/// Board setup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum BoardError {
    /// Axis missing from the configuration
    MissingAxis(AxisId),
    /// Pin outside the pool or already taken
    PinUnavailable(u8),
    /// More motors than an axis can gang
    TooManyMotors(AxisId),
}

/// Outputs available for step/dir lines, indexed by GPIO number
pub struct OutputPool {
    outputs: [Option<Output<'static>>; MOTOR_GPIO_COUNT],
}

impl OutputPool {
    /// Create a pool from GPIO2..=GPIO15, in order
    pub fn new(outputs: [Output<'static>; MOTOR_GPIO_COUNT]) -> Self {
        Self {
            outputs: outputs.map(Some),
        }
    }

    /// Take the output for a GPIO number
    pub fn take(&mut self, pin: u8) -> Result<Output<'static>, BoardError> {
        pin.checked_sub(FIRST_MOTOR_GPIO)
            .and_then(|idx| self.outputs.get_mut(idx as usize))
            .and_then(Option::take)
            .ok_or(BoardError::PinUnavailable(pin))
    }
}

/// Bind the configured motors of one axis
pub fn build_axis(
    pool: &mut OutputPool,
    config: &MachineConfig,
    axis: AxisId,
) -> Result<Axis, BoardError> {
    let hw: &AxisHwConfig = config.find_axis(axis).ok_or(BoardError::MissingAxis(axis))?;

    let mut pulses = StepPulseGenerator::new();
    for motor in hw.motors.iter() {
        let step = pool.take(motor.step_pin)?;
        let dir = pool.take(motor.dir_pin.pin)?;
        pulses
            .bind(MotorBinding::new(step, dir, motor.dir_pin.inverted))
            .map_err(|_| BoardError::TooManyMotors(axis))?;
    }

    info!(
        "{} axis: {} motor(s), {} steps/mm, {}..{} mm",
        axis,
        pulses.motor_count(),
        hw.steps_per_mm,
        hw.min_mm,
        hw.max_mm
    );
    Ok(AxisController::new(pulses, hw.calibration()))
}

/// Warn when the configured servo pins differ from the board wiring
pub fn check_servo_pins(servos: &ServosConfig) {
    if servos.rack.pin != RACK_SERVO_GPIO {
        warn!(
            "Rack servo configured on GPIO{}, board drives GPIO{}",
            servos.rack.pin, RACK_SERVO_GPIO
        );
    }
    if servos.screw.pin != SCREW_SERVO_GPIO {
        warn!(
            "Screw servo configured on GPIO{}, board drives GPIO{}",
            servos.screw.pin, SCREW_SERVO_GPIO
        );
    }
}

/// PWM wrap value for a 50 Hz frame at the given system clock
pub fn servo_pwm_top(clk_sys_hz: u32) -> u16 {
    let counts = clk_sys_hz / (SERVO_FRAME_HZ * SERVO_PWM_DIVIDER as u32);
    counts.saturating_sub(1).min(u16::MAX as u32) as u16
}
