//! Gantry - Pick-and-Place Firmware
//!
//! Main firmware binary for RP2040-based X/Y gantries with a rack and
//! screw-gripper end effector. All machine parameters come from
//! machine.toml, validated and embedded at build time.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use gantry_core::config::MachineConfig;
use gantry_core::effector::EndEffectorController;
use gantry_core::motion::{AxisId, PositionTracker};
use gantry_core::sequence::SequenceRunner;
use gantry_drivers::servo::HobbyServo;

use crate::board::OutputPool;
use crate::diagnostics::DefmtSink;
use crate::time::EmbassyClock;

mod board;
mod config;
mod diagnostics;
mod tasks;
mod time;

// Configuration must live forever: the runner borrows the waypoint table
static MACHINE_CONFIG: StaticCell<MachineConfig> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Gantry firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static MachineConfig = MACHINE_CONFIG.init(config::load());
    info!(
        "Configuration loaded: {} waypoint pairs",
        config.sequence.waypoints.len()
    );

    // Step/dir outputs start low so no driver sees a spurious edge
    let mut pool = OutputPool::new([
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_4, Level::Low),
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
        Output::new(p.PIN_14, Level::Low),
        Output::new(p.PIN_15, Level::Low),
    ]);

    let (x, y) = match (
        board::build_axis(&mut pool, config, AxisId::X),
        board::build_axis(&mut pool, config, AxisId::Y),
    ) {
        (Ok(x), Ok(y)) => (x, y),
        (Err(e), _) | (_, Err(e)) => {
            error!("Axis setup failed: {:?}", e);
            return;
        }
    };

    let tracker_config = match config.tracker_config() {
        Ok(tracker_config) => tracker_config,
        Err(e) => {
            error!("Invalid gantry configuration: {:?}", e);
            return;
        }
    };
    let tracker = PositionTracker::new(x, y, EmbassyClock, tracker_config);
    info!("Gantry initialized at {}", Display2Format(&tracker.position()));

    // Servo PWM: slice 1 at 50 Hz
    board::check_servo_pins(&config.servos);
    let mut pwm_config = PwmConfig::default();
    pwm_config.divider = board::SERVO_PWM_DIVIDER.into();
    pwm_config.top = board::servo_pwm_top(clk_sys_freq());
    let pwm = Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_18, p.PIN_19, pwm_config);
    let (Some(rack_pwm), Some(screw_pwm)) = pwm.split() else {
        error!("Servo PWM channels unavailable");
        return;
    };

    let rack = HobbyServo::from_config(rack_pwm, &config.servos.rack);
    let screw = HobbyServo::from_config(screw_pwm, &config.servos.screw);
    let effector = match EndEffectorController::new(rack, screw, Delay, config.effector) {
        Ok(effector) => effector,
        Err(e) => {
            error!("Effector setup failed: {:?}", e);
            return;
        }
    };
    info!("Effector initialized in rest pose");

    let runner = SequenceRunner::new(
        tracker,
        effector,
        Delay,
        DefmtSink,
        &config.sequence.waypoints,
        config.sequence.timing(),
    );

    spawner.spawn(unwrap!(tasks::sequence_task(runner)));
    info!("All tasks spawned, firmware running");
}
