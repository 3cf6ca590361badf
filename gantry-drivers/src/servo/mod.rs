//! Servo drivers

pub mod hobby;

pub use hobby::HobbyServo;
