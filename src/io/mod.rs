//! External robot interfaces: motion actuator and beacon ranging.

pub mod actuator;
pub mod ranging;

pub use actuator::{ActuatorCall, MockActuator, MotionActuator, SharedActuator, create_shared_actuator};
pub use ranging::{BUTTON_X_MASK, RangingMonitor, UwbReading};
