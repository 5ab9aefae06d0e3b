//! Beacon (UWB tag) message handling.
//!
//! The beacon subscription delivers readings on its own thread. Each reading
//! is reduced to a `RangingEstimate` and stored in the shared slot; the
//! tag's X button doubles as a remote shutdown switch.

use std::sync::Arc;

use crate::core::RangingEstimate;
use crate::shared::{CancelToken, RangingSlot};

/// Button bit for the tag's X button.
pub const BUTTON_X_MASK: u32 = 1 << 2;

/// One beacon report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UwbReading {
    /// Signed distance error (m), positive = too far
    pub distance_est: f32,
    /// Relative bearing of the tag (rad)
    pub orientation_est: f32,
    /// Button bitfield
    pub buttons: u32,
}

/// Stores beacon estimates and watches for the shutdown button.
pub struct RangingMonitor {
    slot: Arc<RangingSlot>,
    cancel: CancelToken,
    last_buttons: u32,
}

impl RangingMonitor {
    pub fn new(slot: Arc<RangingSlot>, cancel: CancelToken) -> Self {
        Self {
            slot,
            cancel,
            last_buttons: 0,
        }
    }

    /// Handle one reading from the subscription.
    pub fn on_reading(&mut self, reading: &UwbReading) {
        self.slot.store(RangingEstimate {
            distance_est: reading.distance_est,
            orientation_est: reading.orientation_est,
        });

        let changed = reading.buttons ^ self.last_buttons;
        if changed & BUTTON_X_MASK != 0 && reading.buttons & BUTTON_X_MASK != 0 {
            tracing::warn!("Beacon X button pressed, requesting shutdown");
            self.cancel.cancel();
        }
        self.last_buttons = reading.buttons;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(buttons: u32) -> UwbReading {
        UwbReading {
            distance_est: 1.5,
            orientation_est: -0.3,
            buttons,
        }
    }

    #[test]
    fn test_reading_updates_slot() {
        let slot = Arc::new(RangingSlot::new());
        let mut monitor = RangingMonitor::new(Arc::clone(&slot), CancelToken::new());

        monitor.on_reading(&reading(0));
        assert_eq!(
            slot.latest(),
            Some(RangingEstimate {
                distance_est: 1.5,
                orientation_est: -0.3,
            })
        );
    }

    #[test]
    fn test_x_press_cancels() {
        let cancel = CancelToken::new();
        let mut monitor = RangingMonitor::new(Arc::new(RangingSlot::new()), cancel.clone());

        monitor.on_reading(&reading(0b0001));
        assert!(!cancel.is_cancelled());

        monitor.on_reading(&reading(0b0101));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_x_held_from_start_counts_as_press() {
        let cancel = CancelToken::new();
        let mut monitor = RangingMonitor::new(Arc::new(RangingSlot::new()), cancel.clone());
        monitor.on_reading(&reading(BUTTON_X_MASK));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_x_release_does_not_cancel() {
        let cancel = CancelToken::new();
        let mut monitor = RangingMonitor::new(Arc::new(RangingSlot::new()), cancel.clone());
        monitor.last_buttons = BUTTON_X_MASK;
        monitor.on_reading(&reading(0));
        assert!(!cancel.is_cancelled());
    }
}
