//! Simulated UWB tag feed.

use std::time::{Duration, Instant};

use crate::io::{BUTTON_X_MASK, RangingMonitor, UwbReading};
use crate::shared::CancelToken;

use super::SharedWorld;

/// Bearing noise (rad).
const BEARING_NOISE: f32 = 0.02;

/// Publishes tag readings at a fixed rate.
pub struct SimBeacon {
    world: SharedWorld,
}

impl SimBeacon {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }

    /// Reading as seen from the robot at `now`.
    pub fn read(&self, now: Instant) -> UwbReading {
        let mut world = self.world.lock();
        world.advance(now);

        let (bx, by) = world.beacon_position(now);
        let (range, bearing) = world.pose().range_bearing(bx, by);
        let config = world.config();
        let standoff = config.beacon_standoff;
        let range_noise = config.range_noise_stddev;
        let press_after = config.button_press_after_secs;

        let buttons = if press_after > 0.0 && world.elapsed(now).as_secs_f32() >= press_after {
            BUTTON_X_MASK
        } else {
            0
        };

        let noise = world.noise();
        UwbReading {
            distance_est: range - standoff + noise.gaussian(range_noise),
            orientation_est: bearing + noise.gaussian(BEARING_NOISE),
            buttons,
        }
    }

    /// Feed readings into `monitor` until cancelled.
    pub fn run(&mut self, monitor: &mut RangingMonitor, cancel: &CancelToken) {
        let rate_hz = self.world.lock().config().beacon_rate_hz;
        let period = Duration::from_secs_f32(1.0 / rate_hz);
        tracing::info!("Beacon feed started ({:.0} Hz)", rate_hz);

        while !cancel.sleep(period) {
            let reading = self.read(Instant::now());
            tracing::trace!(
                "Beacon: d={:.2}, o={:.2}, buttons={:#x}",
                reading.distance_est,
                reading.orientation_est,
                reading.buttons
            );
            monitor.on_reading(&reading);
        }

        tracing::info!("Beacon feed stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::devices::mock::SimWorld;
    use crate::shared::RangingSlot;
    use approx::assert_relative_eq;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn world(config: SimulationConfig, now: Instant) -> SharedWorld {
        Arc::new(Mutex::new(SimWorld::new(config, now)))
    }

    #[test]
    fn test_reading_without_noise() {
        let t0 = Instant::now();
        let config = SimulationConfig {
            range_noise_stddev: 0.0,
            beacon_center: [3.0, 0.0],
            beacon_radius: 0.0,
            beacon_standoff: 1.0,
            ..Default::default()
        };
        let beacon = SimBeacon::new(world(config, t0));

        let reading = beacon.read(t0);
        assert_relative_eq!(reading.distance_est, 2.0, epsilon = 1e-5);
        assert!(reading.orientation_est.abs() < 0.2);
        assert_eq!(reading.buttons, 0);
    }

    #[test]
    fn test_button_press_cancels_feed() {
        let config = SimulationConfig {
            beacon_rate_hz: 100.0,
            button_press_after_secs: 0.01,
            ..Default::default()
        };
        let cancel = CancelToken::new();
        let slot = Arc::new(RangingSlot::new());
        let mut monitor = RangingMonitor::new(Arc::clone(&slot), cancel.clone());
        let mut beacon = SimBeacon::new(world(config, Instant::now()));

        beacon.run(&mut monitor, &cancel);

        assert!(cancel.is_cancelled());
        assert!(slot.latest().is_some());
    }
}
