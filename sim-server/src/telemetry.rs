//! Simulated vehicle telemetry

use std::time::Instant;

use rand::Rng;

/// Monotonic odometer plus a freshly sampled status flag
///
/// The odometer derives from elapsed time, so every session observes the same
/// advancing value.
pub struct TelemetrySource {
    start: Instant,
    base_km: f32,
    speed_kmh: f32,
}

impl TelemetrySource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            base_km: 18_250.0,
            speed_kmh: 72.0,
        }
    }

    /// Current odometer reading in kilometers
    pub fn odometer(&self) -> f32 {
        let hours = self.start.elapsed().as_secs_f32() / 3600.0;
        self.base_km + self.speed_kmh * hours
    }

    /// Sample the status flag
    pub fn random_status(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}

impl Default for TelemetrySource {
    fn default() -> Self {
        Self::new()
    }
}
