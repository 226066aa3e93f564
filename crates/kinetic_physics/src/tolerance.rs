//! Motion tolerances

/// Distance and velocity epsilons below which motion is treated as stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Distances below this magnitude are considered zero (logical pixels).
    pub distance: f32,
    /// Velocities below this magnitude are considered zero (pixels/second).
    pub velocity: f32,
}

impl Tolerance {
    pub const fn new(distance: f32, velocity: f32) -> Self {
        Self { distance, velocity }
    }

    /// Tolerance scaled for a display density: one physical pixel of
    /// distance, and one physical pixel per 50ms of velocity.
    pub fn for_device_pixel_ratio(ratio: f32) -> Self {
        Self {
            distance: 1.0 / ratio,
            velocity: 1.0 / (0.050 * ratio),
        }
    }

    /// Whether `value` is within `distance` of zero.
    pub fn near_zero(&self, value: f32) -> bool {
        value.abs() < self.distance
    }

    /// Whether two positions are within `distance` of each other.
    pub fn near_equal(&self, a: f32, b: f32) -> bool {
        (a - b).abs() < self.distance
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::for_device_pixel_ratio(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_pixel_ratio_scaling() {
        let t = Tolerance::for_device_pixel_ratio(2.0);
        assert_eq!(t.distance, 0.5);
        assert_eq!(t.velocity, 10.0);
    }

    #[test]
    fn test_near_equal() {
        let t = Tolerance::new(0.1, 1.0);
        assert!(t.near_equal(5.0, 5.05));
        assert!(!t.near_equal(5.0, 5.2));
        assert!(t.near_zero(-0.05));
    }
}
