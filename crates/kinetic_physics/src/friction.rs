//! Friction (drag) deceleration
//!
//! Exponential decay of velocity under a constant drag coefficient. Used as
//! the free-scrolling phase of bounce physics before a boundary spring
//! takes over.

use crate::simulation::Simulation;
use crate::tolerance::Tolerance;

/// Motion decelerating under a drag coefficient in (0, 1).
///
/// Velocity decays as `v·drag^t`; the position approaches a finite
/// [`final_x`](FrictionSimulation::final_x).
#[derive(Debug, Clone, Copy)]
pub struct FrictionSimulation {
    drag: f32,
    drag_log: f32,
    position: f32,
    velocity: f32,
    tolerance: Tolerance,
}

impl FrictionSimulation {
    pub fn new(drag: f32, position: f32, velocity: f32, tolerance: Tolerance) -> Self {
        debug_assert!(drag > 0.0 && drag < 1.0, "drag must be in (0, 1)");
        Self {
            drag,
            drag_log: drag.ln(),
            position,
            velocity,
            tolerance,
        }
    }

    /// The position the motion converges to as time goes to infinity.
    pub fn final_x(&self) -> f32 {
        self.position - self.velocity / self.drag_log
    }

    /// The time at which the motion passes through `x`, or infinity if it
    /// never does.
    pub fn time_at_x(&self, x: f32) -> f32 {
        if x == self.position {
            return 0.0;
        }
        if self.velocity == 0.0
            || (if self.velocity > 0.0 {
                x < self.position || x > self.final_x()
            } else {
                x > self.position || x < self.final_x()
            })
        {
            return f32::INFINITY;
        }
        (self.drag_log * (x - self.position) / self.velocity + 1.0).ln() / self.drag_log
    }
}

impl Simulation for FrictionSimulation {
    fn x(&self, time: f32) -> f32 {
        self.position + self.velocity * self.drag.powf(time) / self.drag_log
            - self.velocity / self.drag_log
    }

    fn dx(&self, time: f32) -> f32 {
        self.velocity * self.drag.powf(time)
    }

    fn is_done(&self, time: f32) -> bool {
        self.dx(time).abs() < self.tolerance.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_conditions() {
        let sim = FrictionSimulation::new(0.135, 100.0, 500.0, Tolerance::default());
        assert!((sim.x(0.0) - 100.0).abs() < 1e-3);
        assert!((sim.dx(0.0) - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_velocity_decays_monotonically() {
        let sim = FrictionSimulation::new(0.135, 0.0, 1000.0, Tolerance::default());
        let mut last = sim.dx(0.0);
        for i in 1..20 {
            let v = sim.dx(i as f32 * 0.1);
            assert!(v < last);
            assert!(v >= 0.0);
            last = v;
        }
    }

    #[test]
    fn test_final_x_and_time_at_x_agree() {
        let sim = FrictionSimulation::new(0.135, 0.0, 800.0, Tolerance::default());
        let final_x = sim.final_x();
        assert!(final_x > 0.0);

        let halfway = final_x / 2.0;
        let t = sim.time_at_x(halfway);
        assert!(t.is_finite());
        assert!((sim.x(t) - halfway).abs() < 0.5);

        // Positions behind the start or beyond the limit are never reached.
        assert_eq!(sim.time_at_x(-1.0), f32::INFINITY);
        assert_eq!(sim.time_at_x(final_x + 1.0), f32::INFINITY);
    }

    #[test]
    fn test_settles_below_tolerance() {
        let sim = FrictionSimulation::new(0.135, 0.0, 300.0, Tolerance::default());
        assert!(!sim.is_done(0.0));
        assert!(sim.is_done(10.0));
    }
}
