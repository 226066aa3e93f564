//! Spring physics
//!
//! Analytic solutions of the damped harmonic oscillator, used for
//! overscroll snap-back and page settling. The solution is solved once at
//! construction; evaluation at a time point is a closed-form expression,
//! not a numeric integration step.

use crate::simulation::Simulation;
use crate::tolerance::Tolerance;

/// Mass/stiffness/damping description of a spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringDescription {
    pub mass: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl SpringDescription {
    pub const fn new(mass: f32, stiffness: f32, damping: f32) -> Self {
        Self {
            mass,
            stiffness,
            damping,
        }
    }

    /// Build a spring from a damping ratio instead of a raw damping
    /// coefficient. Ratio 1.0 is critically damped, over 1.0 overdamped,
    /// under 1.0 underdamped (bouncy).
    pub fn with_damping_ratio(mass: f32, stiffness: f32, ratio: f32) -> Self {
        Self {
            mass,
            stiffness,
            damping: ratio * 2.0 * (mass * stiffness).sqrt(),
        }
    }
}

/// Damping regime of a spring solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpringType {
    CriticallyDamped,
    UnderDamped,
    OverDamped,
}

/// Closed-form solution relative to the rest position.
#[derive(Debug, Clone, Copy)]
enum SpringSolution {
    /// x(t) = (c1 + c2·t)·e^(r·t)
    Critical { r: f32, c1: f32, c2: f32 },
    /// x(t) = c1·e^(r1·t) + c2·e^(r2·t)
    Overdamped { r1: f32, r2: f32, c1: f32, c2: f32 },
    /// x(t) = e^(r·t)·(c1·cos(w·t) + c2·sin(w·t))
    Underdamped { w: f32, r: f32, c1: f32, c2: f32 },
}

impl SpringSolution {
    fn solve(spring: &SpringDescription, distance: f32, velocity: f32) -> Self {
        let cmk =
            spring.damping * spring.damping - 4.0 * spring.mass * spring.stiffness;
        if cmk == 0.0 {
            let r = -spring.damping / (2.0 * spring.mass);
            SpringSolution::Critical {
                r,
                c1: distance,
                c2: velocity - r * distance,
            }
        } else if cmk > 0.0 {
            let r1 = (-spring.damping - cmk.sqrt()) / (2.0 * spring.mass);
            let r2 = (-spring.damping + cmk.sqrt()) / (2.0 * spring.mass);
            let c2 = (velocity - r1 * distance) / (r2 - r1);
            SpringSolution::Overdamped {
                r1,
                r2,
                c1: distance - c2,
                c2,
            }
        } else {
            let w = (-cmk).sqrt() / (2.0 * spring.mass);
            let r = -spring.damping / (2.0 * spring.mass);
            SpringSolution::Underdamped {
                w,
                r,
                c1: distance,
                c2: (velocity - r * distance) / w,
            }
        }
    }

    fn x(&self, t: f32) -> f32 {
        match *self {
            SpringSolution::Critical { r, c1, c2 } => (c1 + c2 * t) * (r * t).exp(),
            SpringSolution::Overdamped { r1, r2, c1, c2 } => {
                c1 * (r1 * t).exp() + c2 * (r2 * t).exp()
            }
            SpringSolution::Underdamped { w, r, c1, c2 } => {
                (r * t).exp() * (c1 * (w * t).cos() + c2 * (w * t).sin())
            }
        }
    }

    fn dx(&self, t: f32) -> f32 {
        match *self {
            SpringSolution::Critical { r, c1, c2 } => {
                let power = (r * t).exp();
                r * (c1 + c2 * t) * power + c2 * power
            }
            SpringSolution::Overdamped { r1, r2, c1, c2 } => {
                c1 * r1 * (r1 * t).exp() + c2 * r2 * (r2 * t).exp()
            }
            SpringSolution::Underdamped { w, r, c1, c2 } => {
                let power = (r * t).exp();
                let cosine = (w * t).cos();
                let sine = (w * t).sin();
                power * (c2 * w * cosine - c1 * w * sine)
                    + r * power * (c2 * sine + c1 * cosine)
            }
        }
    }

    fn spring_type(&self) -> SpringType {
        match self {
            SpringSolution::Critical { .. } => SpringType::CriticallyDamped,
            SpringSolution::Overdamped { .. } => SpringType::OverDamped,
            SpringSolution::Underdamped { .. } => SpringType::UnderDamped,
        }
    }
}

/// Spring motion from a start position/velocity toward an end position.
#[derive(Debug, Clone, Copy)]
pub struct SpringSimulation {
    end_position: f32,
    solution: SpringSolution,
    tolerance: Tolerance,
}

impl SpringSimulation {
    pub fn new(
        spring: SpringDescription,
        start: f32,
        end: f32,
        velocity: f32,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            end_position: end,
            solution: SpringSolution::solve(&spring, start - end, velocity),
            tolerance,
        }
    }

    pub fn spring_type(&self) -> SpringType {
        self.solution.spring_type()
    }

    pub fn end_position(&self) -> f32 {
        self.end_position
    }
}

impl Simulation for SpringSimulation {
    fn x(&self, time: f32) -> f32 {
        self.end_position + self.solution.x(time)
    }

    fn dx(&self, time: f32) -> f32 {
        self.solution.dx(time)
    }

    fn is_done(&self, time: f32) -> bool {
        self.tolerance.near_zero(self.solution.x(time))
            && self.solution.dx(time).abs() < self.tolerance.velocity
    }
}

/// A [`SpringSimulation`] that reports the exact end position once settled,
/// so a scroll offset lands on the extent instead of a hair short of it.
#[derive(Debug, Clone, Copy)]
pub struct ScrollSpringSimulation {
    inner: SpringSimulation,
}

impl ScrollSpringSimulation {
    pub fn new(
        spring: SpringDescription,
        start: f32,
        end: f32,
        velocity: f32,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            inner: SpringSimulation::new(spring, start, end, velocity, tolerance),
        }
    }
}

impl Simulation for ScrollSpringSimulation {
    fn x(&self, time: f32) -> f32 {
        if self.is_done(time) {
            self.inner.end_position()
        } else {
            self.inner.x(time)
        }
    }

    fn dx(&self, time: f32) -> f32 {
        self.inner.dx(time)
    }

    fn is_done(&self, time: f32) -> bool {
        self.inner.is_done(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_spring() -> SpringDescription {
        SpringDescription::with_damping_ratio(0.5, 100.0, 1.1)
    }

    #[test]
    fn test_damping_ratio_regimes() {
        let tol = Tolerance::default();
        let over = SpringSimulation::new(
            SpringDescription::with_damping_ratio(1.0, 100.0, 1.5),
            0.0,
            10.0,
            0.0,
            tol,
        );
        assert_eq!(over.spring_type(), SpringType::OverDamped);

        let under = SpringSimulation::new(
            SpringDescription::with_damping_ratio(1.0, 100.0, 0.5),
            0.0,
            10.0,
            0.0,
            tol,
        );
        assert_eq!(under.spring_type(), SpringType::UnderDamped);
    }

    #[test]
    fn test_spring_starts_at_start() {
        let sim = SpringSimulation::new(default_spring(), 50.0, 0.0, -20.0, Tolerance::default());
        assert!((sim.x(0.0) - 50.0).abs() < 1e-4);
        assert!((sim.dx(0.0) - -20.0).abs() < 1e-3);
    }

    #[test]
    fn test_spring_converges_to_end() {
        let sim = SpringSimulation::new(default_spring(), 1050.0, 1000.0, 0.0, Tolerance::default());
        assert!(sim.is_done(10.0));
        assert!((sim.x(10.0) - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_scroll_spring_snaps_exactly_when_done() {
        let sim = ScrollSpringSimulation::new(
            default_spring(),
            1050.0,
            1000.0,
            0.0,
            Tolerance::default(),
        );
        assert!(sim.is_done(10.0));
        assert_eq!(sim.x(10.0), 1000.0);
    }

    #[test]
    fn test_underdamped_overshoots() {
        let sim = SpringSimulation::new(
            SpringDescription::with_damping_ratio(1.0, 100.0, 0.2),
            0.0,
            100.0,
            0.0,
            Tolerance::default(),
        );
        let overshoot = (0..200)
            .map(|i| sim.x(i as f32 * 0.01))
            .fold(f32::MIN, f32::max);
        assert!(overshoot > 100.0);
    }
}
