//! Scroll-specific ballistic simulations
//!
//! The generic springs and friction curves live in `kinetic_physics`;
//! these two compose them into the release behaviors the physics
//! policies hand out.

use kinetic_physics::{
    FrictionSimulation, ScrollSpringSimulation, Simulation, SpringDescription, Tolerance,
};

/// Fling decay matching scrolled-list behavior on platforms that hard-stop
/// at the edges: a fixed-duration cubic penetration curve whose duration
/// and distance derive from the release velocity and a friction constant.
pub struct ClampingScrollSimulation {
    position: f32,
    velocity: f32,
    duration: f32,
    distance: f32,
}

/// Rate at which a fling loses velocity per decade of duration.
fn deceleration_rate() -> f32 {
    0.78_f32.ln() / 0.9_f32.ln()
}

const INITIAL_VELOCITY_PENETRATION: f32 = 3.065;

impl ClampingScrollSimulation {
    pub const DEFAULT_FRICTION: f32 = 0.015;

    pub fn new(position: f32, velocity: f32, tolerance: Tolerance) -> Self {
        Self::with_friction(position, velocity, Self::DEFAULT_FRICTION, tolerance)
    }

    pub fn with_friction(
        position: f32,
        velocity: f32,
        friction: f32,
        _tolerance: Tolerance,
    ) -> Self {
        let duration = Self::fling_duration(velocity, friction);
        let distance = (velocity * duration / INITIAL_VELOCITY_PENETRATION).abs();
        Self {
            position,
            velocity,
            duration,
            distance,
        }
    }

    fn deceleration_for_friction(friction: f32) -> f32 {
        friction * 61774.04968
    }

    fn fling_duration(velocity: f32, friction: f32) -> f32 {
        let scaled_friction = friction * Self::deceleration_for_friction(0.84);
        let deceleration = (0.35 * velocity.abs() / scaled_friction).ln();
        (deceleration / (deceleration_rate() - 1.0)).exp()
    }

    fn distance_penetration(t: f32) -> f32 {
        1.2 * t * t * t - 3.27 * t * t + INITIAL_VELOCITY_PENETRATION * t
    }

    fn velocity_penetration(t: f32) -> f32 {
        3.6 * t * t - 6.54 * t + INITIAL_VELOCITY_PENETRATION
    }
}

impl Simulation for ClampingScrollSimulation {
    fn x(&self, time: f32) -> f32 {
        let t = (time / self.duration).clamp(0.0, 1.0);
        self.position + self.distance * Self::distance_penetration(t) * self.velocity.signum()
    }

    fn dx(&self, time: f32) -> f32 {
        let t = (time / self.duration).clamp(0.0, 1.0);
        self.distance * Self::velocity_penetration(t) * self.velocity.signum() / self.duration
    }

    fn is_done(&self, time: f32) -> bool {
        time >= self.duration
    }
}

/// Largest velocity handed from the friction phase to the edge spring.
const MAX_SPRING_TRANSFER_VELOCITY: f32 = 5000.0;

/// Drag coefficient of the in-range friction phase.
const BOUNCE_FRICTION_DRAG: f32 = 0.135;

enum Phase {
    /// Released out of range; only the spring runs.
    SpringOnly(ScrollSpringSimulation),
    /// The fling decays without ever reaching an edge.
    FrictionOnly(FrictionSimulation),
    /// Friction until the edge, then hand the remaining velocity to the
    /// spring at `spring_time`.
    FrictionThenSpring {
        friction: FrictionSimulation,
        spring: ScrollSpringSimulation,
        spring_time: f32,
    },
}

/// Fling decay for edge-bouncing scrollables: friction while in range,
/// an overdamped-ish spring pulling back once an edge is crossed.
pub struct BouncingScrollSimulation {
    phase: Phase,
}

impl BouncingScrollSimulation {
    pub fn new(
        position: f32,
        velocity: f32,
        leading_extent: f32,
        trailing_extent: f32,
        spring: SpringDescription,
        tolerance: Tolerance,
    ) -> Self {
        debug_assert!(leading_extent <= trailing_extent);

        let edge_spring = |start: f32, end: f32, dx: f32| {
            ScrollSpringSimulation::new(spring, start, end, dx, tolerance)
        };

        let phase = if position < leading_extent {
            Phase::SpringOnly(edge_spring(position, leading_extent, velocity))
        } else if position > trailing_extent {
            Phase::SpringOnly(edge_spring(position, trailing_extent, velocity))
        } else {
            let friction = FrictionSimulation::new(BOUNCE_FRICTION_DRAG, position, velocity, tolerance);
            let final_x = friction.final_x();
            if velocity > 0.0 && final_x > trailing_extent {
                let spring_time = friction.time_at_x(trailing_extent);
                debug_assert!(spring_time.is_finite());
                let transfer = friction.dx(spring_time).min(MAX_SPRING_TRANSFER_VELOCITY);
                Phase::FrictionThenSpring {
                    spring: edge_spring(trailing_extent, trailing_extent, transfer),
                    friction,
                    spring_time,
                }
            } else if velocity < 0.0 && final_x < leading_extent {
                let spring_time = friction.time_at_x(leading_extent);
                debug_assert!(spring_time.is_finite());
                let transfer = friction.dx(spring_time).max(-MAX_SPRING_TRANSFER_VELOCITY);
                Phase::FrictionThenSpring {
                    spring: edge_spring(leading_extent, leading_extent, transfer),
                    friction,
                    spring_time,
                }
            } else {
                Phase::FrictionOnly(friction)
            }
        };

        Self { phase }
    }

    fn active(&self, time: f32) -> (&dyn Simulation, f32) {
        match &self.phase {
            Phase::SpringOnly(spring) => (spring, time),
            Phase::FrictionOnly(friction) => (friction, time),
            Phase::FrictionThenSpring {
                friction,
                spring,
                spring_time,
            } => {
                if time > *spring_time {
                    (spring, time - spring_time)
                } else {
                    (friction, time)
                }
            }
        }
    }
}

impl Simulation for BouncingScrollSimulation {
    fn x(&self, time: f32) -> f32 {
        let (sim, t) = self.active(time);
        sim.x(t)
    }

    fn dx(&self, time: f32) -> f32 {
        let (sim, t) = self.active(time);
        sim.dx(t)
    }

    fn is_done(&self, time: f32) -> bool {
        let (sim, t) = self.active(time);
        sim.is_done(t)
    }
}
