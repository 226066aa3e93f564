//! Scroll physics
//!
//! Policy objects that decide how a scrollable reacts to user input and
//! what it does when let go. A `ScrollPhysics` is an ordered list of
//! policies consulted outer to inner; the first policy with an opinion on
//! a question answers it, and built-in defaults cover the rest. This keeps
//! composition explicit: `bouncing.applied_to(&page_snapping)` produces a
//! single flat list rather than a linked chain of trait objects.

use smallvec::SmallVec;

use kinetic_physics::{ScrollSpringSimulation, Simulation, SpringDescription, Tolerance};

use crate::metrics::ScrollMetrics;
use crate::page::PageGeometry;
use crate::simulation::{BouncingScrollSimulation, ClampingScrollSimulation};

/// Slowest fling gesture the default physics will honor, in logical
/// pixels per second.
pub const MIN_FLING_VELOCITY: f32 = 50.0;

/// Fastest fling the default physics will apply; faster input is clamped.
pub const MAX_FLING_VELOCITY: f32 = 8000.0;

/// One policy in a physics chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsPolicy {
    /// Hard-stop at the extents; flings decay with platform friction.
    Clamping,
    /// Overscroll past the extents with resistance, then spring back.
    Bouncing,
    /// Accept drags even when there is nowhere to scroll.
    AlwaysScrollable,
    /// Reject all user-driven scrolling.
    NeverScrollable,
    /// Settle every ballistic motion onto a page boundary.
    PageSnapping(PageGeometry),
}

/// How a policy answers the "where should a released position go" question.
enum Ballistic {
    /// No opinion; ask the next policy.
    Defer,
    /// Stay put; the position is already settled.
    Settle,
    Run(Box<dyn Simulation>),
}

/// An ordered, immutable set of scroll policies.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollPhysics {
    policies: SmallVec<[PhysicsPolicy; 2]>,
}

impl Default for ScrollPhysics {
    fn default() -> Self {
        Self::clamping()
    }
}

impl ScrollPhysics {
    pub fn new(policies: impl IntoIterator<Item = PhysicsPolicy>) -> Self {
        Self {
            policies: policies.into_iter().collect(),
        }
    }

    pub fn clamping() -> Self {
        Self::new([PhysicsPolicy::Clamping])
    }

    pub fn bouncing() -> Self {
        Self::new([PhysicsPolicy::Bouncing])
    }

    pub fn always_scrollable() -> Self {
        Self::new([PhysicsPolicy::AlwaysScrollable, PhysicsPolicy::Clamping])
    }

    pub fn never_scrollable() -> Self {
        Self::new([PhysicsPolicy::NeverScrollable])
    }

    pub fn page_snapping(geometry: PageGeometry) -> Self {
        Self::new([PhysicsPolicy::PageSnapping(geometry), PhysicsPolicy::Clamping])
    }

    /// Combine two physics: `self`'s policies are consulted first, then
    /// `ancestor`'s.
    pub fn applied_to(&self, ancestor: &ScrollPhysics) -> ScrollPhysics {
        let mut policies = self.policies.clone();
        policies.extend(ancestor.policies.iter().cloned());
        ScrollPhysics { policies }
    }

    pub fn policies(&self) -> &[PhysicsPolicy] {
        &self.policies
    }

    // =========================================================================
    // Gesture acceptance
    // =========================================================================

    /// Whether a new drag gesture should be accepted at all.
    pub fn should_accept_user_offset(&self, metrics: &dyn ScrollMetrics) -> bool {
        for policy in &self.policies {
            match policy {
                PhysicsPolicy::AlwaysScrollable => return true,
                PhysicsPolicy::NeverScrollable => return false,
                _ => {}
            }
        }
        metrics.pixels() != 0.0 || metrics.min_scroll_extent() != metrics.max_scroll_extent()
    }

    /// Minimum pointer travel before a drag is recognized as scrolling,
    /// when the policy wants start-debouncing at all.
    pub fn drag_start_distance_motion_threshold(&self) -> Option<f32> {
        self.policies.iter().find_map(|policy| match policy {
            PhysicsPolicy::Bouncing => Some(3.5),
            _ => None,
        })
    }

    // =========================================================================
    // Per-delta shaping
    // =========================================================================

    /// Transform a raw user drag delta before it is applied. The default
    /// passes the delta through unchanged; bouncing attenuates it while
    /// out of range.
    pub fn apply_physics_to_user_offset(&self, metrics: &dyn ScrollMetrics, offset: f32) -> f32 {
        for policy in &self.policies {
            if let PhysicsPolicy::Bouncing = policy {
                return bouncing_user_offset(metrics, offset);
            }
        }
        offset
    }

    /// Given a proposed new offset `value`, return the portion the
    /// position must NOT take on. Non-zero results become overscroll
    /// notifications.
    pub fn apply_boundary_conditions(&self, metrics: &dyn ScrollMetrics, value: f32) -> f32 {
        for policy in &self.policies {
            match policy {
                PhysicsPolicy::Clamping => return clamping_boundary(metrics, value),
                // Bouncing permits any offset; the spring pulls it back later.
                PhysicsPolicy::Bouncing => return 0.0,
                _ => {}
            }
        }
        0.0
    }

    // =========================================================================
    // Ballistic motion
    // =========================================================================

    /// Build the simulation that carries the position after the user lets
    /// go with `velocity`. `None` means the position should go idle where
    /// it stands.
    pub fn create_ballistic_simulation(
        &self,
        metrics: &dyn ScrollMetrics,
        velocity: f32,
    ) -> Option<Box<dyn Simulation>> {
        for policy in &self.policies {
            match self.policy_ballistic(policy, metrics, velocity) {
                Ballistic::Defer => continue,
                Ballistic::Settle => return None,
                Ballistic::Run(sim) => return Some(sim),
            }
        }
        None
    }

    fn policy_ballistic(
        &self,
        policy: &PhysicsPolicy,
        metrics: &dyn ScrollMetrics,
        velocity: f32,
    ) -> Ballistic {
        let tolerance = self.tolerance();
        match policy {
            PhysicsPolicy::Clamping => {
                if metrics.out_of_range() {
                    // TODO: an underflow (pixels < min_scroll_extent) should
                    // spring back to min_scroll_extent; it currently targets
                    // max_scroll_extent, matching long-standing behavior that
                    // downstream tests encode.
                    return Ballistic::Run(Box::new(ScrollSpringSimulation::new(
                        self.spring(),
                        metrics.pixels(),
                        metrics.max_scroll_extent(),
                        velocity.min(0.0),
                        tolerance,
                    )));
                }
                if velocity.abs() < tolerance.velocity {
                    return Ballistic::Settle;
                }
                if velocity > 0.0 && metrics.pixels() >= metrics.max_scroll_extent() {
                    return Ballistic::Settle;
                }
                if velocity < 0.0 && metrics.pixels() <= metrics.min_scroll_extent() {
                    return Ballistic::Settle;
                }
                Ballistic::Run(Box::new(ClampingScrollSimulation::new(
                    metrics.pixels(),
                    velocity,
                    tolerance,
                )))
            }
            PhysicsPolicy::Bouncing => {
                if velocity.abs() >= tolerance.velocity || metrics.out_of_range() {
                    return Ballistic::Run(Box::new(BouncingScrollSimulation::new(
                        metrics.pixels(),
                        velocity * 0.91,
                        metrics.min_scroll_extent(),
                        metrics.max_scroll_extent(),
                        self.spring(),
                        tolerance,
                    )));
                }
                Ballistic::Settle
            }
            PhysicsPolicy::PageSnapping(geometry) => {
                // A fling already at an edge falls through to the inner
                // policy so edge overscroll behaves normally.
                if (velocity <= 0.0 && metrics.pixels() <= metrics.min_scroll_extent())
                    || (velocity >= 0.0 && metrics.pixels() >= metrics.max_scroll_extent())
                {
                    return Ballistic::Defer;
                }
                let target = page_snap_target(geometry, metrics, &tolerance, velocity);
                if target != metrics.pixels() {
                    return Ballistic::Run(Box::new(ScrollSpringSimulation::new(
                        self.spring(),
                        metrics.pixels(),
                        target,
                        velocity,
                        tolerance,
                    )));
                }
                Ballistic::Settle
            }
            PhysicsPolicy::AlwaysScrollable | PhysicsPolicy::NeverScrollable => Ballistic::Defer,
        }
    }

    // =========================================================================
    // Tuning values
    // =========================================================================

    /// Spring used whenever the position must be pulled to a target.
    pub fn spring(&self) -> SpringDescription {
        SpringDescription::with_damping_ratio(0.5, 100.0, 1.1)
    }

    /// Smallest distances and velocities treated as zero.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::default()
    }

    pub fn min_fling_velocity(&self) -> f32 {
        for policy in &self.policies {
            if let PhysicsPolicy::Bouncing = policy {
                return MIN_FLING_VELOCITY * 2.0;
            }
        }
        MIN_FLING_VELOCITY
    }

    pub fn max_fling_velocity(&self) -> f32 {
        MAX_FLING_VELOCITY
    }

    /// Velocity carried into a new drag that interrupts a fling. Zero for
    /// policies where each gesture starts fresh.
    pub fn carried_momentum(&self, existing_velocity: f32) -> f32 {
        for policy in &self.policies {
            if let PhysicsPolicy::Bouncing = policy {
                return existing_velocity.signum()
                    * (0.000816 * existing_velocity.abs().powf(1.967)).min(40000.0);
            }
        }
        0.0
    }
}

/// Resistance curve for dragging past an edge: full resistance at the
/// moment of crossing, asymptotically immovable as overscroll grows.
fn friction_factor(overscroll_fraction: f32) -> f32 {
    0.52 * (1.0 - overscroll_fraction).powi(2)
}

fn bouncing_user_offset(metrics: &dyn ScrollMetrics, offset: f32) -> f32 {
    debug_assert!(offset != 0.0);
    debug_assert!(metrics.min_scroll_extent() <= metrics.max_scroll_extent());

    if !metrics.out_of_range() {
        return offset;
    }

    let overscroll_past_start = (metrics.min_scroll_extent() - metrics.pixels()).max(0.0);
    let overscroll_past_end = (metrics.pixels() - metrics.max_scroll_extent()).max(0.0);
    let overscroll_past = overscroll_past_start.max(overscroll_past_end);
    // Easing back toward the range meets less resistance than pulling
    // further out, and the resistance relaxes over the delta.
    let easing = (overscroll_past_start > 0.0 && offset < 0.0)
        || (overscroll_past_end > 0.0 && offset > 0.0);

    let friction = if easing {
        friction_factor((overscroll_past - offset.abs()) / metrics.viewport_dimension())
    } else {
        friction_factor(overscroll_past / metrics.viewport_dimension())
    };

    offset.signum() * apply_friction(overscroll_past, offset.abs(), friction)
}

/// Integrate the friction factor over a delta that may cross back into
/// range partway through: the out-of-range portion is attenuated, the
/// in-range remainder applies at full strength.
fn apply_friction(extent_outside: f32, mut abs_delta: f32, gamma: f32) -> f32 {
    debug_assert!(abs_delta > 0.0);
    let mut total = 0.0;
    if extent_outside > 0.0 {
        let delta_to_limit = extent_outside / gamma;
        if abs_delta < delta_to_limit {
            return abs_delta * gamma;
        }
        total += extent_outside;
        abs_delta -= delta_to_limit;
    }
    total + abs_delta
}

fn clamping_boundary(metrics: &dyn ScrollMetrics, value: f32) -> f32 {
    if value < metrics.pixels() && metrics.pixels() <= metrics.min_scroll_extent() {
        // Already at or past the leading edge and trying to go further.
        return value - metrics.pixels();
    }
    if metrics.max_scroll_extent() <= metrics.pixels() && metrics.pixels() < value {
        return value - metrics.pixels();
    }
    if value < metrics.min_scroll_extent() && metrics.min_scroll_extent() < metrics.pixels() {
        // Crossing the leading edge this step; keep the in-range part.
        return value - metrics.min_scroll_extent();
    }
    if metrics.pixels() < metrics.max_scroll_extent() && metrics.max_scroll_extent() < value {
        return value - metrics.max_scroll_extent();
    }
    0.0
}

fn page_snap_target(
    geometry: &PageGeometry,
    metrics: &dyn ScrollMetrics,
    tolerance: &Tolerance,
    velocity: f32,
) -> f32 {
    let mut page = geometry.page_from_pixels(metrics.pixels(), metrics.viewport_dimension());
    if velocity < -tolerance.velocity {
        page -= 0.5;
    } else if velocity > tolerance.velocity {
        page += 0.5;
    }
    geometry.pixels_from_page(page.round(), metrics.viewport_dimension())
}
