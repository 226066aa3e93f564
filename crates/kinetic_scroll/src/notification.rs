//! Scroll notifications
//!
//! Typed events emitted by a position as it moves. Instead of bubbling
//! through a widget tree, events accumulate in the position's outbox and
//! the owner drains them once per frame.

use crate::drag::DragStartDetails;
use crate::metrics::{FixedScrollMetrics, ScrollDirection};

/// An event describing a change in scroll state.
///
/// Every variant carries a metrics snapshot taken at emission time, so a
/// consumer drained later still sees the values the event described.
#[derive(Debug)]
pub enum ScrollNotification {
    /// Scrolling has begun. `drag` is present when a user gesture started
    /// it, absent for programmatic motion.
    Start {
        metrics: FixedScrollMetrics,
        drag: Option<DragStartDetails>,
    },
    /// The offset changed by `delta` pixels.
    Update {
        metrics: FixedScrollMetrics,
        delta: f32,
        during_drag: bool,
    },
    /// Motion the physics refused to apply. `overscroll` is the rejected
    /// portion of the delta, `velocity` the speed at which the edge was hit.
    Overscroll {
        metrics: FixedScrollMetrics,
        overscroll: f32,
        velocity: f32,
        during_drag: bool,
    },
    /// Scrolling has stopped.
    End { metrics: FixedScrollMetrics },
    /// The user-perceived scroll direction changed.
    Direction {
        metrics: FixedScrollMetrics,
        direction: ScrollDirection,
    },
}

impl ScrollNotification {
    /// Metrics snapshot attached to this notification.
    pub fn metrics(&self) -> &FixedScrollMetrics {
        match self {
            ScrollNotification::Start { metrics, .. }
            | ScrollNotification::Update { metrics, .. }
            | ScrollNotification::Overscroll { metrics, .. }
            | ScrollNotification::End { metrics }
            | ScrollNotification::Direction { metrics, .. } => metrics,
        }
    }
}
