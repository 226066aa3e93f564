//! Scroll activities
//!
//! What a position is currently doing, as a state machine: idle, held,
//! dragged, coasting ballistically, or animating to a programmatic
//! target. Activities never install their successors themselves; a tick
//! returns an [`ActivityRequest`] and the owning position performs the
//! transition. That keeps the transition logic in one place and avoids
//! re-entrant mutation.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;

use kinetic_core::Ticker;
use kinetic_physics::{Easing, Simulation};

use crate::drag::{DragStartDetails, ScrollDragController, VoidCallback};
use crate::metrics::AxisDirection;

/// The mutation surface an activity drives the position through.
///
/// Implemented by the position's inner state so an activity can move
/// pixels while the position retains ownership of the activity itself.
pub trait ScrollActivityDelegate {
    fn axis_direction(&self) -> AxisDirection;

    /// Move to `pixels`, honoring boundary conditions. Returns the
    /// overscroll: the portion of the move that was refused.
    fn set_pixels(&mut self, pixels: f32) -> f32;

    /// Apply a user drag delta (positive = content toward larger
    /// offsets from the user's perspective), through overscroll shaping.
    fn apply_user_offset(&mut self, delta: f32);

    /// Apply a discrete wheel/trackpad delta, which clamps instead of
    /// overscrolling.
    fn apply_user_scroll_offset(&mut self, delta: f32);

    /// Record the activity's instantaneous velocity so overscroll
    /// reporting can attach it.
    fn report_velocity(&mut self, velocity: f32);
}

/// Transition an activity asks its owner to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityRequest {
    None,
    /// Stop; become idle where the position stands.
    GoIdle,
    /// Hand off to physics-driven ballistic motion at the given velocity.
    GoBallistic(f32),
}

/// Waiting for input. The resting state.
#[derive(Default)]
pub struct IdleActivity;

/// A pointer is down and has stopped an ongoing motion, but has not
/// moved far enough to start a drag.
pub struct HoldActivity {
    on_hold_canceled: Option<VoidCallback>,
}

/// A pointer is actively dragging the position.
pub struct DragActivity {
    pub controller: ScrollDragController,
    start_details: DragStartDetails,
}

/// Coasting under a physics simulation after release.
pub struct BallisticActivity {
    simulation: Box<dyn Simulation>,
    ticker: Ticker,
    velocity: f32,
}

/// Animating to a programmatic target over a fixed duration.
pub struct DrivenActivity {
    from: f32,
    to: f32,
    duration: Duration,
    curve: Easing,
    ticker: Ticker,
    last_value: f32,
    velocity: f32,
    completer: Option<oneshot::Sender<()>>,
}

pub enum ScrollActivity {
    Idle(IdleActivity),
    Hold(HoldActivity),
    Drag(DragActivity),
    Ballistic(BallisticActivity),
    Driven(DrivenActivity),
}

impl ScrollActivity {
    pub fn idle() -> Self {
        ScrollActivity::Idle(IdleActivity)
    }

    pub fn hold(on_hold_canceled: Option<VoidCallback>) -> Self {
        ScrollActivity::Hold(HoldActivity { on_hold_canceled })
    }

    pub fn drag(controller: ScrollDragController, start_details: DragStartDetails) -> Self {
        ScrollActivity::Drag(DragActivity {
            controller,
            start_details,
        })
    }

    pub fn ballistic(simulation: Box<dyn Simulation>, mut ticker: Ticker) -> Self {
        let velocity = simulation.dx(0.0);
        ticker.start();
        ScrollActivity::Ballistic(BallisticActivity {
            simulation,
            ticker,
            velocity,
        })
    }

    /// Builds the driven activity together with the receiver that
    /// resolves when the animation finishes or is interrupted.
    pub fn driven(
        from: f32,
        to: f32,
        duration: Duration,
        curve: Easing,
        mut ticker: Ticker,
    ) -> (Self, oneshot::Receiver<()>) {
        debug_assert!(!duration.is_zero());
        let (tx, rx) = oneshot::channel();
        ticker.start();
        let activity = ScrollActivity::Driven(DrivenActivity {
            from,
            to,
            duration,
            curve,
            ticker,
            last_value: from,
            velocity: 0.0,
            completer: Some(tx),
        });
        (activity, rx)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ScrollActivity::Idle(_) => "idle",
            ScrollActivity::Hold(_) => "hold",
            ScrollActivity::Drag(_) => "drag",
            ScrollActivity::Ballistic(_) => "ballistic",
            ScrollActivity::Driven(_) => "driven",
        }
    }

    /// Whether pointer input should be ignored while this activity runs.
    pub fn should_ignore_pointer(&self) -> bool {
        matches!(
            self,
            ScrollActivity::Drag(_) | ScrollActivity::Ballistic(_) | ScrollActivity::Driven(_)
        )
    }

    /// Whether the position counts as scrolling for notification
    /// purposes.
    pub fn is_scrolling(&self) -> bool {
        matches!(
            self,
            ScrollActivity::Drag(_) | ScrollActivity::Ballistic(_) | ScrollActivity::Driven(_)
        )
    }

    /// Instantaneous velocity of the position under this activity.
    pub fn velocity(&self) -> f32 {
        match self {
            ScrollActivity::Ballistic(ballistic) => ballistic.velocity,
            ScrollActivity::Driven(driven) => driven.velocity,
            _ => 0.0,
        }
    }

    /// Start details of the drag gesture, when one is in progress.
    pub fn drag_details(&self) -> Option<DragStartDetails> {
        match self {
            ScrollActivity::Drag(drag) => Some(drag.start_details),
            _ => None,
        }
    }

    /// The content dimensions changed under this activity.
    pub fn apply_new_dimensions(&self) -> ActivityRequest {
        match self {
            // Re-run physics so a now-out-of-range position settles back.
            ScrollActivity::Idle(_) => ActivityRequest::GoBallistic(0.0),
            ScrollActivity::Ballistic(ballistic) => {
                ActivityRequest::GoBallistic(ballistic.velocity)
            }
            _ => ActivityRequest::None,
        }
    }

    /// Advance the activity by one frame.
    pub fn tick(
        &mut self,
        delegate: &mut dyn ScrollActivityDelegate,
        dt: Duration,
    ) -> ActivityRequest {
        match self {
            ScrollActivity::Idle(_) | ScrollActivity::Hold(_) | ScrollActivity::Drag(_) => {
                ActivityRequest::None
            }
            ScrollActivity::Ballistic(ballistic) => ballistic.tick(delegate, dt),
            ScrollActivity::Driven(driven) => driven.tick(delegate, dt),
        }
    }

    /// Tear the activity down: stop tickers, resolve completers, fire
    /// cancel callbacks. Must be called before the activity is dropped.
    pub fn dispose(self) {
        match self {
            ScrollActivity::Idle(_) => {}
            ScrollActivity::Hold(mut hold) => {
                if let Some(callback) = hold.on_hold_canceled.take() {
                    callback();
                }
            }
            // Dropping the controller fires its cancel callback.
            ScrollActivity::Drag(_) => {}
            ScrollActivity::Ballistic(mut ballistic) => {
                ballistic.ticker.stop();
            }
            ScrollActivity::Driven(mut driven) => {
                driven.ticker.stop();
                if let Some(completer) = driven.completer.take() {
                    let _ = completer.send(());
                }
            }
        }
    }
}

impl BallisticActivity {
    fn tick(&mut self, delegate: &mut dyn ScrollActivityDelegate, dt: Duration) -> ActivityRequest {
        let t = self.ticker.tick(dt).as_secs_f32();
        self.velocity = self.simulation.dx(t);
        delegate.report_velocity(self.velocity);
        let overscroll = delegate.set_pixels(self.simulation.x(t));
        if overscroll != 0.0 {
            // The simulation ran into a boundary it did not model.
            trace!(overscroll, "ballistic motion hit a boundary, stopping");
            return ActivityRequest::GoIdle;
        }
        if self.simulation.is_done(t) {
            // Let the physics decide whether anything remains to do
            // (page snap, spring back) from the settled position.
            return ActivityRequest::GoBallistic(0.0);
        }
        ActivityRequest::None
    }
}

impl DrivenActivity {
    fn tick(&mut self, delegate: &mut dyn ScrollActivityDelegate, dt: Duration) -> ActivityRequest {
        let elapsed = self.ticker.tick(dt);
        let t = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        // Land exactly on the target; curve evaluation at 1.0 may carry
        // float error.
        let value = if t >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * self.curve.apply(t)
        };
        let dt_secs = dt.as_secs_f32();
        self.velocity = if dt_secs > 0.0 {
            (value - self.last_value) / dt_secs
        } else {
            self.velocity
        };
        self.last_value = value;
        delegate.report_velocity(self.velocity);
        let overscroll = delegate.set_pixels(value);
        if overscroll != 0.0 {
            trace!(overscroll, "driven animation hit a boundary, stopping");
            return ActivityRequest::GoIdle;
        }
        if t >= 1.0 {
            // A finished animation has no residual velocity; the physics
            // only need a chance to settle (page snap, spring back).
            return ActivityRequest::GoBallistic(0.0);
        }
        ActivityRequest::None
    }
}
