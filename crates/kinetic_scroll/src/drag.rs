//! Drag plumbing
//!
//! Details structs describing a pointer gesture, and the controller that
//! turns raw pointer deltas into scroll offsets: losing carried momentum
//! when the finger rests, debouncing motion after a stop, and shaping the
//! release velocity for the ballistic handoff.

use std::time::Duration;

use tracing::trace;

use crate::activity::ScrollActivityDelegate;

/// Called when a drag is torn down without a normal end, so the gesture
/// layer can release whatever it was holding for the drag.
pub type VoidCallback = Box<dyn FnOnce() + Send>;

/// Pointer-down details for the start of a drag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragStartDetails {
    /// Timestamp of the triggering pointer event, relative to an
    /// arbitrary epoch shared by all events of the gesture.
    pub source_timestamp: Option<Duration>,
}

/// One pointer-move worth of drag input.
#[derive(Debug, Clone, Copy)]
pub struct DragUpdateDetails {
    /// Delta along the scroll axis, in the pointer's coordinate space.
    pub primary_delta: f32,
    /// True for discrete wheel/trackpad scroll deltas, which bypass
    /// overscroll shaping.
    pub is_scroll: bool,
    pub source_timestamp: Option<Duration>,
}

impl DragUpdateDetails {
    pub fn new(primary_delta: f32) -> Self {
        Self {
            primary_delta,
            is_scroll: false,
            source_timestamp: None,
        }
    }

    pub fn at(primary_delta: f32, source_timestamp: Duration) -> Self {
        Self {
            primary_delta,
            is_scroll: false,
            source_timestamp: Some(source_timestamp),
        }
    }
}

/// Pointer-up details ending a drag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragEndDetails {
    /// Release velocity along the scroll axis, in the pointer's
    /// coordinate space.
    pub primary_velocity: f32,
}

/// Carried momentum is dropped if the finger rests longer than this.
const MOMENTUM_RETAIN_STATIONARY_THRESHOLD: Duration = Duration::from_millis(20);

/// A pause longer than this re-arms the motion-start threshold.
const MOTION_STOPPED_THRESHOLD: Duration = Duration::from_millis(50);

/// A single delta bigger than this breaks through the motion-start
/// threshold at full size.
const BIG_THRESHOLD_BREAK_DISTANCE: f32 = 24.0;

/// Scrolls a position in response to drag input.
///
/// Owned by the drag activity; the position feeds it updates through the
/// drag handle. Velocity shaping for the release (fling gating, carried
/// momentum, clamping) happens in [`end`](ScrollDragController::end).
pub struct ScrollDragController {
    carried_velocity: f32,
    retain_momentum: bool,
    motion_start_distance_threshold: Option<f32>,
    /// `Some` while the threshold is armed; accumulated offset since the
    /// last stop.
    offset_since_last_stop: Option<f32>,
    last_non_stationary_timestamp: Option<Duration>,
    reversed: bool,
    min_fling_velocity: f32,
    max_fling_velocity: f32,
    on_drag_canceled: Option<VoidCallback>,
}

impl ScrollDragController {
    pub fn new(
        details: &DragStartDetails,
        reversed: bool,
        carried_velocity: f32,
        motion_start_distance_threshold: Option<f32>,
        min_fling_velocity: f32,
        max_fling_velocity: f32,
        on_drag_canceled: Option<VoidCallback>,
    ) -> Self {
        debug_assert!(
            motion_start_distance_threshold.map_or(true, |t| t > 0.0),
            "motion threshold must be positive when present"
        );
        Self {
            carried_velocity,
            retain_momentum: carried_velocity != 0.0,
            motion_start_distance_threshold,
            offset_since_last_stop: motion_start_distance_threshold.map(|_| 0.0),
            last_non_stationary_timestamp: details.source_timestamp,
            reversed,
            min_fling_velocity,
            max_fling_velocity,
            on_drag_canceled,
        }
    }

    /// Velocity the interrupted fling would contribute on release.
    pub fn carried_velocity(&self) -> f32 {
        if self.retain_momentum {
            self.carried_velocity
        } else {
            0.0
        }
    }

    fn maybe_lose_momentum(&mut self, offset: f32, timestamp: Option<Duration>) {
        if self.retain_momentum
            && offset == 0.0
            && stationary_longer_than(
                timestamp,
                self.last_non_stationary_timestamp,
                MOMENTUM_RETAIN_STATIONARY_THRESHOLD,
            )
        {
            trace!("drag went stationary, dropping carried momentum");
            self.retain_momentum = false;
        }
    }

    /// Gate small deltas behind the motion-start threshold. Without
    /// timestamps the threshold cannot be evaluated and deltas pass
    /// through.
    fn adjust_for_scroll_start_threshold(
        &mut self,
        offset: f32,
        timestamp: Option<Duration>,
    ) -> f32 {
        let Some(timestamp) = timestamp else {
            return offset;
        };
        if offset == 0.0 {
            if self.motion_start_distance_threshold.is_some()
                && self.offset_since_last_stop.is_none()
                && stationary_longer_than(
                    Some(timestamp),
                    self.last_non_stationary_timestamp,
                    MOTION_STOPPED_THRESHOLD,
                )
            {
                // Motion has stopped; re-arm the threshold.
                self.offset_since_last_stop = Some(0.0);
            }
            return 0.0;
        }
        let Some(since_stop) = self.offset_since_last_stop else {
            return offset;
        };
        let threshold = self
            .motion_start_distance_threshold
            .unwrap_or_else(|| unreachable!("threshold armed without a configured distance"));
        let since_stop = since_stop + offset;
        self.offset_since_last_stop = Some(since_stop);
        if since_stop.abs() > threshold {
            self.offset_since_last_stop = None;
            if offset.abs() > BIG_THRESHOLD_BREAK_DISTANCE {
                offset
            } else {
                // Ease into motion rather than jumping by the full
                // accumulated distance.
                (threshold / 3.0).min(offset.abs()) * offset.signum()
            }
        } else {
            0.0
        }
    }

    /// Apply one drag update to the position through `delegate`.
    pub fn update(&mut self, details: &DragUpdateDetails, delegate: &mut dyn ScrollActivityDelegate) {
        let mut offset = details.primary_delta;
        if offset != 0.0 {
            self.last_non_stationary_timestamp = details.source_timestamp;
        }
        self.maybe_lose_momentum(offset, details.source_timestamp);
        offset = self.adjust_for_scroll_start_threshold(offset, details.source_timestamp);
        if offset == 0.0 {
            return;
        }
        if self.reversed {
            offset = -offset;
        }
        if details.is_scroll {
            delegate.apply_user_scroll_offset(offset);
        } else {
            delegate.apply_user_offset(offset);
        }
    }

    /// Finish the drag, returning the velocity the ballistic phase should
    /// start with. Disarms the cancel callback.
    pub fn end(&mut self, details: &DragEndDetails) -> f32 {
        // The velocity points in the opposite direction of the offset
        // delta; a downward swipe scrolls content up.
        let mut velocity = -details.primary_velocity;
        if self.reversed {
            velocity = -velocity;
        }
        if velocity.abs() < self.min_fling_velocity {
            velocity = 0.0;
        }
        if self.retain_momentum
            && velocity != 0.0
            && velocity.signum() == self.carried_velocity.signum()
        {
            velocity += self.carried_velocity;
        }
        velocity = velocity.clamp(-self.max_fling_velocity, self.max_fling_velocity);
        // A normal end is not a cancel.
        self.on_drag_canceled = None;
        velocity
    }
}

impl Drop for ScrollDragController {
    fn drop(&mut self) {
        if let Some(callback) = self.on_drag_canceled.take() {
            callback();
        }
    }
}

fn stationary_longer_than(
    now: Option<Duration>,
    last_motion: Option<Duration>,
    threshold: Duration,
) -> bool {
    match (now, last_motion) {
        (Some(now), Some(last)) => now.saturating_sub(last) > threshold,
        // No timestamps to compare; treat the pause as long enough.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::AxisDirection;

    #[derive(Default)]
    struct RecordingDelegate {
        offsets: Vec<f32>,
        scroll_offsets: Vec<f32>,
    }

    impl ScrollActivityDelegate for RecordingDelegate {
        fn axis_direction(&self) -> AxisDirection {
            AxisDirection::Down
        }

        fn set_pixels(&mut self, _pixels: f32) -> f32 {
            0.0
        }

        fn apply_user_offset(&mut self, delta: f32) {
            self.offsets.push(delta);
        }

        fn apply_user_scroll_offset(&mut self, delta: f32) {
            self.scroll_offsets.push(delta);
        }

        fn report_velocity(&mut self, _velocity: f32) {}
    }

    fn controller(carried: f32, threshold: Option<f32>) -> ScrollDragController {
        ScrollDragController::new(
            &DragStartDetails {
                source_timestamp: Some(Duration::ZERO),
            },
            false,
            carried,
            threshold,
            50.0,
            8000.0,
            None,
        )
    }

    #[test]
    fn test_update_forwards_deltas() {
        let mut drag = controller(0.0, None);
        let mut delegate = RecordingDelegate::default();
        drag.update(&DragUpdateDetails::at(-12.0, Duration::from_millis(5)), &mut delegate);
        assert_eq!(delegate.offsets, vec![-12.0]);
    }

    #[test]
    fn test_reversed_axis_negates_deltas() {
        let mut drag = ScrollDragController::new(
            &DragStartDetails::default(),
            true,
            0.0,
            None,
            50.0,
            8000.0,
            None,
        );
        let mut delegate = RecordingDelegate::default();
        drag.update(&DragUpdateDetails::new(-12.0), &mut delegate);
        assert_eq!(delegate.offsets, vec![12.0]);
    }

    #[test]
    fn test_scroll_deltas_use_scroll_path() {
        let mut drag = controller(0.0, None);
        let mut delegate = RecordingDelegate::default();
        drag.update(
            &DragUpdateDetails {
                primary_delta: -30.0,
                is_scroll: true,
                source_timestamp: None,
            },
            &mut delegate,
        );
        assert!(delegate.offsets.is_empty());
        assert_eq!(delegate.scroll_offsets, vec![-30.0]);
    }

    #[test]
    fn test_threshold_swallows_small_motion() {
        let mut drag = controller(0.0, Some(3.5));
        let mut delegate = RecordingDelegate::default();
        // 1px at a time: swallowed until the accumulated distance
        // crosses 3.5.
        for i in 1..=3 {
            drag.update(
                &DragUpdateDetails::at(-1.0, Duration::from_millis(i * 8)),
                &mut delegate,
            );
        }
        assert!(delegate.offsets.is_empty());
        drag.update(
            &DragUpdateDetails::at(-1.0, Duration::from_millis(32)),
            &mut delegate,
        );
        // The breakout forwards no more than the pointer actually
        // moved: exactly the 1px delta here.
        assert_eq!(delegate.offsets, vec![-1.0]);
    }

    #[test]
    fn test_threshold_breakout_damps_medium_delta() {
        let mut drag = controller(0.0, Some(3.5));
        let mut delegate = RecordingDelegate::default();
        // A single 5px delta crosses the threshold but stays under the
        // big-break distance, so it is damped to threshold / 3.
        drag.update(
            &DragUpdateDetails::at(-5.0, Duration::from_millis(8)),
            &mut delegate,
        );
        assert_eq!(delegate.offsets.len(), 1);
        assert!((delegate.offsets[0] + 3.5 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_big_delta_breaks_threshold_at_full_size() {
        let mut drag = controller(0.0, Some(3.5));
        let mut delegate = RecordingDelegate::default();
        drag.update(
            &DragUpdateDetails::at(-30.0, Duration::from_millis(8)),
            &mut delegate,
        );
        assert_eq!(delegate.offsets, vec![-30.0]);
    }

    #[test]
    fn test_threshold_rearms_after_motion_stops() {
        let mut drag = controller(0.0, Some(3.5));
        let mut delegate = RecordingDelegate::default();
        drag.update(
            &DragUpdateDetails::at(-30.0, Duration::from_millis(8)),
            &mut delegate,
        );
        assert_eq!(delegate.offsets.len(), 1);
        // Moving freely now.
        drag.update(
            &DragUpdateDetails::at(-2.0, Duration::from_millis(16)),
            &mut delegate,
        );
        assert_eq!(delegate.offsets.len(), 2);
        // Zero-delta events past the stop window re-arm the threshold.
        drag.update(
            &DragUpdateDetails::at(0.0, Duration::from_millis(100)),
            &mut delegate,
        );
        drag.update(
            &DragUpdateDetails::at(-1.0, Duration::from_millis(108)),
            &mut delegate,
        );
        assert_eq!(delegate.offsets.len(), 2);
    }

    #[test]
    fn test_momentum_lost_when_stationary() {
        let mut drag = controller(1200.0, None);
        assert_eq!(drag.carried_velocity(), 1200.0);
        let mut delegate = RecordingDelegate::default();
        // Stationary event well past the retention window.
        drag.update(
            &DragUpdateDetails::at(0.0, Duration::from_millis(60)),
            &mut delegate,
        );
        assert_eq!(drag.carried_velocity(), 0.0);
        let velocity = drag.end(&DragEndDetails {
            primary_velocity: -300.0,
        });
        assert_eq!(velocity, 300.0);
    }

    #[test]
    fn test_momentum_carried_into_matching_fling() {
        let mut drag = controller(1200.0, None);
        let velocity = drag.end(&DragEndDetails {
            primary_velocity: -300.0,
        });
        assert_eq!(velocity, 1500.0);
    }

    #[test]
    fn test_momentum_not_added_against_fling_direction() {
        let mut drag = controller(-1200.0, None);
        let velocity = drag.end(&DragEndDetails {
            primary_velocity: -300.0,
        });
        assert_eq!(velocity, 300.0);
    }

    #[test]
    fn test_slow_release_is_not_a_fling() {
        let mut drag = controller(0.0, None);
        let velocity = drag.end(&DragEndDetails {
            primary_velocity: -20.0,
        });
        assert_eq!(velocity, 0.0);
    }

    #[test]
    fn test_release_velocity_is_clamped() {
        let mut drag = controller(0.0, None);
        let velocity = drag.end(&DragEndDetails {
            primary_velocity: -20000.0,
        });
        assert_eq!(velocity, 8000.0);
    }

    #[test]
    fn test_cancel_callback_fires_on_drop_not_on_end() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let canceled = Arc::new(AtomicBool::new(false));
        let flag = canceled.clone();
        let drag = ScrollDragController::new(
            &DragStartDetails::default(),
            false,
            0.0,
            None,
            50.0,
            8000.0,
            Some(Box::new(move || flag.store(true, Ordering::SeqCst))),
        );
        drop(drag);
        assert!(canceled.load(Ordering::SeqCst));

        let canceled = Arc::new(AtomicBool::new(false));
        let flag = canceled.clone();
        let mut drag = ScrollDragController::new(
            &DragStartDetails::default(),
            false,
            0.0,
            None,
            50.0,
            8000.0,
            Some(Box::new(move || flag.store(true, Ordering::SeqCst))),
        );
        drag.end(&DragEndDetails::default());
        drop(drag);
        assert!(!canceled.load(Ordering::SeqCst));
    }
}
