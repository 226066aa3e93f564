//! Scroll position
//!
//! Owns the pixel offset of one scrollable and the activity currently
//! driving it. All mutation funnels through here: layout pushes new
//! dimensions in, gestures come in through handles, programmatic motion
//! through `jump_to`/`animate_to`, and every resulting event lands in the
//! notification outbox for the owner to drain once per frame.
//!
//! The state is split in two: [`PositionInner`] holds the metrics,
//! physics, and outbox, and implements [`ScrollActivityDelegate`]; the
//! [`ScrollPosition`] wrapper holds the activity itself. Ticking borrows
//! the two halves disjointly, so an activity can move pixels while the
//! position retains ownership of it.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use kinetic_core::{SharedStorage, StorageError, StorageKey, Vsync};
use kinetic_physics::{Easing, Tolerance};

use crate::activity::{ActivityRequest, ScrollActivity, ScrollActivityDelegate};
use crate::controller::ScrollAnimation;
use crate::drag::{
    DragEndDetails, DragStartDetails, DragUpdateDetails, ScrollDragController, VoidCallback,
};
use crate::metrics::{AxisDirection, FixedScrollMetrics, ScrollDirection, ScrollMetrics};
use crate::notification::ScrollNotification;
use crate::page::PageConfig;
use crate::physics::ScrollPhysics;

const LAYOUT_MSG: &str = "scroll position used before it was laid out";

/// Hooks back into whatever owns the scrollable, so the position can
/// tell it when pointer handling should change.
pub trait ScrollContext: Send {
    /// Content should stop receiving pointer events (a fling or
    /// animation is in control).
    fn set_ignore_pointer(&mut self, _ignore: bool) {}

    /// Whether drag gestures can currently start at all.
    fn set_can_drag(&mut self, _can_drag: bool) {}
}

/// Where an `ensure_visible` target may move the position relative to
/// where it already is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlignmentPolicy {
    /// Go to the revealed offset regardless of direction.
    #[default]
    Explicit,
    /// Only scroll forward; the item is allowed to stay above the target.
    KeepVisibleAtEnd,
    /// Only scroll backward; the item is allowed to stay below the target.
    KeepVisibleAtStart,
}

/// Construction parameters for a [`ScrollPosition`].
pub struct ScrollPositionConfig {
    pub physics: ScrollPhysics,
    pub axis_direction: AxisDirection,
    pub initial_pixels: f32,
    /// Persist the offset on scroll end and restore it on request.
    pub keep_scroll_offset: bool,
    /// Present for positions that lay content out in viewport-sized pages.
    pub page: Option<PageConfig>,
    pub storage: Option<(SharedStorage, StorageKey)>,
    pub debug_label: Option<String>,
}

impl Default for ScrollPositionConfig {
    fn default() -> Self {
        Self {
            physics: ScrollPhysics::default(),
            axis_direction: AxisDirection::Down,
            initial_pixels: 0.0,
            keep_scroll_offset: true,
            page: None,
            storage: None,
            debug_label: None,
        }
    }
}

/// Metrics, physics, and the notification outbox. The mutation surface
/// activities drive.
struct PositionInner {
    physics: ScrollPhysics,
    axis_direction: AxisDirection,
    min_scroll_extent: Option<f32>,
    max_scroll_extent: Option<f32>,
    pixels: Option<f32>,
    viewport_dimension: Option<f32>,
    user_scroll_direction: ScrollDirection,
    /// Velocity most recently reported by the running activity, attached
    /// to overscroll notifications.
    reported_velocity: f32,
    drag_details: Option<DragStartDetails>,
    notifications: Vec<ScrollNotification>,
    keep_scroll_offset: bool,
    storage: Option<(SharedStorage, StorageKey)>,
    page: Option<PageConfig>,
    /// Page to restore once the viewport has a size.
    cached_page: Option<f32>,
    did_change_viewport_or_correction: bool,
}

impl ScrollMetrics for PositionInner {
    fn min_scroll_extent(&self) -> f32 {
        self.min_scroll_extent.expect(LAYOUT_MSG)
    }

    fn max_scroll_extent(&self) -> f32 {
        self.max_scroll_extent.expect(LAYOUT_MSG)
    }

    fn pixels(&self) -> f32 {
        self.pixels.expect(LAYOUT_MSG)
    }

    fn viewport_dimension(&self) -> f32 {
        self.viewport_dimension.expect(LAYOUT_MSG)
    }

    fn axis_direction(&self) -> AxisDirection {
        self.axis_direction
    }
}

impl PositionInner {
    fn laid_out(&self) -> bool {
        self.pixels.is_some()
            && self.viewport_dimension.is_some()
            && self.min_scroll_extent.is_some()
            && self.max_scroll_extent.is_some()
    }

    fn page_value(&self) -> Option<f32> {
        let config = self.page.as_ref()?;
        let pixels = self.pixels?;
        let viewport = self.viewport_dimension?;
        if viewport == 0.0 {
            return self.cached_page;
        }
        let min = self.min_scroll_extent?;
        let max = self.max_scroll_extent?;
        Some(
            config
                .geometry
                .page_from_pixels(pixels.clamp(min, max), viewport),
        )
    }

    fn during_drag(&self) -> bool {
        self.drag_details.is_some()
    }

    fn did_start_scroll(&mut self) {
        let metrics = self.snapshot();
        self.notifications.push(ScrollNotification::Start {
            metrics,
            drag: self.drag_details,
        });
    }

    fn did_update_scroll_position_by(&mut self, delta: f32) {
        let metrics = self.snapshot();
        self.notifications.push(ScrollNotification::Update {
            metrics,
            delta,
            during_drag: self.during_drag(),
        });
    }

    fn did_overscroll_by(&mut self, overscroll: f32) {
        let metrics = self.snapshot();
        self.notifications.push(ScrollNotification::Overscroll {
            metrics,
            overscroll,
            velocity: self.reported_velocity,
            during_drag: self.during_drag(),
        });
    }

    fn did_end_scroll(&mut self) {
        if !self.laid_out() {
            return;
        }
        let metrics = self.snapshot();
        self.notifications.push(ScrollNotification::End { metrics });
        if self.keep_scroll_offset {
            self.save_offset();
        }
    }

    fn update_user_scroll_direction(&mut self, direction: ScrollDirection) {
        if direction == self.user_scroll_direction {
            return;
        }
        self.user_scroll_direction = direction;
        if self.laid_out() {
            let metrics = self.snapshot();
            self.notifications
                .push(ScrollNotification::Direction { metrics, direction });
        }
    }

    /// Persist the offset (or page, for paged positions). Storage
    /// failures are logged, not surfaced; scrolling must not stall on a
    /// broken store.
    fn save_offset(&mut self) {
        let Some((storage, key)) = self.storage.clone() else {
            return;
        };
        let value = if self.page.is_some() {
            match self.page_value() {
                Some(page) => page,
                None => return,
            }
        } else {
            match self.pixels {
                Some(pixels) => pixels,
                None => return,
            }
        };
        let result = storage.lock().unwrap().write(&key, value);
        if let Err(error) = result {
            warn!(%error, key = %key.0, "failed to persist scroll offset");
        }
    }
}

impl ScrollActivityDelegate for PositionInner {
    fn axis_direction(&self) -> AxisDirection {
        self.axis_direction
    }

    fn set_pixels(&mut self, new_pixels: f32) -> f32 {
        let old_pixels = self.pixels.expect(LAYOUT_MSG);
        if new_pixels == old_pixels {
            return 0.0;
        }
        let snapshot = self.snapshot();
        let overscroll = self.physics.apply_boundary_conditions(&snapshot, new_pixels);
        debug_assert!(
            overscroll.abs() <= (new_pixels - old_pixels).abs() + 1e-3,
            "boundary conditions returned more overscroll than the delta"
        );
        let applied = new_pixels - overscroll;
        self.pixels = Some(applied);
        if applied != old_pixels {
            self.did_update_scroll_position_by(applied - old_pixels);
        }
        if overscroll != 0.0 {
            self.did_overscroll_by(overscroll);
            return overscroll;
        }
        0.0
    }

    fn apply_user_offset(&mut self, delta: f32) {
        self.update_user_scroll_direction(if delta > 0.0 {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Reverse
        });
        let snapshot = self.snapshot();
        let shaped = self.physics.apply_physics_to_user_offset(&snapshot, delta);
        let _ = self.set_pixels(snapshot.pixels - shaped);
    }

    fn apply_user_scroll_offset(&mut self, delta: f32) {
        self.update_user_scroll_direction(if delta > 0.0 {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Reverse
        });
        // Discrete wheel deltas clamp at the extents instead of
        // overscrolling.
        let target = (self.pixels.expect(LAYOUT_MSG) - delta)
            .clamp(self.min_scroll_extent(), self.max_scroll_extent());
        let _ = self.set_pixels(target);
    }

    fn report_velocity(&mut self, velocity: f32) {
        self.reported_velocity = velocity;
    }
}

/// A scroll position shared between its owner, a controller, and any
/// outstanding gesture handles.
pub type SharedScrollPosition = Arc<Mutex<ScrollPosition>>;

pub struct ScrollPosition {
    inner: PositionInner,
    /// Always `Some` between public calls; taken only mid-transition.
    activity: Option<ScrollActivity>,
    /// Bumped on every activity change; outstanding handles carry the
    /// generation they were minted at and go inert when it moves on.
    generation: u64,
    vsync: Vsync,
    context: Option<Box<dyn ScrollContext>>,
    /// Velocity of the motion a hold interrupted, fed into carried
    /// momentum when the hold becomes a drag.
    held_previous_velocity: f32,
    /// Routing slot of the live gesture handle, if any, so `absorb` can
    /// repoint it.
    gesture_binding: Option<Weak<Mutex<GestureBinding>>>,
    /// Set while a controller owns this position; at most one may.
    attached: bool,
    debug_label: Option<String>,
}

impl ScrollPosition {
    pub fn new(config: ScrollPositionConfig, vsync: Vsync) -> Self {
        let ScrollPositionConfig {
            physics,
            axis_direction,
            initial_pixels,
            keep_scroll_offset,
            page,
            storage,
            debug_label,
        } = config;
        // Paged positions cannot know their pixels until the viewport
        // has a size; everyone else starts at the configured offset.
        let pixels = if page.is_some() {
            None
        } else {
            Some(initial_pixels)
        };
        Self {
            inner: PositionInner {
                physics,
                axis_direction,
                min_scroll_extent: None,
                max_scroll_extent: None,
                pixels,
                viewport_dimension: None,
                user_scroll_direction: ScrollDirection::Idle,
                reported_velocity: 0.0,
                drag_details: None,
                notifications: Vec::new(),
                keep_scroll_offset,
                storage,
                page,
                cached_page: None,
                did_change_viewport_or_correction: false,
            },
            activity: Some(ScrollActivity::idle()),
            generation: 0,
            vsync,
            context: None,
            held_previous_velocity: 0.0,
            gesture_binding: None,
            attached: false,
            debug_label,
        }
    }

    pub fn into_shared(self) -> SharedScrollPosition {
        Arc::new(Mutex::new(self))
    }

    pub fn set_context(&mut self, context: Box<dyn ScrollContext>) {
        self.context = Some(context);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn has_pixels(&self) -> bool {
        self.inner.pixels.is_some()
    }

    pub fn has_content_dimensions(&self) -> bool {
        self.inner.min_scroll_extent.is_some() && self.inner.max_scroll_extent.is_some()
    }

    pub fn physics(&self) -> &ScrollPhysics {
        &self.inner.physics
    }

    /// Whether a controller currently owns this position.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn mark_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    pub fn is_scrolling(&self) -> bool {
        self.activity.as_ref().is_some_and(|a| a.is_scrolling())
    }

    pub fn velocity(&self) -> f32 {
        self.activity.as_ref().map_or(0.0, |a| a.velocity())
    }

    pub fn user_scroll_direction(&self) -> ScrollDirection {
        self.inner.user_scroll_direction
    }

    pub fn metrics(&self) -> FixedScrollMetrics {
        self.inner.snapshot()
    }

    /// Current page for paged positions, `None` before layout or for
    /// plain positions.
    pub fn page(&self) -> Option<f32> {
        self.inner.page_value()
    }

    /// Offset at which `page` would sit. Panics for non-paged positions
    /// or before layout.
    pub fn pixels_from_page(&self, page: f32) -> f32 {
        let config = self
            .inner
            .page
            .as_ref()
            .expect("pixels_from_page on a position without page layout");
        config
            .geometry
            .pixels_from_page(page, self.inner.viewport_dimension.expect(LAYOUT_MSG))
    }

    /// Take everything emitted since the previous drain, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<ScrollNotification> {
        std::mem::take(&mut self.inner.notifications)
    }

    // =========================================================================
    // Activity machinery
    // =========================================================================

    fn begin_activity(&mut self, new_activity: ScrollActivity) {
        self.held_previous_velocity = 0.0;
        let old = self.activity.take();
        let (was_scrolling, old_ignore) = old
            .as_ref()
            .map(|a| (a.is_scrolling(), a.should_ignore_pointer()))
            .unwrap_or((false, false));
        let now_scrolling = new_activity.is_scrolling();
        if was_scrolling && !now_scrolling {
            self.inner.did_end_scroll();
        }
        self.inner.drag_details = new_activity.drag_details();
        if let Some(old) = old {
            old.dispose();
        }
        let new_ignore = new_activity.should_ignore_pointer();
        debug!(
            label = self.debug_label.as_deref().unwrap_or(""),
            activity = new_activity.kind_name(),
            "activity change"
        );
        self.activity = Some(new_activity);
        self.generation = self.generation.wrapping_add(1);
        if old_ignore != new_ignore {
            if let Some(context) = self.context.as_mut() {
                context.set_ignore_pointer(new_ignore);
            }
        }
        if !was_scrolling && now_scrolling {
            self.inner.did_start_scroll();
        }
        if !now_scrolling {
            self.inner.update_user_scroll_direction(ScrollDirection::Idle);
        }
    }

    fn handle_request(&mut self, request: ActivityRequest) {
        match request {
            ActivityRequest::None => {}
            ActivityRequest::GoIdle => self.go_idle(),
            ActivityRequest::GoBallistic(velocity) => self.go_ballistic(velocity),
        }
    }

    pub fn go_idle(&mut self) {
        self.begin_activity(ScrollActivity::idle());
    }

    /// Hand the position to physics at `velocity`. Installs whatever
    /// simulation the physics produce, or goes idle if they produce
    /// none.
    pub fn go_ballistic(&mut self, velocity: f32) {
        debug_assert!(self.inner.laid_out(), "{LAYOUT_MSG}");
        let snapshot = self.inner.snapshot();
        match self
            .inner
            .physics
            .create_ballistic_simulation(&snapshot, velocity)
        {
            Some(simulation) => {
                let ticker = self.vsync.create_ticker();
                self.begin_activity(ScrollActivity::ballistic(simulation, ticker));
            }
            None => self.go_idle(),
        }
    }

    /// Advance the running activity by one frame and perform whatever
    /// transition it requests.
    pub fn tick(&mut self, dt: Duration) {
        let Some(activity) = self.activity.as_mut() else {
            return;
        };
        let request = activity.tick(&mut self.inner, dt);
        self.handle_request(request);
    }

    // =========================================================================
    // Programmatic motion
    // =========================================================================

    /// Discontinuously move to `value`: any running activity stops, the
    /// jump is reported as a complete scroll, and physics then settle
    /// the new offset (spring-back, page snap).
    pub fn jump_to(&mut self, value: f32) {
        self.go_idle();
        let old_pixels = self.inner.pixels.expect(LAYOUT_MSG);
        if value != old_pixels {
            self.inner.pixels = Some(value);
            self.inner.did_start_scroll();
            self.inner.did_update_scroll_position_by(value - old_pixels);
            self.inner.did_end_scroll();
        }
        self.go_ballistic(0.0);
    }

    /// Animate to `to` over `duration`. Degenerates to a jump for a zero
    /// duration or a target already within tolerance. The returned
    /// animation resolves when the motion finishes or is interrupted.
    pub fn animate_to(&mut self, to: f32, duration: Duration, curve: Easing) -> ScrollAnimation {
        let pixels = self.inner.pixels.expect(LAYOUT_MSG);
        let tolerance = self.inner.physics.tolerance();
        if duration.is_zero() || tolerance.near_equal(to, pixels) {
            self.jump_to(to);
            return ScrollAnimation::completed();
        }
        let ticker = self.vsync.create_ticker();
        let (activity, done) = ScrollActivity::driven(pixels, to, duration, curve, ticker);
        self.begin_activity(activity);
        ScrollAnimation::new(done)
    }

    /// Scroll so a region of content becomes visible. `reveal_offset`
    /// maps an alignment in `0.0..=1.0` to the offset that would reveal
    /// the region at that alignment; the owner computes it from its
    /// layout.
    pub fn ensure_visible(
        &mut self,
        reveal_offset: &dyn Fn(f32) -> f32,
        alignment: f32,
        policy: ScrollAlignmentPolicy,
        duration: Duration,
        curve: Easing,
    ) -> ScrollAnimation {
        let min = self.inner.min_scroll_extent();
        let max = self.inner.max_scroll_extent();
        let pixels = self.inner.pixels();
        let target = match policy {
            ScrollAlignmentPolicy::Explicit => reveal_offset(alignment).clamp(min, max),
            ScrollAlignmentPolicy::KeepVisibleAtEnd => {
                reveal_offset(1.0).clamp(min, max).max(pixels)
            }
            ScrollAlignmentPolicy::KeepVisibleAtStart => {
                reveal_offset(0.0).clamp(min, max).min(pixels)
            }
        };
        if target == pixels {
            return ScrollAnimation::completed();
        }
        if duration.is_zero() {
            self.jump_to(target);
            return ScrollAnimation::completed();
        }
        self.animate_to(target, duration, curve)
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// Stop current motion without starting a drag, keeping the
    /// interrupted velocity so a follow-up drag can carry it.
    pub fn hold(
        this: &SharedScrollPosition,
        on_hold_canceled: Option<VoidCallback>,
    ) -> ScrollHoldHandle {
        let binding = {
            let mut position = this.lock().unwrap();
            let previous_velocity = position.velocity();
            position.begin_activity(ScrollActivity::hold(on_hold_canceled));
            position.held_previous_velocity = previous_velocity;
            let binding = Arc::new(Mutex::new(GestureBinding {
                position: Arc::downgrade(this),
                generation: position.generation,
            }));
            position.gesture_binding = Some(Arc::downgrade(&binding));
            binding
        };
        ScrollHoldHandle { binding }
    }

    /// Start a drag gesture.
    pub fn drag(
        this: &SharedScrollPosition,
        details: DragStartDetails,
        on_drag_canceled: Option<VoidCallback>,
    ) -> ScrollDragHandle {
        let binding = {
            let mut position = this.lock().unwrap();
            let carried = position
                .inner
                .physics
                .carried_momentum(position.held_previous_velocity);
            let controller = ScrollDragController::new(
                &details,
                position.inner.axis_direction.is_reversed(),
                carried,
                position.inner.physics.drag_start_distance_motion_threshold(),
                position.inner.physics.min_fling_velocity(),
                position.inner.physics.max_fling_velocity(),
                on_drag_canceled,
            );
            position.begin_activity(ScrollActivity::drag(controller, details));
            let binding = Arc::new(Mutex::new(GestureBinding {
                position: Arc::downgrade(this),
                generation: position.generation,
            }));
            position.gesture_binding = Some(Arc::downgrade(&binding));
            binding
        };
        ScrollDragHandle { binding }
    }

    // =========================================================================
    // Layout protocol
    // =========================================================================

    /// Report the viewport's size along the scroll axis. Returns false
    /// when the position corrected its pixels and layout must run again.
    pub fn apply_viewport_dimension(&mut self, viewport_dimension: f32) -> bool {
        let old_viewport = self.inner.viewport_dimension;
        if old_viewport == Some(viewport_dimension) {
            return true;
        }
        self.inner.viewport_dimension = Some(viewport_dimension);
        self.inner.did_change_viewport_or_correction = true;
        if let Some(config) = self.inner.page.clone() {
            // Keep the current page, not the current pixels, across
            // viewport resizes.
            let old_pixels = self.inner.pixels;
            let page = match (old_pixels, old_viewport) {
                (Some(pixels), Some(viewport)) if viewport != 0.0 => {
                    config.geometry.page_from_pixels(pixels, viewport)
                }
                _ => self.inner.cached_page.unwrap_or(config.initial_page),
            };
            let new_pixels = config.geometry.pixels_from_page(page, viewport_dimension);
            if old_pixels != Some(new_pixels) {
                self.inner.pixels = Some(new_pixels);
                return false;
            }
        }
        true
    }

    /// Report the content's scrollable range. Dimension changes smaller
    /// than the default tolerance are ignored so float jitter in layout
    /// does not retrigger physics every frame.
    pub fn apply_content_dimensions(&mut self, min: f32, max: f32) -> bool {
        debug_assert!(min <= max);
        debug_assert!(
            self.inner.viewport_dimension.is_some(),
            "viewport dimension must be applied before content dimensions"
        );
        let (min, max) = if let Some(config) = &self.inner.page {
            // Paged layouts with a fractional viewport inset both ends so
            // the first and last pages can center.
            let offset = config
                .geometry
                .initial_page_offset(self.inner.viewport_dimension());
            let min = min + offset;
            (min, min.max(max - offset))
        } else {
            (min, max)
        };
        let tolerance = Tolerance::default();
        let unchanged = self
            .inner
            .min_scroll_extent
            .is_some_and(|m| tolerance.near_equal(m, min))
            && self
                .inner
                .max_scroll_extent
                .is_some_and(|m| tolerance.near_equal(m, max))
            && !self.inner.did_change_viewport_or_correction;
        if !unchanged {
            self.inner.min_scroll_extent = Some(min);
            self.inner.max_scroll_extent = Some(max);
            if self.inner.pixels.is_none() {
                self.inner.pixels = Some(min);
            }
            self.inner.did_change_viewport_or_correction = false;
            self.apply_new_dimensions();
        }
        true
    }

    fn apply_new_dimensions(&mut self) {
        let request = self
            .activity
            .as_ref()
            .map_or(ActivityRequest::None, |a| a.apply_new_dimensions());
        self.handle_request(request);
        let can_drag = {
            let snapshot = self.inner.snapshot();
            self.inner.physics.should_accept_user_offset(&snapshot)
        };
        if let Some(context) = self.context.as_mut() {
            context.set_can_drag(can_drag);
        }
    }

    /// Change the offset without notifications or physics, for use
    /// during layout. The caller is responsible for laying out again.
    pub fn correct_pixels(&mut self, value: f32) {
        self.inner.pixels = Some(value);
    }

    /// Shift the offset by `correction` during layout, e.g. when content
    /// is inserted above the visible region.
    pub fn correct_by(&mut self, correction: f32) {
        let pixels = self.inner.pixels.expect(LAYOUT_MSG);
        self.inner.pixels = Some(pixels + correction);
        self.inner.did_change_viewport_or_correction = true;
    }

    /// Take over another position's state, adopting its in-flight
    /// activity. Used when a scrollable swaps positions (changed physics
    /// or controller) without interrupting the user: a gesture handle fed
    /// by `other` keeps feeding the adoptive position.
    pub fn absorb(this: &SharedScrollPosition, mut other: ScrollPosition) {
        let mut position = this.lock().unwrap();
        position.inner.min_scroll_extent = other.inner.min_scroll_extent;
        position.inner.max_scroll_extent = other.inner.max_scroll_extent;
        position.inner.pixels = other.inner.pixels;
        position.inner.viewport_dimension = other.inner.viewport_dimension;
        position.inner.cached_page = other.inner.page_value().or(other.inner.cached_page);
        position.inner.user_scroll_direction = other.inner.user_scroll_direction;
        position.inner.drag_details = other.inner.drag_details.take();
        position
            .inner
            .notifications
            .append(&mut other.inner.notifications);
        if let Some(old) = position.activity.take() {
            old.dispose();
        }
        position.activity = Some(other.activity.take().unwrap_or_else(ScrollActivity::idle));
        position.held_previous_velocity = other.held_previous_velocity;
        position.generation = position.generation.wrapping_add(1);
        // Repoint the live gesture handle, if the binding still belongs
        // to the activity we just adopted. Stale bindings from earlier
        // gestures keep their old generation and stay inert.
        if let Some(binding) = other.gesture_binding.take() {
            if let Some(live) = binding.upgrade() {
                let mut live = live.lock().unwrap();
                if live.generation == other.generation {
                    live.position = Arc::downgrade(this);
                    live.generation = position.generation;
                    position.gesture_binding = Some(binding);
                }
            }
        }
        let ignore = position
            .activity
            .as_ref()
            .is_some_and(|a| a.should_ignore_pointer());
        if let Some(context) = position.context.as_mut() {
            context.set_ignore_pointer(ignore);
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Read the persisted offset (or page) back from storage and move
    /// there. A missing value is not an error.
    pub fn restore_offset(&mut self) -> Result<(), StorageError> {
        if !self.inner.keep_scroll_offset {
            return Ok(());
        }
        let Some((storage, key)) = self.inner.storage.clone() else {
            return Ok(());
        };
        let value = storage.lock().unwrap().read(&key)?;
        let Some(value) = value else {
            return Ok(());
        };
        if self.inner.page.is_some() {
            self.inner.cached_page = Some(value);
            if self.inner.laid_out() {
                let pixels = self.pixels_from_page(value);
                self.jump_to(pixels);
            }
        } else if self.inner.laid_out() {
            self.jump_to(value);
        } else {
            self.inner.pixels = Some(value);
        }
        Ok(())
    }

    // Internal entry points for the gesture handles.

    fn drag_update(&mut self, generation: u64, details: &DragUpdateDetails) {
        if self.generation != generation {
            return;
        }
        if let Some(ScrollActivity::Drag(drag)) = self.activity.as_mut() {
            drag.controller.update(details, &mut self.inner);
        }
    }

    fn drag_end(&mut self, generation: u64, details: &DragEndDetails) {
        if self.generation != generation {
            return;
        }
        let velocity = match self.activity.as_mut() {
            Some(ScrollActivity::Drag(drag)) => drag.controller.end(details),
            _ => return,
        };
        self.go_ballistic(velocity);
    }

    fn drag_cancel(&mut self, generation: u64) {
        if self.generation != generation {
            return;
        }
        if matches!(self.activity, Some(ScrollActivity::Drag(_))) {
            self.go_ballistic(0.0);
        }
    }

    fn hold_cancel(&mut self, generation: u64) {
        if self.generation != generation {
            return;
        }
        if matches!(self.activity, Some(ScrollActivity::Hold(_))) {
            self.go_ballistic(0.0);
        }
    }
}

impl ScrollMetrics for ScrollPosition {
    fn min_scroll_extent(&self) -> f32 {
        self.inner.min_scroll_extent()
    }

    fn max_scroll_extent(&self) -> f32 {
        self.inner.max_scroll_extent()
    }

    fn pixels(&self) -> f32 {
        self.inner.pixels()
    }

    fn viewport_dimension(&self) -> f32 {
        self.inner.viewport_dimension()
    }

    fn axis_direction(&self) -> AxisDirection {
        ScrollMetrics::axis_direction(&self.inner)
    }
}

impl Drop for ScrollPosition {
    fn drop(&mut self) {
        if let Some(activity) = self.activity.take() {
            activity.dispose();
        }
    }
}

/// Routing slot for a gesture handle. Handles resolve through this
/// rather than pointing at a position directly, so [`ScrollPosition::absorb`]
/// can repoint a live gesture at the adoptive position without
/// interrupting it.
struct GestureBinding {
    position: Weak<Mutex<ScrollPosition>>,
    generation: u64,
}

impl GestureBinding {
    /// Copy out the current target. The guard is released before the
    /// position itself is locked, so handles never hold both locks.
    fn target(binding: &Arc<Mutex<GestureBinding>>) -> (Weak<Mutex<ScrollPosition>>, u64) {
        let binding = binding.lock().unwrap();
        (binding.position.clone(), binding.generation)
    }
}

/// Handle for an in-progress hold. Goes inert instead of misfiring if
/// the position has moved on to another activity.
pub struct ScrollHoldHandle {
    binding: Arc<Mutex<GestureBinding>>,
}

impl ScrollHoldHandle {
    /// Release the hold; the position settles from where it stands.
    pub fn cancel(self) {
        let (position, generation) = GestureBinding::target(&self.binding);
        if let Some(position) = position.upgrade() {
            position.lock().unwrap().hold_cancel(generation);
        }
    }
}

/// Handle feeding an in-progress drag. Inert once the position has moved
/// on (a jump, a new gesture, detach).
pub struct ScrollDragHandle {
    binding: Arc<Mutex<GestureBinding>>,
}

impl ScrollDragHandle {
    pub fn update(&self, details: &DragUpdateDetails) {
        let (position, generation) = GestureBinding::target(&self.binding);
        if let Some(position) = position.upgrade() {
            position.lock().unwrap().drag_update(generation, details);
        }
    }

    /// Release the pointer, handing the position to ballistic physics.
    pub fn end(self, details: &DragEndDetails) {
        let (position, generation) = GestureBinding::target(&self.binding);
        if let Some(position) = position.upgrade() {
            position.lock().unwrap().drag_end(generation, details);
        }
    }

    pub fn cancel(self) {
        let (position, generation) = GestureBinding::target(&self.binding);
        if let Some(position) = position.upgrade() {
            position.lock().unwrap().drag_cancel(generation);
        }
    }
}
