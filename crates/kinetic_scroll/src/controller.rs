//! Scroll controller
//!
//! The owner-facing handle on scroll state. A controller can drive any
//! number of attached positions at once (one is the common case), and is
//! the factory for positions configured the way its owner wants them.

use std::sync::Arc;
use std::time::Duration;

use smallvec::SmallVec;
use tokio::sync::oneshot;
use tracing::debug;

use kinetic_core::{SharedStorage, StorageKey, Vsync};
use kinetic_physics::Easing;

use crate::metrics::ScrollMetrics;
use crate::physics::ScrollPhysics;
use crate::position::{ScrollPosition, ScrollPositionConfig, SharedScrollPosition};

/// Completion of a programmatic scroll animation.
///
/// Resolves when the animation finishes normally or is interrupted by a
/// new activity; it never hangs.
pub struct ScrollAnimation {
    receiver: oneshot::Receiver<()>,
    done: bool,
}

impl ScrollAnimation {
    pub(crate) fn new(receiver: oneshot::Receiver<()>) -> Self {
        Self {
            receiver,
            done: false,
        }
    }

    /// An animation that has already finished.
    pub(crate) fn completed() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        Self::new(rx)
    }

    /// Non-blocking completion check.
    pub fn is_complete(&mut self) -> bool {
        if self.done {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                self.done = true;
                true
            }
            Err(oneshot::error::TryRecvError::Empty) => false,
        }
    }

    /// Wait for the animation to finish or be interrupted.
    pub async fn wait(self) {
        if self.done {
            return;
        }
        // A dropped sender counts as finished.
        let _ = self.receiver.await;
    }
}

/// Creates and drives [`ScrollPosition`]s on behalf of their owner.
pub struct ScrollController {
    initial_scroll_offset: f32,
    keep_scroll_offset: bool,
    storage: Option<(SharedStorage, StorageKey)>,
    debug_label: Option<String>,
    positions: SmallVec<[SharedScrollPosition; 1]>,
}

impl Default for ScrollController {
    fn default() -> Self {
        Self {
            initial_scroll_offset: 0.0,
            keep_scroll_offset: true,
            storage: None,
            debug_label: None,
            positions: SmallVec::new(),
        }
    }
}

impl ScrollController {
    pub fn new(initial_scroll_offset: f32) -> Self {
        let mut controller = Self::default();
        controller.initial_scroll_offset = initial_scroll_offset;
        controller
    }

    pub fn with_debug_label(mut self, label: impl Into<String>) -> Self {
        self.debug_label = Some(label.into());
        self
    }

    /// Persist offsets under `key` and restore them when new positions
    /// attach.
    pub fn persisted_in(mut self, storage: SharedStorage, key: StorageKey) -> Self {
        self.storage = Some((storage, key));
        self.keep_scroll_offset = true;
        self
    }

    pub fn initial_scroll_offset(&self) -> f32 {
        self.initial_scroll_offset
    }

    pub(crate) fn storage_binding(&self) -> Option<(SharedStorage, StorageKey)> {
        self.storage.clone()
    }

    /// Build a position configured by this controller. The caller still
    /// owns attaching it.
    pub fn create_scroll_position(&self, physics: ScrollPhysics, vsync: Vsync) -> ScrollPosition {
        ScrollPosition::new(
            ScrollPositionConfig {
                physics,
                initial_pixels: self.initial_scroll_offset,
                keep_scroll_offset: self.keep_scroll_offset,
                storage: self.storage.clone(),
                debug_label: self.debug_label.clone(),
                ..Default::default()
            },
            vsync,
        )
    }

    // =========================================================================
    // Clients
    // =========================================================================

    pub fn has_clients(&self) -> bool {
        !self.positions.is_empty()
    }

    pub fn positions(&self) -> &[SharedScrollPosition] {
        &self.positions
    }

    /// The attached position. Panics unless exactly one is attached;
    /// multi-client controllers must address positions explicitly.
    pub fn position(&self) -> SharedScrollPosition {
        assert_eq!(
            self.positions.len(),
            1,
            "scroll controller {} has {} attached positions, expected exactly one",
            self.debug_label.as_deref().unwrap_or("(unlabeled)"),
            self.positions.len()
        );
        self.positions[0].clone()
    }

    /// Pixel offset of the single attached position.
    pub fn offset(&self) -> f32 {
        self.position().lock().unwrap().pixels()
    }

    pub fn attach(&mut self, position: SharedScrollPosition) {
        {
            let mut guard = position.lock().unwrap();
            assert!(
                !guard.is_attached(),
                "position already attached to a controller"
            );
            guard.mark_attached(true);
        }
        debug!(
            label = self.debug_label.as_deref().unwrap_or(""),
            clients = self.positions.len() + 1,
            "position attached"
        );
        self.positions.push(position);
    }

    pub fn detach(&mut self, position: &SharedScrollPosition) {
        let index = self
            .positions
            .iter()
            .position(|p| Arc::ptr_eq(p, position))
            .expect("detaching a position that was never attached");
        self.positions.remove(index);
        position.lock().unwrap().mark_attached(false);
    }

    // =========================================================================
    // Motion, fanned out to every client
    // =========================================================================

    pub fn jump_to(&self, value: f32) {
        assert!(self.has_clients(), "jump_to with no attached positions");
        for position in &self.positions {
            position.lock().unwrap().jump_to(value);
        }
    }

    /// Animate every client to `to`. One animation handle per client.
    pub fn animate_to(
        &self,
        to: f32,
        duration: Duration,
        curve: Easing,
    ) -> Vec<ScrollAnimation> {
        assert!(self.has_clients(), "animate_to with no attached positions");
        self.positions
            .iter()
            .map(|position| position.lock().unwrap().animate_to(to, duration, curve))
            .collect()
    }
}

impl Drop for ScrollController {
    fn drop(&mut self) {
        // Release the owner marks so still-live positions can attach to
        // a replacement controller.
        for position in &self.positions {
            // Tolerate poisoning: unwinding out of a panic that held the
            // position lock must not turn into a panic-in-drop abort.
            position
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .mark_attached(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out(position: ScrollPosition) -> SharedScrollPosition {
        let shared = position.into_shared();
        {
            let mut guard = shared.lock().unwrap();
            guard.apply_viewport_dimension(300.0);
            guard.apply_content_dimensions(0.0, 1000.0);
        }
        shared
    }

    #[test]
    fn test_create_position_uses_initial_offset() {
        let controller = ScrollController::new(150.0);
        let position = laid_out(
            controller.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        assert_eq!(position.lock().unwrap().pixels(), 150.0);
    }

    #[test]
    fn test_offset_reads_single_client() {
        let mut controller = ScrollController::new(0.0);
        let position = laid_out(
            controller.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        controller.attach(position.clone());
        assert_eq!(controller.offset(), 0.0);
        controller.jump_to(240.0);
        assert_eq!(controller.offset(), 240.0);
        controller.detach(&position);
        assert!(!controller.has_clients());
    }

    #[test]
    fn test_jump_fans_out_to_all_clients() {
        let mut controller = ScrollController::new(0.0);
        let first = laid_out(
            controller.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        let second = laid_out(
            controller.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        controller.attach(first.clone());
        controller.attach(second.clone());
        controller.jump_to(330.0);
        assert_eq!(first.lock().unwrap().pixels(), 330.0);
        assert_eq!(second.lock().unwrap().pixels(), 330.0);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn test_attach_panics_when_owned_by_another_controller() {
        let mut first = ScrollController::new(0.0);
        let mut second = ScrollController::new(0.0);
        let position = laid_out(
            first.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        first.attach(position.clone());
        second.attach(position);
    }

    #[test]
    fn test_detach_releases_ownership() {
        let mut first = ScrollController::new(0.0);
        let mut second = ScrollController::new(0.0);
        let position = laid_out(
            first.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        first.attach(position.clone());
        first.detach(&position);
        assert!(!position.lock().unwrap().is_attached());
        second.attach(position);
        assert!(second.has_clients());
    }

    #[test]
    #[should_panic(expected = "expected exactly one")]
    fn test_position_panics_with_no_clients() {
        let controller = ScrollController::new(0.0);
        let _ = controller.position();
    }

    #[test]
    fn test_animate_returns_one_handle_per_client() {
        let mut controller = ScrollController::new(0.0);
        let first = laid_out(
            controller.create_scroll_position(ScrollPhysics::clamping(), Vsync::new()),
        );
        controller.attach(first.clone());
        let mut animations =
            controller.animate_to(200.0, Duration::from_millis(100), Easing::Linear);
        assert_eq!(animations.len(), 1);
        // Drive the position to completion.
        let mut frames = 0;
        loop {
            let mut guard = first.lock().unwrap();
            guard.tick(Duration::from_micros(16_667));
            if !guard.is_scrolling() {
                break;
            }
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(animations[0].is_complete());
        assert_eq!(first.lock().unwrap().pixels(), 200.0);
    }
}
