//! Integration tests for the full scroll pipeline
//!
//! These tests verify that:
//! - Drag input flows through physics into pixel changes
//! - Ballistic motion settles exactly where the physics promise
//! - Controllers and page controllers drive attached positions
//! - Notifications describe a gesture from start to end

use std::time::Duration;

use kinetic_core::Vsync;
use kinetic_physics::Easing;
use kinetic_scroll::{
    DragEndDetails, DragStartDetails, DragUpdateDetails, PageController, ScrollController,
    ScrollDirection, ScrollMetrics, ScrollNotification, ScrollPhysics, ScrollPosition,
    SharedScrollPosition,
};

const FRAME: Duration = Duration::from_micros(16_667);

fn laid_out_position(physics: ScrollPhysics) -> SharedScrollPosition {
    let controller = ScrollController::new(0.0);
    let shared = controller
        .create_scroll_position(physics, Vsync::new())
        .into_shared();
    {
        let mut position = shared.lock().unwrap();
        assert!(position.apply_viewport_dimension(300.0));
        assert!(position.apply_content_dimensions(0.0, 1000.0));
    }
    shared
}

fn settle(position: &SharedScrollPosition) {
    let mut frames = 0;
    loop {
        let mut guard = position.lock().unwrap();
        guard.tick(FRAME);
        if !guard.is_scrolling() {
            break;
        }
        frames += 1;
        assert!(frames < 10_000, "position never settled");
    }
}

/// Three 50-pixel drag pulls move the content exactly 150 pixels.
#[test]
fn test_drag_sequence_accumulates() {
    let position = laid_out_position(ScrollPhysics::clamping());
    let drag = ScrollPosition::drag(&position, DragStartDetails::default(), None);
    for _ in 0..3 {
        drag.update(&DragUpdateDetails::new(-50.0));
    }
    drag.end(&DragEndDetails::default());
    settle(&position);
    assert_eq!(position.lock().unwrap().pixels(), 150.0);
}

/// A jump past the end leaves the offset out of range; the following
/// ballistic phase springs it back to rest exactly on the extent.
#[test]
fn test_out_of_range_jump_settles_exactly_on_extent() {
    let position = laid_out_position(ScrollPhysics::clamping());
    {
        let mut guard = position.lock().unwrap();
        guard.jump_to(1100.0);
        assert_eq!(guard.pixels(), 1100.0);
        assert!(guard.is_scrolling());
    }
    settle(&position);
    assert_eq!(position.lock().unwrap().pixels(), 1000.0);
}

/// A fling through physics decays, stops within range, and reports a
/// complete start/update/end notification sequence.
#[test]
fn test_fling_notification_lifecycle() {
    let position = laid_out_position(ScrollPhysics::clamping());
    position.lock().unwrap().drain_notifications();

    let drag = ScrollPosition::drag(&position, DragStartDetails::default(), None);
    drag.update(&DragUpdateDetails::new(-40.0));
    drag.end(&DragEndDetails {
        primary_velocity: -1200.0,
    });
    settle(&position);

    let notifications = position.lock().unwrap().drain_notifications();
    assert!(matches!(
        notifications.first(),
        Some(ScrollNotification::Start { drag: Some(_), .. })
    ));
    // The scroll ends, then the user direction resets to idle.
    assert!(matches!(
        notifications.last(),
        Some(ScrollNotification::Direction {
            direction: ScrollDirection::Idle,
            ..
        })
    ));
    assert!(matches!(
        notifications[notifications.len() - 2],
        ScrollNotification::End { .. }
    ));
    let update_count = notifications
        .iter()
        .filter(|n| matches!(n, ScrollNotification::Update { .. }))
        .count();
    // One update from the drag pull, many from ballistic frames.
    assert!(update_count > 5);
    let travelled: f32 = notifications
        .iter()
        .filter_map(|n| match n {
            ScrollNotification::Update { delta, .. } => Some(*delta),
            _ => None,
        })
        .sum();
    assert!((travelled - position.lock().unwrap().pixels()).abs() < 0.01);
}

/// Bouncing physics overscroll past the edge during a fling and spring
/// back to the extent.
#[test]
fn test_bouncing_fling_overscrolls_then_returns() {
    let position = laid_out_position(ScrollPhysics::bouncing());
    position.lock().unwrap().jump_to(900.0);
    settle(&position);

    let drag = ScrollPosition::drag(&position, DragStartDetails::default(), None);
    drag.update(&DragUpdateDetails::new(-10.0));
    drag.end(&DragEndDetails {
        primary_velocity: -4000.0,
    });

    let mut overshot = false;
    let mut frames = 0;
    loop {
        let mut guard = position.lock().unwrap();
        guard.tick(FRAME);
        if guard.pixels() > guard.max_scroll_extent() {
            overshot = true;
        }
        if !guard.is_scrolling() {
            break;
        }
        frames += 1;
        assert!(frames < 10_000);
    }
    assert!(overshot);
    assert_eq!(position.lock().unwrap().pixels(), 1000.0);
}

/// A controller multiplexes programmatic motion across its clients.
#[test]
fn test_controller_drives_attached_position() {
    let mut controller = ScrollController::new(100.0);
    let position = laid_out_position(ScrollPhysics::clamping());
    controller.attach(position.clone());

    controller.jump_to(600.0);
    assert_eq!(controller.offset(), 600.0);

    let mut animations = controller.animate_to(250.0, Duration::from_millis(150), Easing::Ease);
    settle(&position);
    assert_eq!(controller.offset(), 250.0);
    assert!(animations.iter_mut().all(|a| a.is_complete()));

    controller.detach(&position);
    assert!(!controller.has_clients());
}

/// Full-viewport pages: page 2 sits at pixel 800 in a 400-pixel
/// viewport, and jumping there reads back as exactly page 2.
#[test]
fn test_page_controller_addresses_by_page() {
    let mut controller = PageController::new(0.0, true, 1.0);
    let shared = controller
        .create_scroll_position(ScrollPhysics::clamping(), Vsync::new())
        .into_shared();
    {
        let mut position = shared.lock().unwrap();
        // Page positions correct themselves on the first viewport report.
        assert!(!position.apply_viewport_dimension(400.0));
        assert!(position.apply_viewport_dimension(400.0));
        assert!(position.apply_content_dimensions(0.0, 2000.0));
        assert_eq!(position.pixels_from_page(2.0), 800.0);
    }
    controller.attach(shared.clone());

    controller.jump_to_page(2);
    settle(&shared);
    assert_eq!(controller.page(), Some(2.0));
    assert_eq!(controller.offset(), 800.0);

    let _animation = controller.next_page(Duration::from_millis(120), Easing::EaseInOut);
    settle(&shared);
    assert_eq!(controller.page(), Some(3.0));
}

/// A mid-list release below fling velocity snaps to the nearest page.
#[test]
fn test_page_snapping_after_slow_release() {
    let mut controller = PageController::new(0.0, true, 1.0);
    let shared = controller
        .create_scroll_position(ScrollPhysics::clamping(), Vsync::new())
        .into_shared();
    {
        let mut position = shared.lock().unwrap();
        position.apply_viewport_dimension(400.0);
        position.apply_viewport_dimension(400.0);
        position.apply_content_dimensions(0.0, 2000.0);
    }
    controller.attach(shared.clone());

    let drag = ScrollPosition::drag(&shared, DragStartDetails::default(), None);
    // Pull a bit past the midpoint of page 0 -> 1.
    for _ in 0..6 {
        drag.update(&DragUpdateDetails::new(-40.0));
    }
    drag.end(&DragEndDetails::default());
    settle(&shared);
    assert_eq!(controller.page(), Some(1.0));
}
