//! Kinetic Scroll Engine
//!
//! Scroll positions, the physics that govern them, and the controllers
//! that drive them.
//!
//! # Features
//!
//! - **Composable Physics**: clamping, bouncing, page snapping, and
//!   always/never policies, combined outer-to-inner
//! - **Activity Machine**: idle, hold, drag, ballistic, and driven
//!   animation states with explicit transitions
//! - **Gesture Handles**: drag and hold handles that go inert instead of
//!   misfiring when the position moves on
//! - **Paged Scrolling**: page controllers addressing content by index
//! - **Typed Notifications**: start/update/overscroll/end/direction
//!   events drained from a per-position outbox

pub mod activity;
pub mod controller;
pub mod drag;
pub mod metrics;
pub mod notification;
pub mod page;
pub mod physics;
pub mod position;
pub mod simulation;

pub use activity::{ActivityRequest, ScrollActivity, ScrollActivityDelegate};
pub use controller::{ScrollAnimation, ScrollController};
pub use drag::{DragEndDetails, DragStartDetails, DragUpdateDetails, ScrollDragController};
pub use metrics::{Axis, AxisDirection, FixedScrollMetrics, ScrollDirection, ScrollMetrics};
pub use notification::ScrollNotification;
pub use page::{PageConfig, PageController, PageGeometry, PageMetrics};
pub use physics::{PhysicsPolicy, ScrollPhysics, MAX_FLING_VELOCITY, MIN_FLING_VELOCITY};
pub use position::{
    ScrollAlignmentPolicy, ScrollContext, ScrollDragHandle, ScrollHoldHandle, ScrollPosition,
    ScrollPositionConfig, SharedScrollPosition,
};
pub use simulation::{BouncingScrollSimulation, ClampingScrollSimulation};
