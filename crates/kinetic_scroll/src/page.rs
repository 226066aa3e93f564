//! Page-based scrolling
//!
//! The page specialization: geometry mapping offsets to page numbers, the
//! per-position page configuration, and [`PageController`], a scroll
//! controller that addresses content by page index instead of pixels.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use kinetic_core::Vsync;
use kinetic_physics::Easing;

use crate::controller::{ScrollAnimation, ScrollController};
use crate::metrics::FixedScrollMetrics;
use crate::physics::{PhysicsPolicy, ScrollPhysics};
use crate::position::{ScrollPosition, ScrollPositionConfig};

/// Offsets within this fraction of an exact page are treated as exactly
/// on it, absorbing float error from repeated layout round trips.
const PAGE_PRECISION_TOLERANCE: f32 = 1e-5;

/// Mapping between pixel offsets and fractional page numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Fraction of the viewport each page occupies. `1.0` is full-screen
    /// pages; smaller values show neighbors, larger values crop.
    pub viewport_fraction: f32,
}

impl PageGeometry {
    pub fn new(viewport_fraction: f32) -> Self {
        debug_assert!(viewport_fraction > 0.0);
        Self { viewport_fraction }
    }

    /// Leading inset that centers page zero when pages are larger than
    /// the viewport. Zero for fractions up to `1.0`.
    pub fn initial_page_offset(&self, viewport_dimension: f32) -> f32 {
        (viewport_dimension * (self.viewport_fraction - 1.0) / 2.0).max(0.0)
    }

    pub fn page_from_pixels(&self, pixels: f32, viewport_dimension: f32) -> f32 {
        let actual = (pixels - self.initial_page_offset(viewport_dimension)).max(0.0)
            / (viewport_dimension * self.viewport_fraction).max(1.0);
        let round = actual.round();
        if (actual - round).abs() < PAGE_PRECISION_TOLERANCE {
            round
        } else {
            actual
        }
    }

    pub fn pixels_from_page(&self, page: f32, viewport_dimension: f32) -> f32 {
        page * viewport_dimension * self.viewport_fraction
            + self.initial_page_offset(viewport_dimension)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Page behavior attached to a [`ScrollPosition`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub geometry: PageGeometry,
    /// Page shown before any persisted page is restored.
    pub initial_page: f32,
    /// Persist the page (not the pixel offset) across detach.
    pub keep_page: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            initial_page: 0.0,
            keep_page: true,
        }
    }
}

/// Scroll metrics plus the page mapping, as an immutable snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    pub metrics: FixedScrollMetrics,
    pub viewport_fraction: f32,
}

impl PageMetrics {
    pub fn new(metrics: FixedScrollMetrics, viewport_fraction: f32) -> Self {
        Self {
            metrics,
            viewport_fraction,
        }
    }

    /// Current fractional page, `None` while the viewport has no size.
    pub fn page(&self) -> Option<f32> {
        if self.metrics.viewport_dimension == 0.0 {
            return None;
        }
        let geometry = PageGeometry::new(self.viewport_fraction);
        Some(geometry.page_from_pixels(
            self.metrics
                .pixels
                .clamp(self.metrics.min_scroll_extent, self.metrics.max_scroll_extent),
            self.metrics.viewport_dimension,
        ))
    }
}

/// A [`ScrollController`] addressing content by page index.
///
/// Positions it creates carry a [`PageConfig`] and page-snapping physics,
/// so every release settles on a whole page.
pub struct PageController {
    controller: ScrollController,
    initial_page: f32,
    keep_page: bool,
    geometry: PageGeometry,
}

impl PageController {
    pub fn new(initial_page: f32, keep_page: bool, viewport_fraction: f32) -> Self {
        Self {
            controller: ScrollController::default(),
            initial_page,
            keep_page,
            geometry: PageGeometry::new(viewport_fraction),
        }
    }

    pub fn viewport_fraction(&self) -> f32 {
        self.geometry.viewport_fraction
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Build the position this controller should drive, layering page
    /// snapping outside the supplied physics.
    pub fn create_scroll_position(&self, physics: ScrollPhysics, vsync: Vsync) -> ScrollPosition {
        let snapping = ScrollPhysics::new([PhysicsPolicy::PageSnapping(self.geometry)]);
        ScrollPosition::new(
            ScrollPositionConfig {
                physics: snapping.applied_to(&physics),
                keep_scroll_offset: self.keep_page,
                page: Some(PageConfig {
                    geometry: self.geometry,
                    initial_page: self.initial_page,
                    keep_page: self.keep_page,
                }),
                storage: self.storage_binding(),
                ..Default::default()
            },
            vsync,
        )
    }

    /// Current fractional page of the attached position. Panics without
    /// exactly one attached client; `None` before its first layout.
    pub fn page(&self) -> Option<f32> {
        self.controller.position().lock().unwrap().page()
    }

    pub fn jump_to_page(&self, page: i32) {
        let position = self.controller.position();
        let mut position = position.lock().unwrap();
        let pixels = position.pixels_from_page(page as f32);
        position.jump_to(pixels);
    }

    pub fn animate_to_page(
        &self,
        page: i32,
        duration: Duration,
        curve: Easing,
    ) -> ScrollAnimation {
        let position = self.controller.position();
        let mut position = position.lock().unwrap();
        let pixels = position.pixels_from_page(page as f32);
        position.animate_to(pixels, duration, curve)
    }

    pub fn next_page(&self, duration: Duration, curve: Easing) -> ScrollAnimation {
        let current = self.page().expect("page controller used before layout");
        self.animate_to_page(current.round() as i32 + 1, duration, curve)
    }

    pub fn previous_page(&self, duration: Duration, curve: Easing) -> ScrollAnimation {
        let current = self.page().expect("page controller used before layout");
        self.animate_to_page(current.round() as i32 - 1, duration, curve)
    }
}

impl Deref for PageController {
    type Target = ScrollController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

impl DerefMut for PageController {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.controller
    }
}
