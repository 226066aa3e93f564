//! Scroll metrics
//!
//! An immutable description of what a scroll view looks like right now:
//! how far it can scroll, where it is, and how big the viewport is. Every
//! other component queries these values; only a position mutates them.

use std::fmt;

/// Direction in which content moves as the scroll offset increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisDirection {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl AxisDirection {
    pub fn axis(&self) -> Axis {
        match self {
            AxisDirection::Up | AxisDirection::Down => Axis::Vertical,
            AxisDirection::Left | AxisDirection::Right => Axis::Horizontal,
        }
    }

    /// Whether the axis runs counter to the reading direction, so raw
    /// pointer deltas must be negated before applying them.
    pub fn is_reversed(&self) -> bool {
        matches!(self, AxisDirection::Up | AxisDirection::Left)
    }
}

/// Scroll axis, ignoring direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// The direction the user is moving the content, from the user's point of
/// view. `Idle` whenever no user gesture is driving the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    Idle,
    /// Content moving toward larger offsets.
    Forward,
    /// Content moving toward smaller offsets.
    Reverse,
}

/// Read access to the current state of a scrollable, with derived queries.
///
/// Implementors guarantee `min_scroll_extent() <= max_scroll_extent()` and
/// `viewport_dimension() >= 0`. Accessors on a position that has not been
/// laid out yet panic rather than fabricate values.
pub trait ScrollMetrics {
    fn min_scroll_extent(&self) -> f32;
    fn max_scroll_extent(&self) -> f32;
    fn pixels(&self) -> f32;
    fn viewport_dimension(&self) -> f32;
    fn axis_direction(&self) -> AxisDirection;

    /// Content above/before the visible region.
    fn extent_before(&self) -> f32 {
        (self.pixels() - self.min_scroll_extent()).max(0.0)
    }

    /// How much of the viewport currently shows content (reduced by
    /// whatever portion hangs past an edge during overscroll).
    fn extent_inside(&self) -> f32 {
        debug_assert!(self.min_scroll_extent() <= self.max_scroll_extent());
        self.viewport_dimension()
            - (self.min_scroll_extent() - self.pixels()).clamp(0.0, self.viewport_dimension())
            - (self.pixels() - self.max_scroll_extent()).clamp(0.0, self.viewport_dimension())
    }

    /// Content below/after the visible region.
    fn extent_after(&self) -> f32 {
        (self.max_scroll_extent() - self.pixels()).max(0.0)
    }

    /// Whether the offset is outside the valid scroll range (overscrolled).
    fn out_of_range(&self) -> bool {
        self.pixels() < self.min_scroll_extent() || self.pixels() > self.max_scroll_extent()
    }

    /// Whether the offset sits exactly on an extent.
    fn at_edge(&self) -> bool {
        self.pixels() == self.min_scroll_extent() || self.pixels() == self.max_scroll_extent()
    }

    /// Immutable snapshot of the current values.
    fn snapshot(&self) -> FixedScrollMetrics
    where
        Self: Sized,
    {
        FixedScrollMetrics {
            min_scroll_extent: self.min_scroll_extent(),
            max_scroll_extent: self.max_scroll_extent(),
            pixels: self.pixels(),
            viewport_dimension: self.viewport_dimension(),
            axis_direction: self.axis_direction(),
        }
    }
}

/// Plain-data snapshot of scroll metrics at a moment in time.
///
/// Recreated on every dimension change; consumers never mutate one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScrollMetrics {
    pub min_scroll_extent: f32,
    pub max_scroll_extent: f32,
    pub pixels: f32,
    pub viewport_dimension: f32,
    pub axis_direction: AxisDirection,
}

impl ScrollMetrics for FixedScrollMetrics {
    fn min_scroll_extent(&self) -> f32 {
        self.min_scroll_extent
    }

    fn max_scroll_extent(&self) -> f32 {
        self.max_scroll_extent
    }

    fn pixels(&self) -> f32 {
        self.pixels
    }

    fn viewport_dimension(&self) -> f32 {
        self.viewport_dimension
    }

    fn axis_direction(&self) -> AxisDirection {
        self.axis_direction
    }
}

impl fmt::Display for FixedScrollMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}..[{:.1}]..{:.1} (viewport {:.1})",
            self.min_scroll_extent, self.pixels, self.max_scroll_extent, self.viewport_dimension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(min: f32, max: f32, pixels: f32, viewport: f32) -> FixedScrollMetrics {
        FixedScrollMetrics {
            min_scroll_extent: min,
            max_scroll_extent: max,
            pixels,
            viewport_dimension: viewport,
            axis_direction: AxisDirection::Down,
        }
    }

    #[test]
    fn test_extents_in_range() {
        let m = metrics(0.0, 1000.0, 150.0, 300.0);
        assert_eq!(m.extent_before(), 150.0);
        assert_eq!(m.extent_inside(), 300.0);
        assert_eq!(m.extent_after(), 850.0);
        assert!(!m.out_of_range());
        assert!(!m.at_edge());
    }

    #[test]
    fn test_extent_inside_shrinks_during_overscroll() {
        let m = metrics(0.0, 1000.0, -40.0, 300.0);
        assert_eq!(m.extent_before(), 0.0);
        assert_eq!(m.extent_inside(), 260.0);
        assert!(m.out_of_range());
    }

    #[test]
    fn test_at_edge() {
        assert!(metrics(0.0, 1000.0, 0.0, 300.0).at_edge());
        assert!(metrics(0.0, 1000.0, 1000.0, 300.0).at_edge());
        assert!(!metrics(0.0, 1000.0, 500.0, 300.0).at_edge());
    }

    #[test]
    fn test_degenerate_zero_range() {
        // min == max is a defined steady state, not an error.
        let m = metrics(0.0, 0.0, 0.0, 300.0);
        assert_eq!(m.extent_before(), 0.0);
        assert_eq!(m.extent_after(), 0.0);
        assert!(m.at_edge());
        assert!(!m.out_of_range());
    }

    #[test]
    fn test_axis_direction_reversed() {
        assert!(AxisDirection::Up.is_reversed());
        assert!(AxisDirection::Left.is_reversed());
        assert!(!AxisDirection::Down.is_reversed());
        assert!(!AxisDirection::Right.is_reversed());
        assert_eq!(AxisDirection::Left.axis(), Axis::Horizontal);
        assert_eq!(AxisDirection::Up.axis(), Axis::Vertical);
    }
}
