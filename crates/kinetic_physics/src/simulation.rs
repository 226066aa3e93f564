//! Simulation contract

/// A one-dimensional motion described as a function of elapsed time.
///
/// Time is in seconds since the simulation started; positions are logical
/// pixels and velocities pixels per second. Implementations are pure:
/// evaluating at a time never mutates state, so the same simulation can be
/// re-queried and shared freely.
pub trait Simulation: Send {
    /// Position at `time` seconds.
    fn x(&self, time: f32) -> f32;

    /// Velocity at `time` seconds.
    fn dx(&self, time: f32) -> f32;

    /// Whether the motion has settled by `time` seconds.
    fn is_done(&self, time: f32) -> bool;
}
