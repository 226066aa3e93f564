//! Kinetic physics primitives
//!
//! The numeric collaborators behind scrolling:
//!
//! - **Simulations**: position as a function of elapsed time, with a
//!   done-ness test ([`Simulation`], [`SpringSimulation`],
//!   [`FrictionSimulation`]).
//! - **Tolerances**: the epsilons below which motion counts as stopped.
//! - **Easing**: curves for driven (programmatic) animations.

pub mod easing;
pub mod friction;
pub mod simulation;
pub mod spring;
pub mod tolerance;

pub use easing::Easing;
pub use friction::FrictionSimulation;
pub use simulation::Simulation;
pub use spring::{ScrollSpringSimulation, SpringDescription, SpringSimulation, SpringType};
pub use tolerance::Tolerance;
