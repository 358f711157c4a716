//! Time-based attribute transitions over selections.
//!
//! The host owns the clock: it calls [`TransitionController::tick`] with the
//! current time and receives the [`TransitionEvent`]s produced since the last
//! call. Nothing here blocks or spawns.

mod config;
mod controller;
mod ease;
mod error;
mod interpolate;

pub use crate::config::{DEFAULT_DURATION, Timeline, TimelineRegistry, TransitionConfig};
pub use crate::controller::{
    TransitionController, TransitionEvent, TransitionHandle, TransitionState,
};
pub use crate::ease::Ease;
pub use crate::error::{TransitionError, TransitionResult};
pub use crate::interpolate::{Interpolator, Segment};
