//! Client-side execution: the pointer animation and the action executor

pub mod animator;
pub mod executor;

pub use animator::{CLICK_GRACE, InteractionAnimator, PRESS_PULSE, SETTLE_DELAY, TRAVEL_DELAY};
pub use executor::{ActionChannel, ActionExecutor};
