//! The agent loop: model boundary, session log and the driver
pub mod config;
pub mod driver;
pub mod model;
pub mod session;

pub use config::{DEFAULT_MAX_STEPS, GuideConfig};
pub use driver::{
    DriverState, GIVE_UP_MESSAGE, GuideDriver, GuideHandle, GuideOutcome, GuideSignal, GuideTask,
    StepRecord, Termination,
};
pub use model::{ChatMessage, Model, ModelRequest, RepeatingModel, Role, ScriptedModel};
pub use session::{
    GuideSession, InMemorySessionLog, PlanStep, SessionEvent, SessionEventType, SessionLog,
    SessionStatus,
};
