//! Scenario graph engine for branching social-engineering exercises.
//!
//! - [`scenario`]: the authored graph (steps, choices, debrief) and loading.
//! - [`engine`]: the trust/pressure transition and a conversation runtime.
//! - [`validate`]: the structural gate every scenario must pass.
//! - [`simulate`]: the automated player that replays every path.

pub mod audit;
pub mod banlist;
pub mod engine;
pub mod error;
pub mod scenario;
pub mod simulate;
pub mod validate;

pub use engine::trust_pressure::{apply_choice, Effect, Gauges, TrustPressureUpdate};
pub use engine::ConversationState;
pub use error::{ReplayError, StructuralError, ValidationFailure};
pub use scenario::Scenario;
pub use simulate::{simulate, simulate_corpus, CorpusReport, SimulationResult};
pub use validate::{validate, PathValidation};
