pub mod evaluator;
pub mod executor;
pub mod gate;
pub mod grouping;
pub mod orchestrator;
pub mod pacing;

pub use evaluator::{AlertEvaluator, DEFAULT_ASSUMED_CAPACITY};
pub use executor::{ExecutorError, SearchExecutor};
pub use gate::NotificationGate;
pub use grouping::{GroupKeyBuilder, WatchGroup};
pub use orchestrator::{BatchOrchestrator, OrchestratorError, RunSummary};
pub use pacing::{FixedIntervalPacer, NoPacing, Pacer};
