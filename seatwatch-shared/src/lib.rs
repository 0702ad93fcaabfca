pub mod models;
pub mod pii;

pub use models::events::AlertTriggeredEvent;
pub use pii::Masked;
