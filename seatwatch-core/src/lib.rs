pub mod alert;
pub mod availability;
pub mod evaluation;
pub mod itinerary;
pub mod notify;
pub mod repository;
pub mod watch;

pub use alert::{AlertConfig, TriggerRecord, DEFAULT_TRIGGER_HISTORY_LIMIT};
pub use availability::{AvailabilityError, AvailabilityRecord, AvailabilitySource};
pub use evaluation::EvaluationResult;
pub use itinerary::{FlightIdentity, ItinerarySnapshot, OfferView, RouteKey, SnapshotError};
pub use notify::{NotificationSender, NotifyError};
pub use repository::{StoreError, User, UserStore, WatchStore};
pub use watch::{SearchCriteria, Watch, WatchKind};
