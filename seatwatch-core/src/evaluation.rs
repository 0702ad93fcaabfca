use crate::availability::AvailabilityRecord;

/// Outcome of evaluating one watch against its group's batch. Consumed
/// immediately by the orchestrator and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    Triggered {
        message: String,
        current_value: f64,
        threshold: f64,
        matched: AvailabilityRecord,
    },
    NotTriggered {
        current_value: f64,
        threshold: f64,
    },
    NoAlert,
    Error {
        message: String,
    },
}

impl EvaluationResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Triggered { message, .. } | Self::Error { message } => message,
            Self::NotTriggered { .. } => "Alert not triggered",
            Self::NoAlert => "No alert configured",
        }
    }

    pub fn current_value(&self) -> f64 {
        match self {
            Self::Triggered { current_value, .. } | Self::NotTriggered { current_value, .. } => *current_value,
            Self::NoAlert | Self::Error { .. } => 0.0,
        }
    }

    pub fn threshold(&self) -> f64 {
        match self {
            Self::Triggered { threshold, .. } | Self::NotTriggered { threshold, .. } => *threshold,
            Self::NoAlert | Self::Error { .. } => 0.0,
        }
    }

    pub fn matched(&self) -> Option<&AvailabilityRecord> {
        match self {
            Self::Triggered { matched, .. } => Some(matched),
            _ => None,
        }
    }

    /// Short label for structured logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Triggered { .. } => "triggered",
            Self::NotTriggered { .. } => "not_triggered",
            Self::NoAlert => "no_alert",
            Self::Error { .. } => "error",
        }
    }
}
