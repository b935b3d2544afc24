//! Domain error types

use thiserror::Error;

/// Malformed value objects and out-of-range inputs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Queue position {position} is out of range (queue has {len} tracks)")]
    OutOfRange { position: usize, len: usize },

    #[error("Track ID cannot be empty")]
    EmptyTrackId,

    #[error("Track title cannot be empty")]
    EmptyTitle,

    #[error("Track URL cannot be empty")]
    EmptyUrl,

    #[error("Invalid {kind} ID: {value}")]
    InvalidId { kind: &'static str, value: u64 },

    #[error("Vote threshold must be at least 1")]
    InvalidThreshold,

    #[error("Volume {0} is outside [0.0, 1.0]")]
    VolumeOutOfBounds(f32),
}

/// Named business rules that guard predicates enforce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessRule {
    StateTransition,
    MaxQueueSize,
    AlreadyPlaying,
    NotPlaying,
    NotPaused,
    NothingToPlay,
    NothingToSkip,
    TrackTooLong,
    DuplicateTrack,
}

impl BusinessRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessRule::StateTransition => "STATE_TRANSITION",
            BusinessRule::MaxQueueSize => "MAX_QUEUE_SIZE",
            BusinessRule::AlreadyPlaying => "ALREADY_PLAYING",
            BusinessRule::NotPlaying => "NOT_PLAYING",
            BusinessRule::NotPaused => "NOT_PAUSED",
            BusinessRule::NothingToPlay => "NOTHING_TO_PLAY",
            BusinessRule::NothingToSkip => "NOTHING_TO_SKIP",
            BusinessRule::TrackTooLong => "TRACK_TOO_LONG",
            BusinessRule::DuplicateTrack => "DUPLICATE_TRACK",
        }
    }
}

impl std::fmt::Display for BusinessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Business rule {rule} violated: {message}")]
    BusinessRuleViolation { rule: BusinessRule, message: String },

    #[error("{entity} with id '{id}' not found")]
    EntityNotFound { entity: &'static str, id: String },

    #[error("Concurrent modification detected for {entity}: {message}")]
    Concurrency { entity: &'static str, message: String },

    #[error("Cannot perform '{operation}' in state '{state}': {message}")]
    InvalidOperation {
        operation: &'static str,
        state: String,
        message: String,
    },
}

impl DomainError {
    pub fn rule(rule: BusinessRule, message: impl Into<String>) -> Self {
        DomainError::BusinessRuleViolation {
            rule,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Check if this error is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }

    /// The violated rule, if this is a business rule violation
    pub fn violated_rule(&self) -> Option<BusinessRule> {
        match self {
            DomainError::BusinessRuleViolation { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    /// Stable error code for the command surface
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::BusinessRuleViolation { .. } => "BUSINESS_RULE_VIOLATION",
            DomainError::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            DomainError::Concurrency { .. } => "CONCURRENCY_ERROR",
            DomainError::InvalidOperation { .. } => "INVALID_OPERATION",
        }
    }
}
