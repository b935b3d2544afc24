//! Democratic skip / stop / clear voting

pub mod entities;
pub mod rule;
pub mod services;
pub mod value_objects;

pub use entities::{ActiveVotes, Vote, VoteSession};
pub use rule::{RejectionPolicy, ThresholdPolicy};
pub use services::{CastOutcome, VoteEffect, VoteResultHandler, VotingDomainService};
pub use value_objects::{VoteChoice, VoteStatus, VoteType};
