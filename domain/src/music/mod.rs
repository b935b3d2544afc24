//! Music domain: tracks, the per-guild playback session and its rules

pub mod playback_service;
pub mod queue_service;
pub mod repository;
pub mod session;
pub mod track;
pub mod value_objects;

pub use playback_service::PlaybackDomainService;
pub use queue_service::QueueDomainService;
pub use repository::SessionRepository;
pub use session::GuildPlaybackSession;
pub use track::{Requester, Track, TrackId};
pub use value_objects::{LoopMode, PlaybackState, QueuePosition, Volume};
