//! Queue domain service
//!
//! Stateless operations over a session's pending queue. Each operation checks
//! its preconditions before touching the queue, so an `Err` always leaves the
//! queue exactly as it was.

use crate::core::error::DomainError;
use crate::music::session::GuildPlaybackSession;
use crate::music::track::Track;
use crate::music::value_objects::{LoopMode, PlaybackState, QueuePosition};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::time::Duration;

/// Queue rules and pure queue transformations
pub struct QueueDomainService;

impl QueueDomainService {
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 50;
    pub const DEFAULT_MAX_TRACK_DURATION: Duration = Duration::from_secs(3 * 60 * 60);

    /// Append a track; no dedup
    pub fn enqueue(queue: &mut VecDeque<Track>, track: Track) -> QueuePosition {
        let position = QueuePosition::tail_of(queue.len());
        queue.push_back(track);
        position
    }

    /// Insert a track so it plays next
    pub fn enqueue_next(queue: &mut VecDeque<Track>, track: Track) -> QueuePosition {
        queue.push_front(track);
        QueuePosition::front()
    }

    /// Remove the track at `index`, validated against the queue as it is now
    pub fn remove_at(queue: &mut VecDeque<Track>, index: usize) -> Result<Track, DomainError> {
        let position = QueuePosition::within(index, queue.len())?;
        // In range by construction
        queue
            .remove(position.index())
            .ok_or_else(|| DomainError::not_found("Track", position))
    }

    /// Empty the queue, returning how many tracks were dropped
    pub fn clear(queue: &mut VecDeque<Track>) -> usize {
        let count = queue.len();
        queue.clear();
        count
    }

    /// Permute the pending tracks in place
    pub fn shuffle<R: Rng + ?Sized>(queue: &mut VecDeque<Track>, rng: &mut R) {
        queue.make_contiguous().shuffle(rng);
    }

    /// Move a track between two positions
    pub fn move_track(
        queue: &mut VecDeque<Track>,
        from: usize,
        to: usize,
    ) -> Result<(), DomainError> {
        let from = QueuePosition::within(from, queue.len())?;
        let to = QueuePosition::within(to, queue.len())?;
        if from == to {
            return Ok(());
        }
        if let Some(track) = queue.remove(from.index()) {
            queue.insert(to.index(), track);
        }
        Ok(())
    }

    /// Put a finished track back according to the loop mode
    pub fn apply_loop(loop_mode: LoopMode, finished: Track, queue: &mut VecDeque<Track>) {
        match loop_mode {
            LoopMode::Off => {}
            LoopMode::Track => queue.push_front(finished),
            LoopMode::Queue => queue.push_back(finished),
        }
    }

    pub fn can_enqueue(queue_len: usize, max_queue_size: usize) -> bool {
        queue_len < max_queue_size
    }

    /// Tracks of unknown length are accepted
    pub fn validate_track_duration(track: &Track, max: Duration) -> bool {
        track.duration().is_none_or(|d| d <= max)
    }

    /// Total queue length; `None` if any track's duration is unknown
    pub fn total_duration<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Option<Duration> {
        tracks
            .into_iter()
            .try_fold(Duration::ZERO, |acc, track| Some(acc + track.duration()?))
    }

    /// The track that would play after the current one
    pub fn peek_next(session: &GuildPlaybackSession) -> Option<&Track> {
        match (session.loop_mode(), session.current_track()) {
            (LoopMode::Track, Some(current)) => Some(current),
            _ => session.queue().front(),
        }
    }

    /// Whether playback should continue once the current track ends
    pub fn should_auto_play_next(session: &GuildPlaybackSession) -> bool {
        if session.state() == PlaybackState::Stopped {
            return false;
        }
        if !session.queue().is_empty() {
            return true;
        }
        session.loop_mode() != LoopMode::Off && session.current_track().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ValidationError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn track(name: &str) -> Track {
        Track::from_url(name, format!("https://example.com/{}", name)).unwrap()
    }

    fn titles(queue: &VecDeque<Track>) -> Vec<&str> {
        queue.iter().map(|t| t.title()).collect()
    }

    fn abc() -> VecDeque<Track> {
        VecDeque::from(vec![track("A"), track("B"), track("C")])
    }

    #[test]
    fn test_enqueue_appends_in_order() {
        let mut queue = VecDeque::new();
        assert_eq!(QueueDomainService::enqueue(&mut queue, track("A")).index(), 0);
        assert_eq!(QueueDomainService::enqueue(&mut queue, track("B")).index(), 1);
        assert_eq!(titles(&queue), vec!["A", "B"]);
    }

    #[test]
    fn test_enqueue_does_not_dedup() {
        let mut queue = VecDeque::new();
        QueueDomainService::enqueue(&mut queue, track("A"));
        QueueDomainService::enqueue(&mut queue, track("A"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_enqueue_next_goes_to_front() {
        let mut queue = abc();
        let position = QueueDomainService::enqueue_next(&mut queue, track("Z"));
        assert_eq!(position.index(), 0);
        assert_eq!(titles(&queue), vec!["Z", "A", "B", "C"]);
    }

    #[test]
    fn test_remove_at_returns_removed_track() {
        let mut queue = abc();
        let removed = QueueDomainService::remove_at(&mut queue, 1).unwrap();
        assert_eq!(removed.title(), "B");
        assert_eq!(titles(&queue), vec!["A", "C"]);
    }

    #[test]
    fn test_remove_at_out_of_range_leaves_queue_untouched() {
        let mut queue = abc();
        let err = QueueDomainService::remove_at(&mut queue, 5).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(ValidationError::OutOfRange {
                position: 5,
                len: 3
            })
        );
        assert_eq!(titles(&queue), vec!["A", "B", "C"]);

        // One past the end is also out of range
        assert!(QueueDomainService::remove_at(&mut queue, 3).is_err());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_length_accounting_over_mixed_operations() {
        let mut queue = VecDeque::new();
        let mut expected = 0usize;
        for i in 0..10 {
            QueueDomainService::enqueue(&mut queue, track(&format!("t{}", i)));
            expected += 1;
            if i % 3 == 2 {
                QueueDomainService::remove_at(&mut queue, 0).unwrap();
                expected -= 1;
            }
            // Out of range removals never count
            let len = queue.len();
            assert!(QueueDomainService::remove_at(&mut queue, len).is_err());
            assert_eq!(queue.len(), expected);
        }

        assert_eq!(QueueDomainService::clear(&mut queue), expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut queue: VecDeque<Track> = (0..20).map(|i| track(&format!("t{}", i))).collect();
        let mut before: Vec<String> = queue.iter().map(|t| t.title().to_string()).collect();

        let mut rng = StdRng::seed_from_u64(7);
        QueueDomainService::shuffle(&mut queue, &mut rng);

        let mut after: Vec<String> = queue.iter().map(|t| t.title().to_string()).collect();
        assert_eq!(after.len(), 20);
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_move_track() {
        let mut queue = abc();
        QueueDomainService::move_track(&mut queue, 0, 2).unwrap();
        assert_eq!(titles(&queue), vec!["B", "C", "A"]);

        assert!(QueueDomainService::move_track(&mut queue, 0, 3).is_err());
        assert_eq!(titles(&queue), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_apply_loop() {
        let mut queue = VecDeque::from(vec![track("B")]);
        QueueDomainService::apply_loop(LoopMode::Track, track("A"), &mut queue);
        assert_eq!(titles(&queue), vec!["A", "B"]);

        QueueDomainService::apply_loop(LoopMode::Queue, track("C"), &mut queue);
        assert_eq!(titles(&queue), vec!["A", "B", "C"]);

        QueueDomainService::apply_loop(LoopMode::Off, track("D"), &mut queue);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_duration_rules() {
        let max = QueueDomainService::DEFAULT_MAX_TRACK_DURATION;
        let unknown = track("A");
        let short = track("B").with_duration(Duration::from_secs(60));
        let long = track("C").with_duration(max + Duration::from_secs(1));

        assert!(QueueDomainService::validate_track_duration(&unknown, max));
        assert!(QueueDomainService::validate_track_duration(&short, max));
        assert!(!QueueDomainService::validate_track_duration(&long, max));

        assert_eq!(
            QueueDomainService::total_duration([&short, &short]),
            Some(Duration::from_secs(120))
        );
        assert_eq!(QueueDomainService::total_duration([&short, &unknown]), None);
    }

    #[test]
    fn test_can_enqueue() {
        assert!(QueueDomainService::can_enqueue(49, 50));
        assert!(!QueueDomainService::can_enqueue(50, 50));
    }
}
