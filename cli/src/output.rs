//! Console output for command results

use colored::Colorize;
use jukebox_application::{
    NowPlaying, PlayTrackOutput, QueueSnapshot, ReapReport, SkipOutput, TrackEndOutcome,
    VoteOutcome,
};
use jukebox_domain::{Track, VoteEffect, VoteStatus};

/// Formats use case results for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn played(output: &PlayTrackOutput) -> String {
        match &output.started {
            Some(track) => format!("{} {}", "Now playing".green().bold(), track.display_title()),
            None => format!(
                "{} {} at #{}",
                "Queued".cyan(),
                output.track.display_title(),
                output.position.display_number()
            ),
        }
    }

    pub fn skipped(output: &SkipOutput) -> String {
        format!(
            "{} {}{}",
            "Skipped".yellow(),
            output.skipped.title(),
            Self::up_next(output.next.as_ref())
        )
    }

    pub fn vote(outcome: &VoteOutcome) -> String {
        match outcome {
            VoteOutcome::AutoSkipped { skipped, next } => format!(
                "{} {}{}",
                "Skipped".yellow(),
                skipped.title(),
                Self::up_next(next.as_ref())
            ),
            VoteOutcome::Recorded {
                approvals,
                required,
            } => format!("Vote recorded ({}/{} votes)", approvals, required),
            VoteOutcome::Applied(effect) => Self::effect(effect),
            VoteOutcome::Rejected => "Vote failed: it can no longer pass".red().to_string(),
            VoteOutcome::Closed(status) => Self::closed(*status),
        }
    }

    fn effect(effect: &VoteEffect) -> String {
        let label = "Vote passed:".green().bold();
        match effect {
            VoteEffect::Skipped { next } => {
                format!("{} skipped{}", label, Self::up_next(next.as_ref()))
            }
            VoteEffect::Stopped { cleared } => {
                format!("{} stopped, {} queued track(s) dropped", label, cleared)
            }
            VoteEffect::Cleared { count } => format!("{} cleared {} track(s)", label, count),
            VoteEffect::Stale => format!("{} but the track already changed", label),
            VoteEffect::NoEffect | VoteEffect::AlreadyApplied => label.to_string(),
        }
    }

    fn closed(status: VoteStatus) -> String {
        format!("Vote already {}", status).dimmed().to_string()
    }

    pub fn track_end(outcome: &TrackEndOutcome) -> String {
        match outcome {
            TrackEndOutcome::Ignored => "Track end ignored".dimmed().to_string(),
            TrackEndOutcome::Advanced { next: Some(track) } => {
                format!("{} {}", "Now playing".green().bold(), track.display_title())
            }
            TrackEndOutcome::Advanced { next: None } => "Queue finished".to_string(),
        }
    }

    pub fn now_playing(now: Option<&NowPlaying>) -> String {
        let Some(now) = now else {
            return "Nothing is playing".dimmed().to_string();
        };
        let mut out = format!(
            "{} {} ({}, volume {}%, loop {})",
            "Now:".cyan().bold(),
            now.track.display_title(),
            now.state,
            now.volume.as_percent(),
            now.loop_mode
        );
        if let Some(requester) = now.track.requester() {
            out.push_str(&format!(" requested by {}", requester.user_name));
        }
        out.push_str(&Self::up_next(now.up_next.as_ref()));
        out
    }

    pub fn queue(snapshot: &QueueSnapshot) -> String {
        if snapshot.is_empty() {
            return "Queue is empty".dimmed().to_string();
        }

        let mut out = String::new();
        if let Some(current) = &snapshot.current {
            out.push_str(&format!(
                "{} {} ({})\n",
                "Now:".cyan().bold(),
                current.display_title(),
                snapshot.state
            ));
        }
        for (index, track) in snapshot.tracks.iter().enumerate() {
            out.push_str(&format!("  {:>2}. {}\n", index + 1, track.display_title()));
        }

        let total = match snapshot.total_duration {
            Some(d) if !snapshot.tracks.is_empty() => format!(", {} total", clock(d.as_secs())),
            _ => String::new(),
        };
        out.push_str(&format!(
            "{} track(s) queued{}, loop {}, volume {}%",
            snapshot.tracks.len(),
            total,
            snapshot.loop_mode,
            snapshot.volume.as_percent()
        ));
        for vote in &snapshot.votes {
            out.push_str(&format!(
                "\n{} {} vote {}/{}",
                "Open:".yellow(),
                vote.vote_type,
                vote.approvals,
                vote.required
            ));
        }
        out
    }

    pub fn reaped(report: &ReapReport) -> String {
        format!(
            "Sweep: {} vote(s) expired, {} session(s) reaped",
            report.expired_votes, report.reaped_sessions
        )
    }

    fn up_next(next: Option<&Track>) -> String {
        match next {
            Some(track) => format!(", up next: {}", track.title()),
            None => String::new(),
        }
    }
}

fn clock(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}
