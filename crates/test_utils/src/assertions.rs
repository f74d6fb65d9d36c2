//! Custom Test Assertions
//!
//! Ordering checks for listings and aggregations, with failure messages
//! that show the offending neighbours.

use domain_talks::{SpeakerTalkStats, TagTalkStats, TalkSummary};

/// Asserts that summaries come back in ascending id order
///
/// # Panics
///
/// Panics on the first pair out of order
pub fn assert_talks_in_id_order(talks: &[TalkSummary]) {
    for pair in talks.windows(2) {
        assert!(
            pair[0].id < pair[1].id,
            "Talks out of id order: {} before {}",
            pair[0].id,
            pair[1].id
        );
    }
}

/// Asserts that per-speaker counts never increase down the list
pub fn assert_speaker_stats_descending(stats: &[SpeakerTalkStats]) {
    for pair in stats.windows(2) {
        assert!(
            pair[0].talk_count >= pair[1].talk_count,
            "Speaker stats out of order: {} ({}) before {} ({})",
            pair[0].speaker_name,
            pair[0].talk_count,
            pair[1].speaker_name,
            pair[1].talk_count
        );
    }
}

/// Asserts that per-tag counts never increase down the list
pub fn assert_tag_stats_descending(stats: &[TagTalkStats]) {
    for pair in stats.windows(2) {
        assert!(
            pair[0].talk_count >= pair[1].talk_count,
            "Tag stats out of order: {} ({}) before {} ({})",
            pair[0].tag,
            pair[0].talk_count,
            pair[1].tag,
            pair[1].talk_count
        );
    }
}

/// Looks up the count recorded for `tag`, or zero
pub fn tag_count(stats: &[TagTalkStats], tag: &str) -> u64 {
    stats
        .iter()
        .find(|entry| entry.tag == tag)
        .map_or(0, |entry| entry.talk_count)
}
