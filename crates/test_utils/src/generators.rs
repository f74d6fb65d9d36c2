//! Property-Based Test Generators
//!
//! Proptest strategies for talk payloads and paging input.

use proptest::collection::{btree_set, vec};
use proptest::prelude::*;

use core_kernel::SpeakerId;
use domain_talks::NewTalk;

/// A single normalised tag
pub fn tag_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}"
}

/// Raw tag input: may carry padding or be blank
pub fn raw_tag_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => tag_strategy(),
        1 => tag_strategy().prop_map(|tag| format!("  {}\t", tag)),
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
    ]
}

/// Headlines of a few plain words
pub fn headline_strategy() -> impl Strategy<Value = String> {
    vec("[A-Za-z]{2,10}", 1..6).prop_map(|words| words.join(" "))
}

/// A talk payload for the given speaker
pub fn new_talk_strategy(speaker_id: SpeakerId) -> impl Strategy<Value = NewTalk> {
    (headline_strategy(), headline_strategy(), btree_set(tag_strategy(), 0..4)).prop_map(
        move |(headline, description, tags)| {
            NewTalk::new(headline, description, speaker_id).with_tags(tags)
        },
    )
}

/// Page numbers as callers send them, including non-positive ones
pub fn page_number_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        1 => i64::MIN..=0i64,
        4 => 1i64..50,
    ]
}
