//! Behavioural tests for the talk repository over the in-memory store

use std::collections::HashSet;

use fake::faker::lorem::en::Sentence;
use fake::Fake;
use proptest::prelude::*;

use core_kernel::{SpeakerId, TalkId, VersionToken};
use domain_talks::{
    InMemoryTalkStore, NewTalk, Speaker, TalkError, TalkRepository, UpdatedTalk, CONFLICT_MESSAGE,
    TALK_PAGE_SIZE,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn repo_with_speakers(names: &[&str]) -> (TalkRepository<InMemoryTalkStore>, Vec<Speaker>) {
    let speakers: Vec<Speaker> = names
        .iter()
        .map(|name| Speaker::new(SpeakerId::new_v7(), *name))
        .collect();
    let store = InMemoryTalkStore::with_speakers(speakers.clone()).await;
    (TalkRepository::new(store), speakers)
}

// ============================================================================
// Create / Read
// ============================================================================

mod create_and_read {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_id_and_keeps_fields() {
        let (repo, speakers) = repo_with_speakers(&["Ada Lovelace"]).await;
        let speaker = &speakers[0];

        let talk = repo
            .create_talk(
                NewTalk::new("Analytical Engines", "Notes on the engine", speaker.id)
                    .with_event("victorian-tech-1843")
                    .with_tags(["history", " computing "]),
            )
            .await
            .unwrap();

        assert!(!talk.id.as_uuid().is_nil());
        assert_eq!(talk.headline, "Analytical Engines");
        assert_eq!(talk.description, "Notes on the engine");
        assert_eq!(talk.speaker_id, speaker.id);
        assert_eq!(talk.event_id.as_deref(), Some("victorian-tech-1843"));
        assert!(!talk.published);
        assert!(talk.has_tag("computing"));
        assert!(talk.has_tag("history"));
    }

    #[tokio::test]
    async fn test_create_normalizes_raw_tags() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let mut new_talk = NewTalk::new("Tags", "raw", speakers[0].id);
        new_talk.tags = ["  spaced  ".to_string(), String::new()].into_iter().collect();

        let talk = repo.create_talk(new_talk).await.unwrap();

        assert_eq!(talk.tags.len(), 1);
        assert!(talk.has_tag("spaced"));
    }

    #[tokio::test]
    async fn test_detail_merges_speaker() {
        let (repo, speakers) = repo_with_speakers(&["Grace Hopper"]).await;
        let talk = repo
            .create_talk(NewTalk::new("Nanoseconds", "A length of wire", speakers[0].id))
            .await
            .unwrap();

        let detail = repo.get_talk_detail(talk.id).await.unwrap();

        assert_eq!(detail.id, talk.id);
        assert_eq!(detail.description, "A length of wire");
        assert_eq!(detail.speaker, speakers[0]);
    }

    #[tokio::test]
    async fn test_detail_of_unknown_talk_is_not_found() {
        let (repo, _) = repo_with_speakers(&[]).await;

        let err = repo.get_talk_detail(TalkId::new()).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(err, TalkError::NotFound { ref entity, .. } if entity == "Talk"));
    }

    #[tokio::test]
    async fn test_detail_with_missing_speaker_is_not_found() {
        let (repo, _) = repo_with_speakers(&[]).await;
        let orphan = repo
            .create_talk(NewTalk::new("Orphan", "no speaker", SpeakerId::new()))
            .await
            .unwrap();

        let err = repo.get_talk_detail(orphan.id).await.unwrap_err();

        assert!(matches!(err, TalkError::NotFound { ref entity, .. } if entity == "Speaker"));
    }

    #[tokio::test]
    async fn test_get_speakers_in_id_order() {
        let (repo, mut speakers) = repo_with_speakers(&["Carol", "Alice", "Bob"]).await;
        speakers.sort_by_key(|s| s.id);

        let listed = repo.get_speakers().await.unwrap();

        assert_eq!(listed, speakers);
    }
}

// ============================================================================
// Update / Delete
// ============================================================================

mod update_and_delete {
    use super::*;

    fn edit(headline: &str, speaker_id: SpeakerId) -> UpdatedTalk {
        UpdatedTalk {
            headline: headline.to_string(),
            description: "revised".to_string(),
            speaker_id,
            published: true,
            tags: ["rust".to_string()].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_update_with_current_version() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let talk = repo
            .create_talk(NewTalk::new("Draft", "first", speakers[0].id).with_event("ev"))
            .await
            .unwrap();
        let editing = repo.get_talk_for_editing(talk.id).await.unwrap();

        let updated = repo
            .update_talk(talk.id, edit("Final", speakers[0].id), editing.version)
            .await
            .unwrap();

        assert_eq!(updated.id, talk.id);
        assert_eq!(updated.headline, "Final");
        assert!(updated.published);
        assert_eq!(updated.event_id.as_deref(), Some("ev"));

        let reread = repo.get_talk_for_editing(talk.id).await.unwrap();
        assert_eq!(reread.talk.headline, "Final");
        assert_ne!(reread.version, editing.version);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts_without_writing() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let talk = repo
            .create_talk(NewTalk::new("Draft", "first", speakers[0].id))
            .await
            .unwrap();
        let stale = repo.get_talk_for_editing(talk.id).await.unwrap();
        repo.update_talk(talk.id, edit("Winner", speakers[0].id), stale.version)
            .await
            .unwrap();
        let before = repo.get_talk_for_editing(talk.id).await.unwrap();

        let err = repo
            .update_talk(talk.id, edit("Loser", speakers[0].id), stale.version)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(err.to_string(), CONFLICT_MESSAGE);
        let after = repo.get_talk_for_editing(talk.id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_update_with_made_up_version_conflicts() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let talk = repo
            .create_talk(NewTalk::new("Draft", "first", speakers[0].id))
            .await
            .unwrap();

        let err = repo
            .update_talk(talk.id, edit("Guess", speakers[0].id), VersionToken::new())
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_unknown_talk_is_not_found() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;

        let err = repo
            .update_talk(TalkId::new(), edit("Nothing", speakers[0].id), VersionToken::new())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_editable_fields_round_trip_into_update() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let talk = repo
            .create_talk(NewTalk::new("Same", "unchanged", speakers[0].id).with_tags(["a", "b"]))
            .await
            .unwrap();
        let editing = repo.get_talk_for_editing(talk.id).await.unwrap();

        let updated = repo
            .update_talk(talk.id, editing.talk.clone().into(), editing.version)
            .await
            .unwrap();

        assert_eq!(updated, talk);
    }

    #[tokio::test]
    async fn test_delete_then_detail_is_not_found() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let talk = repo
            .create_talk(NewTalk::new("Short-lived", "gone soon", speakers[0].id))
            .await
            .unwrap();

        assert!(repo.delete_talk(talk.id).await.unwrap());

        let err = repo.get_talk_detail(talk.id).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!repo.delete_talk(talk.id).await.unwrap());
    }
}

// ============================================================================
// Listings, filters and search
// ============================================================================

mod listings {
    use super::*;

    #[tokio::test]
    async fn test_summaries_resolve_speaker_names() {
        let (repo, speakers) = repo_with_speakers(&["Barbara Liskov", "Edsger Dijkstra"]).await;
        for speaker in &speakers {
            repo.create_talk(NewTalk::new("Talk", "text", speaker.id))
                .await
                .unwrap();
        }
        repo.create_talk(NewTalk::new("Orphan", "text", SpeakerId::new()))
            .await
            .unwrap();

        let summaries = repo.get_talk_summaries(1).await.unwrap();

        assert_eq!(summaries.len(), 3);
        for summary in &summaries {
            let expected = speakers
                .iter()
                .find(|s| s.id == summary.speaker_id)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            assert_eq!(summary.speaker_name, expected);
        }
    }

    #[tokio::test]
    async fn test_pages_are_disjoint_and_contiguous() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let total = TALK_PAGE_SIZE as usize + 4;
        let mut created = HashSet::new();
        for n in 0..total {
            let talk = repo
                .create_talk(NewTalk::new(format!("Talk {n}"), "text", speakers[0].id))
                .await
                .unwrap();
            created.insert(talk.id);
        }

        let first = repo.get_talk_summaries(1).await.unwrap();
        let second = repo.get_talk_summaries(2).await.unwrap();
        let third = repo.get_talk_summaries(3).await.unwrap();

        assert_eq!(first.len(), TALK_PAGE_SIZE as usize);
        assert_eq!(second.len(), 4);
        assert!(third.is_empty());

        let mut ids: Vec<TalkId> = first.iter().chain(second.iter()).map(|s| s.id).collect();
        let unique: HashSet<TalkId> = ids.iter().copied().collect();
        assert_eq!(unique, created);

        // Listing order is id order, so page two continues where page one stopped
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[tokio::test]
    async fn test_page_zero_and_negative_mean_first_page() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        repo.create_talk(NewTalk::new("Only", "one", speakers[0].id))
            .await
            .unwrap();

        let first = repo.get_talk_summaries(1).await.unwrap();
        assert_eq!(repo.get_talk_summaries(0).await.unwrap(), first);
        assert_eq!(repo.get_talk_summaries(-3).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_talks_by_speaker() {
        let (repo, speakers) = repo_with_speakers(&["Ada", "Alan"]).await;
        for n in 0..3 {
            repo.create_talk(NewTalk::new(format!("Ada {n}"), "text", speakers[0].id))
                .await
                .unwrap();
        }
        repo.create_talk(NewTalk::new("Alan", "text", speakers[1].id))
            .await
            .unwrap();

        let adas = repo.get_talks_by_speaker(speakers[0].id, 1).await.unwrap();

        assert_eq!(adas.len(), 3);
        assert!(adas.iter().all(|s| s.speaker_id == speakers[0].id && s.speaker_name == "Ada"));
    }

    #[tokio::test]
    async fn test_talks_by_tag_only_returns_tagged_talks() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        repo.create_talk(NewTalk::new("Tagged", "x", speakers[0].id).with_tags(["rust", "async"]))
            .await
            .unwrap();
        repo.create_talk(NewTalk::new("Other", "x", speakers[0].id).with_tags(["go"]))
            .await
            .unwrap();
        repo.create_talk(NewTalk::new("Untagged", "x", speakers[0].id))
            .await
            .unwrap();

        let tagged = repo.get_talks_by_tag("rust", 1).await.unwrap();

        assert_eq!(tagged.len(), 1);
        assert!(tagged.iter().all(|s| s.tags.contains("rust")));
        assert!(repo.get_talks_by_tag("missing", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_headline_above_description() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        let in_description = repo
            .create_talk(NewTalk::new("Memory models", "Ownership without garbage", speakers[0].id))
            .await
            .unwrap();
        let in_headline = repo
            .create_talk(NewTalk::new("Ownership explained", "Memory without garbage", speakers[0].id))
            .await
            .unwrap();
        repo.create_talk(NewTalk::new("Unrelated", "Nothing to see", speakers[0].id))
            .await
            .unwrap();

        let results = repo.search_talks("ownership", 1).await.unwrap();

        let ids: Vec<TalkId> = results.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![in_headline.id, in_description.id]);
    }

    #[tokio::test]
    async fn test_search_is_paginated() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        for n in 0..(TALK_PAGE_SIZE + 1) {
            repo.create_talk(NewTalk::new(format!("Tokio {n}"), "runtime", speakers[0].id))
                .await
                .unwrap();
        }

        assert_eq!(repo.search_talks("tokio", 1).await.unwrap().len(), TALK_PAGE_SIZE as usize);
        assert_eq!(repo.search_talks("tokio", 2).await.unwrap().len(), 1);
    }
}

// ============================================================================
// Aggregations
// ============================================================================

mod aggregations {
    use super::*;

    #[tokio::test]
    async fn test_speaker_stats_sorted_by_count() {
        let (repo, speakers) = repo_with_speakers(&["Busy", "Quiet"]).await;
        for _ in 0..3 {
            repo.create_talk(NewTalk::new("Busy", "x", speakers[0].id))
                .await
                .unwrap();
        }
        repo.create_talk(NewTalk::new("Quiet", "x", speakers[1].id))
            .await
            .unwrap();

        let stats = repo.get_speaker_talk_stats().await.unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].speaker_name, "Busy");
        assert_eq!(stats[0].talk_count, 3);
        assert_eq!(stats[1].talk_count, 1);
    }

    #[tokio::test]
    async fn test_tag_stats_count_every_tag() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        repo.create_talk(NewTalk::new("A", "x", speakers[0].id).with_tags(["rust", "async"]))
            .await
            .unwrap();
        repo.create_talk(NewTalk::new("B", "x", speakers[0].id).with_tags(["rust"]))
            .await
            .unwrap();

        let stats = repo.get_tag_talk_stats().await.unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].tag, "rust");
        assert_eq!(stats[0].talk_count, 2);
        assert_eq!(stats[1].tag, "async");
        assert_eq!(stats[1].talk_count, 1);
    }
}

// ============================================================================
// Store failures
// ============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_store_is_propagated() {
        let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
        repo.store().set_available(false);

        let err = repo
            .create_talk(NewTalk::new("Offline", "x", speakers[0].id))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(repo.get_talk_summaries(1).await.unwrap_err().is_unavailable());

        repo.store().set_available(true);
        assert!(repo.get_talk_summaries(1).await.unwrap().is_empty());
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn created_talks_keep_their_fields(tags in proptest::collection::vec("[a-z]{1,8}", 0..5)) {
        let headline: String = Sentence(2..6).fake();
        let description: String = Sentence(5..15).fake();

        let talk = runtime().block_on(async {
            let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
            repo.create_talk(
                NewTalk::new(headline.clone(), description.clone(), speakers[0].id)
                    .with_tags(tags.iter()),
            )
            .await
            .unwrap()
        });

        prop_assert_eq!(&talk.headline, &headline);
        prop_assert_eq!(&talk.description, &description);
        prop_assert!(tags.iter().all(|tag| talk.has_tag(tag)));
    }

    #[test]
    fn tag_listing_never_leaks_other_tags(
        tagged in 0usize..12,
        untagged in 0usize..12,
    ) {
        let (listed, all_tagged) = runtime().block_on(async {
            let (repo, speakers) = repo_with_speakers(&["Ada"]).await;
            for n in 0..tagged {
                repo.create_talk(NewTalk::new(format!("t{n}"), "x", speakers[0].id).with_tags(["wanted", "extra"]))
                    .await
                    .unwrap();
            }
            for n in 0..untagged {
                repo.create_talk(NewTalk::new(format!("u{n}"), "x", speakers[0].id).with_tags(["extra"]))
                    .await
                    .unwrap();
            }
            let mut listed = Vec::new();
            let mut page = 1;
            loop {
                let batch = repo.get_talks_by_tag("wanted", page).await.unwrap();
                if batch.is_empty() {
                    break;
                }
                listed.extend(batch);
                page += 1;
            }
            let all_tagged = listed.iter().all(|s| s.tags.contains("wanted"));
            (listed.len(), all_tagged)
        });

        prop_assert!(all_tagged);
        prop_assert_eq!(listed, tagged);
    }
}

// ============================================================================
// Shared fixtures and generated input
// ============================================================================

mod with_fixtures {
    use super::*;
    use test_utils::{
        assert_tag_stats_descending, memory_repository, memory_store, NewTalkBuilder,
        SpeakerFixtures,
    };

    #[tokio::test]
    async fn test_concurrent_deletes_remove_once() {
        let repo = memory_repository().await;
        let talk = repo.create_talk(NewTalkBuilder::new().build()).await.unwrap();

        let (first, second) = tokio::join!(repo.delete_talk(talk.id), repo.delete_talk(talk.id));
        let removed = [first.unwrap(), second.unwrap()];

        assert_eq!(removed.iter().filter(|removed| **removed).count(), 1);
        assert_eq!(repo.store().talk_count().await, 0);
    }

    #[tokio::test]
    async fn test_fixture_speakers_resolve_in_listings() {
        let store = memory_store().await;
        let repo = TalkRepository::new(store.clone());
        let grace = SpeakerFixtures::grace();
        repo.create_talk(NewTalkBuilder::new().speaker(grace.id).build())
            .await
            .unwrap();

        let summaries = repo.get_talk_summaries(1).await.unwrap();
        assert_eq!(summaries[0].speaker_name, grace.name);
        assert_eq!(repo.get_speakers().await.unwrap(), SpeakerFixtures::all());
        assert_eq!(store.talk_count().await, 1);
    }

    #[tokio::test]
    async fn test_tag_stats_descend_with_many_tags() {
        let repo = memory_repository().await;
        for tags in [vec!["a", "b", "c"], vec!["b", "c"], vec!["c"], vec!["d"]] {
            repo.create_talk(NewTalkBuilder::new().tags(tags).build())
                .await
                .unwrap();
        }

        let stats = repo.get_tag_talk_stats().await.unwrap();
        assert_tag_stats_descending(&stats);
        assert_eq!(stats[0].tag, "c");
        assert_eq!(stats.len(), 4);
    }
}

mod generated {
    use super::*;
    use test_utils::{
        headline_strategy, memory_repository, new_talk_strategy, page_number_strategy,
        raw_tag_strategy, NewTalkBuilder, SpeakerFixtures,
    };

    const QUERY: &str = "zyzzyva quokka";

    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn search_results_hold_every_term_and_rank_headlines_first(
            fillers in proptest::collection::vec(new_talk_strategy(SpeakerFixtures::ada().id), 0..15),
            headline in headline_strategy(),
            description in headline_strategy(),
        ) {
            let (ids, details, in_headline, in_description) = runtime().block_on(async {
                let repo = memory_repository().await;
                for filler in fillers {
                    repo.create_talk(filler).await.unwrap();
                }
                // Only one of the two terms: must never match
                repo.create_talk(
                    NewTalkBuilder::new().headline(format!("{headline} zyzzyva")).build(),
                )
                .await
                .unwrap();
                let in_description = repo
                    .create_talk(
                        NewTalkBuilder::new()
                            .headline(headline.clone())
                            .description(format!("{description} quokka and zyzzyva"))
                            .build(),
                    )
                    .await
                    .unwrap();
                let in_headline = repo
                    .create_talk(
                        NewTalkBuilder::new()
                            .headline(format!("Zyzzyva {headline} Quokka"))
                            .description(description.clone())
                            .build(),
                    )
                    .await
                    .unwrap();

                let mut ids = Vec::new();
                let mut page = 1;
                loop {
                    let batch = repo.search_talks(QUERY, page).await.unwrap();
                    if batch.is_empty() {
                        break;
                    }
                    ids.extend(batch.into_iter().map(|summary| summary.id));
                    page += 1;
                }
                let mut details = Vec::new();
                for id in &ids {
                    details.push(repo.get_talk_detail(*id).await.unwrap());
                }
                (ids, details, in_headline.id, in_description.id)
            });

            for detail in &details {
                let text = words(&format!("{} {}", detail.headline, detail.description));
                for term in words(QUERY) {
                    prop_assert!(text.contains(&term), "{:?} lacks {}", detail.headline, term);
                }
            }
            prop_assert_eq!(ids, vec![in_headline, in_description]);
        }

        #[test]
        fn created_tags_are_normalised(raw in proptest::collection::vec(raw_tag_strategy(), 0..6)) {
            let talk = runtime().block_on(async {
                let repo = memory_repository().await;
                repo.create_talk(NewTalkBuilder::new().raw_tags(raw.clone()).build())
                    .await
                    .unwrap()
            });

            prop_assert_eq!(talk.tags, domain_talks::normalize_tags(&raw));
        }

        #[test]
        fn non_positive_pages_read_as_the_first(
            page in page_number_strategy(),
            count in 0usize..25,
        ) {
            let (requested, expected) = runtime().block_on(async {
                let repo = memory_repository().await;
                for n in 0..count {
                    repo.create_talk(NewTalkBuilder::new().headline(format!("Talk {n}")).build())
                        .await
                        .unwrap();
                }
                let requested = repo.get_talk_summaries(page).await.unwrap();
                let expected = repo.get_talk_summaries(page.max(1)).await.unwrap();
                (requested, expected)
            });

            prop_assert_eq!(requested, expected);
        }
    }
}
