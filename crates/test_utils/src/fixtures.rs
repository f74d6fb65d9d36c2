//! Pre-built Test Fixtures
//!
//! Speakers with fixed ids, so assertions can name them, and stores that
//! already know about them.

use fake::faker::name::en::Name;
use fake::Fake;
use once_cell::sync::Lazy;
use uuid::Uuid;

use core_kernel::SpeakerId;
use domain_talks::{InMemoryTalkStore, Speaker, TalkRepository};

static ADA: Lazy<Speaker> = Lazy::new(|| {
    Speaker::new(
        SpeakerId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_00a1)),
        "Ada Lovelace",
    )
});

static GRACE: Lazy<Speaker> = Lazy::new(|| {
    Speaker::new(
        SpeakerId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_00a2)),
        "Grace Hopper",
    )
});

/// Fixture for speaker test data
pub struct SpeakerFixtures;

impl SpeakerFixtures {
    pub fn ada() -> Speaker {
        ADA.clone()
    }

    pub fn grace() -> Speaker {
        GRACE.clone()
    }

    /// Both well-known speakers, in id order
    pub fn all() -> Vec<Speaker> {
        vec![Self::ada(), Self::grace()]
    }

    /// A speaker with a random id and a generated name
    pub fn random() -> Speaker {
        Speaker::new(SpeakerId::new(), Name().fake::<String>())
    }
}

/// An in-memory store holding the well-known speakers and no talks
pub async fn memory_store() -> InMemoryTalkStore {
    InMemoryTalkStore::with_speakers(SpeakerFixtures::all()).await
}

/// A repository over [`memory_store`]
pub async fn memory_repository() -> TalkRepository<InMemoryTalkStore> {
    TalkRepository::new(memory_store().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_speakers_are_stable() {
        assert_eq!(SpeakerFixtures::ada(), SpeakerFixtures::ada());
        assert!(SpeakerFixtures::ada().id < SpeakerFixtures::grace().id);
    }

    #[test]
    fn test_random_speaker_has_a_name() {
        assert!(!SpeakerFixtures::random().name.is_empty());
    }
}
