//! Speaker documents

use serde::{Deserialize, Serialize};

use core_kernel::SpeakerId;

/// A person giving talks. Speakers are read-only to the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: SpeakerId,
    pub name: String,
}

impl Speaker {
    pub fn new(id: SpeakerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
