//! Table access for the talks catalogue
//!
//! Each table type wraps a borrowed connection, holds the SQL for one table
//! and maps rows into plain row structs. Translating rows into domain
//! documents is the adapter's job.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database.

pub mod speakers;
pub mod talks;

pub use speakers::{SpeakerRow, SpeakerTable};
pub use talks::{SpeakerStatsRow, TagStatsRow, TalkRow, TalkTable, TalkWithSpeakerRow};
