//! In-memory meeting registry
//!
//! Maps a human-chosen meeting title to the backend meeting created for it:
//! - get-or-create with at most one in-flight backend creation per title
//! - capture pipeline bookkeeping per meeting
//! - removal when a meeting ends (no tombstones; the title is free again)

mod error;
mod record;
mod registry;

pub use error::RegistryError;
pub use record::{truncate_external_id, MeetingRecord, MeetingRequest, MAX_EXTERNAL_ID_LEN};
pub use registry::MeetingRegistry;
