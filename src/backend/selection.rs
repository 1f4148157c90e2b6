use super::ConferenceClient;
use crate::registry::MeetingRecord;
use std::sync::Arc;
use tracing::debug;

/// Backend API surface a meeting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientVariant {
    Legacy,
    /// Supports meeting features such as echo reduction
    Enhanced,
}

impl ClientVariant {
    /// Variant owning an existing meeting (or the default when there is none).
    ///
    /// Derived from the record alone so every action on a meeting lands on
    /// the variant that created it.
    pub fn for_meeting(force_enhanced: bool, record: Option<&MeetingRecord>) -> Self {
        if force_enhanced || record.is_some_and(|r| r.echo_reduction()) {
            ClientVariant::Enhanced
        } else {
            ClientVariant::Legacy
        }
    }

    /// Variant used to create a new meeting
    pub fn for_creation(force_enhanced: bool, echo_reduction: bool) -> Self {
        if force_enhanced || echo_reduction {
            ClientVariant::Enhanced
        } else {
            ClientVariant::Legacy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClientVariant::Legacy => "legacy",
            ClientVariant::Enhanced => "enhanced",
        }
    }
}

/// One client per backend variant plus the process-wide override flag
#[derive(Clone)]
pub struct BackendClients {
    legacy: Arc<dyn ConferenceClient>,
    enhanced: Arc<dyn ConferenceClient>,
    force_enhanced: bool,
}

impl BackendClients {
    pub fn new(
        legacy: Arc<dyn ConferenceClient>,
        enhanced: Arc<dyn ConferenceClient>,
        force_enhanced: bool,
    ) -> Self {
        Self {
            legacy,
            enhanced,
            force_enhanced,
        }
    }

    pub fn get(&self, variant: ClientVariant) -> Arc<dyn ConferenceClient> {
        match variant {
            ClientVariant::Legacy => Arc::clone(&self.legacy),
            ClientVariant::Enhanced => Arc::clone(&self.enhanced),
        }
    }

    pub fn for_meeting(&self, record: &MeetingRecord) -> Arc<dyn ConferenceClient> {
        let variant = ClientVariant::for_meeting(self.force_enhanced, Some(record));
        debug!("Meeting '{}' uses the {} client", record.title, variant.as_str());
        self.get(variant)
    }

    pub fn for_creation(&self, echo_reduction: bool) -> Arc<dyn ConferenceClient> {
        let variant = ClientVariant::for_creation(self.force_enhanced, echo_reduction);
        debug!("Creating meeting through the {} client", variant.as_str());
        self.get(variant)
    }
}
