//! Transcription configuration builder
//!
//! Turns the loosely-typed query parameters of a start-transcription action
//! into the engine-specific settings object the backend expects. Pure; no
//! registry or backend access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranscriptionError {
    #[error("Unknown transcription engine: {0}")]
    UnknownEngine(String),

    #[error("Invalid transcriptionStreamParams: {0}")]
    InvalidStreamParams(String),
}

/// Parameter-bag key → settings field, for the standard engine
const TRANSCRIBE_FIELDS: &[(&str, &str)] = &[
    ("contentIdentificationType", "ContentIdentificationType"),
    ("contentRedactionType", "ContentRedactionType"),
    ("enablePartialResultsStability", "EnablePartialResultsStabilization"),
    ("partialResultsStability", "PartialResultsStability"),
    ("piiEntityTypes", "PiiEntityTypes"),
    ("languageModelName", "LanguageModelName"),
    ("identifyLanguage", "IdentifyLanguage"),
    ("languageOptions", "LanguageOptions"),
    ("preferredLanguage", "PreferredLanguage"),
];

/// Parameter-bag key → settings field, for the medical engine
const TRANSCRIBE_MEDICAL_FIELDS: &[(&str, &str)] =
    &[("contentIdentificationType", "ContentIdentificationType")];

/// Settings the medical engine always carries
const TRANSCRIBE_MEDICAL_FIXED: &[(&str, &str)] =
    &[("Specialty", "PRIMARYCARE"), ("Type", "CONVERSATION")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionEngine {
    Transcribe,
    TranscribeMedical,
}

impl TranscriptionEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptionEngine::Transcribe => "transcribe",
            TranscriptionEngine::TranscribeMedical => "transcribe_medical",
        }
    }

    fn fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            TranscriptionEngine::Transcribe => TRANSCRIBE_FIELDS,
            TranscriptionEngine::TranscribeMedical => TRANSCRIBE_MEDICAL_FIELDS,
        }
    }

    fn fixed(self) -> &'static [(&'static str, &'static str)] {
        match self {
            TranscriptionEngine::Transcribe => &[],
            TranscriptionEngine::TranscribeMedical => TRANSCRIBE_MEDICAL_FIXED,
        }
    }
}

impl FromStr for TranscriptionEngine {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcribe" => Ok(TranscriptionEngine::Transcribe),
            "transcribe_medical" => Ok(TranscriptionEngine::TranscribeMedical),
            other => Err(TranscriptionError::UnknownEngine(other.to_string())),
        }
    }
}

/// Engine-specific settings, serialized as
/// `{"EngineTranscribeSettings": {...}}` or
/// `{"EngineTranscribeMedicalSettings": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TranscriptionConfiguration {
    EngineTranscribeSettings(Map<String, Value>),
    EngineTranscribeMedicalSettings(Map<String, Value>),
}

impl TranscriptionConfiguration {
    pub fn engine(&self) -> TranscriptionEngine {
        match self {
            TranscriptionConfiguration::EngineTranscribeSettings(_) => TranscriptionEngine::Transcribe,
            TranscriptionConfiguration::EngineTranscribeMedicalSettings(_) => {
                TranscriptionEngine::TranscribeMedical
            }
        }
    }

    pub fn settings(&self) -> &Map<String, Value> {
        match self {
            TranscriptionConfiguration::EngineTranscribeSettings(settings)
            | TranscriptionConfiguration::EngineTranscribeMedicalSettings(settings) => settings,
        }
    }
}

/// Inputs to [`build_configuration`] other than the engine name
#[derive(Debug, Clone, Default)]
pub struct TranscriptionOptions {
    pub language_code: Option<String>,
    pub region: Option<String>,
    /// Free-form parameter bag (`transcriptionStreamParams`)
    pub stream_params: Map<String, Value>,
}

impl TranscriptionOptions {
    /// Parses the JSON parameter bag; `None` yields an empty bag
    pub fn parse_stream_params(raw: Option<&str>) -> Result<Map<String, Value>, TranscriptionError> {
        match raw {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| TranscriptionError::InvalidStreamParams(e.to_string())),
            None => Ok(Map::new()),
        }
    }
}

/// Build the settings object for `engine`.
///
/// Only supplied keys are emitted; nothing is defaulted apart from the
/// medical engine's fixed fields.
pub fn build_configuration(
    engine: &str,
    options: &TranscriptionOptions,
) -> Result<TranscriptionConfiguration, TranscriptionError> {
    let engine: TranscriptionEngine = engine.parse()?;
    let mut settings = Map::new();

    for (field, value) in engine.fixed() {
        settings.insert((*field).to_string(), Value::String((*value).to_string()));
    }

    if let Some(language_code) = &options.language_code {
        settings.insert("LanguageCode".to_string(), Value::String(language_code.clone()));
    }
    if let Some(region) = &options.region {
        settings.insert("Region".to_string(), Value::String(region.clone()));
    }

    for (key, field) in engine.fields() {
        if let Some(value) = options.stream_params.get(*key) {
            settings.insert((*field).to_string(), value.clone());
        }
    }

    Ok(match engine {
        TranscriptionEngine::Transcribe => TranscriptionConfiguration::EngineTranscribeSettings(settings),
        TranscriptionEngine::TranscribeMedical => {
            TranscriptionConfiguration::EngineTranscribeMedicalSettings(settings)
        }
    })
}
