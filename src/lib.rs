pub mod app;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod registry;
pub mod transcription;

pub use backend::{
    BackendClients, BackendError, ClientVariant, ConferenceClient, IdentityProvider,
    MemoryConferenceClient, Operation, StaticIdentity,
};
pub use config::Config;
pub use dispatch::{Action, ActionResponse, ActionStatus, DispatchError, Dispatcher, Params};
pub use http::{create_router, AppState};
pub use registry::{MeetingRecord, MeetingRegistry, MeetingRequest, RegistryError};
pub use transcription::{build_configuration, TranscriptionConfiguration, TranscriptionOptions};
