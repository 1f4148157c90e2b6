//! Action dispatch
//!
//! Routes a named action with its query parameters to the registry and the
//! backend. Transport-agnostic; the HTTP layer only maps names and statuses.

mod action;
mod dispatcher;
mod error;
mod params;

pub use action::{Action, ActionStatus};
pub use dispatcher::{attendee_external_id, ActionResponse, Dispatcher};
pub use error::DispatchError;
pub use params::Params;
