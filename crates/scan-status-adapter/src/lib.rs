/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public scan server adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{Credential, CredentialSource};

// Re-export commonly used types from http
pub use http::{ClientConfig, Result, ScanApiError, ScanClient, TaskQuery};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    StatusFrame,
    StatusWebSocket,
    StreamChannel,
    StreamEvent,
    TASK_STATUS_KIND,
    parse_status_frame,
};
