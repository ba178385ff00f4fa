/*
[INPUT]:  Bearer tokens from the external login flow
[OUTPUT]: Credential values and an observable credential source
[POS]:    Auth layer - credential handling for REST and stream access
[UPDATE]: When credential semantics or change notification change
*/

pub mod credential;

pub use credential::{Credential, CredentialSource};
