//! Service layer for the dashboard.
//!
//! This module contains the business logic for:
//! - Fetching raw payloads (`AvailabilitySource`, `HttpSource`)
//! - Normalizing payloads into records (`normalize`)
//! - The login gate (`SessionGate`)

pub mod normalize;
mod session;
mod source;

pub use normalize::{ParseOutcome, PayloadParser, parser_for};
pub use session::{
    AUTH_KEY, AuthRejection, Authenticator, Credentials, Session, SessionGate, StaticAuthenticator,
};
pub use source::{AvailabilitySource, HttpSource};
