//! Form submission pipeline for the hackathon website.
//!
//! Raw form state is normalized, validated, and only then handed to the API
//! client, which retries transport-level failures with exponential back-off.
//! Callers always get an [`ApiResponse`]; no error escapes a service.
//!
//! ```text
//! RawContactForm ─▶ normalize ─▶ validate ─▶ ApiClient (RetryPolicy) ─▶ ApiResponse
//! ```

pub mod config;
pub mod errors;
pub mod normalize;
pub mod retry;
pub mod service;
pub mod transport;
pub mod types;
pub mod validation;

pub use config::Config;
pub use errors::{ApiError, ErrorKind, FieldError, SubmissionError};
pub use retry::RetryPolicy;
pub use service::{ContactSubmitter, RegistrationSubmitter, Services};
pub use transport::{ApiClient, HttpTransport, ReqwestTransport};
pub use types::{ApiResponse, RawContactForm, RawRegistrationForm};
