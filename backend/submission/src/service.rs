//! Per-form submission services.
//!
//! Each submission runs `Received → Normalized → Validated → Submitting →
//! Succeeded | Failed`. A validation failure ends the run before anything is
//! sent. The real services talk to the backend through [`ApiClient`]; the mock
//! services run the same front half against a simulated backend. Which one is
//! used is decided once, in [`Services::from_config`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{Config, MockSettings};
use crate::errors::{ApiError, Result};
use crate::normalize::{normalize_contact, normalize_registration};
use crate::transport::{ApiClient, HttpTransport, MultipartBody};
use crate::types::{
    ApiResponse, ContactPayload, ContactReceipt, FormPayload, RawContactForm, RawRegistrationForm,
    RegistrationPayload, RegistrationReceipt, SubmissionStatus,
};
use crate::validation::{validate_contact, validate_registration, AgeBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Normalized,
    Validated,
    Submitting,
    Succeeded,
    Failed,
}

fn enter(form: &str, stage: SubmissionStage) {
    debug!("{form} submission: {stage:?}");
}

fn finish<T>(form: &str, result: std::result::Result<T, ApiError>) -> ApiResponse<T> {
    match &result {
        Ok(_) => {
            enter(form, SubmissionStage::Succeeded);
            info!("{form} submission succeeded");
        }
        Err(e) => {
            enter(form, SubmissionStage::Failed);
            warn!("{form} submission failed ({:?}): {e}", e.kind());
        }
    }
    ApiResponse::from(result)
}

fn prepare_registration(
    form: &RawRegistrationForm,
    bounds: AgeBounds,
) -> std::result::Result<RegistrationPayload, ApiError> {
    enter("registration", SubmissionStage::Received);
    let payload = normalize_registration(form);
    enter("registration", SubmissionStage::Normalized);
    validate_registration(&payload, bounds).into_result()?;
    enter("registration", SubmissionStage::Validated);
    Ok(payload)
}

fn prepare_contact(form: &RawContactForm) -> std::result::Result<ContactPayload, ApiError> {
    enter("contact", SubmissionStage::Received);
    let payload = normalize_contact(form);
    enter("contact", SubmissionStage::Normalized);
    validate_contact(&payload).into_result()?;
    enter("contact", SubmissionStage::Validated);
    Ok(payload)
}

#[async_trait]
pub trait RegistrationSubmitter: Send + Sync {
    async fn submit(&self, form: &RawRegistrationForm) -> ApiResponse<RegistrationReceipt>;
}

#[async_trait]
pub trait ContactSubmitter: Send + Sync {
    async fn submit(&self, form: &RawContactForm) -> ApiResponse<ContactReceipt>;
}

// ─────────────────────────────────────────────────────────
// Real services
// ─────────────────────────────────────────────────────────

pub struct RegistrationService<T> {
    client: Arc<ApiClient<T>>,
    endpoint: String,
    member_age: AgeBounds,
}

impl<T: HttpTransport> RegistrationService<T> {
    pub fn new(client: Arc<ApiClient<T>>, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.registration_endpoint.clone(),
            member_age: config.member_age,
        }
    }

    /// Multipart when a file is attached, JSON otherwise.
    async fn send(
        &self,
        payload: &RegistrationPayload,
    ) -> std::result::Result<RegistrationReceipt, ApiError> {
        enter("registration", SubmissionStage::Submitting);
        match &payload.attachment {
            Some(file) => {
                let fields = serde_json::to_value(payload).map_err(|e| ApiError::Unexpected {
                    detail: e.to_string(),
                })?;
                let body =
                    MultipartBody::from_json_object(&fields).file("attachment", file.clone());
                self.client.post_multipart(&self.endpoint, body).await
            }
            None => self.client.post_json(&self.endpoint, payload).await,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> RegistrationSubmitter for RegistrationService<T> {
    async fn submit(&self, form: &RawRegistrationForm) -> ApiResponse<RegistrationReceipt> {
        let result = match prepare_registration(form, self.member_age) {
            Ok(payload) => self.send(&payload).await,
            Err(e) => Err(e),
        };
        finish("registration", result)
    }
}

pub struct ContactService<T> {
    client: Arc<ApiClient<T>>,
    endpoint: String,
}

impl<T: HttpTransport> ContactService<T> {
    pub fn new(client: Arc<ApiClient<T>>, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.contact_endpoint.clone(),
        }
    }
}

#[async_trait]
impl<T: HttpTransport> ContactSubmitter for ContactService<T> {
    async fn submit(&self, form: &RawContactForm) -> ApiResponse<ContactReceipt> {
        let result = match prepare_contact(form) {
            Ok(payload) => {
                enter("contact", SubmissionStage::Submitting);
                self.client.post_json(&self.endpoint, &payload).await
            }
            Err(e) => Err(e),
        };
        finish("contact", result)
    }
}

// ─────────────────────────────────────────────────────────
// Mock services
// ─────────────────────────────────────────────────────────

/// Simulated backend: random latency and random failures.
#[derive(Debug, Clone)]
pub struct MockBackend {
    settings: MockSettings,
}

impl MockBackend {
    /// Reversed latency bounds are swapped and the failure rate is clamped to
    /// `0.0..=1.0` (NaN counts as zero), so `simulate` never panics.
    pub fn new(settings: MockSettings) -> Self {
        let (lo, hi) = settings.latency_ms.into_inner();
        let rate = settings.failure_rate;
        Self {
            settings: MockSettings {
                failure_rate: if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) },
                latency_ms: lo.min(hi)..=lo.max(hi),
            },
        }
    }

    pub async fn simulate(&self, payload: &FormPayload) -> std::result::Result<String, ApiError> {
        let rate = self.settings.failure_rate;
        let (latency, fail, id) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(self.settings.latency_ms.clone()),
                rng.gen_bool(rate),
                format!("mock-{:08x}", rng.gen::<u32>()),
            )
        };

        debug!(
            "Simulating {} submission ({latency}ms)",
            payload.form_name()
        );
        tokio::time::sleep(Duration::from_millis(latency)).await;

        if fail {
            return Err(ApiError::Server {
                status: 500,
                message: "Simulated server error. Please try again.".to_string(),
            });
        }
        Ok(id)
    }
}

pub struct MockRegistrationService {
    backend: MockBackend,
    member_age: AgeBounds,
}

impl MockRegistrationService {
    pub fn new(config: &Config) -> Self {
        Self {
            backend: MockBackend::new(config.mock.clone()),
            member_age: config.member_age,
        }
    }
}

#[async_trait]
impl RegistrationSubmitter for MockRegistrationService {
    async fn submit(&self, form: &RawRegistrationForm) -> ApiResponse<RegistrationReceipt> {
        let result = match prepare_registration(form, self.member_age) {
            Ok(payload) => {
                enter("registration", SubmissionStage::Submitting);
                self.backend
                    .simulate(&FormPayload::Registration(payload))
                    .await
                    .map(|id| RegistrationReceipt {
                        id,
                        status: SubmissionStatus::Submitted,
                        submitted_at: Some(Utc::now()),
                    })
            }
            Err(e) => Err(e),
        };
        finish("registration", result)
    }
}

pub struct MockContactService {
    backend: MockBackend,
}

impl MockContactService {
    pub fn new(config: &Config) -> Self {
        Self {
            backend: MockBackend::new(config.mock.clone()),
        }
    }
}

#[async_trait]
impl ContactSubmitter for MockContactService {
    async fn submit(&self, form: &RawContactForm) -> ApiResponse<ContactReceipt> {
        let result = match prepare_contact(form) {
            Ok(payload) => {
                enter("contact", SubmissionStage::Submitting);
                self.backend
                    .simulate(&FormPayload::Contact(payload))
                    .await
                    .map(|id| ContactReceipt {
                        id,
                        status: "sent".to_string(),
                        submitted_at: Some(Utc::now()),
                    })
            }
            Err(e) => Err(e),
        };
        finish("contact", result)
    }
}

// ─────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Services {
    pub registration: Arc<dyn RegistrationSubmitter>,
    pub contact: Arc<dyn ContactSubmitter>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.use_mock {
            info!("Using mock submission services");
            return Ok(Self {
                registration: Arc::new(MockRegistrationService::new(config)),
                contact: Arc::new(MockContactService::new(config)),
            });
        }

        info!("Submitting to {}", config.api_base_url);
        let client = Arc::new(ApiClient::from_config(config)?);
        Ok(Self {
            registration: Arc::new(RegistrationService::new(Arc::clone(&client), config)),
            contact: Arc::new(ContactService::new(client, config)),
        })
    }
}
