//! Data model shared by the validator, normalizer, transport and services.
//!
//! `Raw*` types mirror unprocessed UI form state: every scalar is a string and
//! blank entries are allowed. The payload types are what the normalizer
//! produces and what is sent to the backend, in its camelCase wire format.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

// ─────────────────────────────────────────────────────────
// Raw form state
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTeamMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub country: String,
    pub nationality: String,
    pub age: String,
    pub linkedin: String,
    pub gender: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRegistrationForm {
    pub team_name: String,
    pub team_size: String,
    pub team_leader: RawTeamMember,
    pub team_members: Vec<RawTeamMember>,
    pub project_title: String,
    pub idea_summary: String,
    pub problem_statement: String,
    pub technology: String,
    pub alignment: String,
    pub has_prototype: bool,
    pub prototype_url: String,
    pub repository_url: String,
    pub challenge_areas: Vec<String>,
    pub declarations: Vec<String>,
    /// Supplied out of band (file picker), never part of the JSON form state.
    #[serde(skip)]
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

// ─────────────────────────────────────────────────────────
// Normalized payloads
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub country: String,
    pub nationality: String,
    pub age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub team_name: String,
    pub team_size: u32,
    pub team_leader: TeamMember,
    pub team_members: Vec<TeamMember>,
    pub project_title: String,
    pub idea_summary: String,
    pub problem_statement: String,
    pub technology: String,
    pub alignment: String,
    pub has_prototype: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototype_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    pub challenge_areas: Vec<String>,
    pub declarations: Vec<String>,
    /// Sent as a multipart file part, never inside the JSON body.
    #[serde(skip)]
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Registration(RegistrationPayload),
    Contact(ContactPayload),
}

impl FormPayload {
    pub fn form_name(&self) -> &'static str {
        match self {
            Self::Registration(_) => "registration",
            Self::Contact(_) => "contact",
        }
    }
}

/// An uploaded file. The size is the byte length of `bytes`.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// Avoid dumping file contents into logs.
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────
// Payload → raw conversions
// ─────────────────────────────────────────────────────────

impl From<&TeamMember> for RawTeamMember {
    fn from(member: &TeamMember) -> Self {
        Self {
            name: member.name.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            role: member.role.clone(),
            country: member.country.clone(),
            nationality: member.nationality.clone(),
            age: member.age.to_string(),
            linkedin: member.linkedin.clone().unwrap_or_default(),
            gender: member.gender.clone().unwrap_or_default(),
        }
    }
}

impl From<&RegistrationPayload> for RawRegistrationForm {
    fn from(payload: &RegistrationPayload) -> Self {
        Self {
            team_name: payload.team_name.clone(),
            team_size: payload.team_size.to_string(),
            team_leader: RawTeamMember::from(&payload.team_leader),
            team_members: payload.team_members.iter().map(RawTeamMember::from).collect(),
            project_title: payload.project_title.clone(),
            idea_summary: payload.idea_summary.clone(),
            problem_statement: payload.problem_statement.clone(),
            technology: payload.technology.clone(),
            alignment: payload.alignment.clone(),
            has_prototype: payload.has_prototype,
            prototype_url: payload.prototype_url.clone().unwrap_or_default(),
            repository_url: payload.repository_url.clone().unwrap_or_default(),
            challenge_areas: payload.challenge_areas.clone(),
            declarations: payload.declarations.clone(),
            attachment: payload.attachment.clone(),
        }
    }
}

impl From<&ContactPayload> for RawContactForm {
    fn from(payload: &ContactPayload) -> Self {
        Self {
            name: payload.name.clone(),
            email: payload.email.clone(),
            subject: payload.subject.clone(),
            message: payload.message.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Backend responses
// ─────────────────────────────────────────────────────────

/// Registration status reported by the backend. Statuses outside the known
/// set are kept verbatim in `Other` so a stored registration is never
/// reported as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    Submitted,
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Other(status) => status,
        }
    }
}

impl From<String> for SubmissionStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "submitted" => Self::Submitted,
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Other(status),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(status: SubmissionStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub id: String,
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Contact backends answer with free-form statuses such as `"sent"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Terminal result of a submission, as shown to the UI.
///
/// `success == true` may carry `data`; `success == false` always carries
/// `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_messages: Option<IndexMap<String, String>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            field_messages: None,
        }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(error.to_string()),
            field_messages: error.field_messages().cloned(),
        }
    }
}

impl<T> From<Result<T, ApiError>> for ApiResponse<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_receipt_decodes_backend_shape() {
        let receipt: RegistrationReceipt = serde_json::from_value(json!({
            "id": "reg-1",
            "status": "pending",
            "submittedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(receipt.status, SubmissionStatus::Pending);
        assert_eq!(receipt.submitted_at.unwrap().timestamp(), 1_704_067_200);
    }

    #[test]
    fn registration_receipt_tolerates_sparse_bodies() {
        let receipt: RegistrationReceipt =
            serde_json::from_value(json!({"id": "reg-9", "status": "queued"})).unwrap();
        assert_eq!(receipt.status, SubmissionStatus::Other("queued".into()));
        assert_eq!(receipt.submitted_at, None);
        assert_eq!(
            serde_json::to_value(&receipt).unwrap(),
            json!({"id": "reg-9", "status": "queued"})
        );
    }

    #[test]
    fn failure_response_serializes_without_data() {
        let resp: ApiResponse<ContactReceipt> = ApiResponse::failure(&ApiError::Timeout);
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "success": false, "message": "Request timeout" })
        );
    }

    #[test]
    fn attachment_is_not_part_of_json_payload() {
        let raw = RawRegistrationForm {
            attachment: Some(Attachment {
                file_name: "deck.pdf".into(),
                mime_type: "application/pdf".into(),
                bytes: vec![1, 2, 3],
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&raw).unwrap();
        assert!(value.get("attachment").is_none());
        assert!(value.get("teamName").is_some());
    }

    #[test]
    fn attachment_debug_hides_contents() {
        let attachment = Attachment {
            file_name: "logo.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![0; 4],
        };
        let rendered = format!("{attachment:?}");
        assert!(rendered.contains("size: 4"));
        assert!(!rendered.contains("bytes"));
    }
}
