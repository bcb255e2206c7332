//! Field-level validation.
//!
//! Every check is a pure function. Failures are reported as [`FieldError`]
//! lists (or plain booleans for the primitive checks), never as panics.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::errors::{ApiError, FieldError};
use crate::types::{Attachment, ContactPayload, RegistrationPayload, TeamMember};

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub const ALLOWED_FILE_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
    "image/gif",
];

pub const MAX_TEAM_SIZE: u32 = 5;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("EMAIL_REGEX: invalid regex pattern")
});

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("PHONE_REGEX: invalid regex pattern")
});

// ─────────────────────────────────────────────────────────
// Primitive checks
// ─────────────────────────────────────────────────────────

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_REGEX.is_match(s)
}

/// Spaces, hyphens and parentheses are ignored before matching.
pub fn is_valid_phone(s: &str) -> bool {
    let digits: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    PHONE_REGEX.is_match(&digits)
}

/// Absolute `http`/`https` URL with a host.
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

pub fn has_min_length(s: &str, min: usize) -> bool {
    s.trim().chars().count() >= min
}

pub fn has_max_length(s: &str, max: usize) -> bool {
    s.trim().chars().count() <= max
}

/// Inclusive age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBounds {
    pub min: u32,
    pub max: u32,
}

impl AgeBounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Stricter bound applied to team members in the registration flow.
    pub const fn registration() -> Self {
        Self::new(18, 100)
    }
}

impl Default for AgeBounds {
    fn default() -> Self {
        Self::new(16, 100)
    }
}

pub fn is_valid_age(age: u32, bounds: AgeBounds) -> bool {
    (bounds.min..=bounds.max).contains(&age)
}

// ─────────────────────────────────────────────────────────
// Aggregated checks
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ApiError::from_field_errors(&self.errors))
        }
    }
}

fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: String,
    label: &str,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    if !has_min_length(value, min) {
        errors.push(FieldError::validation(
            field,
            format!("{label} must be at least {min} characters long."),
        ));
    } else if let Some(max) = max.filter(|max| !has_max_length(value, *max)) {
        errors.push(FieldError::validation(
            field,
            format!("{label} must be no more than {max} characters long."),
        ));
    }
}

fn check_required(errors: &mut Vec<FieldError>, field: String, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::validation(field, format!("{label} is required.")));
    }
}

/// Validate one team member. Field paths are prefixed with `prefix`
/// (e.g. `teamMembers[0]`), or left bare when the prefix is empty.
pub fn validate_team_member(
    member: &TeamMember,
    prefix: &str,
    bounds: AgeBounds,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_length(&mut errors, field_path(prefix, "name"), "Name", &member.name, 2, Some(100));

    if !is_valid_email(&member.email) {
        errors.push(FieldError::validation(
            field_path(prefix, "email"),
            "Please enter a valid email address.",
        ));
    }

    if !is_valid_phone(&member.phone) {
        errors.push(FieldError::validation(
            field_path(prefix, "phone"),
            "Please enter a valid phone number.",
        ));
    }

    check_length(&mut errors, field_path(prefix, "role"), "Role", &member.role, 2, Some(100));
    check_required(&mut errors, field_path(prefix, "country"), "Country", &member.country);
    check_required(
        &mut errors,
        field_path(prefix, "nationality"),
        "Nationality",
        &member.nationality,
    );

    if !is_valid_age(member.age, bounds) {
        errors.push(FieldError::validation(
            field_path(prefix, "age"),
            format!("Age must be between {} and {}.", bounds.min, bounds.max),
        ));
    }

    if let Some(linkedin) = member.linkedin.as_deref() {
        if !is_valid_url(linkedin) {
            errors.push(FieldError::validation(
                field_path(prefix, "linkedin"),
                "Please enter a valid LinkedIn URL.",
            ));
        }
    }

    errors
}

pub fn validate_file_upload(file: &Attachment) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if file.size() > MAX_FILE_SIZE {
        errors.push(FieldError::validation(
            "attachment",
            "File size must be less than 10MB.",
        ));
    }
    if !ALLOWED_FILE_TYPES.contains(&file.mime_type.as_str()) {
        errors.push(FieldError::validation(
            "attachment",
            "File type not supported. Please upload a PDF, Word document or image.",
        ));
    }
    errors
}

pub fn validate_contact(payload: &ContactPayload) -> ValidationResult {
    let mut errors = Vec::new();

    check_length(&mut errors, "name".into(), "Name", &payload.name, 2, Some(100));
    if !is_valid_email(&payload.email) {
        errors.push(FieldError::validation("email", "Please enter a valid email address."));
    }
    check_length(&mut errors, "subject".into(), "Subject", &payload.subject, 5, Some(200));
    check_length(&mut errors, "message".into(), "Message", &payload.message, 10, Some(2000));

    ValidationResult::from_errors(errors)
}

pub fn validate_registration(payload: &RegistrationPayload, bounds: AgeBounds) -> ValidationResult {
    let mut errors = Vec::new();

    check_length(&mut errors, "teamName".into(), "Team name", &payload.team_name, 2, Some(100));

    let size_ok = (1..=MAX_TEAM_SIZE).contains(&payload.team_size);
    if !size_ok {
        errors.push(FieldError::validation(
            "teamSize",
            format!("Team size must be between 1 and {MAX_TEAM_SIZE}."),
        ));
    }

    errors.extend(validate_team_member(&payload.team_leader, "teamLeader", bounds));

    if size_ok {
        let expected = (payload.team_size - 1) as usize;
        if payload.team_members.len() != expected {
            errors.push(FieldError::validation(
                "teamMembers",
                format!("Please provide details for {expected} additional team member(s)."),
            ));
        }
    }
    for (i, member) in payload.team_members.iter().enumerate() {
        errors.extend(validate_team_member(member, &format!("teamMembers[{i}]"), bounds));
    }

    check_length(
        &mut errors,
        "projectTitle".into(),
        "Project title",
        &payload.project_title,
        3,
        Some(200),
    );
    check_length(
        &mut errors,
        "ideaSummary".into(),
        "Idea summary",
        &payload.idea_summary,
        50,
        None,
    );
    check_length(
        &mut errors,
        "problemStatement".into(),
        "Problem statement",
        &payload.problem_statement,
        50,
        None,
    );
    check_length(
        &mut errors,
        "technology".into(),
        "Technology description",
        &payload.technology,
        10,
        None,
    );
    check_length(
        &mut errors,
        "alignment".into(),
        "Alignment statement",
        &payload.alignment,
        50,
        None,
    );

    match (payload.has_prototype, payload.prototype_url.as_deref()) {
        (true, None) => errors.push(FieldError::validation(
            "prototypeUrl",
            "Prototype URL is required when a prototype exists.",
        )),
        (_, Some(url)) if !is_valid_url(url) => errors.push(FieldError::validation(
            "prototypeUrl",
            "Please enter a valid prototype URL.",
        )),
        _ => {}
    }

    if let Some(url) = payload.repository_url.as_deref() {
        if !is_valid_url(url) {
            errors.push(FieldError::validation(
                "repositoryUrl",
                "Please enter a valid repository URL.",
            ));
        }
    }

    if payload.challenge_areas.is_empty() {
        errors.push(FieldError::validation(
            "challengeAreas",
            "Please select at least one challenge area.",
        ));
    }
    if payload.declarations.is_empty() {
        errors.push(FieldError::validation(
            "declarations",
            "Please accept the required declarations.",
        ));
    }

    if let Some(file) = payload.attachment.as_ref() {
        errors.extend(validate_file_upload(file));
    }

    ValidationResult::from_errors(errors)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn member() -> TeamMember {
        TeamMember {
            name: "Amina Yusuf".into(),
            email: "amina@example.com".into(),
            phone: "+234 (801) 234-5678".into(),
            role: "Developer".into(),
            country: "Nigeria".into(),
            nationality: "Nigerian".into(),
            age: 24,
            linkedin: Some("https://www.linkedin.com/in/amina".into()),
            gender: None,
        }
    }

    pub(crate) fn registration() -> RegistrationPayload {
        RegistrationPayload {
            team_name: "Green Byte".into(),
            team_size: 2,
            team_leader: member(),
            team_members: vec![TeamMember {
                name: "Omar Haddad".into(),
                email: "omar@example.com".into(),
                linkedin: None,
                ..member()
            }],
            project_title: "Solar Grid Planner".into(),
            idea_summary:
                "A planning tool that helps small towns size solar micro-grids from open data."
                    .into(),
            problem_statement:
                "Rural communities lack affordable tooling to plan reliable renewable power supply."
                    .into(),
            technology: "Rust, PostGIS and a web frontend".into(),
            alignment:
                "Directly supports the clean-energy challenge by lowering planning costs for towns."
                    .into(),
            has_prototype: true,
            prototype_url: Some("https://demo.example.com".into()),
            repository_url: None,
            challenge_areas: vec!["clean-energy".into()],
            declarations: vec!["original-work".into(), "code-of-conduct".into()],
            attachment: None,
        }
    }

    fn contact() -> ContactPayload {
        ContactPayload {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            subject: "Inquiry about hackathon".into(),
            message: "I would like to know more about the registration process.".into(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("john@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("   "));
        assert!(!is_valid_email("john doe@example.com"));
        assert!(!is_valid_email("john@example"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("2348012345678"));
        assert!(!is_valid_phone("0123456"));
        assert!(!is_valid_phone("+12345678901234567"));
        assert!(!is_valid_phone("phone"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn url_shapes() {
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(is_valid_url("http://localhost:8080"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("mailto:john@example.com"));
    }

    #[test]
    fn lengths_are_measured_on_trimmed_text() {
        assert!(has_min_length("  ab  ", 2));
        assert!(!has_min_length("  a  ", 2));
        assert!(has_max_length("  abc  ", 3));
        assert!(!has_max_length("abcd", 3));
    }

    #[test]
    fn age_bounds_are_inclusive() {
        assert!(is_valid_age(16, AgeBounds::default()));
        assert!(is_valid_age(100, AgeBounds::default()));
        assert!(!is_valid_age(15, AgeBounds::default()));
        assert!(!is_valid_age(101, AgeBounds::default()));
        assert!(!is_valid_age(17, AgeBounds::registration()));
        assert!(is_valid_age(18, AgeBounds::registration()));
    }

    #[test]
    fn valid_member_has_no_errors() {
        assert!(validate_team_member(&member(), "", AgeBounds::default()).is_empty());
    }

    #[test]
    fn single_violation_yields_single_error() {
        let cases: Vec<(&str, TeamMember)> = vec![
            ("name", TeamMember { name: "A".into(), ..member() }),
            ("email", TeamMember { email: "not-an-email".into(), ..member() }),
            ("phone", TeamMember { phone: "12ab".into(), ..member() }),
            ("role", TeamMember { role: " ".into(), ..member() }),
            ("country", TeamMember { country: "".into(), ..member() }),
            ("nationality", TeamMember { nationality: "  ".into(), ..member() }),
            ("age", TeamMember { age: 12, ..member() }),
            ("linkedin", TeamMember { linkedin: Some("linkedin".into()), ..member() }),
        ];
        for (field, case) in cases {
            let errors = validate_team_member(&case, "", AgeBounds::default());
            assert_eq!(fields(&errors), vec![field], "case {field}");
        }
    }

    #[test]
    fn member_errors_are_prefixed() {
        let bad = TeamMember { email: "x".into(), ..member() };
        let errors = validate_team_member(&bad, "teamMembers[0]", AgeBounds::default());
        assert_eq!(fields(&errors), vec!["teamMembers[0].email"]);
    }

    #[test]
    fn file_upload_limits() {
        let ok = Attachment {
            file_name: "deck.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: vec![0; 1024],
        };
        assert!(validate_file_upload(&ok).is_empty());

        let too_big = Attachment { bytes: vec![0; MAX_FILE_SIZE + 1], ..ok.clone() };
        assert_eq!(validate_file_upload(&too_big).len(), 1);

        let wrong_type = Attachment { mime_type: "application/zip".into(), ..ok };
        let errors = validate_file_upload(&wrong_type);
        assert_eq!(fields(&errors), vec!["attachment"]);
    }

    #[test]
    fn contact_message_too_short() {
        let result = validate_contact(&ContactPayload { message: "Hi".into(), ..contact() });
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].message,
            "Message must be at least 10 characters long."
        );
    }

    #[test]
    fn contact_upper_bounds() {
        let result = validate_contact(&ContactPayload { subject: "x".repeat(201), ..contact() });
        assert_eq!(
            result.errors[0].message,
            "Subject must be no more than 200 characters long."
        );
        assert!(validate_contact(&contact()).is_valid);
    }

    #[test]
    fn valid_registration_passes() {
        let result = validate_registration(&registration(), AgeBounds::registration());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn registration_applies_stricter_age_bound() {
        let mut payload = registration();
        payload.team_members[0].age = 17;
        assert!(validate_registration(&payload, AgeBounds::default()).is_valid);
        let result = validate_registration(&payload, AgeBounds::registration());
        assert_eq!(fields(&result.errors), vec!["teamMembers[0].age"]);
    }

    #[test]
    fn registration_member_count_must_match_team_size() {
        let mut payload = registration();
        payload.team_size = 3;
        let result = validate_registration(&payload, AgeBounds::registration());
        assert_eq!(fields(&result.errors), vec!["teamMembers"]);
    }

    #[test]
    fn registration_prototype_and_lists() {
        let mut payload = registration();
        payload.prototype_url = None;
        payload.repository_url = Some("git@github.com:team/repo".into());
        payload.challenge_areas.clear();
        payload.declarations.clear();
        let result = validate_registration(&payload, AgeBounds::registration());
        assert_eq!(
            fields(&result.errors),
            vec!["prototypeUrl", "repositoryUrl", "challengeAreas", "declarations"]
        );
    }

    #[test]
    fn validation_result_converts_to_error() {
        let err = validate_contact(&ContactPayload { email: "nope".into(), ..contact() })
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
        assert_eq!(err.field_messages().unwrap()["email"], "Please enter a valid email address.");
    }
}
