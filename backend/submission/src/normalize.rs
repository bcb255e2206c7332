//! Raw form state → canonical payloads.
//!
//! Deterministic and idempotent: normalizing a payload that was converted
//! back into raw form state yields the same payload.

use crate::types::{
    ContactPayload, RawContactForm, RawRegistrationForm, RawTeamMember, RegistrationPayload,
    TeamMember,
};

/// Trim and collapse runs of whitespace into single spaces.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim the ends of a free-text body; inner line breaks are kept as typed.
pub fn clean_body(s: &str) -> String {
    s.trim().to_string()
}

pub fn clean_email(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `None` when the value is blank after trimming.
pub fn optional_text(s: &str) -> Option<String> {
    let cleaned = clean_text(s);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Base-10 parse of the leading digits of the trimmed input, so `"25 years"`
/// is 25 and `"18.5"` is 18. `0` when there are no leading digits, the value
/// is negative or it overflows.
pub fn parse_number(s: &str) -> u32 {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

/// Trim entries and drop the blank ones.
pub fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| clean_text(item))
        .filter(|item| !item.is_empty())
        .collect()
}

pub fn normalize_team_member(raw: &RawTeamMember) -> TeamMember {
    TeamMember {
        name: clean_text(&raw.name),
        email: clean_email(&raw.email),
        phone: clean_text(&raw.phone),
        role: clean_text(&raw.role),
        country: clean_text(&raw.country),
        nationality: clean_text(&raw.nationality),
        age: parse_number(&raw.age),
        linkedin: optional_text(&raw.linkedin),
        gender: optional_text(&raw.gender),
    }
}

/// Members beyond `team_size - 1` are UI rows left over from a larger team
/// size and are dropped.
pub fn normalize_registration(raw: &RawRegistrationForm) -> RegistrationPayload {
    let team_size = parse_number(&raw.team_size);
    let member_slots = team_size.saturating_sub(1) as usize;

    RegistrationPayload {
        team_name: clean_text(&raw.team_name),
        team_size,
        team_leader: normalize_team_member(&raw.team_leader),
        team_members: raw
            .team_members
            .iter()
            .take(member_slots)
            .map(normalize_team_member)
            .collect(),
        project_title: clean_text(&raw.project_title),
        idea_summary: clean_body(&raw.idea_summary),
        problem_statement: clean_body(&raw.problem_statement),
        technology: clean_body(&raw.technology),
        alignment: clean_body(&raw.alignment),
        has_prototype: raw.has_prototype,
        prototype_url: optional_text(&raw.prototype_url),
        repository_url: optional_text(&raw.repository_url),
        challenge_areas: clean_list(&raw.challenge_areas),
        declarations: clean_list(&raw.declarations),
        attachment: raw.attachment.clone(),
    }
}

pub fn normalize_contact(raw: &RawContactForm) -> ContactPayload {
    ContactPayload {
        name: clean_text(&raw.name),
        email: clean_email(&raw.email),
        subject: clean_text(&raw.subject),
        message: clean_body(&raw.message),
    }
}
