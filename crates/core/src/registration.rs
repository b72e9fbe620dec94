//! Channel registration input validation.
//!
//! Registration carries the (source_id, domain) pair that determines the
//! channel's UUID plus a couple of linked URLs. Problems are reported as
//! field-level errors so the dashboard form can annotate the offending
//! input instead of failing the whole request opaquely.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::compute_channel_id;

static GITHUB_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://github\.com/.+").expect("valid regex"));
static SPEC_SHEET_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://docs\.google\.com/document/d/.+").expect("valid regex"));

const MAX_FIELD_LEN: usize = 200;

/// Incoming channel registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRegistration {
    pub name: String,
    pub domain: String,
    pub source_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chef_repo_url: Option<String>,
    #[serde(default)]
    pub spec_sheet_url: Option<String>,
    #[serde(default)]
    pub registered_by_email: Option<String>,
}

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a registration and compute the channel UUID it would create.
///
/// Duplicate detection against existing channels is the caller's job
/// (it needs the database); everything shape-level is checked here.
pub fn validate_registration(reg: &ChannelRegistration) -> Result<Uuid, Vec<FieldError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("name", &reg.name),
        ("domain", &reg.domain),
        ("source_id", &reg.source_id),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError::new(field, "This field is required"));
        } else if value.len() > MAX_FIELD_LEN {
            errors.push(FieldError::new(field, "Value is too long"));
        }
    }

    if let Some(url) = reg.chef_repo_url.as_deref() {
        if !GITHUB_URL.is_match(url) {
            errors.push(FieldError::new("chef_repo_url", "Invalid github repository"));
        }
    }

    if let Some(url) = reg.spec_sheet_url.as_deref() {
        if !SPEC_SHEET_URL.is_match(url) {
            errors.push(FieldError::new("spec_sheet_url", "Invalid spec sheet URL"));
        }
    }

    if errors.is_empty() {
        Ok(compute_channel_id(&reg.source_id, &reg.domain))
    } else {
        Err(errors)
    }
}

/// The error attached to the `domain` field when the computed channel id
/// already exists.
pub fn duplicate_channel_error() -> FieldError {
    FieldError::new("domain", "Channel with domain and source ID already exists")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> ChannelRegistration {
        ChannelRegistration {
            name: "OpenStax".to_string(),
            domain: "openstax.org".to_string(),
            source_id: "openstax-books".to_string(),
            description: None,
            chef_repo_url: Some("https://github.com/openstax/chef-openstax".to_string()),
            spec_sheet_url: None,
            registered_by_email: None,
        }
    }

    #[test]
    fn valid_registration_computes_channel_id() {
        let id = validate_registration(&registration()).unwrap();
        assert_eq!(id, compute_channel_id("openstax-books", "openstax.org"));
    }

    #[test]
    fn empty_required_fields_are_reported_per_field() {
        let mut reg = registration();
        reg.name = String::new();
        reg.source_id = "  ".to_string();

        let errors = validate_registration(&reg).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"source_id"));
    }

    #[test]
    fn bad_repo_url_is_a_field_error() {
        let mut reg = registration();
        reg.chef_repo_url = Some("ftp://example.com/chef".to_string());

        let errors = validate_registration(&reg).unwrap_err();
        assert_eq!(errors[0].field, "chef_repo_url");
    }

    #[test]
    fn bad_spec_sheet_url_is_a_field_error() {
        let mut reg = registration();
        reg.spec_sheet_url = Some("https://example.com/doc".to_string());

        let errors = validate_registration(&reg).unwrap_err();
        assert_eq!(errors[0].field, "spec_sheet_url");
    }
}
