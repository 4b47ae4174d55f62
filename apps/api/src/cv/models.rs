//! Structured CV produced by parsing and optimization.
//!
//! Every field defaults so a sparse model reply still deserializes; the one
//! hard invariant (non-empty first/last name) is applied by
//! [`ParsedCv::with_required_fields`] before a CV leaves the service.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for a name the source document does not carry.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Reads an explicit `null` as the field's default; the model sends `null`
/// for anything it could not find.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    /// Professional headline, e.g. "Senior Data Engineer".
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub role: String,
    pub start_date: Option<String>,
    /// `None` for a current position.
    pub end_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "null_as_default")]
    pub institution: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedCv {
    #[serde(deserialize_with = "null_as_default")]
    pub contact: ContactInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
}

impl ParsedCv {
    /// Fills missing names. A lone full name in `first_name` is split first.
    pub fn with_required_fields(mut self) -> Self {
        let contact = &mut self.contact;
        contact.first_name = contact.first_name.trim().to_string();
        contact.last_name = contact.last_name.trim().to_string();

        if contact.last_name.is_empty() {
            if let Some((first, rest)) = contact.first_name.split_once(char::is_whitespace) {
                let (first, rest) = (first.to_string(), rest.trim().to_string());
                contact.first_name = first;
                contact.last_name = rest;
            }
        }
        if contact.first_name.is_empty() {
            contact.first_name = UNKNOWN_NAME.to_string();
        }
        if contact.last_name.is_empty() {
            contact.last_name = UNKNOWN_NAME.to_string();
        }
        self
    }

    /// Flattens the CV into lowercase text for keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.summary.as_str()];
        if let Some(title) = &self.contact.title {
            parts.push(title.as_str());
        }
        for exp in &self.experience {
            parts.push(exp.role.as_str());
            parts.push(exp.company.as_str());
            parts.push(exp.description.as_str());
        }
        for edu in &self.education {
            parts.push(edu.institution.as_str());
            parts.extend(edu.degree.as_deref());
            parts.extend(edu.field.as_deref());
        }
        parts.extend(self.certifications.iter().map(String::as_str));
        parts.extend(self.languages.iter().map(String::as_str));
        parts.join("\n").to_lowercase()
    }
}
