use serde::{Deserialize, Serialize};

/// Trigger request body for `ScrapeProfile` — a single profile URL (§4.1).
#[derive(Debug, Clone, Serialize)]
pub struct UrlInput {
    pub url: String,
}

/// Trigger request body for `SearchProfiles` — a first/last name pair
/// (§4.1).
#[derive(Debug, Clone, Serialize)]
pub struct NameInput {
    pub first_name: String,
    pub last_name: String,
}

/// Response body of the trigger endpoint (§6): `{snapshot_id, error?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerResponse {
    pub snapshot_id: Option<String>,
    pub error: Option<String>,
}

/// Canonical profile fields consumed by the Extractor/Synthesizer (§6).
/// Unknown fields are retained via `extra` rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub linkedin_id: Option<String>,
    pub name: Option<String>,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub position: Option<String>,
    pub current_company_name: Option<String>,
    pub about: Option<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    pub followers: Option<u64>,
    pub connections: Option<u64>,
    pub url: Option<String>,
    pub input_url: Option<String>,
    pub timestamp: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub honors_and_awards: Vec<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: Option<String>,
    pub company: Option<String>,
    pub duration: Option<String>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationEntry {
    pub title: Option<String>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

/// The decoded result of a scraper call: either one profile (`ScrapeProfile`
/// / `ScrapeCompany`) or a list of profiles (`SearchProfiles`). The provider
/// wraps single profiles in a one-element array in some responses; both
/// forms decode to `Single` vs `Many` depending on which operation produced
/// them (§4.1 step 5).
#[derive(Debug, Clone)]
pub enum ScraperRecord {
    Single(ProfileRecord),
    Many(Vec<ProfileRecord>),
}
