pub mod error;

use ai_client::Claude;
use profile_common::{
    Claim, ConsentFlags, ContentKind, EducationFeedback, EngagementMetrics, Evidence, KeywordOptimization, LinkedinProfileAnalysis, Report,
    SectionFeedback, TimelineEntry,
};
use schemars::JsonSchema;
use scraper_client::ProfileRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use error::Result;

/// Temperature for synthesis calls (§4.7/§6) — tolerates more variation than
/// extraction since the output is prose, not a factual claim.
pub const TEMPERATURE: f32 = 0.3;
/// Token cap for synthesis calls (§6).
pub const MAX_TOKENS: u32 = 2_000;
/// How many top-confidence claims are handed to the LLM prompt (§4.7).
pub const TOP_CLAIMS: usize = 10;
/// Confidence score attached to every fallback-path report (§4.7).
pub const FALLBACK_CONFIDENCE: f64 = 0.9;
/// Confidence score attached to the minimal report when no profile-shaped
/// evidence exists at all (§4.7).
pub const MINIMAL_CONFIDENCE: f64 = 0.5;

// =============================================================================
// LLM response shape — mirrors the Report shape of §4.7 field-for-field, as
// its own schemars-derived type so profile-common's domain types don't need
// to carry a JSON-schema dependency.
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SynthesisResponse {
    pub summary: String,
    pub key_roles: Vec<String>,
    pub timeline: Vec<TimelineEntryResponse>,
    pub consent_badges: Vec<String>,
    pub confidence_score: f64,
    pub linkedin_profile_analysis: Option<LinkedinProfileAnalysisResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntryResponse {
    pub date: String,
    pub event: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkedinProfileAnalysisResponse {
    pub completeness_score: f64,
    pub profile_strength: String,
    pub keyword_optimization: KeywordOptimizationResponse,
    pub engagement_metrics: EngagementMetricsResponse,
    pub profile_sections: ProfileSectionsResponse,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KeywordOptimizationResponse {
    pub score: f64,
    pub identified_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EngagementMetricsResponse {
    pub followers: u64,
    pub connections: u64,
    pub traction_rating: String,
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionFeedbackResponse {
    pub present: bool,
    pub quality: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EducationFeedbackResponse {
    pub count: usize,
    pub quality: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProfileSectionsResponse {
    pub headline: SectionFeedbackResponse,
    pub about: SectionFeedbackResponse,
    pub experience: SectionFeedbackResponse,
    pub education: EducationFeedbackResponse,
}

fn response_to_report(r: SynthesisResponse) -> Report {
    Report {
        summary: r.summary,
        key_roles: r.key_roles,
        timeline: r.timeline.into_iter().map(|t| TimelineEntry { date: t.date, event: t.event, source: t.source }).collect(),
        consent_badges: r.consent_badges,
        confidence_score: r.confidence_score,
        linkedin_profile_analysis: r.linkedin_profile_analysis.map(|a| LinkedinProfileAnalysis {
            completeness_score: a.completeness_score,
            profile_strength: a.profile_strength,
            keyword_optimization: KeywordOptimization {
                score: a.keyword_optimization.score,
                identified_keywords: a.keyword_optimization.identified_keywords,
                missing_keywords: a.keyword_optimization.missing_keywords,
            },
            engagement_metrics: EngagementMetrics {
                followers: a.engagement_metrics.followers,
                connections: a.engagement_metrics.connections,
                traction_rating: a.engagement_metrics.traction_rating,
                analysis: a.engagement_metrics.analysis,
            },
            profile_sections: profile_common::ProfileSections {
                headline: SectionFeedback { present: a.profile_sections.headline.present, quality: a.profile_sections.headline.quality, feedback: a.profile_sections.headline.feedback },
                about: SectionFeedback { present: a.profile_sections.about.present, quality: a.profile_sections.about.quality, feedback: a.profile_sections.about.feedback },
                experience: SectionFeedback { present: a.profile_sections.experience.present, quality: a.profile_sections.experience.quality, feedback: a.profile_sections.experience.feedback },
                education: EducationFeedback { count: a.profile_sections.education.count, quality: a.profile_sections.education.quality, feedback: a.profile_sections.education.feedback },
            },
            recommendations: a.recommendations,
        }),
    }
}

/// C7, the synthesizer (§4.7). Holds a `Claude` client for the primary path;
/// the fallback path below it is pure and LLM-free.
pub struct Synthesizer {
    claude: Claude,
}

impl Synthesizer {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }

    /// `Synthesize(subject, evidence, claims, consentFlags) -> Report`
    /// (§4.7).
    pub async fn synthesize(&self, subject: &str, evidence: &[Evidence], claims: &[Claim], consent: &ConsentFlags) -> Report {
        let profile = match find_profile_record(evidence) {
            Some(record) => record,
            None => return minimal_report(subject, evidence.len(), claims.len(), consent),
        };

        let mut ranked_claims: Vec<&Claim> = claims.iter().collect();
        ranked_claims.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        ranked_claims.truncate(TOP_CLAIMS);

        match self.synthesize_via_llm(subject, &profile, &ranked_claims).await {
            Ok(report) => report,
            Err(err) => {
                warn!(subject, error = %err, "synthesis LLM call failed, falling back to deterministic synthesis");
                fallback_report(&profile, consent)
            }
        }
    }

    async fn synthesize_via_llm(&self, subject: &str, profile: &ProfileRecord, claims: &[&Claim]) -> anyhow::Result<Report> {
        let claim_lines: Vec<String> = claims.iter().map(|c| format!("- {} = {} (confidence {:.2})", c.predicate, c.object, c.confidence)).collect();

        let user_prompt = format!(
            r#"Subject: {subject}

Profile fields:
name: {name}
current_company: {company}
title: {title}
location: {city}, {country}
about: {about}
followers: {followers}
connections: {connections}
experience_count: {exp_count}
education_count: {edu_count}

Top claims:
{claims}

Produce a structured analysis report for this profile."#,
            name = profile.name.as_deref().unwrap_or("unknown"),
            company = profile.current_company_name.as_deref().unwrap_or("none"),
            title = profile.position.as_deref().unwrap_or("none"),
            city = profile.city.as_deref().unwrap_or("unknown"),
            country = profile.country_code.as_deref().unwrap_or("unknown"),
            about = profile.about.as_deref().unwrap_or(""),
            followers = profile.followers.unwrap_or(0),
            connections = profile.connections.unwrap_or(0),
            exp_count = profile.experience.len(),
            edu_count = profile.education.len(),
            claims = claim_lines.join("\n"),
        );

        let response: SynthesisResponse = self.claude.extract(SYSTEM_PROMPT, user_prompt, TEMPERATURE, MAX_TOKENS).await?;
        Ok(response_to_report(response))
    }
}

const SYSTEM_PROMPT: &str = r#"You are a professional-profile analyst producing a structured report. Ground every statement in the fields and claims given to you — never invent employers, titles, schools, or numbers not present in the input. Produce the full report shape: summary, key_roles, timeline, consent_badges, confidence_score, and linkedin_profile_analysis with completeness_score, profile_strength, keyword_optimization, engagement_metrics, profile_sections, and exactly five recommendations."#;

/// Locate the first evidence with `content_kind == json` that parses to a
/// profile-shaped object — one with a `name` or `linkedin_id` (§4.7).
/// Evidence may encode a single profile object or an array (a web search's
/// evidence, or a multi-profile search-results evidence, decode to the same
/// `ProfileRecord` shape trivially since every field is optional, so the
/// `name`/`linkedin_id` presence check is what actually filters out
/// non-profile evidence).
fn find_profile_record(evidence: &[Evidence]) -> Option<ProfileRecord> {
    for ev in evidence {
        if ev.content_kind != ContentKind::Json {
            continue;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&ev.content) else {
            continue;
        };
        let candidates: Vec<serde_json::Value> = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        for candidate in candidates {
            if let Ok(record) = serde_json::from_value::<ProfileRecord>(candidate) {
                if record.name.is_some() || record.linkedin_id.is_some() {
                    return Some(record);
                }
            }
        }
    }
    None
}

// =============================================================================
// Deterministic fallback (§4.7) — no LLM involved.
// =============================================================================

fn fallback_report(profile: &ProfileRecord, consent: &ConsentFlags) -> Report {
    let name = profile.name.as_deref().unwrap_or("This person");
    let company = profile.current_company_name.as_deref();
    let location = location_string(profile);
    let about_snippet: String = profile.about.as_deref().unwrap_or("").chars().take(200).collect();
    let followers = profile.followers.unwrap_or(0);
    let connections = profile.connections.unwrap_or(0);

    let mut summary = format!("{name}");
    if let Some(company) = company {
        summary.push_str(&format!(" currently works at {company}"));
    }
    if let Some(location) = &location {
        summary.push_str(&format!(", based in {location}"));
    }
    summary.push('.');
    if !about_snippet.is_empty() {
        summary.push_str(&format!(" {about_snippet}"));
    }
    summary.push_str(&format!(
        " Has {} {} and {} {}, with {} experience entries and {} education entries on record.",
        followers,
        magnitude_qualifier(followers, "followers"),
        connections,
        magnitude_qualifier(connections, "connections"),
        profile.experience.len(),
        profile.education.len(),
    ));

    let mut key_roles = Vec::new();
    if let Some(company) = company {
        key_roles.push(company.to_string());
    }
    key_roles.extend(
        profile
            .experience
            .iter()
            .filter(|e| e.company.as_deref() != company)
            .take(3)
            .filter_map(|e| e.company.clone()),
    );
    if let Some(first_edu) = profile.education.first() {
        if let Some(title) = &first_edu.title {
            key_roles.push(title.clone());
        }
    }

    let mut timeline: Vec<TimelineEntry> = profile
        .experience
        .iter()
        .take(5)
        .map(|e| TimelineEntry {
            date: experience_date(e),
            event: format!("{} at {}", e.title.as_deref().unwrap_or("Role"), e.company.as_deref().unwrap_or("unknown company")),
            source: "LinkedIn Profile".to_string(),
        })
        .collect();
    timeline.extend(profile.education.iter().map(|e| TimelineEntry {
        date: year_range(e.start_year.as_deref(), e.end_year.as_deref()),
        event: e.title.clone().unwrap_or_else(|| "Education".to_string()),
        source: "LinkedIn Profile".to_string(),
    }));

    let has_about = !about_snippet.is_empty();
    let has_experience = !profile.experience.is_empty();
    let has_education = !profile.education.is_empty();
    let completeness_score = (0.2 * has_about as u8 as f64
        + 0.3 * has_experience as u8 as f64
        + 0.2 * has_education as u8 as f64
        + 0.15 * (followers > 0) as u8 as f64
        + 0.15 * (connections > 0) as u8 as f64)
        .clamp(0.0, 1.0);

    let profile_strength = if completeness_score >= 0.8 {
        "Strong"
    } else if completeness_score >= 0.6 {
        "Good"
    } else if completeness_score >= 0.4 {
        "Moderate"
    } else {
        "Weak"
    }
    .to_string();

    let traction_rating = traction_rating_for(followers);

    let analysis = format!("{followers} followers and {connections} connections place this profile in the {traction_rating} engagement tier.");

    let keyword_optimization = build_keyword_optimization(profile, completeness_score);
    let profile_sections = build_profile_sections(profile, has_about, has_experience);
    let recommendations = build_recommendations(has_experience, has_about, has_education, followers, connections);

    Report {
        summary,
        key_roles,
        timeline,
        consent_badges: consent_badges_for(consent),
        confidence_score: FALLBACK_CONFIDENCE,
        linkedin_profile_analysis: Some(LinkedinProfileAnalysis {
            completeness_score,
            profile_strength,
            keyword_optimization,
            engagement_metrics: EngagementMetrics { followers, connections, traction_rating: traction_rating.to_string(), analysis },
            profile_sections,
            recommendations,
        }),
    }
}

fn minimal_report(subject: &str, evidence_count: usize, claims_count: usize, consent: &ConsentFlags) -> Report {
    Report {
        summary: format!("No profile-shaped evidence was found for \"{subject}\" ({evidence_count} evidence record(s), {claims_count} claim(s) collected)."),
        key_roles: Vec::new(),
        timeline: Vec::new(),
        consent_badges: consent_badges_for(consent),
        confidence_score: MINIMAL_CONFIDENCE,
        linkedin_profile_analysis: None,
    }
}

fn consent_badges_for(consent: &ConsentFlags) -> Vec<String> {
    let mut badges = Vec::new();
    if consent.profile {
        badges.push("public_profile_data".to_string());
    }
    if consent.email {
        badges.push("email_shared".to_string());
    }
    if consent.phone {
        badges.push("phone_shared".to_string());
    }
    badges
}

fn location_string(profile: &ProfileRecord) -> Option<String> {
    match (&profile.city, &profile.country_code) {
        (Some(city), Some(country)) => Some(format!("{city}, {country}")),
        (Some(city), None) => Some(city.clone()),
        (None, Some(country)) => Some(country.clone()),
        (None, None) => None,
    }
}

fn magnitude_qualifier(count: u64, noun: &str) -> String {
    let qualifier = if count >= 10_000 {
        "extensive"
    } else if count >= 1_000 {
        "solid"
    } else {
        "modest"
    };
    format!("{qualifier} {noun}")
}

fn traction_rating_for(followers: u64) -> &'static str {
    if followers >= 10_000 {
        "High"
    } else if followers >= 1_000 {
        "Medium"
    } else {
        "Low"
    }
}

fn experience_date(e: &scraper_client::ExperienceEntry) -> String {
    if let Some(duration) = &e.duration {
        return duration.clone();
    }
    year_range(e.start_year.as_deref(), e.end_year.as_deref())
}

fn year_range(start: Option<&str>, end: Option<&str>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => format!("{start}-Present"),
        (None, Some(end)) => end.to_string(),
        (None, None) => "unknown".to_string(),
    }
}

fn build_keyword_optimization(profile: &ProfileRecord, completeness_score: f64) -> KeywordOptimization {
    let mut identified: Vec<String> = Vec::new();
    if let Some(title) = &profile.position {
        identified.extend(title.split_whitespace().filter(|w| w.len() > 3).map(|w| w.to_string()));
    }
    if let Some(company) = &profile.current_company_name {
        identified.push(company.clone());
    }
    identified.dedup();

    let generic_keywords = ["leadership", "strategy", "results-driven", "cross-functional", "stakeholder management"];
    let missing: Vec<String> = generic_keywords
        .iter()
        .filter(|kw| !identified.iter().any(|i| i.to_lowercase().contains(*kw)))
        .map(|kw| kw.to_string())
        .take(3)
        .collect();

    KeywordOptimization { score: completeness_score, identified_keywords: identified, missing_keywords: missing }
}

fn build_profile_sections(profile: &ProfileRecord, has_about: bool, has_experience: bool) -> profile_common::ProfileSections {
    profile_common::ProfileSections {
        headline: SectionFeedback {
            present: profile.position.is_some(),
            quality: if profile.position.is_some() { "Good".to_string() } else { "Missing".to_string() },
            feedback: if profile.position.is_some() {
                "Headline clearly states the current role.".to_string()
            } else {
                "Add a headline stating your current role and focus area.".to_string()
            },
        },
        about: SectionFeedback {
            present: has_about,
            quality: if has_about { "Good".to_string() } else { "Missing".to_string() },
            feedback: if has_about {
                "About section gives useful context on background and focus.".to_string()
            } else {
                "Add an About section summarizing your experience and goals.".to_string()
            },
        },
        experience: SectionFeedback {
            present: has_experience,
            quality: if profile.experience.len() >= 2 { "Strong".to_string() } else if has_experience { "Adequate".to_string() } else { "Missing".to_string() },
            feedback: if has_experience {
                "Experience history is present; keep entries current.".to_string()
            } else {
                "Add work experience entries to establish a track record.".to_string()
            },
        },
        education: EducationFeedback {
            count: profile.education.len(),
            quality: if profile.education.is_empty() { "Missing".to_string() } else { "Adequate".to_string() },
            feedback: if profile.education.is_empty() {
                "Add education history to build credibility.".to_string()
            } else {
                "Education history is present.".to_string()
            },
        },
    }
}

fn build_recommendations(has_experience: bool, has_about: bool, has_education: bool, followers: u64, connections: u64) -> Vec<String> {
    vec![
        if has_experience {
            "Keep your work experience entries up to date with quantifiable achievements.".to_string()
        } else {
            "Add detailed work experience entries to strengthen your profile.".to_string()
        },
        if has_about {
            "Refine your About section to highlight recent accomplishments.".to_string()
        } else {
            "Write a compelling About section summarizing your expertise.".to_string()
        },
        if has_education {
            "Your education history is already visible to reviewers.".to_string()
        } else {
            "Add your educational background to build credibility.".to_string()
        },
        if followers < 1_000 {
            "Grow your network and follower count to increase visibility.".to_string()
        } else {
            "Continue engaging your network to maintain visibility.".to_string()
        },
        if connections < 500 {
            "Expand your professional connections to broaden your reach.".to_string()
        } else {
            "Leverage your strong connections for introductions and referrals.".to_string()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper_client::{EducationEntry, ExperienceEntry};

    fn sample_profile() -> ProfileRecord {
        ProfileRecord {
            linkedin_id: None,
            name: Some("Alice".to_string()),
            country_code: Some("FR".to_string()),
            city: Some("Paris".to_string()),
            position: Some("Engineer".to_string()),
            current_company_name: Some("Acme".to_string()),
            about: Some("Builds things.".to_string()),
            experience: vec![ExperienceEntry {
                title: Some("Engineer".to_string()),
                company: Some("Acme".to_string()),
                duration: Some("2020-Present".to_string()),
                start_year: Some("2020".to_string()),
                end_year: None,
            }],
            education: vec![EducationEntry { title: Some("MIT".to_string()), start_year: Some("2016".to_string()), end_year: Some("2020".to_string()) }],
            followers: Some(5_000),
            connections: Some(400),
            url: Some("https://www.linkedin.com/in/alice".to_string()),
            input_url: None,
            timestamp: None,
            avatar: None,
            honors_and_awards: vec![],
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn fallback_report_matches_scenario_1_thresholds() {
        let report = fallback_report(&sample_profile(), &ConsentFlags::default());
        let analysis = report.linkedin_profile_analysis.expect("profile analysis present");
        assert_eq!(analysis.profile_strength, "Strong");
        assert_eq!(analysis.engagement_metrics.traction_rating, "Medium");
        assert!(analysis.completeness_score >= 0.8);
        assert_eq!(analysis.recommendations.len(), 5);
        assert_eq!(report.confidence_score, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn minimal_report_has_half_confidence_and_empty_timeline() {
        let report = minimal_report("Alice Example", 0, 0, &ConsentFlags::default());
        assert_eq!(report.confidence_score, MINIMAL_CONFIDENCE);
        assert!(report.timeline.is_empty());
        assert!(report.linkedin_profile_analysis.is_none());
    }

    #[test]
    fn find_profile_record_recognizes_wrapped_single_profile() {
        let profile_json = serde_json::to_string(&sample_profile()).unwrap();
        let wrapped = format!("[{profile_json}]");
        let ev = Evidence::new("Alice", "https://www.linkedin.com/in/alice", wrapped, ContentKind::Json);
        let found = find_profile_record(&[ev]);
        assert!(found.is_some());
    }

    #[test]
    fn find_profile_record_skips_non_profile_evidence() {
        let search_results = serde_json::json!([{"url": "https://x.com", "title": "t", "snippet": "s"}]);
        let ev = Evidence::new("Alice", "provider://search", search_results.to_string(), ContentKind::Json);
        assert!(find_profile_record(&[ev]).is_none());
    }
}
