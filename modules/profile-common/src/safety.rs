use regex::Regex;
use std::sync::LazyLock;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());
static SSN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,5}\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?:St|Ave|Blvd|Dr|Ln|Rd|Way|Ct|Pl|Cir|Ter)\b").unwrap()
});

/// A sensitive category a claim's predicate or object can fall into. Used by
/// the verifier to decide which consent flag gates a claim and which
/// `sensitive:*` policy tag to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitiveCategory {
    Email,
    Phone,
    Ssn,
    Address,
}

impl SensitiveCategory {
    /// The policy tag this category maps to. Emails get their own tag per
    /// §4.6; every other sensitive category shares `sensitive:pii`.
    pub fn policy_tag(&self) -> &'static str {
        match self {
            SensitiveCategory::Email => "sensitive:contact",
            SensitiveCategory::Phone | SensitiveCategory::Ssn | SensitiveCategory::Address => {
                "sensitive:pii"
            }
        }
    }
}

/// Check text for PII patterns, returning every category matched (a claim
/// object can trip more than one, e.g. an address containing no phone and
/// vice versa never happens, but an `about` blob pasted wholesale might).
pub fn detect_pii(text: &str) -> Vec<SensitiveCategory> {
    let mut found = Vec::new();
    if EMAIL_RE.is_match(text) {
        found.push(SensitiveCategory::Email);
    }
    if PHONE_RE.is_match(text) {
        found.push(SensitiveCategory::Phone);
    }
    if SSN_RE.is_match(text) {
        found.push(SensitiveCategory::Ssn);
    }
    if ADDRESS_RE.is_match(text) {
        found.push(SensitiveCategory::Address);
    }
    found
}

/// Mask all but the first digit group of a phone number: `+1-612-555-1234`
/// becomes `+1-612-***-****`. Falls back to masking everything but the first
/// character if the text doesn't look like a recognized phone shape.
pub fn redact_phone(text: &str) -> String {
    if let Some(m) = PHONE_RE.find(text) {
        let digits: Vec<char> = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() >= 10 {
            let (country, rest) = if digits.len() > 10 {
                (digits[0], &digits[digits.len() - 10..])
            } else {
                ('1', &digits[..])
            };
            let area: String = rest[..3].iter().collect();
            return format!("+{country}-{area}-***-****");
        }
    }
    redact_generic(text)
}

/// Mask an email's local part to its first character: `jane.doe@acme.com`
/// becomes `j***@acme.com`.
pub fn redact_email(text: &str) -> String {
    if let Some(m) = EMAIL_RE.find(text) {
        if let Some((local, domain)) = m.as_str().split_once('@') {
            let first = local.chars().next().unwrap_or('*');
            return format!("{first}***@{domain}");
        }
    }
    redact_generic(text)
}

/// Generic redaction for SSNs/addresses/anything else sensitive: keep the
/// first character, mask the rest.
pub fn redact_generic(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => format!("{first}***"),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_pii_phone() {
        let found = detect_pii("Call me at 612-555-1234 for info");
        assert_eq!(found, vec![SensitiveCategory::Phone]);
    }

    #[test]
    fn detect_pii_email() {
        let found = detect_pii("Contact john@example.com");
        assert_eq!(found, vec![SensitiveCategory::Email]);
    }

    #[test]
    fn detect_pii_clean() {
        let found = detect_pii("Senior Engineer at Acme, based in Paris");
        assert!(found.is_empty());
    }

    #[test]
    fn redact_phone_masks_trailing_digits() {
        let redacted = redact_phone("+1-612-555-1234");
        assert_eq!(redacted, "+1-612-***-****");
    }

    #[test]
    fn redact_email_keeps_first_char_and_domain() {
        let redacted = redact_email("jane.doe@acme.com");
        assert_eq!(redacted, "j***@acme.com");
    }
}
