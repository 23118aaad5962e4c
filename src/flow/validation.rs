use once_cell::sync::Lazy;
use regex::Regex;
use unicase::UniCase;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const PROMPT_DURATION_MS: u64 = 3000;

/// Verdict returned by step validators. A failed verdict carries the prompt
/// the widget should flash and for how long.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Validation {
    pub success: bool,
    pub prompt_content: Option<String>,
    pub prompt_duration_ms: Option<u64>,
    pub prompt_type: Option<&'static str>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            success: true,
            prompt_content: None,
            prompt_duration_ms: None,
            prompt_type: None,
        }
    }

    pub fn error(prompt: String) -> Self {
        Self {
            success: false,
            prompt_content: Some(prompt),
            prompt_duration_ms: Some(PROMPT_DURATION_MS),
            prompt_type: Some("error"),
        }
    }
}

pub fn validate_email(input: &str) -> Validation {
    if input.trim().is_empty() {
        return Validation::error(String::from("Email is required"));
    }
    if !EMAIL_REGEX.is_match(input) {
        return Validation::error(String::from("Please enter a valid email address"));
    }
    Validation::ok()
}

pub fn validate_required(input: &str, field_label: &str) -> Validation {
    if input.trim().is_empty() {
        return Validation::error(format!("{} is required", field_label));
    }
    Validation::ok()
}

/// Optional fields accept anything; skipping is handled by
/// [`process_optional_input`].
pub fn validate_optional(_input: &str) -> Validation {
    Validation::ok()
}

/// Maps empty, whitespace-only or a (case-insensitive) "skip" token to an
/// empty string; everything else is trimmed.
pub fn process_optional_input(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || UniCase::new(trimmed) == UniCase::new("skip") {
        return String::new();
    }
    String::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_email_is_required() {
        for input in ["", "   "] {
            let v = validate_email(input);
            assert!(!v.success);
            assert_eq!(v.prompt_content.as_deref(), Some("Email is required"));
            assert_eq!(v.prompt_duration_ms, Some(3000));
        }
    }

    #[test]
    fn email_needs_a_domain_dot() {
        let v = validate_email("a@b");
        assert!(!v.success);
        assert_eq!(
            v.prompt_content.as_deref(),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn well_formed_email_passes() {
        assert!(validate_email("a@b.com").success);
        assert!(validate_email("first.last@dept.example.edu").success);
    }

    #[test]
    fn rejects_spaces_and_missing_local_part() {
        assert!(!validate_email("a b@c.com").success);
        assert!(!validate_email("@c.com").success);
    }

    #[test]
    fn required_field_carries_its_label() {
        let v = validate_required("  ", "Name");
        assert!(!v.success);
        assert_eq!(v.prompt_content.as_deref(), Some("Name is required"));
        assert!(validate_required("Ada", "Name").success);
    }

    #[test]
    fn optional_validator_always_passes() {
        assert!(validate_optional("").success);
        assert!(validate_optional("anything").success);
    }

    #[test]
    fn optional_input_skip_tokens_become_empty() {
        for input in ["", "   ", "skip", "SKIP", " Skip "] {
            assert_eq!(process_optional_input(input), "");
        }
    }

    #[test]
    fn optional_input_is_trimmed() {
        assert_eq!(process_optional_input(" id123 "), "id123");
    }
}
