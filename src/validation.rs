//! Validation for user-authored quests, missions and milestones.

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 120;
/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Validation errors with messages suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please provide a title for your {what}")]
    MissingTitle { what: &'static str },

    #[error("The {what} title is too long (maximum {max} characters)")]
    TitleTooLong { what: &'static str, max: usize },

    #[error("The {what} description is too long (maximum {max} characters)")]
    DescriptionTooLong { what: &'static str, max: usize },

    #[error("A mission needs at least one milestone")]
    NoMilestones,

    #[error("Please provide a title for milestone {index}")]
    MissingMilestoneTitle { index: usize },

    #[error("Invalid milestone '{input}': {reason}")]
    MalformedMilestone { input: String, reason: String },
}

/// Trim a title and check it is present and not oversized.
pub fn validate_title(what: &'static str, raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle { what });
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            what,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(title.to_string())
}

/// Trim a description. Empty descriptions are allowed.
pub fn validate_description(what: &'static str, raw: &str) -> Result<String, ValidationError> {
    let description = raw.trim();
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            what,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(description.to_string())
}
