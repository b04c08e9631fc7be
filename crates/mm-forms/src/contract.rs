//! Field contract for the minutes form

use mm_core::error::ValidationErrors;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Validates the text fields of a minutes form
#[derive(Debug, Clone)]
pub struct MinutesContract {
    title_max_length: usize,
}

impl MinutesContract {
    pub fn new(title_max_length: usize) -> Self {
        Self { title_max_length }
    }

    fn validate_title(&self, title: &str, errors: &mut ValidationErrors) {
        if title.trim().is_empty() {
            errors.add("title", "can't be blank");
        } else if title.chars().count() > self.title_max_length {
            errors.add(
                "title",
                format!("must be at most {} characters", self.title_max_length),
            );
        }
    }

    fn validate_content(&self, content: &str, errors: &mut ValidationErrors) {
        if content.trim().is_empty() {
            errors.add("content", "can't be blank");
        }
    }

    pub fn validate(&self, title: &str, content: &str) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_title(title, &mut errors);
        self.validate_content(content, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for MinutesContract {
    fn default() -> Self {
        Self::new(100)
    }
}
