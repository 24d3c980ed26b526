//! Shared pieces of the catalog services (programs, courses, lessons, modules).

use crate::database::manager::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Database(DatabaseError::Sqlx(err))
    }
}

/// Title validation shared by every content level
pub(crate) fn validate_title(title: &str) -> Result<(), CatalogError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation("title must not be empty".to_string()));
    }
    if trimmed.len() > 200 {
        return Err(CatalogError::Validation("title must be at most 200 characters".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_oversized_titles() {
        assert!(validate_title("Onboarding 101").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }
}
