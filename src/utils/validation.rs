use crate::utils::error::{LimsError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LimsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LimsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LimsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Spooler queue names are passed as a single argument, so no whitespace.
pub fn validate_queue_name(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(LimsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Printer names cannot contain whitespace".to_string(),
        });
    }
    Ok(())
}

pub fn validate_unique_ids<I>(field_name: &str, ids: I) -> Result<()>
where
    I: IntoIterator<Item = u64>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LimsError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: id.to_string(),
                reason: "Duplicate id".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_queue_name() {
        assert!(validate_queue_name("printers.name", "zebra_lab1").is_ok());
        assert!(validate_queue_name("printers.name", "").is_err());
        assert!(validate_queue_name("printers.name", "zebra lab").is_err());
    }

    #[test]
    fn test_validate_unique_ids() {
        assert!(validate_unique_ids("templates.id", [1, 2, 3]).is_ok());
        assert!(validate_unique_ids("templates.id", [1, 2, 1]).is_err());
    }
}
