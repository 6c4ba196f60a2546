//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::engine::normalize::normalize_answer;

/// Validates that a keyword survives normalization; a keyword normalizing to
/// an empty string could never be matched by any guess.
pub fn non_blank_keyword(keyword: &str) -> Result<(), ValidationError> {
    if normalize_answer(keyword).is_empty() {
        let mut err = ValidationError::new("blank_keyword");
        err.message = Some("Keyword normalizes to an empty string".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that an award schedule is non-empty, positive and strictly
/// descending.
pub fn descending_schedule(schedule: &[i32]) -> Result<(), ValidationError> {
    if schedule.is_empty() {
        let mut err = ValidationError::new("empty_schedule");
        err.message = Some("Award schedule must list at least one value".into());
        return Err(err);
    }
    if schedule.iter().any(|award| *award <= 0) {
        let mut err = ValidationError::new("non_positive_award");
        err.message = Some("Awards must be positive".into());
        return Err(err);
    }
    if schedule.windows(2).any(|pair| pair[0] <= pair[1]) {
        let mut err = ValidationError::new("unsorted_schedule");
        err.message = Some("Awards must be strictly descending".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_keyword() {
        assert!(non_blank_keyword("vung ang").is_ok());
        assert!(non_blank_keyword("PVOIL!").is_ok());
        assert!(non_blank_keyword("!!! ---").is_err());
        assert!(non_blank_keyword("").is_err());
    }

    #[test]
    fn test_descending_schedule() {
        assert!(descending_schedule(&[30, 20, 10]).is_ok());
        assert!(descending_schedule(&[30]).is_ok());
        assert!(descending_schedule(&[30, 30, 10]).is_err()); // not strict
        assert!(descending_schedule(&[10, 20]).is_err()); // ascending
        assert!(descending_schedule(&[30, 0]).is_err()); // non-positive
        assert!(descending_schedule(&[]).is_err()); // empty
    }
}
