use crate::error::AppError;

pub fn validate_non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub fn validate_capacity(capacity: i64) -> Result<i64, AppError> {
    if capacity <= 0 {
        return Err(AppError::Validation(
            "Room capacity must be greater than zero".to_string(),
        ));
    }
    Ok(capacity)
}

/// Rounded percentage; a zero denominator yields 0.
pub fn percentage(numerator: usize, denominator: usize) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((numerator as f64 / denominator as f64) * 100.0).round() as u32
}
