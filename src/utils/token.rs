use crate::error::AppError;

const STUDENT_PREFIX: &str = "STUDENT:";

/// Extracts the student id from a scanned `STUDENT:<id>` QR payload.
///
/// The prefix is case-sensitive and the id must be plain ASCII digits with
/// no sign and no surrounding whitespace.
pub fn parse_student_token(raw: &str) -> Result<i64, AppError> {
    let digits = raw
        .strip_prefix(STUDENT_PREFIX)
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .ok_or(AppError::MalformedToken)?;

    digits.parse::<i64>().map_err(|_| AppError::MalformedToken)
}
