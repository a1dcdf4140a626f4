/// Errors reported back to the action that triggered them.
///
/// Everything else (missing ids, unavailable or corrupt storage) is absorbed
/// by the operation itself and never surfaces here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Board name must not be blank")]
    BlankBoardName,

    #[error("List title must not be blank")]
    BlankListTitle,

    #[error("Task title must not be blank")]
    BlankTaskTitle,

    #[error("List not found: {0}")]
    ListNotFound(String),
}

/// Trim `value` and reject it with `err` if nothing is left.
pub(crate) fn require_text(value: &str, err: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_string())
    }
}
