use crate::error::{AppError, Result};
use crate::models::enrollment::Decision;

/// The message shown when a rejection is confirmed without a remark.
pub const REMARK_REQUIRED: &str = "Remark is required to reject";

/// Validates the remark accompanying a decision.
///
/// Rejections need a non-blank remark; approvals take none.
///
/// # Returns
///
/// The trimmed remark to send, if any.
pub fn validate_remark(decision: Decision, remark: Option<&str>) -> Result<Option<String>> {
    match decision {
        Decision::Approved => Ok(None),
        Decision::Rejected => {
            let remark = remark.map(str::trim).unwrap_or_default();
            if remark.is_empty() {
                return Err(AppError::Validation(REMARK_REQUIRED.to_string()));
            }
            Ok(Some(remark.to_string()))
        }
    }
}
