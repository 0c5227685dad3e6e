pub mod annotations;
pub mod api_keys;
pub mod categories;
pub mod instances;
pub mod persons;
pub mod texts;

use crate::error_handler::{AppError, AppResult};

/// Shared paging rules: `limit` in 1..=100 (default 20), `offset ≥ 0`
/// (default 0).
pub(crate) fn paging(limit: Option<i64>, offset: Option<i64>) -> AppResult<(i64, i64)> {
    let limit = limit.unwrap_or(20);
    let offset = offset.unwrap_or(0);
    if !(1..=100).contains(&limit) {
        return Err(AppError::BadRequest("limit must be between 1 and 100".into()));
    }
    if offset < 0 {
        return Err(AppError::BadRequest("offset must be non-negative".into()));
    }
    Ok((limit, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_bounds() {
        assert_eq!(paging(None, None).unwrap(), (20, 0));
        assert_eq!(paging(Some(1), Some(0)).unwrap(), (1, 0));
        assert_eq!(paging(Some(100), Some(5000)).unwrap(), (100, 5000));
        assert!(paging(Some(0), None).is_err());
        assert!(paging(Some(101), None).is_err());
        assert!(paging(None, Some(-1)).is_err());
    }
}
