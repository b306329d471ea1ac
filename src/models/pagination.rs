// src/models/pagination.rs

use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Normalizes the raw query into (page, limit, offset).
    /// Page is clamped to >= 1, limit to 1..=MAX_LIMIT. The offset saturates
    /// so an absurd page number yields an empty page, never an overflow.
    pub fn window(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (page, limit, (page - 1).saturating_mul(limit))
    }
}

/// `ceil(total / limit)`; an empty collection has zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(PageParams::default().window(), (1, DEFAULT_LIMIT, 0));
        let p = PageParams { page: Some(3), limit: Some(20) };
        assert_eq!(p.window(), (3, 20, 40));
        let p = PageParams { page: Some(0), limit: Some(500) };
        assert_eq!(p.window(), (1, MAX_LIMIT, 0));
        let p = PageParams { page: Some(-4), limit: Some(-1) };
        assert_eq!(p.window(), (1, 1, 0));
    }

    #[test]
    fn window_saturates_instead_of_overflowing_on_huge_pages() {
        let p = PageParams { page: Some(i64::MAX), limit: Some(100) };
        assert_eq!(p.window(), (i64::MAX, 100, i64::MAX));
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 10), 10);
    }
}
