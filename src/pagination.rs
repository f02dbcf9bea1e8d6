use serde::Serialize;

use crate::constants::limits::PAGINATE_LIMIT;

/// Offset window for a paginated listing.
///
/// The arithmetic is legacy behavior that downstream consumers depend on:
/// the last-page start is `(total - records) - (total - page * records)`
/// computed in saturating unsigned math, so an uneven final page yields a
/// full-size window ending at `total` rather than a short remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: u64,
    pub end: u64,
    pub pages: u64,
    pub limit: u64,
}

#[must_use]
pub fn paginate(page: Option<u64>, size: Option<u64>, total_records: u64) -> Window {
    let records = match size {
        Some(s) if s >= PAGINATE_LIMIT => s,
        _ => PAGINATE_LIMIT,
    };
    let pages = total_records.div_ceil(records);

    // Out-of-range or missing page falls back to the first window.
    let Some(page) = page.filter(|p| *p >= 1 && *p <= pages) else {
        let end = total_records.min(records);
        return Window {
            start: 0,
            end,
            pages,
            limit: end,
        };
    };

    let end = if page == pages { total_records } else { page * records };
    let start = if page == 1 {
        0
    } else if page == pages {
        (total_records - records).saturating_sub(total_records.saturating_sub(page * records))
    } else {
        end - records
    };

    Window {
        start,
        end,
        pages,
        limit: end - start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let w = paginate(Some(1), Some(20), 45);
        assert_eq!(w, Window { start: 0, end: 20, pages: 3, limit: 20 });
    }

    #[test]
    fn test_middle_page() {
        let w = paginate(Some(2), Some(20), 45);
        assert_eq!(w, Window { start: 20, end: 40, pages: 3, limit: 20 });
    }

    #[test]
    fn test_uneven_last_page_keeps_full_window() {
        let w = paginate(Some(3), Some(20), 45);
        assert_eq!(w, Window { start: 25, end: 45, pages: 3, limit: 20 });
    }

    #[test]
    fn test_even_last_page() {
        let w = paginate(Some(3), Some(20), 60);
        assert_eq!(w, Window { start: 40, end: 60, pages: 3, limit: 20 });
    }

    #[test]
    fn test_out_of_range_page_matches_missing_page() {
        let fallback = paginate(None, Some(20), 45);
        assert_eq!(fallback, Window { start: 0, end: 20, pages: 3, limit: 20 });
        assert_eq!(paginate(Some(4), Some(20), 45), fallback);
        assert_eq!(paginate(Some(0), Some(20), 45), fallback);
    }

    #[test]
    fn test_size_below_minimum_is_clamped() {
        let w = paginate(Some(1), Some(5), 45);
        assert_eq!(w.limit, 20);
    }

    #[test]
    fn test_fewer_records_than_page_size() {
        let w = paginate(None, None, 7);
        assert_eq!(w, Window { start: 0, end: 7, pages: 1, limit: 7 });
    }

    #[test]
    fn test_empty_table() {
        let w = paginate(Some(1), Some(20), 0);
        assert_eq!(w, Window { start: 0, end: 0, pages: 0, limit: 0 });
    }
}
