pub mod agency;
pub mod app_default;
pub mod log;
pub mod provider;
pub mod user;
pub mod verification;

/// Listing order requested by the caller. Column names outside the
/// per-repository allow-list fall back to the creation timestamp.
#[derive(Clone, Debug)]
pub struct Ordering {
    pub order_by: String,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            order_by: "createdAt".to_string(),
            descending: true,
        }
    }
}

/// Expands a pair of `YYYY-MM-DD` dates to the inclusive timestamp
/// bounds of those days.
pub fn day_range(start_date: &str, end_date: &str) -> (String, String) {
    (
        format!("{start_date} 00:00:00"),
        format!("{end_date} 23:59:59"),
    )
}

impl Ordering {
    pub fn new(order_by: Option<String>, sort_by: Option<String>) -> Self {
        let descending = sort_by
            .as_deref()
            .is_none_or(|s| !s.eq_ignore_ascii_case("asc"));
        Self {
            order_by: order_by.unwrap_or_else(|| "createdAt".to_string()),
            descending,
        }
    }
}
