use crate::constants::{TIMESTAMP_FORMAT, limits};
use crate::db::{NewLog, Store};
use chrono::{Months, Utc};
use tracing::{error, info, warn};

/// Records who did what. Entries are written in the background and
/// expire a month after creation; a rejected or failed entry never
/// fails the request that produced it.
#[derive(Clone)]
pub struct AuditService {
    store: Store,
}

impl AuditService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn record(&self, user_unique_id: &str, log_type: &str, action: &str) {
        self.record_with_details(user_unique_id, log_type, action, None);
    }

    pub fn record_with_details(
        &self,
        user_unique_id: &str,
        log_type: &str,
        action: &str,
        details: Option<String>,
    ) {
        if let Some((param, msg)) = validate(user_unique_id, log_type, action, details.as_deref()) {
            warn!(
                unique_id = user_unique_id,
                "Logs | Validation Error Occured - {param} : {msg}"
            );
            return;
        }

        let entry = NewLog {
            user_unique_id: user_unique_id.to_string(),
            r#type: log_type.to_string(),
            action: action.to_string(),
            details,
        };
        let expiry = expiry_date();
        let store = self.store.clone();
        let unique_id = user_unique_id.to_string();
        let action = action.to_string();

        tokio::spawn(async move {
            match store.add_log(entry, expiry).await {
                Ok(_) => info!(unique_id, "Log - {action}"),
                Err(err) => error!(unique_id, "Failed to record audit entry: {err}"),
            }
        });
    }
}

fn validate(
    user_unique_id: &str,
    log_type: &str,
    action: &str,
    details: Option<&str>,
) -> Option<(&'static str, &'static str)> {
    if user_unique_id.is_empty() {
        Some(("user_unique_id", "User Unique ID is required"))
    } else if log_type.is_empty() {
        Some(("type", "Type is required"))
    } else if log_type.len() > limits::TYPE_MAX {
        Some(("type", "Type max length reached"))
    } else if action.is_empty() {
        Some(("action", "Action is required"))
    } else if action.len() > limits::ACTION_MAX {
        Some(("action", "Action max length reached"))
    } else if details.is_some_and(|d| !d.is_empty() && d.len() > limits::TEXT_MAX) {
        Some(("details", "Details max length reached"))
    } else {
        None
    }
}

fn expiry_date() -> String {
    let now = Utc::now();
    now.checked_add_months(Months::new(1))
        .unwrap_or(now)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_plain_entry() {
        assert_eq!(validate("user-1", "Agencies", "Added new agency", None), None);
    }

    #[test]
    fn test_validate_rejects_missing_actor() {
        let err = validate("", "Agencies", "Added new agency", None);
        assert_eq!(err, Some(("user_unique_id", "User Unique ID is required")));
    }

    #[test]
    fn test_validate_rejects_long_type() {
        let log_type = "x".repeat(limits::TYPE_MAX + 1);
        let err = validate("user-1", &log_type, "action", None);
        assert_eq!(err, Some(("type", "Type max length reached")));
    }

    #[test]
    fn test_validate_rejects_long_action() {
        let action = "x".repeat(limits::ACTION_MAX + 1);
        let err = validate("user-1", "Users", &action, None);
        assert_eq!(err, Some(("action", "Action max length reached")));
    }

    #[test]
    fn test_validate_allows_empty_details() {
        assert_eq!(validate("user-1", "Users", "action", Some("")), None);
    }

    #[test]
    fn test_expiry_date_is_a_month_out() {
        let expiry = expiry_date();
        let parsed = chrono::NaiveDateTime::parse_from_str(&expiry, TIMESTAMP_FORMAT)
            .expect("expiry should parse");
        assert!(parsed > Utc::now().naive_utc());
    }
}
