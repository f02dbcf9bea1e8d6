pub mod headers {
    pub const HEADER_ACCESS_KEY: &str = "ninvs-access-key";
    pub const HEADER_ACCESS_TOKEN: &str = "ninvs-access-token";
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time in the canonical "YYYY-MM-DD HH:MM:SS" form stored everywhere.
#[must_use]
pub fn now_str() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

pub mod status {
    pub const DELETED: i32 = 0;
    pub const ACTIVE: i32 = 1;
    pub const PENDING: i32 = 2;
}

pub mod access {
    pub const GRANTED: i32 = 1;
    pub const SUSPENDED: i32 = 2;
    pub const REVOKED: i32 = 3;
}

pub mod user_types {
    pub const ADMIN: &str = "ADMIN";
    pub const AGENCY: &str = "AGENCY";
    pub const PROVIDER: &str = "PROVIDER";
    pub const CITIZEN: &str = "CITIZEN";
}

pub mod app_defaults {
    pub const MAINTENANCE: &str = "Maintenance";
    pub const PAYSTACK_SECRET_KEY: &str = "Paystack_Secret_Key";
    pub const PAYSTACK_PUBLIC_KEY: &str = "Paystack_Public_Key";
    pub const PASSCODER_TEST_KEY: &str = "Passcoder_Test_Key";
    pub const PASSCODER_LIVE_KEY: &str = "Passcoder_Live_Key";
    pub const USERS_EMAILS: &str = "Users_Emails";
    pub const USERS_PHONE_NUMBERS: &str = "Users_Phone_Numbers";
    pub const API_WHITELIST: &str = "Api_Whitelist";
}

pub mod limits {
    /// Minimum (and default) page size for list endpoints.
    pub const PAGINATE_LIMIT: u64 = 20;

    pub const TYPE_MAX: usize = 50;

    pub const ACTION_MAX: usize = 200;

    /// TEXT column ceiling, matches the audit `details` column.
    pub const TEXT_MAX: usize = 65535;
}

pub mod tokens {
    /// Token lifetime in seconds (24 hours).
    pub const DEFAULT_TTL: u64 = 86400;

    /// Extended lifetime when the caller passes `remember_me` (7 days).
    pub const REMEMBER_ME_TTL: u64 = 604_800;
}
