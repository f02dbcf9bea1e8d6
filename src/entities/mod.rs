pub mod prelude;

pub mod agencies;
pub mod app_defaults;
pub mod logs;
pub mod providers;
pub mod users;
pub mod verifications;
