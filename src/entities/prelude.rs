pub use super::agencies::Entity as Agencies;
pub use super::app_defaults::Entity as AppDefaults;
pub use super::logs::Entity as Logs;
pub use super::providers::Entity as Providers;
pub use super::users::Entity as Users;
pub use super::verifications::Entity as Verifications;
