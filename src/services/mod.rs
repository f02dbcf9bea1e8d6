pub mod audit;
pub mod verify;

pub use audit::AuditService;
pub use verify::{LookupError, LookupOutcome, LookupRequest, VerificationService};
