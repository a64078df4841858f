pub mod assignment_service;
pub mod auth_service;
pub mod backend_client;
pub mod billing_service;
pub mod mail_service;
pub mod memory_store;
pub mod onboarding_service;
pub mod password_service;
pub mod record_store;
pub mod reference_service;
pub mod remote_store;
pub mod session_service;
pub mod stats_service;

pub use assignment_service::AssignmentService;
pub use auth_service::AuthService;
pub use backend_client::BackendClient;
pub use billing_service::BillingService;
pub use mail_service::MailService;
pub use memory_store::MemoryStore;
pub use onboarding_service::OnboardingService;
pub use password_service::PasswordService;
pub use record_store::RecordStore;
pub use reference_service::{ReferenceService, ReferenceSnapshot};
pub use remote_store::RemoteStore;
pub use session_service::{SessionRegistry, SessionService};
pub use stats_service as stats;
