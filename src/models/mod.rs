pub mod bill;
pub mod collector;
pub mod customer;
pub mod dashboard;
pub mod onboarding;
pub mod plan;
pub mod reference;
pub mod user;

pub use bill::*;
pub use collector::*;
pub use customer::*;
pub use dashboard::*;
pub use onboarding::*;
pub use plan::*;
pub use reference::*;
pub use user::*;
