//! Domain models for the CRM API.
//!
//! Response types serialize straight to the JSON the API returns. Request
//! bodies are `*Input` types; beyond serde's presence checks they are not
//! validated.

pub mod analytics;
pub mod customer;
pub mod deal;
pub mod notification;
pub mod report;
pub mod task;
pub mod user;

pub use analytics::AnalyticsSummary;
pub use customer::{Customer, CustomerInput};
pub use deal::{Deal, DealInput};
pub use notification::Notification;
pub use report::{Report, ReportInput};
pub use task::{Task, TaskInput};
pub use user::{
    Identity, LoginInput, LoginResponse, RegisterInput, RoleUpdateInput, UpgradeInput, User,
};
