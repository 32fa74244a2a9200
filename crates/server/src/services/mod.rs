//! Business services used by the route handlers.

pub mod email;
pub mod notifier;
pub mod password;
pub mod tokens;

pub use email::EmailService;
pub use notifier::{NotificationMessage, NotificationStore, Notifier};
pub use password::{PasswordError, hash_password, verify_password};
pub use tokens::{Claims, TokenError, TokenService, bearer_token};
