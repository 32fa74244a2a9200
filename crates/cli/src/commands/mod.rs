pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Read the database URL, preferring `CRM_DATABASE_URL` over `DATABASE_URL`.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("CRM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
