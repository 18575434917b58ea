//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read the database URL the server uses.
///
/// Loads `.env` first, then `TQ_DATABASE_URL` with `DATABASE_URL` as fallback.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("TQ_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
