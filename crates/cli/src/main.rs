//! CRM CLI - database migrations and user bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! crm-cli migrate
//!
//! # Create the first admin (registering an admin over the API needs one)
//! crm-cli user create -e admin@example.com -n "Admin Name" -r admin --password '...'
//! ```
//!
//! Both commands read `CRM_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "crm-cli")]
#[command(author, version, about = "CRM backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user with any role
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`user`, `admin`, `premium`)
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Initial password
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create_user(&email, &name, &role, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_user_create_defaults_to_user_role() {
        let cli = Cli::try_parse_from([
            "crm-cli", "user", "create", "-e", "a@b.io", "-n", "Ana", "--password", "pw",
        ])
        .unwrap();

        match cli.command {
            Commands::User {
                action: UserAction::Create { role, .. },
            } => assert_eq!(role, "user"),
            Commands::Migrate => panic!("expected user create"),
        }
    }

    #[test]
    fn test_user_create_requires_password() {
        let result = Cli::try_parse_from(["crm-cli", "user", "create", "-e", "a@b.io", "-n", "Ana"]);
        assert!(result.is_err());
    }
}
