use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Password;
use tasknest::TaskNest;
use tasknest_core::config::TaskNestConfig;
use tasknest_core::model::User;
use tasknest_core::Store;

/// Non-interactive password source; checked before prompting.
const PASSWORD_ENV: &str = "TASKNEST_PASSWORD";

/// Manage users with password credentials.
///
/// Passwords come from `TASKNEST_PASSWORD` or a hidden prompt, never argv.
#[derive(Parser)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user with a password.
    Add { name: String },

    /// Check a user's password.
    Verify { name: String },
}

impl UserCommand {
    pub async fn execute(self, config: TaskNestConfig) -> Result<()> {
        if !config.database.is_postgres() {
            bail!("User commands need database.url (or DATABASE_URL) to be set");
        }

        let app = TaskNest::builder().config(config).build()?;
        let handle = app.open_store().await?;

        let outcome = match self.action {
            UserAction::Add { name } => {
                let password = read_password(true)?;
                add_user(handle.store.as_ref(), &name, &password)
                    .await
                    .map(|_| ())
            }
            UserAction::Verify { name } => {
                let password = read_password(false)?;
                verify_user(handle.store.as_ref(), &name, &password)
                    .await
                    .and_then(|ok| {
                        if ok {
                            Ok(())
                        } else {
                            bail!("Invalid name or password")
                        }
                    })
            }
        };
        handle.close().await;
        outcome?;

        println!("  {} Done", style("✓").green());
        Ok(())
    }
}

fn read_password(confirm: bool) -> Result<String> {
    password_or_prompt(std::env::var(PASSWORD_ENV).ok(), || {
        let prompt = Password::new().with_prompt("Password");
        let prompt = if confirm {
            prompt.with_confirmation("Confirm password", "Passwords do not match")
        } else {
            prompt
        };
        Ok(prompt.interact()?)
    })
}

/// Use the environment value when set and non-empty, otherwise prompt.
fn password_or_prompt(
    from_env: Option<String>,
    prompt: impl FnOnce() -> Result<String>,
) -> Result<String> {
    match from_env.filter(|p| !p.is_empty()) {
        Some(password) => Ok(password),
        None => prompt(),
    }
}

/// Create a user with hashed credentials. Names are unique.
pub async fn add_user(store: &dyn Store, name: &str, password: &str) -> Result<User> {
    let name = name.trim();
    if name.is_empty() || password.is_empty() {
        bail!("Name and password must not be empty");
    }

    let mut tx = store.begin().await?;
    if tx.find_user(name).await?.is_some() {
        bail!("User '{}' already exists", name);
    }
    let user = tx.insert_user(User::with_password(name, password)).await?;
    tx.commit().await?;

    tracing::info!(user = %user.name, "User created");
    Ok(user)
}

/// Whether `password` matches the stored credentials of `name`.
pub async fn verify_user(store: &dyn Store, name: &str, password: &str) -> Result<bool> {
    let mut tx = store.begin().await?;
    Ok(tx
        .find_user(name.trim())
        .await?
        .map(|user| user.check_password(password))
        .unwrap_or(false))
}
