//! CLI module for the userdesk command-line interface.
//!
//! One-shot subcommands talk to the remote API and exit:
//! - `login` / `logout` - Manage the stored session
//! - `status` - Show guard state and the configured endpoint
//! - `users list|add|edit|delete` - Work with one page of the directory
//! - `config check` - Validate configuration file
//!
//! `shell` (the default) starts an interactive console that keeps the
//! directory page in memory between commands.

pub mod shell;
pub mod table;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::directory::{MutationOutcome, UserDirectory};
use crate::guard::{GuardDecision, GuardState, Route};
use crate::models::{Credentials, User, UserDraft};
use crate::Console;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "userdesk")]
#[command(author, version, about = "A terminal admin console for user-management APIs", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "userdesk.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API base URL (overrides the config file)
    #[arg(long, env = "USERDESK_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as x-api-key (overrides the config file)
    #[arg(long, env = "USERDESK_API_KEY")]
    pub api_key: Option<String>,

    /// Session token file (overrides the config file)
    #[arg(long, env = "USERDESK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Subcommand to run (if none, starts the interactive shell)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            config.api.api_key = Some(key.clone());
        }
        if let Some(path) = &self.session_file {
            config.session.path = Some(path.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "USERDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show session state and the configured API
    Status,

    /// User directory commands
    #[command(subcommand)]
    Users(UsersCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Start the interactive console
    Shell,
}

/// Users subcommands
#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// Show one page of users
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Add a user
    Add {
        #[command(flatten)]
        fields: UserFields,
        /// Page to load before adding
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Edit a user shown on the given page
    Edit {
        id: u64,
        #[command(flatten)]
        fields: UserFields,
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Delete a user shown on the given page
    Delete {
        id: u64,
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Form fields for add and edit. Omitted fields are empty on add and keep
/// their current value on edit.
#[derive(Args, Debug, Clone, Default)]
pub struct UserFields {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
}

impl UserFields {
    pub fn into_draft(self) -> UserDraft {
        UserDraft {
            email: self.email.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
        }
    }

    pub fn apply_to(self, user: &User) -> UserDraft {
        let current = UserDraft::from(user);
        UserDraft {
            email: self.email.unwrap_or(current.email),
            first_name: self.first_name.unwrap_or(current.first_name),
            last_name: self.last_name.unwrap_or(current.last_name),
        }
    }
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli, console: &Console) -> Result<()> {
    match &cli.command {
        Some(Commands::Login { email, password }) => cmd_login(console, email, password).await,
        Some(Commands::Logout) => cmd_logout(console).await,
        Some(Commands::Status) => cmd_status(console),
        Some(Commands::Users(UsersCommands::List { page })) => cmd_users_list(console, *page).await,
        Some(Commands::Users(UsersCommands::Add { fields, page })) => {
            cmd_users_add(console, fields.clone(), *page).await
        }
        Some(Commands::Users(UsersCommands::Edit { id, fields, page })) => {
            cmd_users_edit(console, *id, fields.clone(), *page).await
        }
        Some(Commands::Users(UsersCommands::Delete { id, page, yes })) => {
            cmd_users_delete(console, *id, *page, *yes).await
        }
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        Some(Commands::Shell) | None => shell::run(console).await,
    }
}

async fn cmd_login(console: &Console, email: &str, password: &str) -> Result<()> {
    let credentials = Credentials::new(email, password);
    match console.auth().login(&credentials).await {
        Ok(notification) => {
            println!("{}", notification);
            Ok(())
        }
        Err(e) => {
            if let Some(errors) = e.field_errors() {
                print!("{}", table::render_field_errors(errors));
            }
            if let Some(notification) = e.notification() {
                println!("{}", notification);
            }
            Err(e).context("Login failed")
        }
    }
}

async fn cmd_logout(console: &Console) -> Result<()> {
    let notification = console.auth().logout().await;
    println!("{}", notification);
    Ok(())
}

fn cmd_status(console: &Console) -> Result<()> {
    let guard = console.guard();

    println!();
    println!("=== userdesk Status ===");
    println!();
    println!("API:        {}", console.api.base_url());
    println!(
        "Session:    {}",
        match guard.state() {
            GuardState::Authorized => "[OK] Logged in",
            GuardState::Unauthorized => "[!!] Not logged in",
        }
    );
    println!("Route:      {}", guard_landing(console));
    println!();
    Ok(())
}

/// Where the guard sends a visitor to the root route.
fn guard_landing(console: &Console) -> Route {
    match console.guard().check(&Route::root()) {
        GuardDecision::Render(route) | GuardDecision::Redirect(route) => route,
    }
}

/// Enter the protected root and mount the directory on `page`.
async fn open_directory(console: &Console, page: u32) -> Result<UserDirectory> {
    if let GuardDecision::Redirect(_) = console.guard().enter(Route::root()) {
        anyhow::bail!("Not logged in. Run `userdesk login` first.");
    }

    let mut directory = console.directory();
    if !directory.set_page(page).await {
        report(console, &mut directory);
        anyhow::bail!("Failed to load page {}", page);
    }
    Ok(directory)
}

/// Print the pending notification, and explain a forced logout.
fn report(console: &Console, directory: &mut UserDirectory) {
    if let Some(notification) = directory.take_notification() {
        println!("{}", notification);
    }
    if console.navigator.current() == Route::Login {
        println!("Session is no longer valid. Run `userdesk login` again.");
    }
}

fn finish(console: &Console, directory: &mut UserDirectory, outcome: MutationOutcome) -> Result<()> {
    match outcome {
        MutationOutcome::Applied => {
            report(console, directory);
            println!();
            print!("{}", table::render_users(directory.page()));
            Ok(())
        }
        MutationOutcome::Failed => {
            report(console, directory);
            anyhow::bail!("Request failed");
        }
        MutationOutcome::Invalid(errors) => {
            print!("{}", table::render_field_errors(&errors));
            anyhow::bail!("Invalid user fields");
        }
        MutationOutcome::Idle => Ok(()),
    }
}

async fn cmd_users_list(console: &Console, page: u32) -> Result<()> {
    let directory = open_directory(console, page).await?;
    println!();
    print!("{}", table::render_users(directory.page()));
    Ok(())
}

async fn cmd_users_add(console: &Console, fields: UserFields, page: u32) -> Result<()> {
    let mut directory = open_directory(console, page).await?;
    directory.open_add();
    let outcome = directory.save(fields.into_draft()).await;
    finish(console, &mut directory, outcome)
}

async fn cmd_users_edit(console: &Console, id: u64, fields: UserFields, page: u32) -> Result<()> {
    let mut directory = open_directory(console, page).await?;
    let user = directory
        .page()
        .find(id)
        .cloned()
        .with_context(|| format!("User {} not found on page {}", id, page))?;

    directory.open_edit(id);
    let outcome = directory.save(fields.apply_to(&user)).await;
    finish(console, &mut directory, outcome)
}

async fn cmd_users_delete(console: &Console, id: u64, page: u32, yes: bool) -> Result<()> {
    let mut directory = open_directory(console, page).await?;
    if !directory.request_delete(id) {
        anyhow::bail!("User {} not found on page {}", id, page);
    }

    if !yes && !confirm("Are you sure you want to delete this user?")? {
        directory.cancel_delete();
        println!("Deletion cancelled.");
        return Ok(());
    }

    let outcome = directory.confirm_delete().await;
    finish(console, &mut directory, outcome)
}

/// Ask a yes/no question on stdin; anything but "y"/"yes" is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Validate configuration file
pub fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(mut config) => {
            cli.apply_overrides(&mut config);

            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!(
                "  API Key:      {}",
                if config.api.api_key.as_deref().map_or(false, |k| !k.is_empty()) {
                    "Set"
                } else {
                    "Not set"
                }
            );
            println!();
            println!("Session:");
            println!("  File:         {}", config.session.resolved_path().display());
            println!(
                "  On 401:       {}",
                if config.session.clear_on_unauthorized {
                    "Clear token"
                } else {
                    "Keep token"
                }
            );
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            anyhow::bail!("Invalid configuration file");
        }
    }
}
