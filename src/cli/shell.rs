//! Interactive console.
//!
//! The shell keeps one [`UserDirectory`] alive between commands, so local
//! adds, edits and deletes stay visible until the next page load. The guard
//! is consulted before every protected command; when a 401 sends the
//! navigator back to login, the prompt switches to `login>`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::table::{render_field_errors, render_users};
use super::UserFields;
use crate::directory::{Modal, MutationOutcome, UserDirectory};
use crate::guard::{GuardDecision, GuardState, Route};
use crate::models::Credentials;
use crate::Console;

/// One line typed at the prompt
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Log in: login <email> <password>
    Login { email: String, password: String },
    /// Log out and return to the login prompt
    Logout,
    /// Show the current page
    List,
    /// Reload the current page from the server
    Refresh,
    /// Go to a page
    Page { number: u32 },
    /// Next page
    Next,
    /// Previous page
    Prev,
    /// Add a user: add --email E --first-name F --last-name L
    Add {
        #[command(flatten)]
        fields: UserFields,
    },
    /// Edit a user on this page: edit <id> [--email E] [--first-name F] [--last-name L]
    Edit {
        id: u64,
        #[command(flatten)]
        fields: UserFields,
    },
    /// Ask to delete a user on this page
    Delete { id: u64 },
    /// Confirm the pending delete
    Confirm,
    /// Cancel the pending delete
    Cancel,
    /// Show session state
    Status,
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub async fn run(console: &Console) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let guard = console.guard();
    let mut directory = console.directory();

    println!("=== userdesk console ===");
    println!("API: {}", console.api.base_url());
    println!("Type 'help' for commands, 'quit' to exit.");
    println!();

    if let GuardDecision::Render(_) = guard.enter(Route::root()) {
        mount(console, &mut directory).await;
    } else {
        println!("Not logged in. Use: login <email> <password>");
    }

    loop {
        let prompt = match console.navigator.current() {
            Route::Login => "login> ",
            Route::Protected(_) => "users> ",
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match split_line(trimmed)
                    .map_err(|e| e.to_string())
                    .and_then(|words| ShellLine::try_parse_from(words).map_err(|e| e.to_string()))
                {
                    Ok(parsed) => parsed.command,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };

                if let Flow::Quit = dispatch(console, &mut directory, command).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Type 'quit' to exit.");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Run one parsed command. When a request ends at the login route, the
/// directory is replaced with a fresh, unloaded one.
pub async fn dispatch(
    console: &Console,
    directory: &mut UserDirectory,
    command: ShellCommand,
) -> Flow {
    let was_protected = console.navigator.current().is_protected();

    match command {
        ShellCommand::Quit => return Flow::Quit,
        ShellCommand::Status => print_status(console),
        ShellCommand::Login { email, password } => {
            login(console, directory, Credentials::new(email, password)).await;
            return Flow::Continue;
        }
        ShellCommand::Logout => {
            let notification = directory.logout().await;
            println!("{}", notification);
            *directory = console.directory();
            return Flow::Continue;
        }
        protected => {
            if let GuardDecision::Redirect(_) = console.guard().enter(Route::root()) {
                println!("Not logged in. Use: login <email> <password>");
                return Flow::Continue;
            }
            if !directory.is_loaded() && !directory.load().await {
                report(directory);
            } else {
                run_protected(directory, protected).await;
            }
        }
    }

    if was_protected && console.navigator.current() == Route::Login {
        println!("Session is no longer valid. Please log in again.");
        *directory = console.directory();
    }
    Flow::Continue
}

async fn run_protected(directory: &mut UserDirectory, command: ShellCommand) {
    match command {
        ShellCommand::List => print_page(directory),
        ShellCommand::Refresh => {
            if directory.load().await {
                print_page(directory);
            }
        }
        ShellCommand::Page { number } => change_page(directory, number).await,
        ShellCommand::Next => match next_page(directory.page_number(), directory.total_pages()) {
            Some(next) => change_page(directory, next).await,
            None => println!("Already on the last page."),
        },
        ShellCommand::Prev => match prev_page(directory.page_number()) {
            Some(prev) => change_page(directory, prev).await,
            None => println!("Already on the first page."),
        },
        ShellCommand::Add { fields } => {
            directory.open_add();
            let outcome = directory.save(fields.into_draft()).await;
            after_mutation(directory, outcome);
        }
        ShellCommand::Edit { id, fields } => {
            if !directory.open_edit(id) {
                println!("User {} is not on this page.", id);
            } else if let Some(Modal::Edit(user)) = directory.modal().cloned() {
                let outcome = directory.save(fields.apply_to(&user)).await;
                after_mutation(directory, outcome);
            }
        }
        ShellCommand::Delete { id } => {
            if directory.request_delete(id) {
                println!("Are you sure you want to delete this user? Type 'confirm' or 'cancel'.");
            } else {
                println!("User {} is not on this page.", id);
            }
        }
        ShellCommand::Confirm => {
            let outcome = directory.confirm_delete().await;
            if outcome == MutationOutcome::Idle {
                println!("Nothing to confirm.");
            } else {
                after_mutation(directory, outcome);
            }
        }
        ShellCommand::Cancel => {
            if directory.pending_delete().is_some() {
                directory.cancel_delete();
                println!("Deletion cancelled.");
            } else {
                println!("Nothing to cancel.");
            }
        }
        ShellCommand::Quit
        | ShellCommand::Status
        | ShellCommand::Login { .. }
        | ShellCommand::Logout => {}
    }
}

fn next_page(current: u32, total_pages: u32) -> Option<u32> {
    current.checked_add(1).filter(|next| *next <= total_pages)
}

fn prev_page(current: u32) -> Option<u32> {
    current.checked_sub(1).filter(|prev| *prev >= 1)
}

/// A prompt line ended inside a quoted word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnclosedQuote;

impl std::fmt::Display for UnclosedQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: unclosed quote")
    }
}

/// Split a prompt line into words. Single or double quotes group words, and
/// a backslash outside single quotes escapes the next character.
pub fn split_line(line: &str) -> Result<Vec<String>, UnclosedQuote> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(UnclosedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

async fn login(console: &Console, directory: &mut UserDirectory, credentials: Credentials) {
    match console.auth().login(&credentials).await {
        Ok(notification) => {
            println!("{}", notification);
            *directory = console.directory();
            mount(console, directory).await;
        }
        Err(e) => {
            if let Some(errors) = e.field_errors() {
                print!("{}", render_field_errors(errors));
            }
            if let Some(notification) = e.notification() {
                println!("{}", notification);
            }
        }
    }
}

/// Load the first page after entering the protected root.
async fn mount(console: &Console, directory: &mut UserDirectory) {
    if directory.set_page(1).await {
        print_page(directory);
    } else {
        report(directory);
        if console.navigator.current() == Route::Login {
            println!("Session is no longer valid. Please log in again.");
        }
    }
}

async fn change_page(directory: &mut UserDirectory, page: u32) {
    if page == 0 || page > directory.total_pages() {
        println!("Page {} is out of range (1-{}).", page, directory.total_pages());
        return;
    }
    if page == directory.page_number() {
        print_page(directory);
        return;
    }
    if directory.set_page(page).await {
        print_page(directory);
    } else {
        report(directory);
    }
}

fn after_mutation(directory: &mut UserDirectory, outcome: MutationOutcome) {
    match outcome {
        MutationOutcome::Invalid(errors) => {
            print!("{}", render_field_errors(&errors));
            // Each shell command opens its own form
            directory.close_modal();
        }
        MutationOutcome::Applied => {
            report(directory);
            print_page(directory);
        }
        MutationOutcome::Failed | MutationOutcome::Idle => report(directory),
    }
}

fn report(directory: &mut UserDirectory) {
    if let Some(notification) = directory.take_notification() {
        println!("{}", notification);
    }
}

fn print_page(directory: &UserDirectory) {
    println!();
    print!("{}", render_users(directory.page()));
    println!();
}

fn print_status(console: &Console) {
    let state = match console.guard().state() {
        GuardState::Authorized => "logged in",
        GuardState::Unauthorized => "not logged in",
    };
    println!("Session: {}", state);
    println!("Route:   {}", console.navigator.current());
    println!("API:     {}", console.api.base_url());
}
