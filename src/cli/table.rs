//! Plain-text rendering of a directory page.

use std::fmt::Write;

use crate::api::validation::FieldErrors;
use crate::models::{User, UserPage};

fn column_width(column: &str) -> usize {
    match column {
        "id" => 5,
        "email" => 30,
        "first_name" | "last_name" => 15,
        _ => 40,
    }
}

fn column_label(column: &str) -> String {
    column.replace('_', " ").to_uppercase()
}

/// Render a page as a fixed-width table followed by a pagination footer.
pub fn render_users(page: &UserPage) -> String {
    let mut out = String::new();

    if page.records.is_empty() {
        out.push_str("No users found.\n");
    } else {
        let header: Vec<String> = User::COLUMNS
            .iter()
            .map(|c| format!("{:<width$}", column_label(c), width = column_width(c)))
            .collect();
        let _ = writeln!(out, "{}", header.join("  ").trim_end());

        let total_width: usize = User::COLUMNS.iter().map(|c| column_width(c) + 2).sum();
        let _ = writeln!(out, "{}", "-".repeat(total_width - 2));

        for user in &page.records {
            let cells: Vec<String> = User::COLUMNS
                .iter()
                .map(|c| {
                    let width = column_width(c);
                    let value = user.column(c);
                    let value = if value.is_empty() { "-".to_string() } else { value };
                    format!("{:<width$}", truncate(&value, width), width = width)
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
    }

    let _ = writeln!(
        out,
        "Page {} of {} ({} users)",
        page.page_number,
        page.total_pages(),
        page.total_count
    );
    out
}

/// Render field errors one per line, indented.
pub fn render_field_errors(errors: &FieldErrors) -> String {
    let mut out = String::new();
    for (field, messages) in errors.iter() {
        for message in messages {
            let _ = writeln!(out, "  {}: {}", field, message);
        }
    }
    out
}

/// Truncate a string to max length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
