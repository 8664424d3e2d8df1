//! Table formatting utilities using comfy-table.

use std::path::Path;

use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use precheck_core::path_utils::relative_to;
use precheck_core::{AffectedMapping, CheckStatus, Package, RunReport};

use super::Status;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).add_attribute(comfy_table::Attribute::Bold))
                .collect::<Vec<_>>(),
        )
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}

fn status_color(status: CheckStatus) -> Color {
    match status {
        CheckStatus::Passed => Color::Green,
        CheckStatus::Failed | CheckStatus::Error => Color::Red,
        CheckStatus::Cancelled | CheckStatus::NotRun => Color::Yellow,
        CheckStatus::Skipped => Color::DarkGrey,
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    let relative = relative_to(path, root);
    if relative.as_os_str().is_empty() {
        ".".to_string()
    } else {
        relative.display().to_string()
    }
}

/// Prints discovered packages.
pub fn print_package_table(packages: &[Package], root: &Path) {
    let mut table = new_table(&["Package", "Path", "Environment", "Checks"]);

    for package in packages {
        let environment = package
            .environment
            .as_ref()
            .map(|e| e.kind.clone())
            .unwrap_or_else(|| "(detect)".to_string());
        let checks = if package.checks.is_empty() {
            "(no checks)".bright_black().to_string()
        } else {
            package
                .checks
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            Cell::new(&package.name).fg(Color::White),
            Cell::new(display_relative(&package.root, root)).fg(Color::DarkGrey),
            Cell::new(environment),
            Cell::new(checks),
        ]);
    }

    println!("{}", table);
}

/// Prints affected packages with their changed files.
pub fn print_affected_table(mapping: &AffectedMapping, root: &Path) {
    let mut table = new_table(&["Package", "Path", "Changed files"]);

    for entry in &mapping.affected {
        let files = if entry.whole_package {
            "(always checked)".bright_black().to_string()
        } else {
            entry
                .relative_files()
                .iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };
        table.add_row(vec![
            Cell::new(&entry.package.name).fg(Color::White),
            Cell::new(display_relative(&entry.package.root, root)).fg(Color::DarkGrey),
            Cell::new(files),
        ]);
    }

    println!("{}", table);
}

/// Prints one row per check result, grouped by package in report order.
pub fn print_result_table(report: &RunReport) {
    let mut table = new_table(&["Status", "Package", "Check", "Files", "Details"]);

    for package in &report.packages {
        if package.results.is_empty() {
            table.add_row(vec![
                Cell::new(Status::from(package.status).symbol()),
                Cell::new(&package.name).fg(Color::White),
                Cell::new("(no checks)").fg(Color::DarkGrey),
                Cell::new(package.files.len()),
                Cell::new(""),
            ]);
            continue;
        }

        for result in &package.results {
            let details = match (&result.message, result.exit_code) {
                (Some(message), _) => message.clone(),
                (None, Some(code)) if code != 0 => format!("exit code {}", code),
                _ => String::new(),
            };
            let color = status_color(result.status);
            table.add_row(vec![
                Cell::new(format!(
                    "{} {}",
                    Status::from(result.status).symbol(),
                    result.status
                ))
                .fg(color),
                Cell::new(&package.name).fg(Color::White),
                Cell::new(&result.check),
                Cell::new(result.files.len()),
                Cell::new(details).fg(color),
            ]);
        }
    }

    println!("{}", table);
}
