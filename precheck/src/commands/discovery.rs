//! Discovery and inspection commands.

use std::path::PathBuf;

use anyhow::Result;
use owo_colors::OwoColorize;
use precheck_core::{partition, Baseline};

use crate::formatting::{
    print_affected_table, print_key_value, print_package_table, print_section_header,
    print_success, print_warning, SectionStyle,
};

use super::Workspace;

pub fn cmd_list(root: PathBuf, json: bool) -> Result<()> {
    let workspace = Workspace::load(&root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workspace.packages)?);
        return Ok(());
    }

    print_section_header("Packages", SectionStyle::Primary);
    if workspace.packages.is_empty() {
        print_warning("No packages found");
    } else {
        print_package_table(&workspace.packages, &workspace.root);
        println!();
        print_success(&format!("Found {} packages", workspace.packages.len()));
    }
    println!();

    Ok(())
}

pub fn cmd_affected(root: PathBuf, baseline: Baseline, json: bool) -> Result<()> {
    let workspace = Workspace::load(&root)?;
    let changes = workspace.resolve_changes(&baseline)?;
    let mapping = partition(&workspace.packages, &changes)
        .include_always(&workspace.packages, &workspace.config.always_check);

    if json {
        println!("{}", serde_json::to_string_pretty(&mapping)?);
        return Ok(());
    }

    print_section_header("Affected packages", SectionStyle::Primary);
    print_key_value("Baseline", &baseline.to_string());
    print_key_value("Changed files", &changes.len().to_string());
    println!();

    if mapping.is_empty() {
        print_success("No affected packages");
    } else {
        print_affected_table(&mapping, &workspace.root);
    }

    if !mapping.ignored.is_empty() {
        println!();
        println!(
            "  {} {}",
            mapping.ignored.len().to_string().bold(),
            "changed files are outside every package and were ignored".bright_black()
        );
    }
    println!();

    Ok(())
}
