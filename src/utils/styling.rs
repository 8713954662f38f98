//! Terminal styling for the command-line front end

use console::{style, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("BENFORD").cyan().bold(),
        style("analyzer").cyan()
    );
    println!(
        "    {}",
        style("First-digit tests, anomaly detection and correlation pruning").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the store location and dataset the command is working on
pub fn print_context(store_dir: &Path, id: Option<&str>) {
    println!(
        "    {} Store:   {}",
        FOLDER,
        style(truncate_path(store_dir, 44)).white()
    );
    if let Some(id) = id {
        println!("    {} Dataset: {}", CHART, style(id).yellow());
    }
}

/// Print a section header
pub fn print_step_header(title: &str) {
    println!();
    println!("    {}", style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a failure reported by the service
pub fn print_failure(status: u16, message: &str) {
    eprintln!(
        "    {} {} {}",
        style("✗").red().bold(),
        style(format!("[{}]", status)).red(),
        style(message).red()
    );
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(detail) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(detail).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("abcdefghijkl", 8), "...hijkl");
    }
}
