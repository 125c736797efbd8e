//! Terminal colours for command output.

use console::Style;

use promptvcs_core::models::{ConflictStatus, DiffLine, DiffLineKind};

/// `✓ msg` in green.
pub fn success(msg: &str) -> String {
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

/// `⚠ msg` in yellow.
pub fn warn(msg: &str) -> String {
    format!("{} {msg}", Style::new().yellow().apply_to("⚠"))
}

pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Branch name (cyan), marked when current.
pub fn branch(name: &str, current: bool) -> String {
    let style = Style::new().cyan();
    if current {
        format!("{} {}", Style::new().green().apply_to("*"), style.bold().apply_to(name))
    } else {
        format!("  {}", style.apply_to(name))
    }
}

pub fn conflict_status(status: ConflictStatus) -> String {
    match status {
        ConflictStatus::Unresolved => Style::new().red().apply_to("● unresolved").to_string(),
        ConflictStatus::Resolved => Style::new().green().apply_to("✓ resolved").to_string(),
    }
}

/// One diff line, coloured by kind.
pub fn diff_line(line: &DiffLine) -> String {
    let style = match line.kind {
        DiffLineKind::Add => Style::new().green(),
        DiffLineKind::Remove => Style::new().red(),
        DiffLineKind::Context => Style::new().dim(),
    };
    style.apply_to(&line.content).to_string()
}

/// `yes` / `no`
pub fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
