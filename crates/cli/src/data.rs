//! Dashboard, activity log, export, import and clearing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use promptvcs_core::stats::average_accuracy;
use promptvcs_core::transfer::{default_export_file_name, parse_import};
use promptvcs_core::{Command, Session};

use crate::{confirm, report, style};

pub fn cmd_stats(session: &Session) -> Result<()> {
    let stats = session.stats();
    println!();
    println!("{}", style::header("PromptVCS Dashboard"));
    println!();
    println!("  Repositories  : {}", stats.repositories);
    println!("  Branches      : {}", stats.branches);
    println!("  Collaborators : {}", stats.collaborators);
    println!("  Teams         : {}", stats.teams);
    println!("  Performance   : {}%", stats.performance_score);

    let repos = session.state().repositories.list();
    if !repos.is_empty() {
        println!();
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Repository", "Versions", "Avg accuracy"]);
        for r in repos {
            table.add_row(vec![
                Cell::new(&r.name),
                Cell::new(r.versions.len()),
                Cell::new(format!("{}%", average_accuracy(r))),
            ]);
        }
        println!("{table}");
    }

    println!();
    Ok(())
}

pub fn cmd_chart(session: &Session, repo: &str) -> Result<()> {
    let series = session.chart(repo)?;
    if series.is_empty() {
        println!("No versions to chart.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Version", "Accuracy", "", "Speed (ms)"]);
    for ((label, accuracy), speed) in series
        .labels
        .iter()
        .zip(&series.accuracy)
        .zip(&series.speed)
    {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{accuracy}%")),
            Cell::new(bar(*accuracy)),
            Cell::new(speed),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// A 20-cell bar for a percentage.
fn bar(percent: u32) -> String {
    let filled = (percent.min(100) / 5) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

pub fn cmd_activity(session: &Session, limit: usize) -> Result<()> {
    let state = session.state();
    if state.activities.is_empty() {
        println!("No activity recorded.");
        return Ok(());
    }

    println!("{:<18} {:<22} MESSAGE", "TIMESTAMP", "ICON");
    println!("{}", "-".repeat(80));
    for a in state.recent_activities(limit) {
        println!(
            "{:<18} {:<22} {}",
            a.timestamp.format("%Y-%m-%d %H:%M"),
            a.icon,
            a.message
        );
    }
    println!();
    println!(
        "{} of {} entries shown",
        limit.min(state.activities.len()),
        state.activities.len()
    );
    Ok(())
}

pub fn cmd_export(session: &mut Session, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(default_export_file_name(chrono::Local::now().date_naive()))
    });
    session
        .export_to(&output)
        .with_context(|| format!("failed to export to {}", output.display()))?;
    println!("{}", style::success(&format!("Exported to {}", output.display())));
    Ok(())
}

pub fn cmd_import(session: &mut Session, path: &Path, yes: bool) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = parse_import(&json).with_context(|| format!("failed to import {}", path.display()))?;
    if !confirm(
        "Importing replaces all repositories and teams. Continue?",
        yes,
    )? {
        println!("{}", style::warn("Import cancelled."));
        return Ok(());
    }
    let events = session
        .execute(Command::Import(doc))
        .context("failed to apply import")?;
    report(&events);
    Ok(())
}

pub fn cmd_clear(session: &mut Session, yes: bool) -> Result<()> {
    if !confirm("Delete ALL repositories, teams, settings and activity?", yes)? {
        println!("{}", style::warn("Nothing cleared."));
        return Ok(());
    }
    let events = session
        .execute(Command::ClearAll)
        .context("failed to clear data")?;
    report(&events);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptvcs_core::conflict::RandomConflictOracle;
    use promptvcs_core::oracle::SequenceRandom;
    use promptvcs_core::repository::NewRepository;

    fn session() -> Session {
        let mut s = Session::in_memory(
            Box::new(SequenceRandom::new(vec![0.5])),
            Box::new(RandomConflictOracle::new(SequenceRandom::new(vec![0.0]))),
        )
        .unwrap();
        s.execute(Command::CreateRepository {
            new: NewRepository::named("R1"),
            team_ids: Vec::new(),
        })
        .unwrap();
        s
    }

    #[test]
    fn test_export_to_unwritable_path_records_nothing() {
        let mut s = session();
        let before = s.state().clone();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(cmd_export(&mut s, Some(path)).is_err());
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn test_export_writes_file_then_records() {
        let mut s = session();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        cmd_export(&mut s, Some(path.clone())).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"exportDate\""));
        assert_eq!(s.state().activities.last().unwrap().message, "Exported data");
    }

    #[test]
    fn test_invalid_import_fails_before_confirmation() {
        let mut s = session();
        let before = s.state().clone();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ nope").unwrap();
        // `yes = false` would prompt; parsing must fail first.
        let err = cmd_import(&mut s, &path, false).unwrap_err();
        assert!(format!("{err:#}").contains("invalid format"));
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0).chars().filter(|&c| c == '█').count(), 0);
        assert_eq!(bar(50).chars().filter(|&c| c == '█').count(), 10);
        assert_eq!(bar(100).chars().count(), 20);
        assert_eq!(bar(250).chars().filter(|&c| c == '█').count(), 20);
    }
}
