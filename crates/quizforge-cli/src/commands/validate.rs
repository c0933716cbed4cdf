//! The `quizforge validate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;
use std::collections::BTreeMap;

use quizforge_core::validate::load_collection;

/// How many per-record errors are surfaced before the rest is summarized.
const MAX_SHOWN_ERRORS: usize = 5;

pub fn execute(exercises: PathBuf) -> Result<()> {
    let (set, errors) = load_collection(&exercises)?;

    println!(
        "Course: {} ({} valid exercise(s))",
        set.course,
        set.exercises.len()
    );
    if !set.description.is_empty() {
        println!("{}", set.description);
    }

    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    for ex in &set.exercises {
        *by_kind.entry(ex.kind().to_string()).or_default() += 1;
    }
    let mut table = Table::new();
    table.set_header(vec!["Type", "Count"]);
    for (kind, count) in &by_kind {
        table.add_row(vec![kind.clone(), count.to_string()]);
    }
    println!("{table}");

    if errors.is_empty() {
        println!("All exercises valid.");
    } else {
        for err in errors.iter().take(MAX_SHOWN_ERRORS) {
            println!("WARNING: {err}");
        }
        if errors.len() > MAX_SHOWN_ERRORS {
            println!("... and {} more", errors.len() - MAX_SHOWN_ERRORS);
        }
        println!("\n{} exercise(s) rejected.", errors.len());
    }

    Ok(())
}
