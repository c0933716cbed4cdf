//! The `quizforge catalog` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::Table;

use quizforge_core::catalog::load_course;

pub fn execute(dir: PathBuf, course: Option<String>) -> Result<()> {
    match course {
        Some(course) => show_course(&dir, &course),
        None => list_courses(&dir),
    }
}

fn list_courses(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        println!("No catalog directory at {}", dir.display());
        return Ok(());
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                path.file_stem().map(|s| s.to_string_lossy().into_owned())
            } else {
                None
            }
        })
        .collect();
    names.sort();

    if names.is_empty() {
        println!("No courses found in {}", dir.display());
    } else {
        println!("Available courses:");
        for name in names {
            println!("  {name}");
        }
    }
    Ok(())
}

fn show_course(dir: &Path, course: &str) -> Result<()> {
    let set = load_course(dir, course);
    println!("Course: {} ({} exercise(s))", set.course, set.exercises.len());

    let mut table = Table::new();
    table.set_header(vec!["Id", "Type", "Difficulty", "Points", "Question"]);
    for ex in &set.exercises {
        let question = if ex.question.chars().count() > 60 {
            let head: String = ex.question.chars().take(57).collect();
            format!("{head}...")
        } else {
            ex.question.clone()
        };
        table.add_row(vec![
            ex.id.to_string(),
            ex.kind().to_string(),
            ex.difficulty.to_string(),
            ex.points.to_string(),
            question,
        ]);
    }
    println!("{table}");
    Ok(())
}
