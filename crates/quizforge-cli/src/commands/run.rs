//! The `quizforge run` command: an interactive timed exam on stdin/stdout.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use comfy_table::Table;

use quizforge_core::model::{Difficulty, ExerciseKind, ExerciseRecord, Payload};
use quizforge_core::renderer::{Answer, PresentationBody};
use quizforge_core::validate::load_collection;
use quizforge_report::ExamReport;
use quizforge_session::config::{DifficultyFilter, ExamConfig};
use quizforge_session::controller::{ExamResults, SessionController};
use quizforge_session::error::SessionError;
use quizforge_session::persist::{FileSnapshotStore, SnapshotStore, AUTOSAVE_INTERVAL_SECS};
use quizforge_session::state::SessionPhase;
use quizforge_session::timer::TimerStatus;

pub struct RunArgs {
    pub exercises: PathBuf,
    pub questions: usize,
    pub time_limit: u32,
    pub difficulty: Option<String>,
    pub kinds: Option<String>,
    pub no_shuffle: bool,
    pub show_explanations: bool,
    pub yes: bool,
    pub state_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let (set, errors) = load_collection(&args.exercises)?;
    for err in errors.iter().take(5) {
        eprintln!("WARNING: {err}");
    }

    let store = args.state_dir.as_ref().map(FileSnapshotStore::new);
    let now = Utc::now();

    // A fresh-enough snapshot resumes the previous exam; any persistence
    // problem means a fresh session.
    let restored = store
        .as_ref()
        .and_then(|s| s.load_fresh(now).ok().flatten());
    let resumed = restored.is_some();
    let mut ctrl = match restored {
        Some(snapshot) => {
            println!("Resuming previous session.");
            SessionController::restore(snapshot, now)
        }
        None => SessionController::new(set, now),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();

    if !resumed {
        let config = build_config(&args)?;
        match ctrl.start_exam(config.clone(), args.yes, now) {
            Ok(()) => {}
            Err(SessionError::PoolTooSmall {
                requested,
                available,
            }) => {
                println!(
                    "Only {available} exercises match the filters ({requested} requested)."
                );
                if !confirm(&mut input, "Proceed with the smaller pool?")? {
                    bail!("exam cancelled");
                }
                ctrl.start_exam(config, true, now)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let results = exam_loop(&mut ctrl, &mut input, store.as_ref(), args.yes)?;
    print_results(&results);

    if let Some(path) = &args.report {
        let config = ctrl.config().cloned().unwrap_or_default();
        let report = ExamReport::new(ctrl.course(), config, results);
        // A directory target gets a generated course-and-timestamp name.
        let path = if path.is_dir() {
            path.join(report.default_file_name())
        } else {
            path.clone()
        };
        report.save_json(&path)?;
        println!("Report written to {}", path.display());
    }

    // The exam is over; a leftover snapshot would resurrect it.
    if let Some(store) = &store {
        let _ = store.clear();
    }
    ctrl.exit_exam_mode();
    Ok(())
}

fn build_config(args: &RunArgs) -> Result<ExamConfig> {
    let difficulty = match args.difficulty.as_deref() {
        None => DifficultyFilter::Any,
        Some(s) => DifficultyFilter::Only(parse_difficulty(s)?),
    };
    let kinds = match args.kinds.as_deref() {
        None => ExamConfig::default().kinds,
        Some(list) => list
            .split(',')
            .map(|k| parse_kind(k.trim()))
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(ExamConfig {
        question_count: args.questions,
        time_limit_minutes: args.time_limit,
        difficulty,
        kinds,
        randomize: !args.no_shuffle,
        show_explanations: args.show_explanations,
    })
}

fn parse_difficulty(s: &str) -> Result<Difficulty> {
    match s.to_lowercase().as_str() {
        "easy" | "facile" => Ok(Difficulty::Easy),
        "medium" | "medio" => Ok(Difficulty::Medium),
        "hard" | "difficile" => Ok(Difficulty::Hard),
        other => bail!("unknown difficulty: {other}"),
    }
}

fn parse_kind(s: &str) -> Result<ExerciseKind> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow!("unknown exercise kind: {s}"))
}

fn exam_loop(
    ctrl: &mut SessionController,
    input: &mut impl BufRead,
    store: Option<&FileSnapshotStore>,
    yes: bool,
) -> Result<ExamResults> {
    let mut last_save = Utc::now();
    loop {
        if ctrl.phase() == SessionPhase::Finished {
            // Restored past the deadline, or finished on a previous run.
            return ctrl
                .results()
                .cloned()
                .context("finished exam has no results");
        }

        let now = Utc::now();
        if ctrl.tick(now) == TimerStatus::Expired {
            println!("\nTime is up!");
            continue;
        }

        // Interval autosave on top of the per-state-change saves; long
        // pauses at a prompt should not lose the session.
        if (now - last_save).num_seconds() >= AUTOSAVE_INTERVAL_SECS as i64 {
            persist(ctrl, store);
            last_save = now;
        }

        let record = ctrl
            .current_exercise()
            .context("exam has no current exercise")?
            .clone();
        print_question(ctrl, &record);

        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // Input exhausted: finish with whatever has been answered.
            return Ok(ctrl.finish_exam(false, Utc::now())?);
        }
        let line = line.trim();

        // Navigation commands; anything else is an answer.
        match line {
            "/prev" => {
                ctrl.previous();
                persist(ctrl, store);
                continue;
            }
            "/finish" => {
                if yes || confirm(input, "Finish the exam?")? {
                    return Ok(ctrl.finish_exam(false, Utc::now())?);
                }
                continue;
            }
            _ => {}
        }

        if !line.is_empty() {
            match parse_answer(&record, line) {
                Ok(answer) => {
                    if let Err(e) = ctrl.submit_answer(record.id, answer) {
                        println!("Invalid answer: {e}");
                        continue;
                    }
                    if let Some(verdict) = ctrl.check_answer(record.id) {
                        println!("{}", verdict.feedback);
                        let reveal = verdict.correct
                            && ctrl.config().is_some_and(|c| c.show_explanations);
                        if reveal {
                            if let Some(explanation) = &record.explanation {
                                println!("{explanation}");
                            }
                        }
                    }
                }
                Err(msg) => {
                    println!("Could not read that answer: {msg}");
                    continue;
                }
            }
        }

        persist(ctrl, store);

        if ctrl.at_last_question() {
            if yes || confirm(input, "Finish the exam?")? {
                return Ok(ctrl.finish_exam(false, Utc::now())?);
            }
        } else {
            ctrl.next();
            persist(ctrl, store);
        }
    }
}

fn persist(ctrl: &SessionController, store: Option<&FileSnapshotStore>) {
    if let Some(store) = store {
        if let Err(e) = store.save(&ctrl.snapshot(Utc::now())) {
            tracing::warn!(%e, "snapshot save failed");
        }
    }
}

fn print_question(ctrl: &SessionController, record: &ExerciseRecord) {
    println!();
    if let Some(remaining) = ctrl.timer_display(Utc::now()) {
        println!("[{remaining}]");
    }
    println!(
        "Question {}/{} ({} pt): {}",
        ctrl.current_index() + 1,
        ctrl.exercise_count(),
        record.points,
        record.question
    );

    if let Some(presentation) = ctrl.current_presentation() {
        match presentation.body {
            PresentationBody::Options { options, multiple } => {
                for (i, opt) in options.iter().enumerate() {
                    println!("  {}. {opt}", i + 1);
                }
                if multiple {
                    println!("(comma-separated numbers, e.g. 1,3)");
                }
            }
            PresentationBody::TrueFalse => println!("(t)rue / (f)alse"),
            PresentationBody::TextEntry { min_words } => {
                println!("(free text, at least {min_words} words)");
            }
            PresentationBody::Blanks { .. } => {
                println!("(blank answers separated by ';')");
            }
            PresentationBody::Matching { left, right } => {
                for (i, item) in left.iter().enumerate() {
                    println!("  L{}. {item}", i + 1);
                }
                for (i, item) in right.iter().enumerate() {
                    println!("  R{}. {item}", i + 1);
                }
                println!("(pairs like 1=2,2=1)");
            }
            PresentationBody::Ordering { items } => {
                for (i, item) in items.iter().enumerate() {
                    println!("  {}. {item}", i + 1);
                }
                println!("(positions in your order, e.g. 3,1,2)");
            }
            PresentationBody::Code { lines } => {
                for line in &lines {
                    println!("  {line}");
                }
                println!("(blank answers separated by ';')");
            }
            PresentationBody::Categories { items, categories } => {
                for (i, item) in items.iter().enumerate() {
                    println!("  item {}. {item}", i + 1);
                }
                for (i, cat) in categories.iter().enumerate() {
                    println!("  category {}. {cat}", i + 1);
                }
                println!("(placements like 1=2,2=1)");
            }
        }
    }
    println!("(empty line skips; /prev, /finish)");
}

/// Parse a one-line answer for the given record. Everything is 1-based on
/// the wire and refers to displayed positions.
fn parse_answer(record: &ExerciseRecord, line: &str) -> Result<Answer, String> {
    match &record.payload {
        Payload::MultipleChoiceSingle { .. } => {
            let n = parse_index(line)?;
            Ok(Answer::Selection(n))
        }
        Payload::MultipleChoiceMultiple { .. } => {
            let indices = line
                .split(',')
                .map(|p| parse_index(p.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Answer::Selections(indices))
        }
        Payload::TrueFalse { .. } => match line.to_lowercase().as_str() {
            "t" | "true" | "v" | "vero" => Ok(Answer::Bool(true)),
            "f" | "false" | "falso" => Ok(Answer::Bool(false)),
            other => Err(format!("expected t/f, got {other}")),
        },
        Payload::OpenText { .. } => Ok(Answer::Text(line.to_string())),
        Payload::FillInBlank { .. } | Payload::CodeCompletion { .. } => Ok(Answer::Blanks(
            line.split(';').map(|s| s.trim().to_string()).collect(),
        )),
        Payload::Matching { left_items, .. } => {
            let mut pairs = vec![None; left_items.len()];
            for part in line.split(',') {
                let (left, right) = parse_pair(part.trim())?;
                let slot = pairs
                    .get_mut(left)
                    .ok_or_else(|| format!("no left item {}", left + 1))?;
                *slot = Some(right);
            }
            Ok(Answer::Pairs(pairs))
        }
        Payload::Ordering { .. } => {
            let sequence = line
                .split(',')
                .map(|p| parse_index(p.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Answer::Sequence(sequence))
        }
        Payload::DragAndDrop {
            draggable_items, ..
        } => {
            let mut placements = vec![None; draggable_items.len()];
            for part in line.split(',') {
                let (item, category) = parse_pair(part.trim())?;
                let slot = placements
                    .get_mut(item)
                    .ok_or_else(|| format!("no item {}", item + 1))?;
                *slot = Some(category);
            }
            Ok(Answer::Placements(placements))
        }
    }
}

/// "3" → 2 (1-based on the wire, 0-based internally).
fn parse_index(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("not a number: {s}"))?;
    n.checked_sub(1).ok_or_else(|| "positions start at 1".to_string())
}

/// "1=2" → (0, 1).
fn parse_pair(s: &str) -> Result<(usize, usize), String> {
    let (a, b) = s
        .split_once('=')
        .ok_or_else(|| format!("expected a=b, got {s}"))?;
    Ok((parse_index(a.trim())?, parse_index(b.trim())?))
}

fn confirm(input: &mut impl BufRead, prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_results(results: &ExamResults) {
    println!("\n=== Results ===");
    if results.time_expired {
        println!("Finished because time expired.");
    }
    println!(
        "Score: {}/{} points, {}/{} correct ({:.1}%)",
        results.score, results.max_score, results.correct_count, results.total_count,
        results.percentage
    );
    println!("Grade: {}", results.band);

    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Points", "Outcome"]);
    for detail in &results.details {
        table.add_row(vec![
            detail.id.to_string(),
            detail.kind.to_string(),
            detail.points.to_string(),
            if detail.correct { "correct" } else { "wrong" }.to_string(),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: Payload) -> ExerciseRecord {
        ExerciseRecord {
            id: 1,
            question: "q _____".into(),
            points: 1,
            difficulty: Difficulty::Medium,
            payload,
            hint: None,
            explanation: None,
            sample_answer: None,
            image: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn parses_one_based_selections() {
        let rec = record(Payload::MultipleChoiceSingle {
            options: vec!["a".into(), "b".into()],
            correct_answer: 0,
        });
        assert_eq!(parse_answer(&rec, "2"), Ok(Answer::Selection(1)));
        assert!(parse_answer(&rec, "0").is_err());
        assert!(parse_answer(&rec, "x").is_err());
    }

    #[test]
    fn parses_true_false_in_both_languages() {
        let rec = record(Payload::TrueFalse {
            correct_answer: true,
        });
        assert_eq!(parse_answer(&rec, "t"), Ok(Answer::Bool(true)));
        assert_eq!(parse_answer(&rec, "vero"), Ok(Answer::Bool(true)));
        assert_eq!(parse_answer(&rec, "falso"), Ok(Answer::Bool(false)));
    }

    #[test]
    fn parses_blank_lists() {
        let rec = record(Payload::FillInBlank {
            blanks: vec![quizforge_core::model::BlankSpec {
                position: 0,
                correct_answers: vec!["x".into()],
                case_sensitive: false,
            }],
        });
        assert_eq!(
            parse_answer(&rec, " alpha ; beta "),
            Ok(Answer::Blanks(vec!["alpha".into(), "beta".into()]))
        );
    }

    #[test]
    fn parses_matching_pairs_with_gaps() {
        let rec = record(Payload::Matching {
            left_items: vec!["a".into(), "b".into(), "c".into()],
            right_items: vec!["1".into(), "2".into(), "3".into()],
            correct_matches: vec![],
        });
        assert_eq!(
            parse_answer(&rec, "1=2,3=1"),
            Ok(Answer::Pairs(vec![Some(1), None, Some(0)]))
        );
        assert!(parse_answer(&rec, "4=1").is_err());
    }

    #[test]
    fn parses_ordering_sequences() {
        let rec = record(Payload::Ordering {
            items: vec!["a".into(), "b".into(), "c".into()],
            correct_order: vec![0, 1, 2],
        });
        assert_eq!(
            parse_answer(&rec, "3,1,2"),
            Ok(Answer::Sequence(vec![2, 0, 1]))
        );
    }
}
