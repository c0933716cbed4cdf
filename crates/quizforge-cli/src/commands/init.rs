//! The `quizforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    std::fs::create_dir_all("exercises")?;
    let example_path = std::path::Path::new("exercises/example.json");
    if example_path.exists() {
        println!("exercises/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_COLLECTION)?;
        println!("Created exercises/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizforge validate --exercises exercises/example.json");
    println!("  2. Run: quizforge run --exercises exercises/example.json --questions 3");
    println!("  3. Add your own collections under exercises/");

    Ok(())
}

const EXAMPLE_COLLECTION: &str = r#"{
  "course": "Example Course",
  "description": "A small starter collection covering several exercise types.",
  "exercises": [
    {
      "id": 1,
      "type": "multiple_choice_single",
      "question": "What is 2 + 2?",
      "options": ["3", "4", "5", "6"],
      "correct_answer": 1,
      "points": 1,
      "difficulty": "easy",
      "explanation": "Basic arithmetic: 2 + 2 = 4."
    },
    {
      "id": 2,
      "type": "true_false",
      "question": "The HTTP protocol is stateless.",
      "correct_answer": true,
      "points": 1,
      "difficulty": "easy"
    },
    {
      "id": 3,
      "type": "fill_in_blank",
      "question": "A strong _____ should never be reused across sites.",
      "blanks": [
        {
          "position": 0,
          "correct_answers": ["password"],
          "case_sensitive": false
        }
      ],
      "points": 2,
      "difficulty": "medium"
    },
    {
      "id": 4,
      "type": "ordering",
      "question": "Put the steps of a TCP handshake in order.",
      "items": ["SYN-ACK", "ACK", "SYN"],
      "correct_order": [2, 0, 1],
      "points": 2,
      "difficulty": "medium"
    },
    {
      "id": 5,
      "type": "open_text",
      "question": "Explain why input validation matters.",
      "keywords": ["injection", "sanitize", "validation"],
      "min_words": 10,
      "points": 3,
      "difficulty": "hard"
    }
  ]
}
"#;
