//! The `quizforge take` command: an interactive, timed attempt on the terminal.

use std::path::PathBuf;

use std::io::BufRead;

use anyhow::Result;
use tokio::sync::mpsc;

use quizforge_core::model::OPTION_COUNT;
use quizforge_core::session::{AttemptResult, SubmitReason, TestSession, Tick, TimedSession};
use quizforge_providers::config::load_config_from;

use super::{build_engine, upload_file};

const HELP: &str = "Commands: 1-4 answer, n next, p previous, g <n> go to question, s submit, ? help";

/// One line of terminal input.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Answer(usize),
    Next,
    Previous,
    GoTo(usize),
    Submit,
    Help,
    Unknown(String),
}

fn parse_action(line: &str) -> Option<Action> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default().to_ascii_lowercase();
    let action = match head.as_str() {
        "n" | "next" => Action::Next,
        "p" | "prev" | "previous" => Action::Previous,
        "s" | "submit" => Action::Submit,
        "?" | "h" | "help" => Action::Help,
        "g" | "go" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n >= 1 => Action::GoTo(n - 1),
            _ => Action::Unknown(line.to_string()),
        },
        other => match other.parse::<usize>() {
            Ok(n) if (1..=OPTION_COUNT).contains(&n) => Action::Answer(n - 1),
            _ => Action::Unknown(line.to_string()),
        },
    };
    Some(action)
}

fn render(session: &TestSession) -> String {
    let (Some(test), Some(index), Some(question)) = (
        session.test(),
        session.current_index(),
        session.current_question(),
    ) else {
        return String::new();
    };
    let chosen = session.answers().and_then(|a| a.get(&index).copied());
    let answered = session.answers().map_or(0, |a| a.len());

    let mut out = format!(
        "\nQuestion {}/{}  [{}]  answered {}/{} ({:.0}%)\n{}\n",
        index + 1,
        test.question_count(),
        session.clock().unwrap_or_default(),
        answered,
        test.question_count(),
        session.progress_percent().unwrap_or_default(),
        question.prompt,
    );
    for (i, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(i) { '*' } else { ' ' };
        out.push_str(&format!(" {marker}{}) {option}\n", i + 1));
    }
    out
}

fn print_result(result: &AttemptResult) {
    match result.reason {
        SubmitReason::TimeExpired => println!("\nTime is up, the test was submitted."),
        SubmitReason::Manual => println!("\nTest submitted."),
    }
    println!(
        "Score: {}% ({}/{} correct, {} answered), {}",
        result.score_percent,
        result.correct_count,
        result.total_questions,
        result.answered_count,
        if result.passed { "passed" } else { "not passed" },
    );
    for item in &result.review {
        let verdict = match (item.chosen_option_index, item.is_correct) {
            (None, _) => "unanswered",
            (Some(_), true) => "correct",
            (Some(_), false) => "wrong",
        };
        println!("  {}. [{verdict}] {}", item.index + 1, item.prompt);
        if !item.is_correct {
            println!("     answer: {}", item.correct_option_index + 1);
        }
        if !item.explanation.is_empty() {
            println!("     {}", item.explanation);
        }
    }
}

/// Forward stdin lines from a plain thread, so a pending read never holds up
/// shutdown once the clock has submitted the attempt.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Submit, unless the clock already did.
fn submit(timed: &TimedSession) -> Result<()> {
    match timed.submit() {
        Ok(_) => Ok(()),
        Err(_) if timed.result().is_some() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn execute(
    pdf: PathBuf,
    questions: Option<usize>,
    time_limit: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let engine = build_engine(&config)?;
    let outcome = upload_file(&engine, &pdf, None, None, questions).await?;
    let test = outcome.test;

    println!(
        "{} ({}, {}, {} questions)",
        test.title,
        test.subject,
        test.difficulty,
        test.question_count()
    );
    println!("{}", outcome.diagnostics.message);
    println!("{HELP}");

    let session = match time_limit {
        Some(seconds) => TestSession::start_with_time_limit(test, seconds),
        None => TestSession::start(test),
    }
    .with_pass_threshold(config.pass_threshold_percent);
    let timed = TimedSession::start(session);
    let mut ticks = timed.countdown().subscribe();
    let mut clock_running = true;

    print!("{}", timed.inspect(render));
    let mut lines = spawn_stdin_reader();

    loop {
        tokio::select! {
            changed = ticks.changed(), if clock_running => {
                if changed.is_err() {
                    clock_running = false;
                }
                if matches!(*ticks.borrow_and_update(), Tick::Expired) {
                    break;
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::debug!("input closed, submitting");
                    submit(&timed)?;
                    break;
                };
                let Some(action) = parse_action(&line) else {
                    continue;
                };
                let outcome = match action {
                    Action::Answer(option) => timed.answer_current(option).map(|_| ()),
                    Action::Next => timed.next().map(|_| ()),
                    Action::Previous => timed.previous().map(|_| ()),
                    Action::GoTo(index) => timed.navigate(index).map(|_| ()),
                    Action::Submit => {
                        submit(&timed)?;
                        break;
                    }
                    Action::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Action::Unknown(input) => {
                        println!("Unknown command: {input}. {HELP}");
                        continue;
                    }
                };
                if let Err(e) = outcome {
                    println!("{e}");
                }
                print!("{}", timed.inspect(render));
            }
        }
    }

    if let Some(result) = timed.result() {
        print_result(&result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_are_one_based() {
        assert_eq!(parse_action("1"), Some(Action::Answer(0)));
        assert_eq!(parse_action(" 4 "), Some(Action::Answer(3)));
        assert_eq!(parse_action("5"), Some(Action::Unknown("5".into())));
        assert_eq!(parse_action("0"), Some(Action::Unknown("0".into())));
    }

    #[test]
    fn navigation_commands() {
        assert_eq!(parse_action("n"), Some(Action::Next));
        assert_eq!(parse_action("P"), Some(Action::Previous));
        assert_eq!(parse_action("g 3"), Some(Action::GoTo(2)));
        assert_eq!(parse_action("g"), Some(Action::Unknown("g".into())));
        assert_eq!(parse_action("g 0"), Some(Action::Unknown("g 0".into())));
        assert_eq!(parse_action("submit"), Some(Action::Submit));
        assert_eq!(parse_action("?"), Some(Action::Help));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_action(""), None);
        assert_eq!(parse_action("   "), None);
    }
}
