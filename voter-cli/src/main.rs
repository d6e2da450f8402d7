mod guard;
mod poll;

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::json;

use crate::guard::{VoteGuard, GUARD_FILE};
use crate::poll::{active_question, Question};

/// Terminal voting surface for the live polling server.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the polling server.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server: String,
    /// Path of the local voted-questions record.
    #[arg(long, default_value = GUARD_FILE)]
    guard: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the active question and its live tallies once.
    Status,
    /// Follow the live stream and redraw on every update.
    Watch,
    /// Cast a vote for an option of the active question.
    Vote {
        /// The option label, exactly as displayed.
        option: String,
    },
}

const IDLE_MESSAGE: &str = "No question is active right now; waiting for the moderator.";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // No request timeout: the stream in `watch` stays open indefinitely.
    let client = Client::builder()
        .timeout(None)
        .build()
        .context("failed to build the HTTP client")?;
    match cli.command {
        Command::Status => status(&client, &cli.server, &cli.guard),
        Command::Watch => watch(&client, &cli.server, &cli.guard),
        Command::Vote { option } => vote(&client, &cli.server, &cli.guard, &option),
    }
}

fn status(client: &Client, server: &str, guard_path: &Path) -> anyhow::Result<()> {
    let guard = VoteGuard::load(guard_path)?;
    match fetch_active(client, server)? {
        Some(question) => render(&question, &guard),
        None => println!("{IDLE_MESSAGE}"),
    }
    Ok(())
}

fn watch(client: &Client, server: &str, guard_path: &Path) -> anyhow::Result<()> {
    let guard = VoteGuard::load(guard_path)?;
    let response = client
        .get(format!("{server}/questions/stream"))
        .send()
        .context("failed to reach the polling server")?
        .error_for_status()?;

    // Server-sent events: each snapshot arrives as a single `data:` line;
    // comment and event-name lines carry nothing we need.
    let reader = BufReader::new(response);
    for line in reader.lines() {
        let line = line?;
        if let Some(data) = line.strip_prefix("data:") {
            let questions: Vec<Question> =
                serde_json::from_str(data.trim()).context("malformed snapshot from the server")?;
            match active_question(&questions) {
                Some(question) => render(question, &guard),
                None => println!("{IDLE_MESSAGE}"),
            }
        }
    }
    Ok(())
}

fn vote(client: &Client, server: &str, guard_path: &Path, option: &str) -> anyhow::Result<()> {
    let mut guard = VoteGuard::load(guard_path)?;

    let Some(mut question) = fetch_active(client, server)? else {
        bail!("no question is open for voting right now");
    };

    // One vote per question per profile. The record only changes once the
    // server has accepted the vote, so a failed attempt stays retryable.
    if guard.has_voted(&question.id) {
        bail!("you have already voted on this question");
    }
    if !question.options.iter().any(|o| o == option) {
        bail!(
            "no option {option:?} on the active question; choose one of {:?}",
            question.options
        );
    }

    client
        .post(format!("{server}/questions/{}/votes", question.id))
        .json(&json!({ "option": option }))
        .send()
        .context("failed to reach the polling server")?
        .error_for_status()
        .context("the server did not accept the vote")?;

    guard.record(&question.id)?;

    // Update the cached copy with the increment the server just recorded;
    // the stream will deliver the authoritative tallies shortly.
    question.apply_vote(option);
    println!("Vote recorded.");
    render(&question, &guard);
    Ok(())
}

/// Fetch the active question, mapping the server's 404 to an idle state.
fn fetch_active(client: &Client, server: &str) -> anyhow::Result<Option<Question>> {
    let response = client
        .get(format!("{server}/questions/active"))
        .send()
        .context("failed to reach the polling server")?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let question = response
        .error_for_status()?
        .json()
        .context("malformed question from the server")?;
    Ok(Some(question))
}

fn render(question: &Question, guard: &VoteGuard) {
    println!();
    println!("{}", question.text);
    if guard.has_voted(&question.id) {
        println!("(you have already voted on this question)");
    }
    for option in &question.options {
        let votes = question.votes_for(option);
        let percentage = question.percentage(option);
        let bar = "#".repeat((percentage / 2) as usize);
        println!("  {option:<24} {bar:<50} {votes} votes ({percentage}%)");
    }
    println!("  total: {} votes", question.total_votes());
}
