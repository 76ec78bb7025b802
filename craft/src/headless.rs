//! Headless mode for the craft journal.
//!
//! Reads one command per line from stdin and prints the journal's replies,
//! for scripting and automated testing.

use craft_core::headless::HELP;
use craft_core::store::Store;
use craft_core::{HeadlessJournal, Journal};
use std::io::{self, BufRead, Write};

/// Run the line-oriented command loop until `quit` or end of input.
pub async fn run_headless<S: Store>(journal: Journal<S>) -> io::Result<()> {
    let mut session = HeadlessJournal::new(journal);

    println!("=== Craft Journal Headless Mode ===");
    println!("Mode: {}", session.journal().mode().label());
    match session.journal().current_user() {
        Some(user) => println!("User: {} <{}>", user.name, user.email),
        None => println!("User: (not logged in)"),
    }
    println!();
    println!("{HELP}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        for output in session.handle_line(&line).await {
            println!("{output}");
        }
        stdout.flush()?;

        if session.is_done() {
            break;
        }
    }

    Ok(())
}
