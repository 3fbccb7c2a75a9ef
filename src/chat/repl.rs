//! Interactive console loop.

use std::io::{BufRead, Write};

use console::style;

use super::ChatError;
use super::pipeline::ConversationalRag;

const BANNER: &str =
    "What would you like to know about your documents? Type 'exit' to end the conversation.";

/// Whether `line` asks to end the session (`exit` in any letter case).
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Run the read-eval-print loop until `exit` or end of input.
///
/// Returns the number of answered turns.
pub async fn run_repl<R, W>(
    rag: &mut ConversationalRag,
    mut input: R,
    out: &mut W,
) -> Result<usize, ChatError>
where
    R: BufRead,
    W: Write,
{
    writeln!(out, "{}", style(BANNER).yellow())?;

    let mut turns = 0;
    let mut line = String::new();
    loop {
        write!(out, "{}", style("You: ").red())?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            tracing::debug!(target: "chat", "end of input");
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            break;
        }

        let turn = rag.ask(question).await?;
        writeln!(out, "{} {}", style("AI:").green(), turn.answer)?;
        turns += 1;
    }

    tracing::info!(target: "chat", "session ended after {turns} turns");
    Ok(turns)
}
