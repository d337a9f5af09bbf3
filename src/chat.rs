//! Interactive chat session and one-shot question answering.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::{Conversation, GREETING};
use crate::app::AppContext;

/// Ask a single question and print the agent's answer.
pub async fn run_ask(ctx: &AppContext, query: &str) -> anyhow::Result<()> {
    let mut conversation = Conversation::new();
    let answer = ctx.agent.respond(&mut conversation, query).await?;
    println!("{answer}");
    Ok(())
}

/// Run an interactive chat loop on stdin/stdout.
///
/// Conversation history is kept for the duration of the session and
/// discarded on exit. `exit` or `quit` (or EOF) ends the session.
pub async fn run_chat(ctx: &AppContext) -> anyhow::Result<()> {
    println!("{GREETING}");
    println!("(type 'exit' to quit)\n");

    let mut conversation = Conversation::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        match ctx.agent.respond(&mut conversation, input).await {
            Ok(answer) => println!("\n{answer}\n"),
            Err(e) => eprintln!("\nerror: {e}\n"),
        }
    }

    println!("Goodbye.");
    Ok(())
}
