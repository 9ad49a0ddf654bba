//! `pathway chat` — interactive conversation on stdin/stdout.

use pathway_chat::AppContext;
use pathway_core::{AppConfig, AppError, AppResult};
use std::io::{BufRead, Write};

pub async fn run(config: AppConfig) -> AppResult<()> {
    let context = AppContext::initialize(config).await?;
    let mut session = context.new_session();

    println!("Pathway assistant ready. Type your question, or 'exit' to quit.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout
            .flush()
            .map_err(|e| AppError::Io(e))?;

        let mut line = String::new();
        let bytes = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| AppError::Io(e))?;
        if bytes == 0 {
            break; // EOF
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "exit" | "quit") {
            break;
        }

        let reply = session.handle_message(message).await;
        println!("\n{}\n", reply);
    }

    context.shutdown()?;
    println!("Goodbye.");
    Ok(())
}
