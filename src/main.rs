//! Interactive chat over a Figma design system.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use deska_agent::{default_registry, ChatSession};
use deska_common::DesignSystemFiles;
use deska_figma::FigmaClient;
use deska_llm::{GeminiClient, LLMConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deska")]
#[command(about = "Conversational assistant over a Figma design system")]
struct Args {
    /// Ask one question and exit instead of starting the chat loop
    #[arg(short, long)]
    question: Option<String>,

    /// Gemini model to use (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let figma = Arc::new(FigmaClient::from_env()?);
    let files = DesignSystemFiles::from_env();
    let llm = Arc::new(build_llm(args.model)?);

    let registry = default_registry(figma, files);
    let mut session = ChatSession::new(llm, registry);

    if let Some(question) = args.question {
        let answer = session.ask(&question).await?;
        println!("{answer}");
        return Ok(());
    }

    println!("{}", "deska — design system assistant".cyan().bold());
    println!("Ask about components, patterns or paste a Figma link. 'exit' to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        match session.ask(question).await {
            Ok(answer) => println!("\n{}\n", answer),
            Err(e) => eprintln!("{} {e:#}\n", "error:".red().bold()),
        }
    }

    Ok(())
}

fn build_llm(model: Option<String>) -> Result<GeminiClient> {
    match model {
        Some(model) => {
            let api_key = std::env::var("GEMINI_API_KEY")
                .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;
            GeminiClient::new(LLMConfig {
                api_key,
                model,
                ..Default::default()
            })
        }
        None => GeminiClient::from_env(),
    }
}

async fn print_prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{} ", "you ›".green().bold()).as_bytes())
        .await?;
    stdout.flush().await?;
    Ok(())
}
