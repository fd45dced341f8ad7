use anyhow::Result;
use clap::Parser;
use insight_engine::analyzer::AnalyzerReply;
use insight_engine::{AnalysisSession, AnalyzerConfig, LlmClient};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "insight-engine")]
#[command(about = "Conversational analysis over a CSV dataset")]
struct Args {
    /// CSV file to analyze
    csv: PathBuf,

    /// Single question; starts an interactive chat session when omitted
    question: Option<String>,

    /// API key (or set GROQ_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Chat-completion model identifier
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = AnalyzerConfig::default();
    if let Some(model) = args.model {
        config.model = model;
    }
    let api_key = args
        .api_key
        .unwrap_or_else(AnalyzerConfig::api_key_from_env);
    let llm = LlmClient::new(api_key, &config);
    let mut session = AnalysisSession::new(llm, config);

    let df = insight_engine::ingest::read_csv(&args.csv)?;
    info!("loaded {} ({} rows x {} columns)", args.csv.display(), df.height(), df.width());
    session.analyzer_mut().load_dataset(df);

    if let Some(conclusion) = session.analyzer().memory().conclusions().first() {
        println!("Initial analysis: {}", conclusion.text);
    }

    if let Some(question) = args.question {
        let reply = session.ask(&question).await;
        print_reply(&reply);
        return Ok(());
    }

    println!("Ask questions about the data (:summary, :reset, :quit)");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" => break,
            ":summary" => println!("{}", session.analyzer().summarize()),
            ":reset" => {
                session.analyzer_mut().reset();
                println!("Memory cleared. Starting a fresh analysis session.");
            }
            question => {
                let reply = session.ask(question).await;
                print_reply(&reply);
            }
        }
    }

    Ok(())
}

fn print_reply(reply: &AnalyzerReply) {
    match reply {
        AnalyzerReply::Answer { text, chart } => {
            println!("{}", text);
            if let Some(uri) = chart {
                println!("[chart: {} bytes]", uri.len());
            }
        }
        AnalyzerReply::NoDataset { guidance } => println!("{}", guidance),
        AnalyzerReply::LlmFailure { reason } => println!("{}", reason),
    }
}
