use std::env;
use std::io::{self, BufRead, Write};

use assist_core::config::PipelineConfig;
use assist_core::types::Language;
use assist_rag::{pipeline_ready, Pipeline};

struct UiText {
    welcome: &'static str,
    prompt: &'static str,
    suggestions: [&'static str; 3],
}

fn ui_text(language: Language) -> UiText {
    match language {
        Language::English => UiText {
            welcome: "Welcome! I am the District Police Assistance bot. How can I help you?",
            prompt: "Type your question (or 'quit' to exit)",
            suggestions: ["Emergency contacts", "Police stations", "How to file a complaint?"],
        },
        Language::Tamil => UiText {
            welcome: "வணக்கம்! மாவட்ட காவல்துறை உதவி செயலிக்கு உங்களை வரவேற்கிறோம். நான் உங்களுக்கு எப்படி உதவ முடியும்?",
            prompt: "உங்கள் கேள்வியை இங்கு தட்டச்சு செய்யவும் ('quit' என்று அழுத்தி வெளியேறவும்)",
            suggestions: ["அவசர உதவி எண்கள்", "காவல் நிலையங்கள்", "புகார் அளிப்பது எப்படி?"],
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut language = Language::English;
    let mut question_words: Vec<String> = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--lang" => {
                let code = args.next().unwrap_or_default();
                language = match Language::parse(&code) {
                    Some(lang) => lang,
                    None => {
                        eprintln!("Unknown language '{code}' (expected 'en' or 'ta')");
                        std::process::exit(1);
                    }
                };
            }
            "--help" | "-h" => {
                eprintln!("Usage: assist-chat [--lang en|ta] [question...]");
                eprintln!("Example: assist-chat --lang ta 'அவசர உதவி எண்கள்'");
                std::process::exit(0);
            }
            word => question_words.push(word.to_string()),
        }
    }

    let config = PipelineConfig::load()?;
    if !pipeline_ready(&config) {
        eprintln!(
            "Knowledge base not found at {}. Run assist-indexer first.",
            config.index_path().display()
        );
        std::process::exit(1);
    }

    let pipeline = Pipeline::open(config).await?;

    if !question_words.is_empty() {
        let question = question_words.join(" ");
        ask(&pipeline, &question, language).await;
        return Ok(());
    }

    let text = ui_text(language);
    println!("{}", text.welcome);
    println!();
    for suggestion in text.suggestions {
        println!("  - {suggestion}");
    }
    println!();

    let stdin = io::stdin();
    loop {
        print!("{}> ", text.prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }
        ask(&pipeline, question, language).await;
        println!();
    }
    Ok(())
}

async fn ask(pipeline: &Pipeline, question: &str, language: Language) {
    match pipeline.answer(question, language).await {
        Ok(response) => println!("{}", response.answer_text),
        // Distinct from the fallback sentence: the user can tell "no answer
        // in the documents" apart from "the system is broken".
        Err(e) => eprintln!("[error] {e}"),
    }
}
