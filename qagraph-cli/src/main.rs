//! qagraph binary: parse the question from the command line, run the pipeline, print the report.

use clap::Parser;
use qagraph_cli::{render_output, run_with_options, PipelineRequest, RunOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qagraph")]
#[command(about = "Answer a question: decompose, retrieve, synthesize, validate, explain")]
struct Args {
    /// Question (may also be given as positional arguments)
    #[arg(short, long, value_name = "TEXT")]
    query: Option<String>,

    /// Paper URL used as citation when no external context is fetched
    #[arg(long, value_name = "URL")]
    paper_url: Option<String>,

    /// Session id for stored results (with DB_PATH)
    #[arg(long, default_value = "cli")]
    session_id: String,

    /// Model for every agent (overrides OPENAI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Upper bound on sub-questions (overrides MAX_SUBQUESTIONS)
    #[arg(long)]
    max_subquestions: Option<usize>,

    /// Enrichment round trips allowed (overrides MAX_ENRICH_ATTEMPTS)
    #[arg(long)]
    max_enrich_attempts: Option<u64>,

    /// SQLite path for session results (overrides DB_PATH)
    #[arg(long)]
    db_path: Option<String>,

    /// Print each stage as it finishes
    #[arg(long)]
    stream: bool,

    /// Debug logs on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Positional question words (when -q/--query is not used)
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,
}

fn get_query(args: &Args) -> Option<String> {
    let q = match &args.query {
        Some(q) => q.trim().to_string(),
        None => args.rest.join(" ").trim().to_string(),
    };
    (!q.is_empty()).then_some(q)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "qagraph=debug,qagraph_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(args.verbose);

    let Some(query) = get_query(&args) else {
        eprintln!("error: no question given (use -q TEXT or positional words)");
        std::process::exit(2);
    };
    println!("Question: {}", query);
    println!("---");

    let options = RunOptions {
        model: args.model.clone(),
        max_subquestions: args.max_subquestions,
        max_enrich_attempts: args.max_enrich_attempts,
        context_api_url: None,
        db_path: args.db_path.clone(),
        stream: args.stream,
        verbose: args.verbose,
    };
    let request =
        PipelineRequest::new(query, args.session_id.clone()).with_paper_url(args.paper_url.clone());

    match run_with_options(&request, &options).await {
        Ok(output) => print!("{}", render_output(&output)),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
