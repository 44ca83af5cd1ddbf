//! Runs a mapping prompt over a record set file and writes the mapped record set,
//! inputs and debug fields included.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use llmap::completions::openai::{OpenAiCompletions, OpenAiParameters};
use llmap::corpus::RecordSet;
use llmap::logging::{LogConfig, Logger};
use llmap::mapping::{CompletionMapping, MapCorpusOptions, ParseFailurePolicy};

#[derive(Parser)]
#[command(about = "Run a mapping prompt on some data")]
struct Args {
    /// Path to the directory containing the mapping definition files
    #[arg(long)]
    prompt_dir: PathBuf,

    /// Path to the TSV or YAML file containing input data
    #[arg(long)]
    input: PathBuf,

    /// Path to the TSV or YAML file to contain output data
    #[arg(long)]
    output: PathBuf,

    /// Model identifier to run completions with
    #[arg(long, default_value = "gpt-4-0125-preview")]
    model: String,

    /// Substitute this value for every output field when a completion cannot be
    /// parsed, instead of halting the run
    #[arg(long)]
    parse_error_default: Option<String>,

    /// Append observability entries to this log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Echo log entries to the console
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logger = Logger::new(LogConfig {
        debug: args.debug,
        log_file_path: args.log_file,
    });
    let policy = match args.parse_error_default {
        Some(default) => ParseFailurePolicy::DefaultOnParseFailure(default),
        None => ParseFailurePolicy::Strict,
    };
    let options = MapCorpusOptions {
        include_debug_fields: true,
        ..Default::default()
    };

    let client = OpenAiCompletions::new(OpenAiParameters::new(args.model));
    let mapping = CompletionMapping::load_from_directory(&args.prompt_dir, client, logger)?;
    let corpus = RecordSet::load(&args.input)?;
    let mapped = mapping.map_corpus(&corpus, &policy, &options).await?;
    mapped.save(&args.output)?;
    Ok(())
}
