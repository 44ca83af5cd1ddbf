//! Prints the prompt template represented by files in a mapping definition directory,
//! with the final user turn left unfilled so the placeholders stay visible.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use llmap::completions::openai::{OpenAiCompletions, OpenAiParameters};
use llmap::logging::Logger;
use llmap::mapping::CompletionMapping;

#[derive(Parser)]
#[command(about = "Print a string representation of a mapping prompt")]
struct Args {
    /// Path to the directory containing the mapping definition files
    #[arg(long)]
    prompt_dir: PathBuf,

    /// Model identifier to configure the completion client with
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let client = OpenAiCompletions::new(OpenAiParameters::new(args.model));
    let mapping = CompletionMapping::load_from_directory(&args.prompt_dir, client, Logger::disabled())?;
    println!("{}", mapping.prompt_template());
    Ok(())
}
