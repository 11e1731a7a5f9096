//! `generate`: static HTML page over a JSONL log.

use anyhow::Result;
use cdvl_crawler::SiteGenerator;
use tracing::info;

use crate::ProcessExit;
use crate::cli::GenerateArgs;

pub(crate) fn run_generate_command(args: &GenerateArgs) -> Result<ProcessExit> {
    let count = SiteGenerator::new(&args.input, &args.output).generate()?;
    info!(videos = count, output = %args.output.display(), "Site written");
    Ok(ProcessExit::Success)
}
