//! `crawl`: log in and sweep both id spaces.

use anyhow::Result;
use cdvl_crawler::Crawler;
use tracing::info;

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::progress_manager::create_reporter;
use crate::cli::CrawlArgs;

pub(crate) async fn run_crawl_command(ctx: &RunContext<'_>, args: &CrawlArgs) -> Result<ProcessExit> {
    ctx.ensure_license()?;
    let config = ctx.load_config(args.config_layer())?;
    let session = ctx.open_session(config).await?;

    let crawler = Crawler::new(session, &args.output_dir)
        .with_reporter(create_reporter(ctx.show_progress));
    let summary = crawler.crawl_all().await?;

    info!(
        videos = summary.videos.success,
        datasets = summary.datasets.success,
        output_dir = %args.output_dir.display(),
        "Crawl finished"
    );
    Ok(ProcessExit::Success)
}
