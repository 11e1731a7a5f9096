//! `download`: resolve and fetch videos by id.

use anyhow::{Context, Result, bail};
use cdvl_crawler::{ConfigLayer, DownloadOptions, Downloader, get_download_link};
use tracing::{error, info};

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::exit_handler::determine_exit_outcome;
use crate::app::progress_manager::create_reporter;
use crate::cli::DownloadArgs;

/// Parses `1,5,10` into ids; every entry must be a positive integer.
pub(crate) fn parse_video_ids(raw: &str) -> Result<Vec<u64>> {
    let ids = raw
        .split(',')
        .map(|part| {
            part.trim().parse::<u64>().with_context(|| {
                format!("Invalid video ID format '{}'. Use comma-separated integers (e.g., 1,5,10)", part.trim())
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if ids.contains(&0) {
        bail!("Video IDs must be positive integers");
    }
    Ok(ids)
}

pub(crate) async fn run_download_command(
    ctx: &RunContext<'_>,
    args: &DownloadArgs,
) -> Result<ProcessExit> {
    let ids = parse_video_ids(&args.ids)?;
    if args.output.is_some() && ids.len() > 1 {
        bail!("--output can only be used with a single video ID");
    }

    ctx.ensure_license()?;
    let config = ctx.load_config(ConfigLayer::default())?;
    let session = ctx.open_session(config).await?;
    let downloader = Downloader::new(&session, &args.output_dir)
        .with_reporter(create_reporter(ctx.show_progress));

    let total = ids.len();
    info!(total, dry_run = args.dry_run, "Downloading videos");
    let mut succeeded = 0usize;
    for (index, &video_id) in ids.iter().enumerate() {
        info!(video_id, "[{}/{total}] Processing video", index + 1);

        let url = match get_download_link(&session, video_id).await {
            Ok(url) => url,
            Err(e) => {
                error!(video_id, error = %e, "Failed to get download link");
                continue;
            }
        };

        if args.dry_run {
            println!("Video {video_id}: {url}");
            succeeded += 1;
            continue;
        }

        let options = DownloadOptions {
            output_path: args.output.as_deref(),
            content_id: Some(video_id),
            resume: !args.no_resume,
        };
        // Failures are logged by the downloader.
        if let Ok(outcome) = downloader.download_file(&url, options).await {
            info!(video_id, path = %outcome.path.display(), "Downloaded");
            succeeded += 1;
        }
    }

    println!("Successfully processed {succeeded}/{total} video(s)");
    Ok(determine_exit_outcome(succeeded, total))
}
