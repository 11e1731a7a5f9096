//! CLI command handlers.

mod crawl;
mod download;
mod export;
mod generate;

pub(crate) use crawl::run_crawl_command;
pub(crate) use download::run_download_command;
pub(crate) use export::run_export_command;
pub(crate) use generate::run_generate_command;
