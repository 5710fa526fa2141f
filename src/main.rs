// src/main.rs

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_content::{
    BlockId, BlockQuery, CommandLineInput, ContentCache, ContentCommand, ContentConfig,
    ContentRepository, DevOnlyCache, FileCache, MediaQuery, NotionHttpClient, PostListQuery,
    PostQuery, SchemaValidator, SortDirection,
};
use serde_json::Value;
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration. Logs go to stderr so stdout stays pure JSON.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_content.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Wires the HTTP client, the development-only disk cache and the validator
/// into a repository.
fn build_repository(
    config: &ContentConfig,
) -> Result<ContentRepository, Box<dyn std::error::Error>> {
    let client = NotionHttpClient::new(&config.api_key)?;
    let disk: Arc<dyn ContentCache> = Arc::new(FileCache::new(&config.cache_dir));
    let cache = DevOnlyCache::new(disk, config.mode);

    if config.mode.uses_cache() {
        log::info!("Cache enabled at {}", config.cache_dir.display());
    } else {
        log::debug!("Cache disabled in {:?} mode", config.mode);
    }

    Ok(
        ContentRepository::new(Arc::new(client), Arc::new(cache), config.sources.clone())
            .with_retry(config.retry)
            .with_validator(SchemaValidator::new(config.images.clone())),
    )
}

/// Runs the requested operation and returns its result as JSON.
async fn execute(
    repository: &ContentRepository,
    config: &ContentConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let skip_cache = config.skip_cache;

    let output = match &config.command {
        ContentCommand::Post {
            slug,
            navigation,
            blocks,
        } => {
            let post = repository
                .fetch_post(&PostQuery {
                    slug: slug.clone(),
                    include_navigation: *navigation,
                    include_blocks: *blocks,
                    skip_cache,
                })
                .await?;
            if post.is_none() {
                log::warn!("No published post with slug '{}'", slug);
            }
            serde_json::to_value(post)?
        }
        ContentCommand::Posts { descending } => {
            let sort = if *descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            serde_json::to_value(
                repository
                    .fetch_posts(&PostListQuery { sort, skip_cache })
                    .await?,
            )?
        }
        ContentCommand::Media { category } => match category.categories().as_slice() {
            [single] => serde_json::to_value(
                repository
                    .fetch_media_items(&MediaQuery {
                        category: *single,
                        skip_cache,
                    })
                    .await?,
            )?,
            several => serde_json::to_value(
                repository.fetch_media_library(several, skip_cache).await?,
            )?,
        },
        ContentCommand::Blocks { id } => {
            let block_id = BlockId::parse(id)?;
            serde_json::to_value(
                repository
                    .fetch_block_children(&BlockQuery {
                        block_id,
                        skip_cache,
                    })
                    .await?,
            )?
        }
    };

    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = ContentConfig::resolve(cli)?;
    let repository = build_repository(&config)?;
    let output = execute(&repository, &config).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
