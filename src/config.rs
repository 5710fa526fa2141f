// src/config.rs
use crate::cache::FileCache;
use crate::constants::{
    RETRY_BACKOFF_MULTIPLIER, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::model::MediaCategory;
use crate::repository::DataSources;
use crate::schema::ImagePolicy;
use crate::types::{ApiKey, DatabaseId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: ContentCommand,

    /// Bypass cached results (fresh results are still written back)
    #[arg(long, global = true, default_value_t = false)]
    pub skip_cache: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Total attempts per API request, the first one included
    #[arg(long, global = true, default_value_t = RETRY_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[arg(long, global = true, default_value_t = RETRY_INITIAL_DELAY_MS)]
    pub initial_delay_ms: u64,

    /// Upper bound for any retry delay, in milliseconds
    #[arg(long, global = true, default_value_t = RETRY_MAX_DELAY_MS)]
    pub max_delay_ms: u64,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ContentCommand {
    /// Fetch one post by slug
    Post {
        slug: String,
        /// Include the previous and next posts
        #[arg(long)]
        navigation: bool,
        /// Include the post's block tree
        #[arg(long)]
        blocks: bool,
    },
    /// List published posts by first-published date
    Posts {
        #[arg(long)]
        descending: bool,
    },
    /// List media items of one category, or all of them
    Media {
        #[arg(value_enum)]
        category: MediaSelection,
    },
    /// Fetch the grouped block tree under a page or block (URL or ID)
    Blocks { id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSelection {
    Books,
    Albums,
    Podcasts,
    All,
}

impl MediaSelection {
    pub fn categories(self) -> Vec<MediaCategory> {
        match self {
            Self::Books => vec![MediaCategory::Books],
            Self::Albums => vec![MediaCategory::Albums],
            Self::Podcasts => vec![MediaCategory::Podcasts],
            Self::All => MediaCategory::ALL.to_vec(),
        }
    }
}

/// Where the process runs. Only development reads and writes the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Development,
    Test,
    #[default]
    Production,
}

impl RuntimeMode {
    /// Interprets `APP_ENV`. Unset or unrecognised values mean production.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development" | "dev" | "local") => Self::Development,
            Some("test") => Self::Test,
            _ => Self::Production,
        }
    }

    pub fn uses_cache(self) -> bool {
        self == Self::Development
    }
}

/// Everything the binary needs, validated.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub command: ContentCommand,
    pub api_key: ApiKey,
    pub sources: DataSources,
    pub mode: RuntimeMode,
    pub cache_dir: PathBuf,
    pub retry: RetryPolicy,
    pub images: ImagePolicy,
    pub skip_cache: bool,
    pub verbose: bool,
}

impl ContentConfig {
    /// Resolves a complete configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, |name| std::env::var(name).ok())
    }

    /// Like [`ContentConfig::resolve`] with an explicit environment lookup.
    pub fn resolve_with(
        cli: CommandLineInput,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_key_str = env("NOTION_API_KEY").ok_or_else(|| {
            AppError::MissingConfiguration(
                "NOTION_API_KEY environment variable not set".to_string(),
            )
        })?;
        let api_key = ApiKey::new(api_key_str)?;

        let database = |name: &str| -> Result<Option<DatabaseId>, AppError> {
            env(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| {
                    DatabaseId::parse(&v)
                        .map_err(|e| AppError::InvalidId(format!("{}: {}", name, e)))
                })
                .transpose()
        };
        let sources = DataSources {
            posts: database("NOTION_POSTS_DATABASE_ID")?,
            books: database("NOTION_BOOKS_DATABASE_ID")?,
            albums: database("NOTION_ALBUMS_DATABASE_ID")?,
            podcasts: database("NOTION_PODCASTS_DATABASE_ID")?,
        };

        let mode = RuntimeMode::from_env_value(env("APP_ENV").as_deref());
        let cache_dir = env("CONTENT_CACHE_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(FileCache::default_dir);

        let images = ImagePolicy {
            allowed_url_prefixes: env("CONTENT_IMAGE_URL_PREFIXES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            require_alt_text: true,
        };

        if cli.max_attempts == 0 {
            return Err(AppError::MissingConfiguration(
                "--max-attempts must be at least 1".to_string(),
            ));
        }
        let retry = RetryPolicy {
            max_attempts: cli.max_attempts,
            initial_delay: Duration::from_millis(cli.initial_delay_ms),
            max_delay: Duration::from_millis(cli.max_delay_ms.max(cli.initial_delay_ms)),
            backoff_multiplier: RETRY_BACKOFF_MULTIPLIER,
        };

        Ok(ContentConfig {
            command: cli.command,
            api_key,
            sources,
            mode,
            cache_dir,
            retry,
            images,
            skip_cache: cli.skip_cache,
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn cli(args: &[&str]) -> CommandLineInput {
        CommandLineInput::parse_from(
            std::iter::once("notion-content").chain(args.iter().copied()),
        )
    }

    #[test]
    fn parses_subcommands_and_global_flags() {
        let input = cli(&["post", "hello-world", "--navigation", "--skip-cache"]);
        assert_eq!(
            input.command,
            ContentCommand::Post {
                slug: "hello-world".to_string(),
                navigation: true,
                blocks: false,
            }
        );
        assert!(input.skip_cache);
        assert_eq!(input.max_attempts, RETRY_MAX_ATTEMPTS);

        let input = cli(&["media", "all"]);
        assert_eq!(
            input.command,
            ContentCommand::Media {
                category: MediaSelection::All
            }
        );
    }

    #[test]
    fn app_env_selects_the_runtime_mode() {
        assert_eq!(RuntimeMode::from_env_value(Some("development")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::from_env_value(Some("Local")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::from_env_value(Some("test")), RuntimeMode::Test);
        assert_eq!(RuntimeMode::from_env_value(Some("staging")), RuntimeMode::Production);
        assert_eq!(RuntimeMode::from_env_value(None), RuntimeMode::Production);
        assert!(!RuntimeMode::Test.uses_cache());
    }

    #[test]
    fn resolves_from_the_environment() {
        let config = ContentConfig::resolve_with(
            cli(&["posts", "--max-attempts", "5"]),
            env(&[
                ("NOTION_API_KEY", "secret_abcdefghijklmnopqrstuvwxyz"),
                ("NOTION_POSTS_DATABASE_ID", "0123456789abcdef0123456789abcdef"),
                ("APP_ENV", "dev"),
                ("CONTENT_CACHE_DIR", "/tmp/content-cache"),
                ("CONTENT_IMAGE_URL_PREFIXES", "https://a.example/, https://b.example/"),
            ]),
        )
        .unwrap();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/content-cache"));
        assert_eq!(
            config.images.allowed_url_prefixes,
            vec!["https://a.example/", "https://b.example/"]
        );
        assert!(config.sources.posts.is_some());
        assert!(config.sources.books.is_none());
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = ContentConfig::resolve_with(cli(&["posts"]), env(&[])).unwrap_err();
        assert!(matches!(err, AppError::MissingConfiguration(_)));
    }

    #[test]
    fn malformed_database_ids_are_rejected() {
        let err = ContentConfig::resolve_with(
            cli(&["posts"]),
            env(&[
                ("NOTION_API_KEY", "secret_abcdefghijklmnopqrstuvwxyz"),
                ("NOTION_BOOKS_DATABASE_ID", "not-an-id"),
            ]),
        )
        .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidId(ref m) if m.starts_with("NOTION_BOOKS_DATABASE_ID"))
        );
    }
}
