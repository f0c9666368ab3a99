mod platform;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use catalog_core::{FilterPatch, ResetOptions, SortKey};
use catalog_engine::{ClientSettings, Taxonomy};
use clap::{ArgAction, Args, Parser, Subcommand};

use platform::app::{self, BrowsePlan};
use platform::logging::{self, LogDestination};

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Browse the game catalog from the terminal")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Also write the log to ./catalog.log
    #[arg(long = "log-file", global = true, action = ArgAction::SetTrue)]
    log_file: bool,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long = "timeout-secs", global = true)]
    timeout_secs: Option<u64>,

    /// Retries after a 429 response
    #[arg(long = "max-retries", global = true)]
    max_retries: Option<u32>,

    /// Seconds to wait for results before giving up
    #[arg(long = "wait-secs", global = true, default_value_t = 30)]
    wait_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List items for an address, e.g. "/games?genres=action&ordering=-rating"
    Browse(BrowseArgs),
    /// Show one item by numeric id or slug
    Detail {
        item: String,
    },
    /// List genres usable as filter values
    Genres {
        #[arg(long = "page-size")]
        page_size: Option<u32>,
    },
    /// List platforms usable as filter values
    Platforms {
        #[arg(long = "page-size")]
        page_size: Option<u32>,
    },
}

#[derive(Args, Debug)]
struct BrowseArgs {
    /// Starting address; defaults to the last browsed one
    address: Option<String>,

    /// Search text; an empty value clears it
    #[arg(long)]
    search: Option<String>,

    /// Genre ids or slugs
    #[arg(long = "genre", value_delimiter = ',')]
    genres: Vec<String>,

    /// Platform ids
    #[arg(long = "platform", value_delimiter = ',')]
    platforms: Vec<u32>,

    /// Sort key such as name, -released or -rating
    #[arg(long, allow_hyphen_values = true)]
    ordering: Option<SortKey>,

    #[arg(long = "page-size")]
    page_size: Option<u32>,

    /// Clear search, genres and platforms before applying other options
    #[arg(long, action = ArgAction::SetTrue)]
    reset: bool,

    /// With --reset, also clear the ordering
    #[arg(long = "reset-ordering", action = ArgAction::SetTrue, requires = "reset")]
    reset_ordering: bool,

    /// With --reset, also clear the page size
    #[arg(long = "reset-page-size", action = ArgAction::SetTrue, requires = "reset")]
    reset_page_size: bool,

    /// Pages to load before printing
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Re-fetch the first page once results are shown
    #[arg(long, action = ArgAction::SetTrue)]
    refresh: bool,

    /// Retries after a failed page load
    #[arg(long, default_value_t = 0)]
    retry: u32,
}

impl BrowseArgs {
    fn into_plan(self, wait: Duration) -> BrowsePlan {
        let reset = self.reset.then(|| ResetOptions {
            keep_ordering: !self.reset_ordering,
            keep_page_size: !self.reset_page_size,
        });
        let patch = FilterPatch {
            search: self.search,
            genres: (!self.genres.is_empty()).then_some(self.genres),
            platforms: (!self.platforms.is_empty()).then_some(self.platforms),
            ordering: self.ordering.map(Some),
            page_size: self.page_size.map(|size| (size > 0).then_some(size)),
        };
        BrowsePlan {
            address: self.address,
            reset,
            patch,
            pages: self.pages.max(1),
            refresh: self.refresh,
            retries: self.retry,
            wait,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, cli.verbose);

    let mut settings = ClientSettings::from_env();
    if let Some(secs) = cli.timeout_secs {
        settings.timeout = Duration::from_secs(secs);
    }
    if let Some(max_retries) = cli.max_retries {
        settings.max_retries = max_retries;
    }
    let wait = Duration::from_secs(cli.wait_secs);

    match cli.command {
        Commands::Browse(args) => {
            let state_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            app::run_browse(settings, args.into_plan(wait), &state_dir)
        }
        Commands::Detail { item } => app::run_detail(settings, &item, wait),
        Commands::Genres { page_size } => {
            app::run_taxonomy(settings, Taxonomy::Genres, page_size, wait)
        }
        Commands::Platforms { page_size } => {
            app::run_taxonomy(settings, Taxonomy::Platforms, page_size, wait)
        }
    }
}
