use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;

use wallhaven_client_lib::commands::{self, ConfigAction, QueryOverrides, SaveOptions, Session};
use wallhaven_client_lib::{Categories, Order, Purity, Sorting, ThumbSize};

#[derive(Parser)]
#[command(author, version, about = "Search and download wallpapers from wallhaven.cc", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log debug output, including request urls
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and list wallpapers
    Search {
        #[command(flatten)]
        filters: Filters,

        /// Number of consecutive pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Print the decoded response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search, then download wallpapers from the result page
    Save {
        /// Wallpaper ids or wallhaven urls to download from the page
        ids: Vec<String>,

        #[command(flatten)]
        filters: Filters,

        /// Download every wallpaper on the page
        #[arg(long)]
        all: bool,

        /// Download a thumbnail instead of the full image
        #[arg(long, value_enum)]
        thumb: Option<ThumbArg>,

        /// Target directory (defaults to the configured save directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args)]
struct Filters {
    /// Search text; empty means no keyword filter
    #[arg(short, long)]
    query: Option<String>,

    /// Categories as general/anime/people digits, e.g. 110
    #[arg(long)]
    categories: Option<Categories>,

    /// Purity as sfw/sketchy/nsfw digits, e.g. 100
    #[arg(long)]
    purity: Option<Purity>,

    /// relevance, random, date_added, views or favorites
    #[arg(long)]
    sorting: Option<Sorting>,

    /// asc or desc
    #[arg(long)]
    order: Option<Order>,

    #[arg(short, long)]
    page: Option<u32>,

    /// Seed from a previous random search, keeps the order stable
    #[arg(long)]
    seed: Option<String>,

    /// API key for this call (overrides WALLHAVEN_API_KEY and the stored key)
    #[arg(long)]
    api_key: Option<String>,
}

impl Filters {
    fn split(self) -> (QueryOverrides, Option<String>) {
        let overrides = QueryOverrides {
            query: self.query,
            categories: self.categories,
            purity: self.purity,
            sorting: self.sorting,
            order: self.order,
            page: self.page,
            seed: self.seed,
        };
        (overrides, self.api_key)
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Store an API key
    SetKey { key: String },
    /// Forget the stored API key
    ClearKey,
    /// Set the default download directory
    SetDir { dir: PathBuf },
    /// Use another API root
    SetBase { url: String },
    /// Store default search filters
    SetDefaults {
        #[command(flatten)]
        filters: Filters,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThumbArg {
    Small,
    Large,
    Original,
}

impl From<ThumbArg> for ThumbSize {
    fn from(arg: ThumbArg) -> Self {
        match arg {
            ThumbArg::Small => ThumbSize::Small,
            ThumbArg::Large => ThumbSize::Large,
            ThumbArg::Original => ThumbSize::Original,
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // `init` also installs the log -> tracing bridge used by the library.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut session = Session::load(cli.settings)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Search {
            filters,
            pages,
            json,
        } => {
            let (overrides, api_key) = filters.split();
            commands::run_search(&session, overrides, api_key.as_deref(), pages, json, &mut out)
                .await?;
        }
        Commands::Save {
            ids,
            filters,
            all,
            thumb,
            dir,
        } => {
            let (overrides, api_key) = filters.split();
            let options = SaveOptions {
                ids,
                all,
                thumb: thumb.map(ThumbSize::from),
                dir,
            };
            commands::run_save(&session, overrides, api_key.as_deref(), options, &mut out).await?;
        }
        Commands::Config { action } => {
            let action = match action {
                ConfigCommand::Show => ConfigAction::Show,
                ConfigCommand::SetKey { key } => ConfigAction::SetKey(key),
                ConfigCommand::ClearKey => ConfigAction::ClearKey,
                ConfigCommand::SetDir { dir } => ConfigAction::SetDir(dir),
                ConfigCommand::SetBase { url } => ConfigAction::SetBase(url),
                ConfigCommand::SetDefaults { filters } => {
                    ConfigAction::SetDefaults(filters.split().0)
                }
            };
            commands::run_config(&mut session, action, &mut out)?;
        }
    }

    Ok(())
}
