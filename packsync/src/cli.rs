use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// packsync: edit and publish sample packs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the pack server.
    #[arg(long, env = "PACKSYNC_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the pack server.
    #[arg(long, env = "PACKSYNC_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "PACKSYNC_TIMEOUT_SECS", default_value_t = 120, global = true)]
    pub timeout_secs: u64,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a pack and its samples as the server has them.
    Show(ShowArgs),
    /// List your personal sample library.
    Library,
    /// Edit an existing pack.
    Edit(EditArgs),
    /// Create a new pack.
    Create(CreateArgs),
    /// Restore a saved draft and submit it.
    Resume(ResumeArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(required = true)]
    pub pack_id: String,
}

/// Pack-level fields shared by `edit` and `create`.
#[derive(Args, Debug, Default)]
pub struct MetadataArgs {
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub price_cents: Option<u64>,

    /// Replaces all genres. Repeat for several.
    #[arg(long = "genre")]
    pub genres: Vec<String>,

    /// Replaces all tags. Repeat for several.
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// New cover image.
    #[arg(long)]
    pub cover: Option<PathBuf>,
}

/// Sample changes shared by `edit` and `create`.
#[derive(Args, Debug, Default)]
pub struct SampleArgs {
    /// Add a sample from your library by id.
    #[arg(long = "add")]
    pub add: Vec<String>,

    /// Upload a local audio file as a new sample.
    #[arg(long = "upload")]
    pub upload: Vec<PathBuf>,

    /// Print the planned changes without sending anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Save the edited form as a draft instead of submitting.
    #[arg(long, conflicts_with = "dry_run")]
    pub save_draft: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[arg(required = true)]
    pub pack_id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub metadata: MetadataArgs,

    /// Remove a sample from the pack by id. The sample stays in your library.
    #[arg(long = "remove")]
    pub remove: Vec<String>,

    #[command(flatten)]
    pub samples: SampleArgs,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long, required = true)]
    pub title: String,

    #[command(flatten)]
    pub metadata: MetadataArgs,

    #[command(flatten)]
    pub samples: SampleArgs,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    #[arg(required = true)]
    pub draft: PathBuf,

    /// Print the planned changes without sending anything.
    #[arg(long)]
    pub dry_run: bool,
}
