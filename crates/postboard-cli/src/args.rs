//! Command-line surface for `postboard-cli`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "postboard-cli", version, about = "postboard posts API client", long_about = None)]
pub struct Cli {
    /// API base URL, e.g. <http://127.0.0.1:3000>
    #[arg(long, env = "POSTBOARD_SITE_URL")]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// One-shot post management (list/create/update/delete)
    Posts(PostsArgs),
    /// Interactive session over the post views
    Browse,
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List posts, newest first
    List,
    /// Create a post
    Create(PostContentArgs),
    /// Replace a post's title, description and image
    Update {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        content: PostContentArgs,
    },
    /// Delete a post
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PostContentArgs {
    #[arg(long)]
    pub title: String,
    /// Inline description text
    #[arg(long, conflicts_with = "description_file")]
    pub description: Option<String>,
    /// Read the description from a file
    #[arg(long)]
    pub description_file: Option<PathBuf>,
    /// Image file to attach
    #[arg(long)]
    pub image: PathBuf,
    /// Send the image as a multipart upload instead of an inline data URI
    #[arg(long, default_value_t = false)]
    pub upload: bool,
}
