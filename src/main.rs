//! CLI entry point for medium-blog

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medium_blog::config::ContentConfig;
use medium_blog::Blog;

#[derive(Parser)]
#[command(name = "medium-blog")]
#[command(version)]
#[command(about = "A server-rendered blog backed by a hosted content store", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(flatten)]
    content: ContentArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Content store settings; each overrides `_config.yml`
#[derive(Args)]
struct ContentArgs {
    /// Content store project id
    #[arg(long, env = "SANITY_PROJECT_ID", global = true)]
    project_id: Option<String>,

    /// Dataset name
    #[arg(long, env = "SANITY_DATASET", global = true)]
    dataset: Option<String>,

    /// API version date, e.g. 2021-10-21
    #[arg(long, env = "SANITY_API_VERSION", global = true)]
    api_version: Option<String>,

    /// Read through the API CDN
    #[arg(long, env = "SANITY_USE_CDN", global = true, value_parser = BoolishValueParser::new())]
    use_cdn: Option<bool>,

    /// Token used to create comment documents
    #[arg(long, env = "SANITY_API_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Override the API origin
    #[arg(long, env = "SANITY_API_HOST", global = true)]
    api_host: Option<String>,
}

impl ContentArgs {
    fn apply(self, config: &mut ContentConfig) {
        if let Some(project_id) = self.project_id {
            config.project_id = project_id;
        }
        if let Some(dataset) = self.dataset {
            config.dataset = dataset;
        }
        if let Some(api_version) = self.api_version {
            config.api_version = api_version;
        }
        if let Some(use_cdn) = self.use_cdn {
            config.use_cdn = use_cdn;
        }
        if self.token.is_some() {
            config.token = self.token;
        }
        if self.api_host.is_some() {
            config.api_host = self.api_host;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Serve posts and comments from a JSON fixture file instead of the API
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// List posts
    List {
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Print the rendered page of one post
    Render {
        slug: String,

        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Write a static snapshot of every page
    Export {
        /// Output directory
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,

        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "medium_blog=debug,tower_http=debug,info"
    } else {
        "medium_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let mut blog = Blog::new(&base_dir)?;
    cli.content.apply(&mut blog.config.content);
    blog.config
        .validate()
        .context("Invalid configuration")?;

    match cli.command {
        Commands::Serve { port, ip, fixtures } => {
            let store = blog.store(fixtures.as_deref())?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            blog.serve(store, &ip, port).await?;
        }

        Commands::List { fixtures } => {
            let store = blog.store(fixtures.as_deref())?;
            medium_blog::commands::list::run(store.as_ref(), &mut std::io::stdout()).await?;
        }

        Commands::Render { slug, fixtures } => {
            let store = blog.store(fixtures.as_deref())?;
            let html = medium_blog::commands::render::run(&blog, store.as_ref(), &slug).await?;
            println!("{}", html);
        }

        Commands::Export { out, fixtures } => {
            let store = blog.store(fixtures.as_deref())?;
            let out = if out.is_absolute() {
                out
            } else {
                base_dir.join(out)
            };
            tracing::info!("Exporting static pages...");
            let written = medium_blog::commands::export::run(&blog, store.as_ref(), &out).await?;
            println!("Exported {} posts to {}", written, out.display());
        }
    }

    Ok(())
}
