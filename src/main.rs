//! # StudyStack CLI (`stx`)
//!
//! The `stx` binary is a thin shell over the StudyStack core: every
//! command drives the same controllers the UI layer consumes, against the
//! backend configured in a TOML file.
//!
//! ## Usage
//!
//! ```bash
//! stx --config ./config/stx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stx list` | Fetch and display the full resource list |
//! | `stx search "<query>"` | Search resources (short queries list everything) |
//! | `stx add text <title> <content>` | Create an inline text note |
//! | `stx add link <title> <url>` | Save an external link |
//! | `stx add file <title> <path>` | Upload a local file |
//! | `stx summarize <id>` | Request an AI summary for a resource |
//! | `stx delete <id>` | Delete a resource |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use studystack::api::{FileAttachment, HttpStudyApi};
use studystack::config::{self, Config};
use studystack::draft::{DraftKind, ResourceDraft};
use studystack::ingest::IngestionController;
use studystack::list::ResourceList;
use studystack::models::Resource;
use studystack::search::SearchController;
use studystack::summary::{SummaryOrchestrator, SummaryStatus};

/// StudyStack CLI — a client for study resource libraries.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; without one, built-in defaults (a local backend on port 8000)
/// are used.
#[derive(Parser)]
#[command(
    name = "stx",
    about = "StudyStack — a client-side ingestion and reconciliation core for study resources",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/stx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Fetch and display the full resource list.
    List,

    /// Search resources by title, summary, or extracted content.
    ///
    /// Queries shorter than two characters fall back to listing
    /// everything, matching the backend's search threshold.
    Search {
        /// The search query string.
        query: String,
    },

    /// Create a new resource.
    Add {
        #[command(subcommand)]
        resource: AddResource,
    },

    /// Request an AI summary for a resource.
    Summarize {
        /// Resource id.
        id: String,
    },

    /// Delete a resource.
    Delete {
        /// Resource id.
        id: String,
    },
}

/// What kind of resource to create.
#[derive(Subcommand)]
enum AddResource {
    /// An inline text note.
    Text {
        title: String,
        content: String,
        #[arg(long, default_value = "")]
        subject: String,
        /// Tag to attach (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Make the resource publicly visible.
        #[arg(long)]
        public: bool,
    },
    /// An external link.
    Link {
        title: String,
        url: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        public: bool,
    },
    /// An uploaded file (PDF, DOCX, image).
    File {
        title: String,
        path: PathBuf,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        public: bool,
    },
}

struct App {
    list: Arc<ResourceList>,
    search: SearchController,
    ingest: IngestionController,
    summary: SummaryOrchestrator,
}

fn build_app(config: &Config) -> Result<App> {
    let api = Arc::new(HttpStudyApi::new(&config.api)?);
    let list = Arc::new(ResourceList::new());
    let uploader = config.session.display_name.clone();

    Ok(App {
        search: SearchController::new(api.clone(), list.clone(), uploader.clone()),
        ingest: IngestionController::new(api.clone(), list.clone(), uploader),
        summary: SummaryOrchestrator::new(api),
        list,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::minimal()
    };

    let app = build_app(&cfg)?;

    match cli.command {
        Commands::List => {
            app.search.on_query_change("").await?;
            print_resources(&app.list.snapshot());
        }
        Commands::Search { query } => {
            app.search.on_query_change(&query).await?;
            print_resources(&app.list.snapshot());
        }
        Commands::Add { resource } => {
            let draft = build_draft(resource)?;
            let created = app.ingest.submit_and_reconcile(&draft).await?;
            println!("added [{}] {} (id: {})", created.category, created.title, created.id);
        }
        Commands::Summarize { id } => {
            // Populate the list so the resource's content travels with
            // the request.
            app.ingest.reconcile().await?;
            let resource = app
                .list
                .get(&id)
                .with_context(|| format!("no resource with id {}", id))?;

            app.summary.request(&resource).await;
            let session = app
                .summary
                .session()
                .context("summary session vanished")?;
            match session.status {
                SummaryStatus::Success => {
                    println!("{}", session.text.unwrap_or_default());
                }
                SummaryStatus::Failed => {
                    anyhow::bail!(session.error.unwrap_or_default());
                }
                SummaryStatus::Loading => unreachable!("request resolved"),
            }
        }
        Commands::Delete { id } => {
            app.ingest.delete(&id).await?;
            println!("deleted {}", id);
        }
    }

    Ok(())
}

fn build_draft(resource: AddResource) -> Result<ResourceDraft> {
    let mut draft = ResourceDraft::new();
    match resource {
        AddResource::Text {
            title,
            content,
            subject,
            tags,
            public,
        } => {
            draft.title = title;
            draft.set_kind(DraftKind::Text);
            draft.set_content(content);
            draft.subject = subject;
            draft.tags = tags;
            draft.is_public = public;
        }
        AddResource::Link {
            title,
            url,
            subject,
            tags,
            public,
        } => {
            draft.title = title;
            draft.set_kind(DraftKind::Link);
            draft.set_content(url);
            draft.subject = subject;
            draft.tags = tags;
            draft.is_public = public;
        }
        AddResource::File {
            title,
            path,
            subject,
            tags,
            public,
        } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_string());
            let mime = guess_mime(&path).to_string();

            draft.title = title;
            draft.set_kind(DraftKind::File);
            draft.attach_file(FileAttachment { name, mime, bytes });
            draft.subject = subject;
            draft.tags = tags;
            draft.is_public = public;
        }
    }
    Ok(draft)
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" | "docx" => "application/msword",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn print_resources(resources: &[Resource]) {
    if resources.is_empty() {
        println!("No resources.");
        return;
    }

    for (i, resource) in resources.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, resource.category, resource.title);
        if let Some(url) = &resource.primary_url {
            println!("    url: {}", url);
        }
        if let Some(content) = &resource.display_content {
            let mut excerpt: String = content.chars().take(96).collect();
            if excerpt.len() < content.len() {
                excerpt.push_str("...");
            }
            println!("    excerpt: \"{}\"", excerpt.replace('\n', " "));
        }
        println!("    uploaded: {}", resource.uploaded_at.format("%Y-%m-%d"));
        println!("    id: {}", resource.id);
        println!();
    }
}
