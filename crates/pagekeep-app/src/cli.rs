// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface over `AppServices`.
//
// Page numbers on the command line are 1-based; they are converted to
// indices at parse time.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pagekeep_core::error::Result;
use pagekeep_core::{Adjustments, DocumentId, ExportFormat, Rotation};
use pagekeep_document::ScanDocument;

use crate::services::app_services::AppServices;

#[derive(Debug, Parser)]
#[command(name = "pagekeep")]
#[command(about = "Keep scanned documents: import, adjust, search, export", long_about = None)]
pub struct Cli {
    /// Data directory (defaults to $PAGEKEEP_DATA_DIR, then the XDG data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import image files as the pages of a new document
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        title: Option<String>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List stored documents, most recently updated first
    List,
    /// Find documents by title, tag, or recognised text
    Search { query: String },
    /// Show a document and its pages
    Show {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
    },
    /// Rotate a page a quarter turn clockwise
    Rotate {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        #[arg(value_parser = parse_page)]
        page: usize,
    },
    /// Change a page's rotation, brightness, or contrast
    Adjust {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        #[arg(value_parser = parse_page)]
        page: usize,
        /// Clockwise degrees, snapped to a quarter turn
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<i32>,
        /// -1.0 to 1.0
        #[arg(long, allow_hyphen_values = true)]
        brightness: Option<f64>,
        /// 0.5 to 2.0
        #[arg(long)]
        contrast: Option<f64>,
    },
    /// Move pages to a new position
    Move {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        /// First page to move
        #[arg(value_parser = parse_page)]
        page: usize,
        /// Insert before this page; one past the last page moves to the end
        #[arg(value_parser = parse_page)]
        before: usize,
        /// Number of consecutive pages to move
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Remove a page from a document
    RemovePage {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        #[arg(value_parser = parse_page)]
        page: usize,
    },
    /// Rename a document
    Retitle {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        title: String,
    },
    /// Replace a document's tags
    Tag {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        tags: Vec<String>,
    },
    /// Delete a document and its files
    Delete {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
    },
    /// Export a document as PDF, JPEG pages, or text
    Export {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Destination directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage the tag registry
    Tags {
        #[command(subcommand)]
        action: Option<TagAction>,
    },
    /// Recognise the text of a page
    #[cfg(feature = "ocr")]
    Ocr {
        #[arg(value_parser = parse_document_id)]
        id: DocumentId,
        #[arg(value_parser = parse_page)]
        page: usize,
        /// Store the recognised text on the page
        #[arg(long)]
        attach: bool,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Subcommand)]
pub enum TagAction {
    /// List known tags
    List,
    /// Register a tag
    Add { tag: String },
    /// Forget a tag
    Remove { tag: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Pdf,
    Jpg,
    Text,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Jpg => ExportFormat::Jpg,
            FormatArg::Text => ExportFormat::Text,
        }
    }
}

fn parse_document_id(s: &str) -> std::result::Result<DocumentId, String> {
    DocumentId::parse(s).ok_or_else(|| format!("'{s}' is not a document id"))
}

/// 1-based page number to 0-based index.
fn parse_page(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("page numbers start at 1".into()),
        Ok(number) => Ok(number - 1),
        Err(_) => Err(format!("'{s}' is not a page number")),
    }
}

fn summary(document: &ScanDocument) -> String {
    let mut line = format!(
        "{}  {}  {:>3}p  {}",
        document.id,
        document.updated_at.format("%Y-%m-%d %H:%M"),
        document.pages.len(),
        document.title,
    );
    if !document.tags.is_empty() {
        line.push_str(&format!("  [{}]", document.tags.join(", ")));
    }
    line
}

fn print_document(document: &ScanDocument) {
    println!("{}", summary(document));
    println!("created {}", document.created_at.to_rfc3339());
    for (index, page) in document.pages.iter().enumerate() {
        let adj = &page.adjustments;
        let text = page.text().map_or(0, str::len);
        println!(
            "  page {:>3}  rot {:>3}  bright {:+.2}  contrast {:.2}  text {} chars",
            index + 1,
            adj.rotation.degrees(),
            adj.brightness,
            adj.contrast,
            text,
        );
    }
}

/// Execute one command.
pub async fn run(services: &AppServices, command: Commands) -> Result<()> {
    match command {
        Commands::Import { files, title, tags } => {
            services.start_session(title, tags).await?;
            for file in files {
                let page = services.import_file(file.clone()).await?;
                tracing::debug!(%page, path = %file.display(), "Imported");
            }
            let saved = services.save_session().await?;
            println!("{}", summary(&saved));
        }
        Commands::List => {
            for document in services.documents().await {
                println!("{}", summary(&document));
            }
        }
        Commands::Search { query } => {
            for document in services.search(&query).await {
                println!("{}", summary(&document));
            }
        }
        Commands::Show { id } => print_document(&services.document(id).await?),
        Commands::Rotate { id, page } => {
            print_document(&services.rotate_page(id, page).await?);
        }
        Commands::Adjust {
            id,
            page,
            rotation,
            brightness,
            contrast,
        } => {
            let document = services.document(id).await?;
            let current = document
                .pages
                .get(page)
                .map(|p| p.adjustments)
                .unwrap_or_default();
            let adjustments = Adjustments::new(
                rotation.map_or(current.rotation, Rotation::from_degrees),
                brightness.unwrap_or(current.brightness),
                contrast.unwrap_or(current.contrast),
            );
            print_document(&services.set_page_adjustments(id, page, adjustments).await?);
        }
        Commands::Move {
            id,
            page,
            before,
            count,
        } => {
            let range = page..page.saturating_add(count);
            print_document(&services.move_pages(id, range, before).await?);
        }
        Commands::RemovePage { id, page } => {
            print_document(&services.remove_page(id, page).await?);
        }
        Commands::Retitle { id, title } => {
            println!("{}", summary(&services.update_metadata(id, Some(title), None).await?));
        }
        Commands::Tag { id, tags } => {
            println!("{}", summary(&services.update_metadata(id, None, Some(tags)).await?));
        }
        Commands::Delete { id } => {
            services.delete_document(id).await?;
            println!("deleted {id}");
        }
        Commands::Export { id, format, out } => {
            let artifact = services
                .export_document(id, format.map(ExportFormat::from), out)
                .await?;
            for file in artifact.files {
                println!("{}", file.display());
            }
        }
        Commands::Tags { action } => match action.unwrap_or(TagAction::List) {
            TagAction::List => {
                for tag in services.tags().await? {
                    println!("{tag}");
                }
            }
            TagAction::Add { tag } => {
                if !services.add_tag(tag.clone()).await? {
                    println!("'{}' is already registered", tag.trim());
                }
            }
            TagAction::Remove { tag } => {
                if !services.remove_tag(tag.clone()).await? {
                    println!("'{tag}' is not registered");
                }
            }
        },
        #[cfg(feature = "ocr")]
        Commands::Ocr { id, page, attach } => {
            let engine = services.load_ocr_engine().await?;
            let text = services.recognize_document_page(engine, id, page).await?;
            println!("{text}");
            if attach {
                services.attach_page_text(id, page, text).await?;
            }
        }
        Commands::PrintConfig => {
            let config = services.config();
            println!("data dir: {}", services.data_dir().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
