use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::book::Book;
use crate::config::{HttpArgs, NotionArgs, SearchArgs};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for books and print the results as JSON.
    Search(SearchCommandArgs),
    /// Add one book to the configured Notion database.
    Add(AddArgs),
    /// Print the Notion database title and property schema.
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct SearchCommandArgs {
    #[arg(long)]
    pub query: String,

    /// 1-based result page.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    /// May be repeated; order is kept.
    #[arg(long = "author")]
    pub authors: Vec<String>,

    #[arg(long)]
    pub publisher: Option<String>,

    #[arg(long)]
    pub isbn: Option<String>,

    #[arg(long)]
    pub published_date: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    /// Cover image URL (also used as the page icon).
    #[arg(long)]
    pub thumbnail: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// 0–5.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub rating: Option<u8>,

    /// Print the mapped page instead of creating it.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub notion: NotionArgs,

    #[command(flatten)]
    pub http: HttpArgs,
}

impl AddArgs {
    pub fn to_book(&self) -> Book {
        Book {
            title: self.title.trim().to_owned(),
            authors: self.authors.clone(),
            publisher: self.publisher.clone(),
            published_date: self.published_date.clone(),
            isbn: self.isbn.clone(),
            thumbnail: self.thumbnail.clone(),
            url: self.url.clone(),
            description: self.description.clone(),
            rating: self.rating,
            ..Book::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub notion: NotionArgs,

    #[command(flatten)]
    pub http: HttpArgs,
}

/// Arguments of the HTTP server binary.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct ServerArgs {
    #[arg(long, env = "BOOK2NOTION_BIND", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Static web assets directory (served if it has an index.html).
    #[arg(long, default_value = "public")]
    pub public_dir: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub notion: NotionArgs,

    #[command(flatten)]
    pub http: HttpArgs,
}
