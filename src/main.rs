use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use book2notion::cli::{AddArgs, Cli, Command, SchemaArgs, SearchCommandArgs};
use book2notion::config::{HttpArgs, NotionArgs};
use book2notion::notion::NotionClient;
use book2notion::search::BookSearch as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    book2notion::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Search(args) => search(args).await.context("search")?,
        Command::Add(args) => add(args).await.context("add")?,
        Command::Schema(args) => schema(args).await.context("schema")?,
    }

    Ok(())
}

async fn search(args: SearchCommandArgs) -> anyhow::Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("--query must not be empty");
    }

    let config = args.search.to_config()?;
    let client = args.http.build_client()?;
    let search = book2notion::search::from_config(&config, client);

    let results = search.search(query, args.page).await?;
    print_json(&results)
}

async fn add(args: AddArgs) -> anyhow::Result<()> {
    let book = args.to_book();
    if !book.has_title() {
        anyhow::bail!("--title must not be empty");
    }

    let notion = notion_client(&args.notion, &args.http)?;
    if args.dry_run {
        let draft = notion.draft_page(&book).await?;
        return print_json(&draft);
    }

    let page = notion.add_book(&book).await?;
    print_json(&serde_json::json!({ "pageId": page.id, "url": page.url }))
}

async fn schema(args: SchemaArgs) -> anyhow::Result<()> {
    let notion = notion_client(&args.notion, &args.http)?;
    let database = notion.fetch_database().await?;
    print_json(&database)
}

fn notion_client(notion: &NotionArgs, http: &HttpArgs) -> anyhow::Result<NotionClient> {
    let config = notion.to_config()?;
    Ok(NotionClient::new(http.build_client()?, &config))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}
