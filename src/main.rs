mod config;
mod search;
mod store;
mod ui;
mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use store::{LoadOutcome, Store};

#[derive(Parser, Debug)]
#[command(name = "cardex")]
struct Cli {
    /// Path of the JSON book (overrides the configured path)
    #[arg(long)]
    book: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge contacts from a JSON file into the book
    Import(ImportArgs),
    /// Write the book to a JSON file
    Export(ExportArgs),
    /// Query contacts by name or phone (tab-separated output)
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(value_name = "PATH")]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(value_name = "PATH")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term (matches name and phone, case-insensitively)
    query: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load()?;
    let book = cli.book.unwrap_or_else(|| config.book.clone());

    let (mut store, outcome) = Store::open(book);
    if let LoadOutcome::Recovered(reason) = &outcome {
        eprintln!("warning: {}; starting with an empty book", reason);
    }

    if let Some(command) = cli.command {
        match command {
            Command::Import(args) => handle_import(args, &mut store)?,
            Command::Export(args) => handle_export(args, &store)?,
            Command::Query(args) => handle_query(args, &store),
        }
        return Ok(());
    }

    if let Some(path) = &config.config_path {
        println!("Loaded configuration from {}", path.display());
    }

    let mut app = ui::app::App::new(&mut store, &config);
    app.run()?;

    Ok(())
}

fn handle_import(args: ImportArgs, store: &mut Store) -> Result<()> {
    let report = store.import_merge(&args.input)?;

    println!("Imported {} contacts.", report.added);
    if report.skipped > 0 {
        println!(
            "Skipped {} contacts (missing name or phone, or duplicate key).",
            report.skipped
        );
    }
    Ok(())
}

fn handle_export(args: ExportArgs, store: &Store) -> Result<()> {
    store.export(&args.output)?;
    println!(
        "Exported {} contacts to {}",
        store.len(),
        args.output.display()
    );
    Ok(())
}

fn handle_query(args: QueryArgs, store: &Store) {
    let results = search::filter(store.contacts(), &args.query);

    if results.is_empty() {
        println!("No matches for \"{}\"", args.query);
    } else {
        println!(
            "Found {} contact(s) matching \"{}\"",
            results.len(),
            args.query
        );
    }

    // Results: name<TAB>phone<TAB>email
    for contact in results {
        println!("{}\t{}\t{}", contact.name, contact.phone, contact.email);
    }
}
