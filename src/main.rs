//! Issue Wiki command-line entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse arguments
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Build the document store
//!   7. Run one command, print JSON on stdout

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use issue_wiki::config::{self, Config, ZettelkastenConfig};
use issue_wiki::error::AppError;
use issue_wiki::logger;
use issue_wiki::model::{Document, extract_categories};
use issue_wiki::search::search;
use issue_wiki::store::DocumentStore;
use issue_wiki::wiki::{Backlink, build_graph, collect_backlinks};

const USAGE: &str = "\
Usage: issue-wiki [OPTIONS] <COMMAND>

Commands:
  list                       Open tickets as documents
  show <ID>                  One document, rendered, with backlinks
  comments <ID>              Comments on a ticket
  backlinks <ID>             Documents that mention a ticket
  graph                      Relation graph of the open corpus
  search <QUERY>...          Ranked search over the open corpus
  categories                 Labels with usage counts

Options:
  -h, --help                 Print help
  -f, --config <PATH>        Path to configuration file (default: config/default.toml)
  -v, -vv, -vvv, -vvvv       Increase logging verbosity";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List,
    Show(u64),
    Comments(u64),
    Backlinks(u64),
    Graph,
    Search(String),
    Categories,
    Help,
}

#[derive(Debug)]
struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    command: Command,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args(std::env::args().skip(1))?;
    if args.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = config::load(args.config_path.as_deref())?;

    let (level, forced) = logger::resolve_level(args.log_level, &config.log_level);
    logger::init(level, forced)?;

    info!(
        site = %config.wiki.site_title,
        source = %config.source.provider,
        repo = %format!("{}/{}", config.source.owner, config.source.repo),
        effective_log_level = %level,
        "config loaded"
    );

    let store = DocumentStore::from_config(&config)?;
    execute(&store, &config, args.command).await
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn require_document(store: &DocumentStore, id: u64) -> Result<Document, AppError> {
    store
        .get_document(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("issue #{id}")))
}

async fn execute(store: &DocumentStore, config: &Config, command: Command) -> Result<(), AppError> {
    let base_path = config.wiki.base_path.as_str();

    match command {
        Command::List => print_json(&store.list_open_documents().await),
        Command::Show(id) => {
            let document = require_document(store, id).await?;
            let corpus = store.list_open_documents().await;
            let backlinks = if config.zettelkasten.show_backlinks {
                collect_backlinks(&document, &corpus, base_path)
            } else {
                Vec::new()
            };
            #[cfg(feature = "markdown")]
            let html = issue_wiki::markdown::render_page(
                &document.body,
                &corpus,
                &config.zettelkasten,
                base_path,
                document.id,
            );
            #[cfg(not(feature = "markdown"))]
            let html = issue_wiki::wiki::rewrite(
                &document.body,
                &corpus,
                &config.zettelkasten,
                base_path,
                document.id,
            );
            print_json(&page_view(&document, &html, &backlinks, &config.zettelkasten))
        }
        Command::Comments(id) => print_json(&store.get_comments(id).await),
        Command::Backlinks(id) => {
            let document = require_document(store, id).await?;
            let corpus = store.list_open_documents().await;
            print_json(&collect_backlinks(&document, &corpus, base_path))
        }
        Command::Graph => print_json(&build_graph(&store.list_open_documents().await)),
        Command::Search(query) => {
            print_json(&search(&store.list_open_documents().await, &query, Utc::now()))
        }
        Command::Categories => print_json(&extract_categories(&store.list_open_documents().await)),
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

fn parse_id(raw: Option<String>, command: &str) -> Result<u64, AppError> {
    let raw = raw.ok_or_else(|| AppError::Usage(format!("{command} requires an issue number")))?;
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| AppError::Usage(format!("not an issue number: '{raw}'")))
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, AppError> {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut positional = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            positional.extend(iter.by_ref());
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(CliArgs { log_level: None, config_path: None, command: Command::Help });
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => return Err(AppError::Usage("-f/--config requires a path argument".into())),
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None => Command::Help,
        Some("list") => Command::List,
        Some("show") => Command::Show(parse_id(positional.next(), "show")?),
        Some("comments") => Command::Comments(parse_id(positional.next(), "comments")?),
        Some("backlinks") => Command::Backlinks(parse_id(positional.next(), "backlinks")?),
        Some("graph") => Command::Graph,
        Some("search") => {
            let query = positional.by_ref().collect::<Vec<_>>().join(" ");
            if query.is_empty() {
                return Err(AppError::Usage("search requires a query".into()));
            }
            Command::Search(query)
        }
        Some("categories") => Command::Categories,
        Some(other) => return Err(AppError::Usage(format!("unknown command '{other}'"))),
    };

    Ok(CliArgs { log_level: logger::level_for_verbosity(verbosity), config_path, command })
}

/// JSON for `show`. `highlight_bidirectional` tells the page view whether
/// to style reciprocal backlinks apart.
fn page_view(
    document: &Document,
    html: &str,
    backlinks: &[Backlink],
    zettelkasten: &ZettelkastenConfig,
) -> serde_json::Value {
    json!({
        "slug": document.slug(),
        "document": document,
        "html": html,
        "backlinks": backlinks,
        "highlight_bidirectional": zettelkasten.highlight_bidirectional,
    })
}
