mod api;
mod config;
mod error;
mod facade;
mod model;
mod store;
mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use api::PokeApiClient;
use config::Config;
use facade::CatalogFacade;
use model::{Item, SearchFilter};
use store::{ItemStore, SqliteStore};
use sync::{Notifier, SyncEngine, SyncScheduler};

#[derive(Parser, Debug)]
#[command(name = "pokesync")]
#[command(about = "Offline-first catalog client for the PokeAPI")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pokesync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the cached catalog, syncing the first page if the cache is empty
  List,
  /// Substring search over the cached catalog
  Search {
    query: String,
    /// Match against the category label instead of the name
    #[arg(long)]
    category: bool,
  },
  /// Show one item's detail record, fetching it on a cache miss
  Detail { id: i64 },
  /// Sync one more page into the cache
  Sync,
  /// Run the background sync loop until interrupted
  Watch,
}

/// Prints background update summaries to the console.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn items_added(&self, added: usize, total: u32) {
    println!("{} new items added, {} total", added, total);
  }
}

fn print_items(items: &[Item]) {
  for item in items {
    println!("{:>5}  {:<16} {}", item.id, item.name, item.category);
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pokesync=warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  let store = Arc::new(SqliteStore::open(config.store.path.as_deref())?);
  let client = PokeApiClient::new(&config.api)?;
  let initial_cursor = store.get_item_count()?;
  let engine = Arc::new(SyncEngine::new(client, Arc::clone(&store), initial_cursor));
  let facade = CatalogFacade::new(Arc::clone(&engine));

  match args.command {
    Command::List => {
      let items = facade.initial_load(config.sync.initial_page_size).await?;
      print_items(&items);
    }

    Command::Search { query, category } => {
      // Search never hits the network; make sure the cache has a first page.
      facade.initial_load(config.sync.initial_page_size).await?;
      let items = facade.search(SearchFilter::from_query(&query, category))?;
      print_items(&items);
    }

    Command::Detail { id } => {
      let detail = facade.detail(id).await?;
      println!("#{} {}", detail.id, detail.name);
      println!("height: {}  weight: {}", detail.height, detail.weight);
      match serde_json::from_str::<Vec<api::types::ApiTypeSlot>>(&detail.types_json) {
        Ok(types) => {
          let names: Vec<&str> = types.iter().map(|t| t.kind.name.as_str()).collect();
          println!("types: {}", names.join(", "));
        }
        Err(_) => println!("types: {}", detail.types_json),
      }
      if !detail.image_url.is_empty() {
        println!("image: {}", detail.image_url);
      }
    }

    Command::Sync => {
      facade.initial_load(config.sync.initial_page_size).await?;
      let loaded = facade.load_more(config.sync.page_size).await?;
      if loaded {
        println!("{} items cached", store.get_item_count()?);
      } else {
        println!("a sync is already in progress");
      }
    }

    Command::Watch => {
      let items = facade.initial_load(config.sync.initial_page_size).await?;
      println!(
        "{} items cached, syncing every {}s (ctrl-c to stop)",
        items.len(),
        config.sync.interval_secs
      );

      let mut scheduler = SyncScheduler::new(
        engine,
        Arc::new(ConsoleNotifier),
        config.sync.interval(),
        config.sync.page_size,
      );
      scheduler.start();

      tokio::signal::ctrl_c().await?;
      scheduler.stop().await;
      println!("{}", *scheduler.status().borrow());
    }
  }

  Ok(())
}
