//! Item store trait and SQLite implementation.
//!
//! The store holds two tables: catalog items and their lazily fetched detail
//! records. Item id is the sole unique key; every upsert is
//! `INSERT OR REPLACE`, so re-applying the same batch is idempotent and
//! interleaved upserts of the same id are safe without an explicit lock.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, Row};

use crate::error::StoreError;
use crate::model::{Item, ItemDetail};

/// Persistent keyed record storage for catalog items and detail records.
pub trait ItemStore: Send + Sync {
  /// Upsert a whole batch in one transaction.
  fn upsert_items(&self, items: &[Item]) -> Result<(), StoreError>;

  fn upsert_detail(&self, detail: &ItemDetail) -> Result<(), StoreError>;

  /// Items in id order, windowed by limit/offset.
  fn get_items(&self, limit: u32, offset: u32) -> Result<Vec<Item>, StoreError>;

  fn get_item_count(&self) -> Result<u32, StoreError>;

  fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError>;

  fn get_detail(&self, id: i64) -> Result<Option<ItemDetail>, StoreError>;

  /// Case-insensitive substring match on the display name.
  fn find_by_name(&self, query: &str) -> Result<Vec<Item>, StoreError>;

  /// Case-insensitive substring match on the category label.
  fn find_by_category(&self, query: &str) -> Result<Vec<Item>, StoreError>;
}

/// Schema for the catalog tables.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    reference_url TEXT NOT NULL,
    image_url TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);
CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);

CREATE TABLE IF NOT EXISTS item_details (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    height INTEGER NOT NULL,
    weight INTEGER NOT NULL,
    types_json TEXT NOT NULL,
    stats_json TEXT NOT NULL,
    abilities_json TEXT NOT NULL,
    image_url TEXT NOT NULL
);
"#;

/// SQLite-backed item store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the given path, or at the default location
  /// under the platform data directory.
  pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&path)?;
    Self::from_connection(conn)
  }

  /// In-memory store for tests.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StoreError::NoDataDir)?;

    Ok(data_dir.join("pokesync").join("catalog.db"))
  }

  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

const ITEM_COLUMNS: &str = "id, name, category, reference_url, image_url, fetched_at";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
  Ok(Item {
    id: row.get(0)?,
    name: row.get(1)?,
    category: row.get(2)?,
    reference_url: row.get(3)?,
    image_url: row.get(4)?,
    fetched_at: row.get(5)?,
  })
}

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<ItemDetail> {
  Ok(ItemDetail {
    id: row.get(0)?,
    name: row.get(1)?,
    height: row.get(2)?,
    weight: row.get(3)?,
    types_json: row.get(4)?,
    stats_json: row.get(5)?,
    abilities_json: row.get(6)?,
    image_url: row.get(7)?,
  })
}

impl ItemStore for SqliteStore {
  fn upsert_items(&self, items: &[Item]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    {
      let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO items (id, name, category, reference_url, image_url, fetched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      )?;
      for item in items {
        stmt.execute(params![
          item.id,
          item.name,
          item.category,
          item.reference_url,
          item.image_url,
          item.fetched_at,
        ])?;
      }
    }
    tx.commit()?;
    Ok(())
  }

  fn upsert_detail(&self, detail: &ItemDetail) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO item_details
         (id, name, height, weight, types_json, stats_json, abilities_json, image_url)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      params![
        detail.id,
        detail.name,
        detail.height,
        detail.weight,
        detail.types_json,
        detail.stats_json,
        detail.abilities_json,
        detail.image_url,
      ],
    )?;
    Ok(())
  }

  fn get_items(&self, limit: u32, offset: u32) -> Result<Vec<Item>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM items ORDER BY id LIMIT ?1 OFFSET ?2",
      ITEM_COLUMNS
    ))?;

    let items = stmt
      .query_map(params![limit, offset], item_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
  }

  fn get_item_count(&self) -> Result<u32, StoreError> {
    let conn = self.lock()?;
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
    Ok(count)
  }

  fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM items WHERE id = ?1",
      ITEM_COLUMNS
    ))?;

    match stmt.query_row(params![id], item_from_row) {
      Ok(item) => Ok(Some(item)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn get_detail(&self, id: i64) -> Result<Option<ItemDetail>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(
      "SELECT id, name, height, weight, types_json, stats_json, abilities_json, image_url
       FROM item_details WHERE id = ?1",
    )?;

    match stmt.query_row(params![id], detail_from_row) {
      Ok(detail) => Ok(Some(detail)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn find_by_name(&self, query: &str) -> Result<Vec<Item>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM items WHERE name LIKE '%' || ?1 || '%' ORDER BY id",
      ITEM_COLUMNS
    ))?;

    let items = stmt
      .query_map(params![query], item_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
  }

  fn find_by_category(&self, query: &str) -> Result<Vec<Item>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM items WHERE category LIKE '%' || ?1 || '%' ORDER BY id",
      ITEM_COLUMNS
    ))?;

    let items = stmt
      .query_map(params![query], item_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn item(id: i64, name: &str, category: &str) -> Item {
    Item {
      id,
      name: name.to_string(),
      category: category.to_string(),
      reference_url: format!("https://pokeapi.co/api/v2/pokemon/{}/", id),
      image_url: format!("https://example.com/{}.png", id),
      fetched_at: Utc::now(),
    }
  }

  #[test]
  fn test_upsert_and_read_back() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .upsert_items(&[item(1, "bulbasaur", "grass, poison")])
      .unwrap();

    let items = store.get_items(10, 0).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "bulbasaur");
    assert_eq!(store.get_item(1).unwrap().unwrap().category, "grass, poison");
    assert!(store.get_item(2).unwrap().is_none());
  }

  #[test]
  fn test_upsert_replaces_on_conflict() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.upsert_items(&[item(1, "bulbasaur", "grass")]).unwrap();
    store
      .upsert_items(&[item(1, "bulbasaur", "grass, poison")])
      .unwrap();

    assert_eq!(store.get_item_count().unwrap(), 1);
    assert_eq!(store.get_item(1).unwrap().unwrap().category, "grass, poison");
  }

  #[test]
  fn test_get_items_window() {
    let store = SqliteStore::open_in_memory().unwrap();
    let batch: Vec<Item> = (1..=5).map(|i| item(i, &format!("item-{}", i), "x")).collect();
    store.upsert_items(&batch).unwrap();

    let window = store.get_items(2, 2).unwrap();
    assert_eq!(window.iter().map(|i| i.id).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(store.get_item_count().unwrap(), 5);
  }

  #[test]
  fn test_substring_search() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .upsert_items(&[
        item(1, "bulbasaur", "grass, poison"),
        item(4, "charmander", "fire"),
        item(7, "squirtle", "water"),
      ])
      .unwrap();

    let by_name = store.find_by_name("saur").unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, 1);

    let by_category = store.find_by_category("poison").unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].name, "bulbasaur");

    assert!(store.find_by_name("mew").unwrap().is_empty());
  }

  #[test]
  fn test_detail_roundtrip() {
    let store = SqliteStore::open_in_memory().unwrap();
    let detail = ItemDetail {
      id: 1,
      name: "bulbasaur".to_string(),
      height: 7,
      weight: 69,
      types_json: r#"[{"slot":1,"type":{"name":"grass"}}]"#.to_string(),
      stats_json: "[]".to_string(),
      abilities_json: "[]".to_string(),
      image_url: "https://example.com/1.png".to_string(),
    };

    assert!(store.get_detail(1).unwrap().is_none());
    store.upsert_detail(&detail).unwrap();
    assert_eq!(store.get_detail(1).unwrap().unwrap(), detail);
  }
}
