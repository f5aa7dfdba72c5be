//! Product catalog: where each product lives in the store.
//!
//! Lookups are keyed by normalized product name (trimmed, lowercased), so the
//! classifier's label text can be matched directly against the catalog. The
//! SQLite store is the production path; the in-memory store backs unit tests
//! and ephemeral runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// One catalog row: a product and where to find it on the floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductLocation {
    pub product_name: String,
    pub category: String,
    pub aisle: String,
    pub section: String,
    pub price: f64,
    pub in_stock: bool,
}

/// Catalog lookups and maintenance over some storage backend.
pub trait ProductStore: Send {
    /// Look up a product by name. The name is normalized before matching.
    fn lookup(&self, name: &str) -> Result<Option<ProductLocation>>;

    /// Every product in the catalog, ordered by aisle then name.
    fn all_products(&self) -> Result<Vec<ProductLocation>>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Insert or replace a product. The name is normalized and validated.
    fn upsert(&mut self, product: &ProductLocation) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

/// Lowercase and trim a product name so lookups are case-insensitive.
pub fn normalize_product_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A conforming product name is a short local identifier: it starts with a
/// letter or digit and contains only lowercase letters, digits, spaces,
/// underscores, and hyphens.
///
/// Allowed: "banana", "orange juice", "peanut-butter"
/// Disallowed: anything empty, longer than 64 chars, or with punctuation
/// outside [ _-].
pub fn validate_product_name(name: &str) -> Result<()> {
    // Compile once for hot paths.
    static PRODUCT_NAME_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = PRODUCT_NAME_RE
        .get_or_init(|| regex::Regex::new(r"^[a-z0-9][a-z0-9 _-]{0,63}$").unwrap());

    if !re.is_match(name) {
        return Err(anyhow!(
            "product name must match ^[a-z0-9][a-z0-9 _-]{{0,63}}$ after normalization, got {:?}",
            name
        ));
    }
    Ok(())
}

pub struct SqliteProductStore {
    conn: Connection,
}

impl SqliteProductStore {
    /// Open (or create) the catalog database. The path ":memory:" opens a
    /// private in-memory database.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(db_path)
                .with_context(|| format!("failed to open catalog database at {}", db_path))?
        };
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS products (
              product_name TEXT PRIMARY KEY,
              category TEXT NOT NULL,
              aisle TEXT NOT NULL,
              section TEXT NOT NULL,
              price REAL NOT NULL,
              in_stock INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl ProductStore for SqliteProductStore {
    fn lookup(&self, name: &str) -> Result<Option<ProductLocation>> {
        let key = normalize_product_name(name);
        let row = self
            .conn
            .query_row(
                r#"
                SELECT product_name, category, aisle, section, price, in_stock
                FROM products WHERE product_name = ?1
                "#,
                params![key],
                |row| {
                    Ok(ProductLocation {
                        product_name: row.get(0)?,
                        category: row.get(1)?,
                        aisle: row.get(2)?,
                        section: row.get(3)?,
                        price: row.get(4)?,
                        in_stock: row.get::<_, i64>(5)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn all_products(&self) -> Result<Vec<ProductLocation>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT product_name, category, aisle, section, price, in_stock
            FROM products ORDER BY aisle, product_name
            "#,
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ProductLocation {
                product_name: row.get(0)?,
                category: row.get(1)?,
                aisle: row.get(2)?,
                section: row.get(3)?,
                price: row.get(4)?,
                in_stock: row.get::<_, i64>(5)? != 0,
            });
        }
        Ok(out)
    }

    fn len(&self) -> Result<usize> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn upsert(&mut self, product: &ProductLocation) -> Result<()> {
        let key = normalize_product_name(&product.product_name);
        validate_product_name(&key)?;
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO products(product_name, category, aisle, section, price, in_stock)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                key,
                product.category,
                product.aisle,
                product.section,
                product.price,
                product.in_stock as i64
            ],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM products", [])?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryProductStore {
    products: HashMap<String, ProductLocation>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn lookup(&self, name: &str) -> Result<Option<ProductLocation>> {
        let key = normalize_product_name(name);
        Ok(self.products.get(&key).cloned())
    }

    fn all_products(&self) -> Result<Vec<ProductLocation>> {
        let mut out: Vec<ProductLocation> = self.products.values().cloned().collect();
        out.sort_by(|a, b| {
            a.aisle
                .cmp(&b.aisle)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        Ok(out)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.products.len())
    }

    fn upsert(&mut self, product: &ProductLocation) -> Result<()> {
        let key = normalize_product_name(&product.product_name);
        validate_product_name(&key)?;
        let mut stored = product.clone();
        stored.product_name = key.clone();
        self.products.insert(key, stored);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.products.clear();
        Ok(())
    }
}

/// Load catalog rows from a CSV file with a header line.
///
/// Required columns: product_name, category, aisle, section, price, stock.
/// Extra columns are ignored; column order does not matter. Rows that fail to
/// parse are logged and skipped rather than aborting the whole load. Returns
/// the number of rows inserted.
pub fn seed_from_csv<S: ProductStore + ?Sized>(store: &mut S, csv_path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(csv_path)
        .with_context(|| format!("failed to read catalog CSV {}", csv_path.display()))?;

    let mut lines = raw.lines();
    let header = lines
        .next()
        .ok_or_else(|| anyhow!("catalog CSV {} is empty", csv_path.display()))?;

    let columns: HashMap<&str, usize> = header
        .split(',')
        .enumerate()
        .map(|(index, name)| (name.trim(), index))
        .collect();

    let required = [
        "product_name",
        "category",
        "aisle",
        "section",
        "price",
        "stock",
    ];
    for column in required {
        if !columns.contains_key(column) {
            return Err(anyhow!(
                "catalog CSV {} is missing required column {:?}",
                csv_path.display(),
                column
            ));
        }
    }

    let field = |parts: &[&str], name: &str| -> Option<String> {
        columns
            .get(name)
            .and_then(|&index| parts.get(index))
            .map(|value| value.trim().to_string())
    };

    let mut inserted = 0usize;
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();

        let row = (|| -> Result<ProductLocation> {
            let product_name = field(&parts, "product_name")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing product_name"))?;
            let category = field(&parts, "category").ok_or_else(|| anyhow!("missing category"))?;
            let aisle = field(&parts, "aisle").ok_or_else(|| anyhow!("missing aisle"))?;
            let section = field(&parts, "section").ok_or_else(|| anyhow!("missing section"))?;
            let price: f64 = field(&parts, "price")
                .ok_or_else(|| anyhow!("missing price"))?
                .parse()
                .map_err(|_| anyhow!("price is not a number"))?;
            let in_stock = field(&parts, "stock")
                .map(|v| truthy(&v))
                .ok_or_else(|| anyhow!("missing stock"))?;
            Ok(ProductLocation {
                product_name,
                category,
                aisle,
                section,
                price,
                in_stock,
            })
        })();

        match row {
            Ok(product) => match store.upsert(&product) {
                Ok(()) => inserted += 1,
                Err(e) => {
                    log::warn!(
                        "skipping catalog row {} ({:?}): {}",
                        line_no + 2,
                        product.product_name,
                        e
                    );
                }
            },
            Err(e) => {
                log::warn!("skipping malformed catalog row {}: {}", line_no + 2, e);
            }
        }
    }

    Ok(inserted)
}

/// Seed the store from the CSV only when the store has no rows yet, so a
/// restarted service does not clobber operator edits. Returns the number of
/// rows inserted (0 when the store was already populated or the CSV is
/// absent).
pub fn seed_if_empty<S: ProductStore + ?Sized>(store: &mut S, csv_path: &Path) -> Result<usize> {
    if !store.is_empty()? {
        return Ok(0);
    }
    if !csv_path.exists() {
        log::warn!(
            "catalog CSV {} not found; starting with an empty catalog",
            csv_path.display()
        );
        return Ok(0);
    }
    seed_from_csv(store, csv_path)
}

fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample(name: &str, aisle: &str) -> ProductLocation {
        ProductLocation {
            product_name: name.to_string(),
            category: "Fruit".to_string(),
            aisle: aisle.to_string(),
            section: "A1".to_string(),
            price: 0.5,
            in_stock: true,
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut store = SqliteProductStore::open(":memory:").expect("open");
        store.upsert(&sample("Banana", "7")).expect("upsert");

        let found = store.lookup("  BANANA ").expect("lookup");
        assert_eq!(found.expect("row").aisle, "7");
        assert!(store.lookup("durian").expect("lookup").is_none());
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let mut store = SqliteProductStore::open(":memory:").expect("open");
        store.upsert(&sample("banana", "7")).expect("upsert");
        store.upsert(&sample("banana", "9")).expect("upsert");

        assert_eq!(store.len().expect("len"), 1);
        assert_eq!(store.lookup("banana").expect("lookup").expect("row").aisle, "9");
    }

    #[test]
    fn all_products_ordered_by_aisle_then_name() {
        let mut store = InMemoryProductStore::new();
        store.upsert(&sample("milk", "2")).expect("upsert");
        store.upsert(&sample("banana", "7")).expect("upsert");
        store.upsert(&sample("apple", "7")).expect("upsert");

        let names: Vec<String> = store
            .all_products()
            .expect("all")
            .into_iter()
            .map(|p| p.product_name)
            .collect();
        assert_eq!(names, vec!["milk", "apple", "banana"]);
    }

    #[test]
    fn product_name_discipline() {
        assert!(validate_product_name("banana").is_ok());
        assert!(validate_product_name("orange juice").is_ok());
        assert!(validate_product_name("peanut-butter_2").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(" banana").is_err());
        assert!(validate_product_name("Banana").is_err());
        assert!(validate_product_name("a/b").is_err());
        assert!(validate_product_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn seed_skips_malformed_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("products.csv");
        let mut file = std::fs::File::create(&csv_path).expect("create");
        writeln!(file, "product_name,category,aisle,section,price,stock").expect("write");
        writeln!(file, "banana,Fruit,7,A1,0.25,true").expect("write");
        writeln!(file, ",Fruit,7,A1,0.25,true").expect("write");
        writeln!(file, "apple,Fruit,7,A2,not-a-price,yes").expect("write");
        writeln!(file, "milk,Dairy,2,B4,3.49,0").expect("write");
        drop(file);

        let mut store = InMemoryProductStore::new();
        let inserted = seed_from_csv(&mut store, &csv_path).expect("seed");
        assert_eq!(inserted, 2);
        assert!(store.lookup("banana").expect("lookup").expect("row").in_stock);
        assert!(!store.lookup("milk").expect("lookup").expect("row").in_stock);
        assert!(store.lookup("apple").expect("lookup").is_none());
    }

    #[test]
    fn seed_if_empty_respects_existing_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("products.csv");
        std::fs::write(
            &csv_path,
            "product_name,category,aisle,section,price,stock\nbanana,Fruit,7,A1,0.25,true\n",
        )
        .expect("write");

        let mut store = InMemoryProductStore::new();
        store.upsert(&sample("milk", "2")).expect("upsert");

        assert_eq!(seed_if_empty(&mut store, &csv_path).expect("seed"), 0);
        assert_eq!(store.len().expect("len"), 1);

        let mut empty = InMemoryProductStore::new();
        assert_eq!(seed_if_empty(&mut empty, &csv_path).expect("seed"), 1);
    }

    #[test]
    fn seed_missing_csv_is_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = InMemoryProductStore::new();
        let inserted =
            seed_if_empty(&mut store, &dir.path().join("absent.csv")).expect("seed");
        assert_eq!(inserted, 0);
    }
}
