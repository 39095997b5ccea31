use crate::model::{ProductRecord, StorageError};
use chrono::NaiveDate;
use rusqlite::{Connection, Row, Transaction, params};
use std::path::Path;
use tracing::info;

const FEATURE_SEPARATOR: &str = "\n";
const PRODUCT_COLUMNS: &str = "sku, name, brand, category, subcategory, price_ghs, price_usd,
    description, features, condition, stock_status, image_path, date_added";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file and creates the `products` table if needed.
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        Self::init(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT NOT NULL,
                price_ghs INTEGER NOT NULL,
                price_usd REAL NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                features TEXT NOT NULL DEFAULT '',
                condition TEXT NOT NULL,
                stock_status TEXT NOT NULL,
                image_path TEXT,
                date_added TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Replaces the stored catalog with `records` in one transaction.
    pub fn replace_catalog(&mut self, records: &[ProductRecord]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM products", [])?;
        Self::insert_all(&tx, records)?;
        tx.commit()?;
        info!("Replaced {} stored products with {}", removed, records.len());
        Ok(())
    }

    /// Adds `records` after the existing rows. A clashing SKU aborts the whole batch.
    pub fn append_catalog(&mut self, records: &[ProductRecord]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        Self::insert_all(&tx, records)?;
        tx.commit()?;
        info!("Appended {} products", records.len());
        Ok(())
    }

    fn insert_all(tx: &Transaction<'_>, records: &[ProductRecord]) -> Result<(), StorageError> {
        let mut stmt = tx.prepare(
            "INSERT INTO products (
                sku, name, brand, category, subcategory, price_ghs, price_usd,
                description, features, condition, stock_status, image_path, date_added
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for record in records {
            stmt.execute(params![
                &record.sku,
                &record.name,
                &record.brand,
                &record.category,
                &record.subcategory,
                record.price_ghs,
                record.price_usd,
                &record.description,
                record.features.join(FEATURE_SEPARATOR),
                &record.condition,
                &record.stock_status,
                &record.image_path,
                record.date_added,
            ])?;
        }
        Ok(())
    }

    pub fn existing_skus(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT sku FROM products ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut skus = Vec::new();
        for sku in rows {
            skus.push(sku?);
        }
        Ok(skus)
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// All stored products in insertion order.
    pub fn load_products(&self) -> Result<Vec<ProductRecord>, StorageError> {
        self.query_products(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"), [])
    }

    /// Products whose name or category contains `query`, ignoring ASCII case,
    /// in insertion order.
    pub fn search_products(&self, query: &str, limit: usize) -> Result<Vec<ProductRecord>, StorageError> {
        self.query_products(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products
                 WHERE instr(lower(name), lower(?1)) > 0 OR instr(lower(category), lower(?1)) > 0
                 ORDER BY id LIMIT ?2"
            ),
            params![query.trim(), sql_limit(limit)],
        )
    }

    /// Cheapest products priced at or below `max_ghs`, cheapest first.
    pub fn products_in_budget(&self, max_ghs: u32, limit: usize) -> Result<Vec<ProductRecord>, StorageError> {
        self.query_products(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products
                 WHERE price_ghs <= ?1 ORDER BY price_ghs ASC, id ASC LIMIT ?2"
            ),
            params![max_ghs, sql_limit(limit)],
        )
    }

    pub fn count_in_budget(&self, max_ghs: u32) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE price_ghs <= ?1",
            params![max_ghs],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn query_products<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ProductRecord>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::map_product)?;

        let mut products = Vec::new();
        for product in rows {
            products.push(product?);
        }
        Ok(products)
    }

    fn map_product(row: &Row) -> Result<ProductRecord, rusqlite::Error> {
        let features: String = row.get(8)?;
        let date_added: NaiveDate = row.get(12)?;

        Ok(ProductRecord {
            sku: row.get(0)?,
            name: row.get(1)?,
            brand: row.get(2)?,
            category: row.get(3)?,
            subcategory: row.get(4)?,
            price_ghs: row.get(5)?,
            price_usd: row.get(6)?,
            description: row.get(7)?,
            features: features
                .split(FEATURE_SEPARATOR)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect(),
            condition: row.get(9)?,
            stock_status: row.get(10)?,
            image_path: row.get(11)?,
            date_added,
        })
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sku: &str, price: u32) -> ProductRecord {
        ProductRecord {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            brand: "JBL".to_string(),
            category: "Audio/Video".to_string(),
            subcategory: "Speakers".to_string(),
            description: "A speaker.".to_string(),
            features: vec!["Bluetooth".to_string(), "Portable design".to_string()],
            price_ghs: price,
            price_usd: f64::from(price) * 0.08,
            condition: "New".to_string(),
            stock_status: "In Stock".to_string(),
            image_path: Some(format!("product/{sku}.png")),
            date_added: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[test]
    fn replace_then_load_round_trips() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .replace_catalog(&[record("AUD-JBL-0001", 900), record("AUD-JBL-0002", 1100)])
            .unwrap();
        storage.replace_catalog(&[record("AUD-JBL-0003", 500)]).unwrap();

        let products = storage.load_products().unwrap();
        assert_eq!(products, vec![record("AUD-JBL-0003", 500)]);
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn append_keeps_existing_rows() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.replace_catalog(&[record("AUD-JBL-0001", 900)]).unwrap();
        storage.append_catalog(&[record("AUD-JBL-0002", 950)]).unwrap();

        assert_eq!(
            storage.existing_skus().unwrap(),
            vec!["AUD-JBL-0001".to_string(), "AUD-JBL-0002".to_string()]
        );
    }

    #[test]
    fn duplicate_sku_rolls_back_batch() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.replace_catalog(&[record("AUD-JBL-0001", 900)]).unwrap();

        let result = storage.append_catalog(&[record("AUD-JBL-0002", 950), record("AUD-JBL-0001", 100)]);
        assert!(matches!(result, Err(StorageError::DatabaseError(_))));
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn empty_features_load_as_empty_list() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut bare = record("ACC-GEN-0001", 60);
        bare.features.clear();
        bare.image_path = None;
        storage.replace_catalog(&[bare.clone()]).unwrap();
        assert_eq!(storage.load_products().unwrap(), vec![bare]);
    }

    fn shelf(storage: &mut SqliteStorage) {
        let mut camera = record("PHO-CAN-0001", 2500);
        camera.name = "Canon EOS Camera".to_string();
        camera.category = "Photography".to_string();
        let mut webcam = record("ACC-LOG-0002", 400);
        webcam.name = "Logitech Webcam".to_string();
        webcam.category = "Accessories".to_string();
        let mut cable = record("ACC-GEN-0003", 60);
        cable.name = "USB-C Cable".to_string();
        cable.category = "Accessories".to_string();
        let mut speaker = record("AUD-JBL-0004", 400);
        speaker.name = "JBL Go 3".to_string();
        storage.replace_catalog(&[camera, webcam, cable, speaker]).unwrap();
    }

    #[test]
    fn search_matches_name_or_category_ignoring_case() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        shelf(&mut storage);

        let skus = |found: Vec<ProductRecord>| found.into_iter().map(|p| p.sku).collect::<Vec<_>>();
        assert_eq!(skus(storage.search_products("CAMERA", 5).unwrap()), vec!["PHO-CAN-0001"]);
        assert_eq!(
            skus(storage.search_products("accessories", 5).unwrap()),
            vec!["ACC-LOG-0002", "ACC-GEN-0003"]
        );
        assert_eq!(skus(storage.search_products("accessories", 1).unwrap()), vec!["ACC-LOG-0002"]);
        assert!(storage.search_products("drone", 5).unwrap().is_empty());
    }

    #[test]
    fn budget_lists_cheapest_first() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        shelf(&mut storage);

        let found = storage.products_in_budget(400, 10).unwrap();
        let skus: Vec<_> = found.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["ACC-GEN-0003", "ACC-LOG-0002", "AUD-JBL-0004"]);
        assert_eq!(storage.count_in_budget(400).unwrap(), 3);

        assert_eq!(storage.products_in_budget(400, 2).unwrap().len(), 2);
        assert!(storage.products_in_budget(10, 10).unwrap().is_empty());
        assert_eq!(storage.count_in_budget(10).unwrap(), 0);
    }

    #[test]
    fn opens_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.replace_catalog(&[record("AUD-JBL-0001", 900)]).unwrap();
        }
        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count().unwrap(), 1);
    }
}
