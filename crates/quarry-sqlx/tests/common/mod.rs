#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use quarry_core::{DatabaseMap, Metadata, Query};
use quarry_sqlx::{ExecutorConfig, SqliteExecutor};

pub const SCHEMA: &str = r#"{
  "name": "library",
  "tables": [
    {
      "name": "author",
      "columns": [
        { "name": "id", "field": "Id", "type": "integer", "primary_key": true },
        { "name": "last_name", "field": "LastName", "type": "varchar" }
      ]
    },
    {
      "name": "book",
      "columns": [
        { "name": "id", "field": "Id", "type": "integer", "primary_key": true },
        { "name": "title", "field": "Title", "type": "varchar" },
        { "name": "price", "field": "Price", "type": "double" },
        { "name": "author_id", "field": "AuthorId", "type": "integer", "nullable": true }
      ],
      "relations": [
        { "name": "Author", "foreign_table": "author",
          "columns": [{ "local": "author_id", "foreign": "id" }] }
      ]
    },
    {
      "name": "review",
      "columns": [
        { "name": "id", "field": "Id", "type": "integer", "primary_key": true },
        { "name": "reviewed_by", "field": "ReviewedBy", "type": "varchar" },
        { "name": "review_date", "field": "ReviewDate", "type": "date" },
        { "name": "recommended", "field": "Recommended", "type": "boolean" },
        { "name": "book_id", "field": "BookId", "type": "integer" }
      ],
      "relations": [
        { "name": "Book", "foreign_table": "book",
          "columns": [{ "local": "book_id", "foreign": "id" }] }
      ]
    }
  ]
}"#;

const DDL: [&str; 3] = [
    "CREATE TABLE author (id INTEGER PRIMARY KEY, last_name TEXT NOT NULL)",
    "CREATE TABLE book (id INTEGER PRIMARY KEY, title TEXT NOT NULL, price REAL NOT NULL, \
     author_id INTEGER REFERENCES author(id))",
    "CREATE TABLE review (id INTEGER PRIMARY KEY, reviewed_by TEXT NOT NULL, \
     review_date TEXT NOT NULL, recommended BOOLEAN NOT NULL, book_id INTEGER NOT NULL)",
];

pub struct Author {
    pub id: i64,
    pub last_name: &'static str,
}

pub struct Book {
    pub id: i64,
    pub title: &'static str,
    pub price: f64,
    pub author_id: Option<i64>,
}

pub struct Review {
    pub id: i64,
    pub reviewed_by: &'static str,
    pub review_date: NaiveDate,
    pub recommended: bool,
    pub book_id: i64,
}

pub const AUTHORS: [Author; 3] = [
    Author { id: 1, last_name: "Herbert" },
    Author { id: 2, last_name: "Le Guin" },
    Author { id: 3, last_name: "O'Brian" },
];

pub const BOOKS: [Book; 6] = [
    Book { id: 1, title: "Dune", price: 9.99, author_id: Some(1) },
    Book { id: 2, title: "Children of Dune", price: 12.5, author_id: Some(1) },
    Book { id: 3, title: "The Dispossessed", price: 8.0, author_id: Some(2) },
    Book { id: 4, title: "The Left Hand of Darkness", price: 15.25, author_id: Some(2) },
    Book { id: 5, title: "Master and Commander", price: 11.0, author_id: Some(3) },
    Book { id: 6, title: "Anonymous Pamphlet", price: 1.0, author_id: None },
];

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("invalid date {y}-{m}-{d}"))
}

pub fn reviews() -> Vec<Review> {
    vec![
        Review { id: 1, reviewed_by: "ann", review_date: date(2023, 1, 15), recommended: true, book_id: 1 },
        Review { id: 2, reviewed_by: "Bob", review_date: date(2023, 6, 2), recommended: false, book_id: 1 },
        Review { id: 3, reviewed_by: "ANN", review_date: date(2024, 2, 29), recommended: true, book_id: 3 },
        Review { id: 4, reviewed_by: "cleo", review_date: date(2024, 8, 10), recommended: true, book_id: 4 },
        Review { id: 5, reviewed_by: "Bob", review_date: date(2022, 11, 30), recommended: true, book_id: 5 },
    ]
}

pub fn metadata() -> Arc<dyn Metadata> {
    Arc::new(DatabaseMap::from_json(SCHEMA).unwrap_or_else(|e| panic!("Bad schema: {e}")))
}

pub fn query(table: &str) -> Query {
    Query::from_table(metadata(), table)
        .unwrap_or_else(|e| panic!("Failed to start query on {table}: {e}"))
}

/// An in-memory database holding the fixture rows.
pub async fn library() -> SqliteExecutor {
    let executor = ExecutorConfig::default()
        .connect()
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory database: {e}"));
    let pool = executor.pool();
    for ddl in DDL {
        sqlx::query(ddl).execute(pool).await.unwrap();
    }
    for author in &AUTHORS {
        sqlx::query("INSERT INTO author (id, last_name) VALUES (?, ?)")
            .bind(author.id)
            .bind(author.last_name)
            .execute(pool)
            .await
            .unwrap();
    }
    for book in &BOOKS {
        sqlx::query("INSERT INTO book (id, title, price, author_id) VALUES (?, ?, ?, ?)")
            .bind(book.id)
            .bind(book.title)
            .bind(book.price)
            .bind(book.author_id)
            .execute(pool)
            .await
            .unwrap();
    }
    for review in reviews() {
        sqlx::query(
            "INSERT INTO review (id, reviewed_by, review_date, recommended, book_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(review.id)
        .bind(review.reviewed_by)
        .bind(review.review_date.format("%Y-%m-%d").to_string())
        .bind(review.recommended)
        .bind(review.book_id)
        .execute(pool)
        .await
        .unwrap();
    }
    executor
}

/// Installs a fmt subscriber once, for debugging failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
