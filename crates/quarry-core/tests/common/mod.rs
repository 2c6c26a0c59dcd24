#![allow(dead_code)]

use std::sync::Arc;

use quarry_core::schema::{ColumnMap, ColumnType, DatabaseMap, Metadata, RelationMap, TableMap};
use quarry_core::{Query, SqlValue, Statement};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The bookstore schema used across the integration tests.
pub fn bookstore() -> Arc<dyn Metadata> {
    Arc::new(
        DatabaseMap::new("bookstore")
            .with_table(
                TableMap::new("book")
                    .column(ColumnMap::new("id", ColumnType::Integer).field("Id").primary_key())
                    .column(ColumnMap::new("title", ColumnType::Varchar).field("Title"))
                    .column(ColumnMap::new("isbn", ColumnType::Varchar).field("ISBN"))
                    .column(ColumnMap::new("price", ColumnType::Float).field("Price"))
                    .column(
                        ColumnMap::new("publisher_id", ColumnType::Integer)
                            .field("PublisherId")
                            .nullable(),
                    )
                    .column(
                        ColumnMap::new("author_id", ColumnType::Integer)
                            .field("AuthorId")
                            .nullable(),
                    )
                    .relation(RelationMap::new("Author", "author").on("author_id", "id"))
                    .relation(RelationMap::new("Publisher", "publisher").on("publisher_id", "id")),
            )
            .with_table(
                TableMap::new("author")
                    .column(ColumnMap::new("id", ColumnType::Integer).field("Id").primary_key())
                    .column(ColumnMap::new("first_name", ColumnType::Varchar).field("FirstName"))
                    .column(ColumnMap::new("last_name", ColumnType::Varchar).field("LastName")),
            )
            .with_table(
                TableMap::new("publisher")
                    .column(ColumnMap::new("id", ColumnType::Integer).field("Id").primary_key())
                    .column(ColumnMap::new("name", ColumnType::Varchar).field("Name")),
            )
            .with_table(
                TableMap::new("review")
                    .column(ColumnMap::new("id", ColumnType::Integer).field("Id").primary_key())
                    .column(ColumnMap::new("reviewed_by", ColumnType::Varchar).field("ReviewedBy"))
                    .column(ColumnMap::new("review_date", ColumnType::Date).field("ReviewDate"))
                    .column(ColumnMap::new("recommended", ColumnType::Boolean).field("Recommended"))
                    .column(ColumnMap::new("book_id", ColumnType::Integer).field("BookId"))
                    .relation(RelationMap::new("Book", "book").on("book_id", "id")),
            ),
    )
}

/// A query over one bookstore table.
pub fn query(table: &str) -> Query {
    Query::from_table(bookstore(), table)
        .unwrap_or_else(|e| panic!("Failed to start query on {table}: {e}"))
}

/// The bind values of a statement, without their column types.
pub fn values(statement: &Statement) -> Vec<SqlValue> {
    statement
        .binds()
        .iter()
        .map(|bind| bind.value().clone())
        .collect()
}

/// Number of `?` placeholders outside quoted literals.
pub fn placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    sql.chars()
        .filter(|ch| {
            if *ch == '\'' {
                in_literal = !in_literal;
            }
            *ch == '?' && !in_literal
        })
        .count()
}

/// A generator with a fixed seed, so failures name a reproducible case.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
