//! Coercion between quarry values and SQLite storage.
//!
//! SQLite stores dates and times as text, so temporal values are formatted
//! with the dialect's formats on the way in and parsed back on the way out
//! when the declared column type says so.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_core::{BindValue, ColumnType, Dialect, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// A value in the form handed to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Converts a bind value into a driver parameter.
#[must_use]
pub fn coerce(bind: &BindValue, dialect: &dyn Dialect) -> Param {
    match bind.value() {
        SqlValue::Bool(b) => Param::Bool(*b),
        SqlValue::Int(n) if bind.column_type().is_boolean() => Param::Bool(*n != 0),
        SqlValue::Int(n) => Param::Int(*n),
        SqlValue::Float(f) => Param::Float(*f),
        SqlValue::Text(s) => Param::Text(s.clone()),
        SqlValue::Blob(b) => Param::Blob(b.clone()),
        SqlValue::Date(d) => Param::Text(d.format(dialect.date_format()).to_string()),
        SqlValue::Time(t) => Param::Text(t.format(dialect.time_format()).to_string()),
        SqlValue::Timestamp(ts) => Param::Text(ts.format(dialect.timestamp_format()).to_string()),
        SqlValue::Null => Param::Null,
    }
}

/// Binds one parameter to a query.
pub fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: Param,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        Param::Null => query.bind(Option::<String>::None),
        Param::Bool(b) => query.bind(b),
        Param::Int(n) => query.bind(n),
        Param::Float(f) => query.bind(f),
        Param::Text(s) => query.bind(s),
        Param::Blob(b) => query.bind(b),
    }
}

/// Reinterprets a decoded value according to the declared column type.
///
/// Values that do not fit the declared type are returned unchanged.
#[must_use]
pub fn restore(column_type: ColumnType, value: SqlValue, dialect: &dyn Dialect) -> SqlValue {
    match (column_type, value) {
        (ColumnType::Boolean, SqlValue::Int(n)) => SqlValue::Bool(n != 0),
        (ColumnType::Date, SqlValue::Text(s)) => NaiveDate::parse_from_str(&s, dialect.date_format())
            .map_or(SqlValue::Text(s), SqlValue::Date),
        (ColumnType::Time, SqlValue::Text(s)) => NaiveTime::parse_from_str(&s, dialect.time_format())
            .map_or(SqlValue::Text(s), SqlValue::Time),
        (ColumnType::Timestamp, SqlValue::Text(s)) => {
            NaiveDateTime::parse_from_str(&s, dialect.timestamp_format())
                .map_or(SqlValue::Text(s), SqlValue::Timestamp)
        }
        (_, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use quarry_core::{MySqlDialect, SqliteDialect};

    use super::*;

    fn bind_value(column_type: ColumnType, value: SqlValue) -> BindValue {
        BindValue::new(column_type, value).unwrap()
    }

    #[test]
    fn test_temporal_values_use_dialect_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let ts = date.and_hms_opt(13, 5, 0).unwrap();
        let dialect = SqliteDialect::new();

        assert_eq!(
            coerce(&bind_value(ColumnType::Date, SqlValue::Date(date)), &dialect),
            Param::Text(String::from("2024-02-29"))
        );
        assert_eq!(
            coerce(&bind_value(ColumnType::Timestamp, SqlValue::Timestamp(ts)), &dialect),
            Param::Text(String::from("2024-02-29 13:05:00"))
        );
        assert_eq!(
            coerce(
                &bind_value(ColumnType::Time, SqlValue::Time(ts.time())),
                &MySqlDialect::new()
            ),
            Param::Text(String::from("13:05:00"))
        );
    }

    #[test]
    fn test_scalars_bind_natively() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            coerce(&bind_value(ColumnType::Boolean, SqlValue::Bool(true)), &dialect),
            Param::Bool(true)
        );
        assert_eq!(
            coerce(&bind_value(ColumnType::Boolean, SqlValue::Int(0)), &dialect),
            Param::Bool(false)
        );
        assert_eq!(
            coerce(&bind_value(ColumnType::BigInt, SqlValue::Int(42)), &dialect),
            Param::Int(42)
        );
        assert_eq!(
            coerce(&bind_value(ColumnType::Varchar, SqlValue::Text(String::from("a"))), &dialect),
            Param::Text(String::from("a"))
        );
    }

    #[test]
    fn test_restore_by_declared_type() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            restore(ColumnType::Boolean, SqlValue::Int(1), &dialect),
            SqlValue::Bool(true)
        );
        assert_eq!(
            restore(ColumnType::Date, SqlValue::Text(String::from("2023-07-01")), &dialect),
            SqlValue::Date(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap())
        );
        assert_eq!(
            restore(ColumnType::Date, SqlValue::Text(String::from("soon")), &dialect),
            SqlValue::Text(String::from("soon"))
        );
        assert_eq!(
            restore(ColumnType::Integer, SqlValue::Null, &dialect),
            SqlValue::Null
        );
    }
}
