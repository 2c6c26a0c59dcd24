//! SQL values and bind parameters.
//!
//! Values supplied by callers never appear in the emitted SQL text. They are
//! collected as [`BindValue`]s in placeholder order and handed to the
//! executor, which binds them positionally.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::schema::ColumnType;

/// A SQL value supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without zone.
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: only meant for logging and debugging. Compiled
    /// statements always use placeholders.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Self::Time(t) => format!("'{}'", t.format("%H:%M:%S")),
            Self::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

macro_rules! impl_to_sql_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_int!(i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Time(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

/// A non-NULL value waiting to be bound to a `?` placeholder, together
/// with the declared type of the column it is compared against.
#[derive(Debug, Clone, PartialEq)]
pub struct BindValue {
    column_type: ColumnType,
    value: SqlValue,
}

impl BindValue {
    /// Creates a bind value. Returns `None` for NULL, which is always
    /// rendered inline as `IS NULL` / `IS NOT NULL` / `NULL`.
    #[must_use]
    pub fn new(column_type: ColumnType, value: SqlValue) -> Option<Self> {
        if value.is_null() {
            None
        } else {
            Some(Self { column_type, value })
        }
    }

    /// Declared type of the column this value is compared against.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// The runtime value.
    #[must_use]
    pub const fn value(&self) -> &SqlValue {
        &self.value
    }

    /// Consumes the bind value and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (ColumnType, SqlValue) {
        (self.column_type, self.value)
    }
}

/// Replaces each `?` in `sql` with the inline form of the matching bind
/// value. Placeholders inside quoted literals are left alone.
///
/// Used for logging and tests; never execute the result.
#[must_use]
pub fn interpolate(sql: &str, binds: &[BindValue]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut values = binds.iter();
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => match values.next() {
                Some(bind) => out.push_str(&bind.value.to_sql_inline()),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}
