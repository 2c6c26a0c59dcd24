//! Compilation of whole queries: clause order, joins, sub-queries and
//! bind ordering.

mod common;

use std::sync::Arc;
use std::thread;

use common::{placeholders, query, values};
use quarry_core::{
    col, CompileError, Direction, Expr, GenericDialect, Join, JoinKind, PostgresDialect, Query,
    SqlValue, SqliteDialect,
};

const BOOK_COLUMNS: &str =
    "book.id, book.title, book.isbn, book.price, book.publisher_id, book.author_id";

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_simple_equality_join() {
    let book = query("book");
    let author = book.table("author").unwrap();
    let join = Join::new(
        book.column("AuthorId").unwrap(),
        author.column("Id").unwrap(),
        JoinKind::Inner,
    );
    let plan = book
        .join(join)
        .filter(col("author.Id").eq(12))
        .select_plan(&GenericDialect::new())
        .unwrap();

    assert_eq!(
        plan.statement().sql(),
        format!(
            "SELECT {BOOK_COLUMNS} FROM book \
             INNER JOIN author ON (book.author_id=author.id) WHERE author.id = ?"
        )
    );
    assert_eq!(values(plan.statement()), vec![SqlValue::Int(12)]);
}

#[test]
fn test_or_of_two_comparisons() {
    let book = query("book");
    let author = book.table("author").unwrap();
    let expr = Expr::any([
        col(book.column("Title").unwrap()).eq("Dune"),
        col(author.column("LastName").unwrap()).eq("Herbert"),
    ]);
    let (sql, binds) = expr.build(&GenericDialect::new()).unwrap();
    assert_eq!(sql, "(book.title = ? OR author.last_name = ?)");
    let binds: Vec<SqlValue> = binds.into_iter().map(|b| b.into_parts().1).collect();
    assert_eq!(
        binds,
        vec![
            SqlValue::Text(String::from("Dune")),
            SqlValue::Text(String::from("Herbert")),
        ]
    );
}

#[test]
fn test_aliased_subquery_binds_come_first() {
    let inner = query("book")
        .select("Id")
        .select("Title")
        .filter(col("Price").lt(30.0));
    let outer = Query::from_subquery(inner, "sub")
        .unwrap()
        .filter(col("Title").like("%Rust%"));
    let plan = outer.select_plan(&GenericDialect::new()).unwrap();

    assert_eq!(
        plan.statement().sql(),
        "SELECT sub.id, sub.title FROM \
         (SELECT book.id, book.title FROM book WHERE book.price < ?) AS sub \
         WHERE sub.title LIKE ?"
    );
    assert_eq!(
        values(plan.statement()),
        vec![SqlValue::Float(30.0), SqlValue::Text(String::from("%Rust%"))]
    );
}

// =============================================================================
// Joins
// =============================================================================

#[test]
fn test_implicit_join() {
    let book = query("book");
    let author = book.table("author").unwrap();
    let join = Join::new(
        book.column("AuthorId").unwrap(),
        author.column("Id").unwrap(),
        JoinKind::Implicit,
    );
    let plan = book
        .join(join)
        .select("Title")
        .filter(col("author.LastName").eq("Tolkien"))
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT book.title FROM book, author \
         WHERE book.author_id=author.id AND author.last_name = ?"
    );
}

#[test]
fn test_implicit_join_ignore_case() {
    let review = query("review");
    let author = review.table("author").unwrap();
    let join = Join::new(
        review.column("ReviewedBy").unwrap(),
        author.column("LastName").unwrap(),
        JoinKind::Implicit,
    );
    let plan = review
        .join(join)
        .select("Id")
        .ignore_case(true)
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT review.id FROM review, author \
         WHERE UPPER(review.reviewed_by)=UPPER(author.last_name)"
    );

    let review = query("review");
    let author = review.table("author").unwrap();
    let join = Join::new(
        review.column("ReviewedBy").unwrap(),
        author.column("LastName").unwrap(),
        JoinKind::Inner,
    );
    let plan = review
        .join(join)
        .select("Id")
        .ignore_case(true)
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT review.id FROM review \
         INNER JOIN author ON (review.reviewed_by=author.last_name)"
    );
}

#[test]
fn test_table_in_implicit_and_explicit_join_appears_once() {
    let book = query("book");
    let publisher = book.table("publisher").unwrap();
    let implicit = Join::new(
        book.column("PublisherId").unwrap(),
        publisher.column("Id").unwrap(),
        JoinKind::Implicit,
    );
    let explicit = Join::new(
        book.column("PublisherId").unwrap(),
        publisher.column("Id").unwrap(),
        JoinKind::Left,
    );
    let plan = book
        .join(implicit)
        .join(explicit)
        .select("Title")
        .select_plan(&GenericDialect::new())
        .unwrap();
    let sql = plan.statement().sql();

    assert_eq!(
        sql,
        "SELECT book.title FROM book \
         LEFT JOIN publisher ON (book.publisher_id=publisher.id) \
         WHERE book.publisher_id=publisher.id"
    );
    assert_eq!(sql.matches("JOIN publisher").count(), 1);
    assert!(!sql.contains(", publisher"));
}

#[test]
fn test_aliases_keep_tables_apart() {
    let book = query("book");
    let writer = book.table_as("author", "writer").unwrap();
    let editor = book.table_as("author", "editor").unwrap();
    let book_author_id = book.column("AuthorId").unwrap();
    let book_publisher_id = book.column("PublisherId").unwrap();
    let plan = book
        .join(Join::new(
            book_author_id,
            writer.column("Id").unwrap(),
            JoinKind::Implicit,
        ))
        .join(Join::new(
            book_publisher_id,
            editor.column("Id").unwrap(),
            JoinKind::Right,
        ))
        .select("writer.LastName")
        .select("editor.LastName")
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT writer.last_name, editor.last_name FROM book, author writer \
         RIGHT JOIN author editor ON (book.publisher_id=editor.id) \
         WHERE book.author_id=writer.id"
    );
}

#[test]
fn test_relation_chain_sql() {
    let plan = query("review")
        .join_relation("Book.Author", JoinKind::Left)
        .unwrap()
        .select("Id")
        .select("book.Title")
        .select("author.LastName")
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT review.id, book.title, author.last_name FROM review \
         LEFT JOIN book ON (review.book_id=book.id) \
         LEFT JOIN author ON (book.author_id=author.id)"
    );
}

// =============================================================================
// WHERE, ORDER BY, LIMIT
// =============================================================================

#[test]
fn test_where_clause_presence() {
    let plan = query("publisher")
        .filter(Expr::all([]))
        .filter(Expr::any([]).or(Expr::all([])))
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT publisher.id, publisher.name FROM publisher"
    );
    assert!(!plan.statement().has_where());

    let plan = query("publisher")
        .filter(Expr::all([Expr::any([]), col("Name").eq("Ace")]))
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT publisher.id, publisher.name FROM publisher \
         WHERE (1<>1 AND publisher.name = ?)"
    );

    let plan = query("publisher")
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT publisher.id, publisher.name FROM publisher"
    );
}

#[test]
fn test_where_with_several_filters() {
    let plan = query("book")
        .select("Id")
        .filter(col("Price").gt_eq(10))
        .filter(Expr::any([col("Title").like("A%"), col("ISBN").is_null()]))
        .order_by("Title", Direction::Asc)
        .order_by("Price", Direction::Desc)
        .limit(10)
        .select_plan(&SqliteDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT book.id FROM book \
         WHERE (book.price >= ? AND (book.title LIKE ? OR book.isbn IS NULL)) \
         ORDER BY book.title ASC, book.price DESC LIMIT 10"
    );
    assert_eq!(
        values(plan.statement()),
        vec![SqlValue::Int(10), SqlValue::Text(String::from("A%"))]
    );
}

#[test]
fn test_query_wide_ignore_case() {
    let plan = query("author")
        .select("Id")
        .filter(col("LastName").eq("tolkien"))
        .filter(col("Id").gt(3))
        .order_by("LastName", Direction::Asc)
        .ignore_case(true)
        .select_plan(&PostgresDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT author.id FROM author \
         WHERE (UPPER(author.last_name) = UPPER(?) AND author.id > ?) \
         ORDER BY UPPER(author.last_name) ASC"
    );
}

#[test]
fn test_distinct_and_offset_only() {
    let plan = query("book")
        .select("AuthorId")
        .distinct()
        .offset(20)
        .select_plan(&SqliteDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT DISTINCT book.author_id FROM book LIMIT -1 OFFSET 20"
    );
}

// =============================================================================
// Sub-queries as operands
// =============================================================================

#[test]
fn test_in_subquery_binds_follow_outer_binds() {
    let recommended = query("review")
        .select("BookId")
        .filter(col("Recommended").eq(true));
    let plan = query("book")
        .select("Title")
        .filter(col("Price").lt(50))
        .filter(col("Id").in_query(recommended))
        .filter(col("Title").not_eq("Draft"))
        .select_plan(&GenericDialect::new())
        .unwrap();
    let statement = plan.statement();
    assert_eq!(
        statement.sql(),
        "SELECT book.title FROM book WHERE (book.price < ? AND \
         book.id IN (SELECT review.book_id FROM review WHERE review.recommended = ?) \
         AND book.title != ?)"
    );
    assert_eq!(
        values(statement),
        vec![
            SqlValue::Int(50),
            SqlValue::Bool(true),
            SqlValue::Text(String::from("Draft")),
        ]
    );
    assert_eq!(placeholders(statement.sql()), statement.binds().len());
}

#[test]
fn test_scalar_subquery_operand() {
    let max_price = query("book").select_raw("MAX(book.price)");
    let plan = query("book")
        .select("Title")
        .filter(col("Price").compare_query(quarry_core::CompareOp::Eq, max_price))
        .select_plan(&GenericDialect::new())
        .unwrap();
    assert_eq!(
        plan.statement().sql(),
        "SELECT book.title FROM book WHERE book.price = (SELECT MAX(book.price) FROM book)"
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unknown_column_is_reported_at_compile() {
    let err = query("book")
        .filter(col("Pages").gt(100))
        .select_plan(&GenericDialect::new())
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownColumn {
            table: String::from("book"),
            column: String::from("Pages"),
        }
    );
}

#[test]
fn test_broken_relation_chain_is_reported_at_compile() {
    let book = query("book");
    let author = book.table("author").unwrap();
    let join = Join::new(
        book.column("AuthorId").unwrap(),
        author.column("Id").unwrap(),
        JoinKind::Inner,
    );
    let err = book
        .model_join(quarry_core::ModelJoin::new(join, "Author").after(3))
        .select_plan(&GenericDialect::new())
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidJoinChain(_)));
}

#[test]
fn test_empty_filter_trees_leave_delete_unbounded() {
    for filter in [Expr::all([]), Expr::any([]).or(Expr::all([]))] {
        let err = query("review")
            .filter(filter)
            .delete_plan(&GenericDialect::new())
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::RefusedUnboundedMutation {
                statement: "DELETE",
                table: String::from("review"),
            }
        );
    }
}

#[test]
fn test_explicit_join_onto_primary_table_needs_alias() {
    let book = query("book");
    let same = book.table("book").unwrap();
    let book_id = book.column("Id").unwrap();
    let err = book
        .join(Join::new(
            book_id,
            same.column("Id").unwrap(),
            JoinKind::Left,
        ))
        .select_plan(&GenericDialect::new())
        .unwrap_err();
    assert_eq!(err, CompileError::UnaliasedSelfJoin(String::from("book")));
}

// =============================================================================
// Idempotence and concurrency
// =============================================================================

fn busy_query() -> Query {
    let inner = query("review").select("BookId").filter(col("ReviewedBy").like("%a%"));
    query("book")
        .join_relation("Author", JoinKind::Left)
        .unwrap()
        .select_with_joins()
        .filter(col("Id").in_query(inner))
        .filter(col("author.LastName").in_list(vec!["Le Guin", "Herbert"]))
        .order_by("Title", Direction::Desc)
        .limit(5)
        .ignore_case(true)
}

#[test]
fn test_compiling_twice_is_identical() {
    let query = busy_query();
    let dialect = SqliteDialect::new();
    let first = query.select_plan(&dialect).unwrap();
    let second = query.select_plan(&dialect).unwrap();
    assert_eq!(first.statement(), second.statement());
    assert_eq!(first.layout(), second.layout());

    let count = query.count_plan(&dialect).unwrap();
    let again = query.select_plan(&dialect).unwrap();
    assert_eq!(again.statement(), first.statement());
    assert!(count.statement().sql().starts_with("SELECT COUNT(*) FROM ("));
}

#[test]
fn test_concurrent_compilation() {
    let query = Arc::new(busy_query());
    let expected = query.select_plan(&SqliteDialect::new()).unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let query = Arc::clone(&query);
                scope.spawn(move || query.select_plan(&SqliteDialect::new()).unwrap())
            })
            .collect();
        for handle in handles {
            let plan = handle.join().unwrap();
            assert_eq!(plan.statement(), expected.statement());
        }
    });
}
