//! Book persistence

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult, RejectReason},
    models::{Book, BookQuery, NewBook, Page},
};

use super::{
    postgres::{constraint_error, like_pattern, PgTransaction},
    Lock,
};

#[async_trait]
pub trait BookStore: Send {
    async fn get_book(&mut self, id: i32, lock: Lock) -> AppResult<Option<Book>>;

    /// Matching books ordered by title, with the total match count
    async fn list_books(&mut self, query: &BookQuery, page: Page) -> AppResult<(Vec<Book>, i64)>;

    /// Distinct non-empty categories, sorted
    async fn book_categories(&mut self) -> AppResult<Vec<String>>;

    async fn isbn_exists(&mut self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool>;

    /// Insert with every copy available
    async fn insert_book(&mut self, book: &NewBook) -> AppResult<Book>;

    /// Overwrite descriptive fields and both copy counts
    async fn update_book(&mut self, book: &Book) -> AppResult<Book>;

    async fn set_available_copies(&mut self, id: i32, available: i32) -> AppResult<()>;

    /// Delete the book and, by cascade, its borrowing history
    async fn delete_book(&mut self, id: i32) -> AppResult<()>;
}

fn push_book_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
    if let Some(ref search) = query.search {
        let pattern = like_pattern(search);
        qb.push(" AND (UPPER(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR UPPER(author) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(ref category) = query.category {
        qb.push(" AND UPPER(category) = ")
            .push_bind(category.to_uppercase());
    }
    if query.available == Some(true) {
        qb.push(" AND available_copies > 0");
    }
}

#[async_trait]
impl BookStore for PgTransaction {
    async fn get_book(&mut self, id: i32, lock: Lock) -> AppResult<Option<Book>> {
        let sql = match lock {
            Lock::Plain => "SELECT * FROM books WHERE id = $1",
            Lock::ForUpdate => "SELECT * FROM books WHERE id = $1 FOR UPDATE",
        };
        let book = sqlx::query_as::<_, Book>(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(book)
    }

    async fn list_books(&mut self, query: &BookQuery, page: Page) -> AppResult<(Vec<Book>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books WHERE 1=1");
        push_book_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE 1=1");
        push_book_filters(&mut qb, query);
        qb.push(" ORDER BY title, id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let books = qb
            .build_query_as::<Book>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok((books, total))
    }

    async fn book_categories(&mut self) -> AppResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category FROM books
            WHERE category IS NOT NULL AND category <> ''
            ORDER BY category
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(categories)
    }

    async fn isbn_exists(&mut self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_book(&mut self, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, title, author, category, publication_year,
                               total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.publication_year)
        .bind(book.total_copies)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(constraint_error)
    }

    async fn update_book(&mut self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET isbn = $1, title = $2, author = $3, category = $4,
                publication_year = $5, total_copies = $6, available_copies = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.publication_year)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match constraint_error(e) {
            AppError::Rejected(RejectReason::BookUnavailable) => {
                AppError::Rejected(RejectReason::CopiesBelowIssued)
            }
            other => other,
        })
    }

    async fn set_available_copies(&mut self, id: i32, available: i32) -> AppResult<()> {
        sqlx::query("UPDATE books SET available_copies = $1 WHERE id = $2")
            .bind(available)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(constraint_error)?;
        Ok(())
    }

    async fn delete_book(&mut self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
