//! Catalog administration

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::{AppError, AppResult, Entity, RejectReason},
    models::{book::BookRequest, Book, BookQuery, Page, PaginatedResponse},
    repository::{BookStore, BorrowingStore, Lock, Store},
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Add a title with all of its copies available
    pub async fn create(&self, request: BookRequest) -> AppResult<Book> {
        request.check(self.clock.today())?;
        let new_book = request.into_new_book();

        let mut tx = self.store.begin().await?;
        if let Some(ref isbn) = new_book.isbn {
            if tx.isbn_exists(isbn, None).await? {
                return Err(AppError::Conflict(
                    "Book with this ISBN already exists".to_string(),
                ));
            }
        }
        let book = tx.insert_book(&new_book).await?;
        tx.commit().await?;

        tracing::info!(book_id = book.id, title = %book.title, "Book added to catalog");
        Ok(book)
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        let mut tx = self.store.begin().await?;
        let book = tx
            .get_book(id, Lock::Plain)
            .await?
            .ok_or(AppError::NotFound(Entity::Book, id))?;
        Ok(book)
    }

    pub async fn list(&self, query: BookQuery) -> AppResult<PaginatedResponse<Book>> {
        let page = Page::new(query.page, query.limit)?;
        let mut tx = self.store.begin().await?;
        let (books, total) = tx.list_books(&query, page).await?;
        Ok(PaginatedResponse::new(books, total, page))
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let mut tx = self.store.begin().await?;
        let categories = tx.book_categories().await?;
        Ok(categories)
    }

    /// Replace descriptive fields and the copy count. Available copies move by the same delta as
    /// the total, and the total may never drop below the copies currently out on loan.
    pub async fn update(&self, id: i32, request: BookRequest) -> AppResult<Book> {
        request.check(self.clock.today())?;
        let changes = request.into_new_book();

        let mut tx = self.store.begin().await?;
        let existing = tx
            .get_book(id, Lock::ForUpdate)
            .await?
            .ok_or(AppError::NotFound(Entity::Book, id))?;

        if let Some(ref isbn) = changes.isbn {
            if tx.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(
                    "Book with this ISBN already exists".to_string(),
                ));
            }
        }

        let issued = tx.count_open_loans_for_book(id).await? as i32;
        if changes.total_copies < issued {
            return Err(AppError::Rejected(RejectReason::CopiesBelowIssued));
        }
        let delta = changes.total_copies - existing.total_copies;

        let updated = Book {
            isbn: changes.isbn,
            title: changes.title,
            author: changes.author,
            category: changes.category,
            publication_year: changes.publication_year,
            total_copies: changes.total_copies,
            available_copies: existing.available_copies + delta,
            ..existing
        };
        let book = tx.update_book(&updated).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, total_copies = book.total_copies, "Book updated");
        Ok(book)
    }

    /// Remove a title and its returned borrowing history
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.get_book(id, Lock::ForUpdate)
            .await?
            .ok_or(AppError::NotFound(Entity::Book, id))?;

        if tx.count_open_loans_for_book(id).await? > 0 {
            return Err(AppError::Rejected(RejectReason::BookHasOpenLoans));
        }
        tx.delete_book(id).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
