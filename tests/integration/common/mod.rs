//! Shared fixtures: an in-memory library driven by a fixed clock

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use lexora_server::{
    clock::FixedClock,
    config::AppConfig,
    models::{book::BookRequest, member::MemberRequest, Book, Member},
    repository::{MemoryStore, Snapshot, Store},
    services::{NoReservations, Services},
    AppState,
};

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct Library {
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub state: AppState,
}

impl Library {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(start_date()));

        let mut config = AppConfig::default();
        config.auth.jwt_secret = JWT_SECRET.to_string();
        config.database.in_memory = true;

        let state = AppState::new(
            config,
            Arc::new(store.clone()),
            clock.clone(),
            Arc::new(NoReservations),
        );

        Self {
            store,
            clock,
            state,
        }
    }

    pub fn services(&self) -> &Services {
        &self.state.services
    }

    pub async fn book(&self, title: &str, copies: i32) -> Book {
        self.services()
            .catalog
            .create(book_request(title, copies))
            .await
            .expect("create book")
    }

    pub async fn member(&self, name: &str) -> Member {
        self.services()
            .members
            .create(MemberRequest {
                full_name: name.to_string(),
                email: None,
                phone: None,
            })
            .await
            .expect("create member")
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await.expect("snapshot")
    }

    pub async fn available_copies(&self, book_id: i32) -> i32 {
        self.services()
            .catalog
            .get(book_id)
            .await
            .expect("get book")
            .available_copies
    }

    /// availableCopies = totalCopies - issued loans, within bounds, for every book
    pub async fn assert_availability_invariant(&self) {
        let snapshot = self.snapshot().await;
        for book in &snapshot.books {
            let issued = snapshot
                .borrowings
                .iter()
                .filter(|b| b.book_id == book.id && b.is_issued())
                .count() as i32;
            assert!(book.available_copies >= 0, "book {} below zero", book.id);
            assert!(
                book.available_copies <= book.total_copies,
                "book {} above total",
                book.id
            );
            assert_eq!(
                book.available_copies,
                book.total_copies - issued,
                "book {} out of sync with its loans",
                book.id
            );
        }
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

pub fn book_request(title: &str, copies: i32) -> BookRequest {
    BookRequest {
        isbn: None,
        title: title.to_string(),
        author: "Test Author".to_string(),
        category: Some("Fiction".to_string()),
        publication_year: Some(2001),
        total_copies: copies,
    }
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}
