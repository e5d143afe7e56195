//! In-process store
//!
//! Transactions are serialized on a single async mutex. Each transaction works on a private copy
//! of the state which replaces the shared state on commit, so a dropped transaction leaves no
//! trace. The same uniqueness and copy-bound rules the PostgreSQL schema enforces are checked here.

use std::{
    cmp::Reverse,
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{AppError, AppResult, RejectReason},
    models::{
        report::{
            Availability, CategoryCount, FineBreakdown, FineRecord, FineStatus, InventoryItem,
            InventoryQuery, InventorySummary, LibraryStats, MemberActivity, MonthlyCount,
            OverdueItem, PopularBook, StatusCount,
        },
        Book, BookQuery, Borrowing, BorrowingFilter, BorrowingStatus, Member, MemberQuery,
        MemberStatus, NewBook, NewBorrowing, NewMember, Page,
    },
};

use super::{
    BookStore, BorrowingOrder, BorrowingStore, Lock, MemberStore, ReportStore, Snapshot, Store,
    Transaction,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    books: BTreeMap<i32, Book>,
    members: BTreeMap<i32, Member>,
    borrowings: BTreeMap<i32, Borrowing>,
    next_book_id: i32,
    next_member_id: i32,
    next_borrowing_id: i32,
}

impl MemoryState {
    fn check_copies(book: &Book) -> AppResult<()> {
        if book.total_copies < 1
            || book.available_copies < 0
            || book.available_copies > book.total_copies
        {
            return Err(AppError::Rejected(RejectReason::BookUnavailable));
        }
        Ok(())
    }

    fn check_isbn(&self, isbn: Option<&str>, exclude_id: Option<i32>) -> AppResult<()> {
        if let Some(isbn) = isbn {
            if self.isbn_taken(isbn, exclude_id) {
                return Err(AppError::Conflict(
                    "Book with this ISBN already exists".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn isbn_taken(&self, isbn: &str, exclude_id: Option<i32>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn.as_deref() == Some(isbn) && Some(b.id) != exclude_id)
    }

    fn check_email(&self, email: Option<&str>, exclude_id: Option<i32>) -> AppResult<()> {
        if let Some(email) = email {
            if self.email_taken(email, exclude_id) {
                return Err(AppError::Conflict(
                    "Member with this email already exists".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> bool {
        self.members.values().any(|m| {
            m.email
                .as_deref()
                .map(|e| e.eq_ignore_ascii_case(email))
                .unwrap_or(false)
                && Some(m.id) != exclude_id
        })
    }

    fn open_loan(&self, member_id: i32, book_id: i32) -> Option<&Borrowing> {
        self.borrowings
            .values()
            .find(|b| b.member_id == member_id && b.book_id == book_id && b.is_issued())
    }
}

/// Store keeping the whole library in process memory
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    available: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                next_book_id: 1,
                next_member_id: 1,
                next_borrowing_id: 1,
                ..Default::default()
            })),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate an outage: while unavailable every call fails with a transient error
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Transient("in-memory store is offline".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive transaction over the in-memory state
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        self.ensure_available()?;
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn snapshot(&self) -> AppResult<Snapshot> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        Ok(Snapshot {
            books: state.books.values().cloned().collect(),
            members: state.members.values().cloned().collect(),
            borrowings: state.borrowings.values().cloned().collect(),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        self.ensure_available()
    }
}

#[async_trait]
impl BookStore for MemoryTransaction {
    async fn get_book(&mut self, id: i32, _lock: Lock) -> AppResult<Option<Book>> {
        Ok(self.working.books.get(&id).cloned())
    }

    async fn list_books(&mut self, query: &BookQuery, page: Page) -> AppResult<(Vec<Book>, i64)> {
        let mut books: Vec<Book> = self
            .working
            .books
            .values()
            .filter(|b| query.matches(b))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        let total = books.len() as i64;
        Ok((page.apply(books), total))
    }

    async fn book_categories(&mut self) -> AppResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .working
            .books
            .values()
            .filter_map(|b| b.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn isbn_exists(&mut self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(self.working.isbn_taken(isbn, exclude_id))
    }

    async fn insert_book(&mut self, book: &NewBook) -> AppResult<Book> {
        self.working.check_isbn(book.isbn.as_deref(), None)?;

        let row = Book {
            id: self.working.next_book_id,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            publication_year: book.publication_year,
            total_copies: book.total_copies,
            available_copies: book.total_copies,
            created_at: Utc::now(),
        };
        MemoryState::check_copies(&row)?;

        self.working.next_book_id += 1;
        self.working.books.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_book(&mut self, book: &Book) -> AppResult<Book> {
        let existing = self
            .working
            .books
            .get(&book.id)
            .cloned()
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
        self.working.check_isbn(book.isbn.as_deref(), Some(book.id))?;
        MemoryState::check_copies(book).map_err(|_| AppError::Rejected(RejectReason::CopiesBelowIssued))?;

        let row = Book {
            created_at: existing.created_at,
            ..book.clone()
        };
        self.working.books.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_available_copies(&mut self, id: i32, available: i32) -> AppResult<()> {
        if let Some(book) = self.working.books.get_mut(&id) {
            let mut updated = book.clone();
            updated.available_copies = available;
            MemoryState::check_copies(&updated)?;
            *book = updated;
        }
        Ok(())
    }

    async fn delete_book(&mut self, id: i32) -> AppResult<()> {
        self.working.books.remove(&id);
        self.working.borrowings.retain(|_, b| b.book_id != id);
        Ok(())
    }
}

#[async_trait]
impl MemberStore for MemoryTransaction {
    async fn get_member(&mut self, id: i32, _lock: Lock) -> AppResult<Option<Member>> {
        Ok(self.working.members.get(&id).cloned())
    }

    async fn list_members(&mut self, query: &MemberQuery, page: Page) -> AppResult<(Vec<Member>, i64)> {
        let mut members: Vec<Member> = self
            .working
            .members
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        let total = members.len() as i64;
        Ok((page.apply(members), total))
    }

    async fn email_exists(&mut self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(self.working.email_taken(email, exclude_id))
    }

    async fn insert_member(&mut self, member: &NewMember) -> AppResult<Member> {
        self.working.check_email(member.email.as_deref(), None)?;

        let row = Member {
            id: self.working.next_member_id,
            full_name: member.full_name.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            status: MemberStatus::Active,
            join_date: member.join_date,
        };
        self.working.next_member_id += 1;
        self.working.members.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_member(&mut self, member: &Member) -> AppResult<Member> {
        if !self.working.members.contains_key(&member.id) {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        self.working.check_email(member.email.as_deref(), Some(member.id))?;
        self.working.members.insert(member.id, member.clone());
        Ok(member.clone())
    }

    async fn delete_member(&mut self, id: i32) -> AppResult<()> {
        self.working.members.remove(&id);
        self.working.borrowings.retain(|_, b| b.member_id != id);
        Ok(())
    }
}

#[async_trait]
impl BorrowingStore for MemoryTransaction {
    async fn get_borrowing(&mut self, id: i32, _lock: Lock) -> AppResult<Option<Borrowing>> {
        Ok(self.working.borrowings.get(&id).cloned())
    }

    async fn list_borrowings(
        &mut self,
        filter: &BorrowingFilter,
        order: BorrowingOrder,
        page: Page,
    ) -> AppResult<(Vec<Borrowing>, i64)> {
        let mut borrowings: Vec<Borrowing> = self
            .working
            .borrowings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        match order {
            BorrowingOrder::Newest => borrowings
                .sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(b.id.cmp(&a.id))),
            BorrowingOrder::DueFirst => {
                borrowings.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)))
            }
        }
        let total = borrowings.len() as i64;
        Ok((page.apply(borrowings), total))
    }

    async fn open_loans_for_member(&mut self, member_id: i32) -> AppResult<Vec<Borrowing>> {
        let mut loans: Vec<Borrowing> = self
            .working
            .borrowings
            .values()
            .filter(|b| b.member_id == member_id && b.is_issued())
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        Ok(loans)
    }

    async fn open_loan(&mut self, member_id: i32, book_id: i32) -> AppResult<Option<Borrowing>> {
        Ok(self.working.open_loan(member_id, book_id).cloned())
    }

    async fn count_open_loans_for_book(&mut self, book_id: i32) -> AppResult<i64> {
        let count = self
            .working
            .borrowings
            .values()
            .filter(|b| b.book_id == book_id && b.is_issued())
            .count();
        Ok(count as i64)
    }

    async fn count_member_borrowings(&mut self, member_id: i32) -> AppResult<i64> {
        let count = self
            .working
            .borrowings
            .values()
            .filter(|b| b.member_id == member_id)
            .count();
        Ok(count as i64)
    }

    async fn outstanding_fines(&mut self, member_id: i32) -> AppResult<Decimal> {
        Ok(self
            .working
            .borrowings
            .values()
            .filter(|b| b.member_id == member_id)
            .map(|b| b.fine_amount)
            .sum())
    }

    async fn insert_borrowing(&mut self, borrowing: &NewBorrowing) -> AppResult<Borrowing> {
        if self
            .working
            .open_loan(borrowing.member_id, borrowing.book_id)
            .is_some()
        {
            return Err(AppError::Rejected(RejectReason::DuplicateLoan));
        }

        let row = Borrowing {
            id: self.working.next_borrowing_id,
            member_id: borrowing.member_id,
            book_id: borrowing.book_id,
            issue_date: borrowing.issue_date,
            due_date: borrowing.due_date,
            return_date: None,
            assessed_fine: Decimal::ZERO,
            fine_amount: Decimal::ZERO,
            status: BorrowingStatus::Issued,
            renewal_count: 0,
        };
        self.working.next_borrowing_id += 1;
        self.working.borrowings.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_borrowing(&mut self, borrowing: &Borrowing) -> AppResult<Borrowing> {
        if !self.working.borrowings.contains_key(&borrowing.id) {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        self.working.borrowings.insert(borrowing.id, borrowing.clone());
        Ok(borrowing.clone())
    }
}

fn on_or_after(date: NaiveDate, since: Option<NaiveDate>) -> bool {
    since.map(|since| date >= since).unwrap_or(true)
}

fn inventory_item(book: &Book) -> InventoryItem {
    let mut availability_percentage = (Decimal::from(book.available_copies)
        * Decimal::ONE_HUNDRED
        / Decimal::from(book.total_copies.max(1)))
    .round_dp(2);
    availability_percentage.rescale(2);

    InventoryItem {
        book_id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
        category: book.category.clone(),
        publication_year: book.publication_year,
        total_copies: book.total_copies,
        available_copies: book.available_copies,
        issued_copies: book.total_copies - book.available_copies,
        availability_percentage,
    }
}

impl MemoryState {
    fn library_stats(&self, today: NaiveDate, trend_start: NaiveDate) -> LibraryStats {
        let mut categories: BTreeMap<Option<String>, CategoryCount> = BTreeMap::new();
        for book in self.books.values() {
            let entry = categories
                .entry(book.category.clone())
                .or_insert_with(|| CategoryCount {
                    category: book.category.clone(),
                    book_count: 0,
                    total_copies: 0,
                });
            entry.book_count += 1;
            entry.total_copies += i64::from(book.total_copies);
        }
        let mut category_distribution: Vec<CategoryCount> = categories.into_values().collect();
        category_distribution.sort_by(|a, b| b.book_count.cmp(&a.book_count));

        let member_status_distribution = [MemberStatus::Active, MemberStatus::Suspended]
            .into_iter()
            .map(|status| StatusCount {
                status,
                member_count: self.members.values().filter(|m| m.status == status).count() as i64,
            })
            .collect();

        let mut months: BTreeMap<String, i64> = BTreeMap::new();
        for borrowing in self.borrowings.values().filter(|b| b.issue_date >= trend_start) {
            *months
                .entry(borrowing.issue_date.format("%Y-%m").to_string())
                .or_default() += 1;
        }

        LibraryStats {
            total_books: self.books.len() as i64,
            total_copies: self.books.values().map(|b| i64::from(b.total_copies)).sum(),
            available_copies: self.books.values().map(|b| i64::from(b.available_copies)).sum(),
            total_members: self.members.len() as i64,
            active_members: self.members.values().filter(|m| m.is_active()).count() as i64,
            active_loans: self.borrowings.values().filter(|b| b.is_issued()).count() as i64,
            overdue_loans: self.borrowings.values().filter(|b| b.is_overdue(today)).count() as i64,
            outstanding_fines: self.borrowings.values().map(|b| b.fine_amount).sum(),
            category_distribution,
            member_status_distribution,
            borrowing_trends: months
                .into_iter()
                .map(|(month, borrowings)| MonthlyCount { month, borrowings })
                .collect(),
        }
    }

    fn popular_books(&self, since: Option<NaiveDate>) -> Vec<PopularBook> {
        let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
        for borrowing in self.borrowings.values() {
            if on_or_after(borrowing.issue_date, since) {
                *counts.entry(borrowing.book_id).or_default() += 1;
            }
        }

        let mut rows: Vec<PopularBook> = counts
            .into_iter()
            .filter_map(|(book_id, borrow_count)| {
                let book = self.books.get(&book_id)?;
                Some(PopularBook {
                    book_id,
                    title: book.title.clone(),
                    author: book.author.clone(),
                    isbn: book.isbn.clone(),
                    category: book.category.clone(),
                    borrow_count,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.borrow_count
                .cmp(&a.borrow_count)
                .then_with(|| a.title.cmp(&b.title))
                .then(a.book_id.cmp(&b.book_id))
        });
        rows
    }

    fn member_activity(
        &self,
        since: Option<NaiveDate>,
        status: Option<MemberStatus>,
    ) -> Vec<MemberActivity> {
        let mut rows: Vec<MemberActivity> = self
            .members
            .values()
            .filter(|m| status.map(|s| m.status == s).unwrap_or(true))
            .map(|member| {
                let mut activity = MemberActivity {
                    member_id: member.id,
                    full_name: member.full_name.clone(),
                    email: member.email.clone(),
                    status: member.status,
                    join_date: member.join_date,
                    total_borrows: 0,
                    active_loans: 0,
                    total_fines: Decimal::ZERO,
                    last_borrow_date: None,
                };
                for borrowing in self.borrowings.values().filter(|b| b.member_id == member.id) {
                    if borrowing.is_issued() {
                        activity.active_loans += 1;
                    }
                    if on_or_after(borrowing.issue_date, since) {
                        activity.total_borrows += 1;
                        activity.total_fines += borrowing.fine_amount;
                    }
                    activity.last_borrow_date =
                        activity.last_borrow_date.max(Some(borrowing.issue_date));
                }
                activity
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_borrows
                .cmp(&a.total_borrows)
                .then_with(|| a.full_name.cmp(&b.full_name))
                .then(a.member_id.cmp(&b.member_id))
        });
        rows
    }

    fn overdue_loans(&self, today: NaiveDate) -> Vec<OverdueItem> {
        let mut loans: Vec<&Borrowing> = self
            .borrowings
            .values()
            .filter(|b| b.is_overdue(today))
            .collect();
        loans.sort_by_key(|b| (b.due_date, b.id));

        loans
            .into_iter()
            .filter_map(|b| {
                let member = self.members.get(&b.member_id)?;
                let book = self.books.get(&b.book_id)?;
                Some(OverdueItem {
                    borrow_id: b.id,
                    member_id: member.id,
                    member_name: member.full_name.clone(),
                    member_email: member.email.clone(),
                    member_phone: member.phone.clone(),
                    book_id: book.id,
                    book_title: book.title.clone(),
                    book_author: book.author.clone(),
                    issue_date: b.issue_date,
                    due_date: b.due_date,
                    days_overdue: b.days_late(today),
                    accrued_fine: b.fine_amount,
                })
            })
            .collect()
    }

    fn fine_records(&self, since: Option<NaiveDate>, status: FineStatus) -> Vec<FineRecord> {
        let mut rows: Vec<FineRecord> = self
            .borrowings
            .values()
            .filter_map(|b| {
                let returned = b.return_date?;
                if b.assessed_fine <= Decimal::ZERO || !on_or_after(returned, since) {
                    return None;
                }
                let paid = b.fine_amount.is_zero();
                let wanted = match status {
                    FineStatus::Paid => paid,
                    FineStatus::Unpaid => !paid,
                    FineStatus::All => true,
                };
                if !wanted {
                    return None;
                }
                let member = self.members.get(&b.member_id)?;
                let book = self.books.get(&b.book_id)?;
                Some(FineRecord {
                    borrow_id: b.id,
                    member_id: member.id,
                    member_name: member.full_name.clone(),
                    book_id: book.id,
                    book_title: book.title.clone(),
                    issue_date: b.issue_date,
                    due_date: b.due_date,
                    return_date: Some(returned),
                    assessed_fine: b.assessed_fine,
                    fine_amount: b.fine_amount,
                    paid,
                })
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.return_date), Reverse(r.borrow_id)));
        rows
    }

    fn inventory(&self, query: &InventoryQuery) -> (Vec<InventoryItem>, InventorySummary) {
        let availability = query.availability.unwrap_or_default();
        let mut books: Vec<&Book> = self
            .books
            .values()
            .filter(|b| match query.category {
                Some(ref category) => b
                    .category
                    .as_deref()
                    .map(|c| c.eq_ignore_ascii_case(category))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|b| match availability {
                Availability::Available => b.available_copies > 0,
                Availability::Unavailable => b.available_copies == 0,
                Availability::All => true,
            })
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        let summary = InventorySummary {
            total_titles: books.len() as i64,
            total_copies: books.iter().map(|b| i64::from(b.total_copies)).sum(),
            available_copies: books.iter().map(|b| i64::from(b.available_copies)).sum(),
            issued_copies: books
                .iter()
                .map(|b| i64::from(b.total_copies - b.available_copies))
                .sum(),
            out_of_stock: books.iter().filter(|b| b.available_copies == 0).count() as i64,
        };

        (books.into_iter().map(inventory_item).collect(), summary)
    }

    fn fine_breakdown(&self, member_id: i32) -> Vec<FineBreakdown> {
        let mut fined: Vec<&Borrowing> = self
            .borrowings
            .values()
            .filter(|b| b.member_id == member_id && b.fine_amount > Decimal::ZERO)
            .collect();
        fined.sort_by_key(|b| (b.due_date, b.id));

        fined
            .into_iter()
            .filter_map(|b| {
                let book = self.books.get(&b.book_id)?;
                Some(FineBreakdown {
                    borrow_id: b.id,
                    book_id: book.id,
                    book_title: book.title.clone(),
                    book_author: book.author.clone(),
                    issue_date: b.issue_date,
                    due_date: b.due_date,
                    return_date: b.return_date,
                    fine_amount: b.fine_amount,
                    status: b.status,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn library_stats(&self, today: NaiveDate, trend_start: NaiveDate) -> AppResult<LibraryStats> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        Ok(state.library_stats(today, trend_start))
    }

    async fn popular_books(
        &self,
        since: Option<NaiveDate>,
        page: Page,
    ) -> AppResult<(Vec<PopularBook>, i64)> {
        self.ensure_available()?;
        let rows = self.state.lock().await.popular_books(since);
        let total = rows.len() as i64;
        Ok((page.apply(rows), total))
    }

    async fn member_activity(
        &self,
        since: Option<NaiveDate>,
        status: Option<MemberStatus>,
        page: Page,
    ) -> AppResult<(Vec<MemberActivity>, i64)> {
        self.ensure_available()?;
        let rows = self.state.lock().await.member_activity(since, status);
        let total = rows.len() as i64;
        Ok((page.apply(rows), total))
    }

    async fn overdue_loans(&self, today: NaiveDate, page: Page) -> AppResult<(Vec<OverdueItem>, i64)> {
        self.ensure_available()?;
        let rows = self.state.lock().await.overdue_loans(today);
        let total = rows.len() as i64;
        Ok((page.apply(rows), total))
    }

    async fn fine_records(
        &self,
        since: Option<NaiveDate>,
        status: FineStatus,
        page: Page,
    ) -> AppResult<(Vec<FineRecord>, i64)> {
        self.ensure_available()?;
        let rows = self.state.lock().await.fine_records(since, status);
        let total = rows.len() as i64;
        Ok((page.apply(rows), total))
    }

    async fn inventory(
        &self,
        query: &InventoryQuery,
        page: Page,
    ) -> AppResult<(Vec<InventoryItem>, InventorySummary)> {
        self.ensure_available()?;
        let (items, summary) = self.state.lock().await.inventory(query);
        Ok((page.apply(items), summary))
    }

    async fn fine_breakdown(&self, member_id: i32) -> AppResult<Vec<FineBreakdown>> {
        self.ensure_available()?;
        let rows = self.state.lock().await.fine_breakdown(member_id);
        Ok(rows)
    }
}
