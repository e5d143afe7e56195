//! Circulation engine: issue, return, renew and fine payment
//!
//! Every mutation runs in one store transaction. Preconditions are checked in a fixed order and
//! the first failure is returned before anything is written; the transaction is then dropped,
//! which discards it. Member and book rows are locked before they are checked so concurrent
//! requests for the same copy queue up instead of racing, and the store's own constraints reject
//! anything that slips through.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    clock::Clock,
    config::CirculationConfig,
    error::{AppError, AppResult, Entity, RejectReason},
    models::{
        borrowing::{BorrowingQuery, BorrowingView, OverdueLoan},
        Borrowing, BorrowingFilter, BorrowingStatus, NewBorrowing, Page, PaginatedResponse,
    },
    repository::{
        BookStore, BorrowingOrder, BorrowingStore, Lock, MemberStore, Store, Transaction,
    },
};

use super::{fines::FinePolicy, reservations::ReservationDirectory};

/// On whose behalf a circulation request is made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// Library staff, unrestricted
    Staff,
    /// A member acting on their own loans
    Member(i32),
}

impl Requester {
    pub fn may_access(&self, member_id: i32) -> bool {
        match self {
            Requester::Staff => true,
            Requester::Member(id) => *id == member_id,
        }
    }

    fn ensure_access(&self, borrowing: &Borrowing) -> AppResult<()> {
        if self.may_access(borrowing.member_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Borrowing belongs to another member".to_string(),
            ))
        }
    }
}

fn reject(operation: &'static str, reason: RejectReason) -> AppError {
    tracing::debug!(operation, code = reason.code(), "Circulation request rejected");
    AppError::Rejected(reason)
}

#[derive(Clone)]
pub struct CirculationService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    reservations: Arc<dyn ReservationDirectory>,
    policy: CirculationConfig,
    fines: FinePolicy,
}

impl CirculationService {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        reservations: Arc<dyn ReservationDirectory>,
        policy: CirculationConfig,
    ) -> Self {
        let fines = FinePolicy::from_config(&policy);
        Self {
            store,
            clock,
            reservations,
            policy,
            fines,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn fine_policy(&self) -> &FinePolicy {
        &self.fines
    }

    /// Lend a copy of a book to a member
    pub async fn issue(&self, member_id: i32, book_id: i32) -> AppResult<Borrowing> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;

        let member = tx
            .get_member(member_id, Lock::ForUpdate)
            .await?
            .ok_or(AppError::NotFound(Entity::Member, member_id))?;
        if !member.is_active() {
            return Err(reject("issue", RejectReason::MemberSuspended));
        }

        let open_loans = tx.open_loans_for_member(member_id).await?;
        if open_loans.iter().any(|loan| loan.is_overdue(today)) {
            return Err(reject("issue", RejectReason::MemberHasOverdue));
        }
        if open_loans.len() >= self.policy.max_active_loans as usize {
            return Err(reject("issue", RejectReason::MemberLimitExceeded));
        }

        let book = tx
            .get_book(book_id, Lock::ForUpdate)
            .await?
            .ok_or(AppError::NotFound(Entity::Book, book_id))?;
        if book.available_copies <= 0 {
            return Err(reject("issue", RejectReason::BookUnavailable));
        }
        if open_loans.iter().any(|loan| loan.book_id == book_id) {
            return Err(reject("issue", RejectReason::DuplicateLoan));
        }

        let borrowing = tx
            .insert_borrowing(&NewBorrowing {
                member_id,
                book_id,
                issue_date: today,
                due_date: today + Duration::days(i64::from(self.policy.loan_period_days)),
            })
            .await?;
        tx.set_available_copies(book_id, book.available_copies - 1)
            .await?;
        tx.commit().await?;

        tracing::info!(
            borrow_id = borrowing.id,
            member_id,
            book_id,
            due_date = %borrowing.due_date,
            "Book issued"
        );
        Ok(borrowing)
    }

    /// Take a book back, finalizing any overdue fine
    pub async fn return_loan(&self, borrow_id: i32) -> AppResult<Borrowing> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;

        let mut borrowing = self.locked_borrowing(tx.as_mut(), borrow_id).await?;
        if !borrowing.is_issued() {
            return Err(reject("return", RejectReason::AlreadyReturned));
        }

        let overdue_days = borrowing.days_late(today);
        let fine = self.fines.compute(overdue_days);
        borrowing.assessed_fine += fine;
        borrowing.fine_amount += fine;
        borrowing.status = BorrowingStatus::Returned;
        borrowing.return_date = Some(today);

        if let Some(book) = tx.get_book(borrowing.book_id, Lock::ForUpdate).await? {
            let available = (book.available_copies + 1).min(book.total_copies);
            tx.set_available_copies(book.id, available).await?;
        }

        let borrowing = tx.update_borrowing(&borrowing).await?;
        tx.commit().await?;

        tracing::info!(
            borrow_id,
            book_id = borrowing.book_id,
            overdue_days,
            fine = %fine,
            "Book returned"
        );
        Ok(borrowing)
    }

    /// Extend the due date of an issued loan
    ///
    /// The reservation directory is asked before the row is locked; the loan is then checked again
    /// under the lock.
    pub async fn renew(&self, borrow_id: i32, requester: Requester) -> AppResult<Borrowing> {
        let today = self.clock.today();

        let current = {
            let mut tx = self.store.begin().await?;
            tx.get_borrowing(borrow_id, Lock::Plain)
                .await?
                .ok_or(AppError::NotFound(Entity::Borrowing, borrow_id))?
        };
        requester.ensure_access(&current)?;
        self.check_renewable(&current)?;

        let reserved = self
            .reservations
            .has_active_reservation(current.book_id, current.member_id)
            .await?;

        let mut tx = self.store.begin().await?;
        let mut borrowing = self.locked_borrowing(tx.as_mut(), borrow_id).await?;
        self.check_renewable(&borrowing)?;
        if reserved {
            return Err(reject("renew", RejectReason::BookReserved));
        }
        if borrowing.is_overdue(today) {
            return Err(reject("renew", RejectReason::CannotRenewOverdue));
        }

        borrowing.due_date += Duration::days(i64::from(self.policy.renewal_period_days));
        borrowing.renewal_count += 1;

        let borrowing = tx.update_borrowing(&borrowing).await?;
        tx.commit().await?;

        tracing::info!(
            borrow_id,
            renewal_count = borrowing.renewal_count,
            due_date = %borrowing.due_date,
            "Loan renewed"
        );
        Ok(borrowing)
    }

    /// Pay all or part of the fine recorded on a borrowing
    pub async fn pay_fine(
        &self,
        borrow_id: i32,
        amount: Decimal,
        requester: Requester,
    ) -> AppResult<Borrowing> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        if amount.normalize().scale() > 2 {
            return Err(AppError::Validation(
                "Payment amount cannot have more than two decimal places".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let mut borrowing = self.locked_borrowing(tx.as_mut(), borrow_id).await?;
        requester.ensure_access(&borrowing)?;

        if amount > borrowing.fine_amount {
            return Err(reject("pay_fine", RejectReason::AmountExceedsFine));
        }
        borrowing.fine_amount -= amount;

        let borrowing = tx.update_borrowing(&borrowing).await?;
        tx.commit().await?;

        tracing::info!(
            borrow_id,
            paid = %amount,
            remaining = %borrowing.fine_amount,
            "Fine payment recorded"
        );
        Ok(borrowing)
    }

    pub async fn get(&self, borrow_id: i32, requester: Requester) -> AppResult<BorrowingView> {
        let mut tx = self.store.begin().await?;
        let borrowing = tx
            .get_borrowing(borrow_id, Lock::Plain)
            .await?
            .ok_or(AppError::NotFound(Entity::Borrowing, borrow_id))?;
        requester.ensure_access(&borrowing)?;
        Ok(BorrowingView::new(borrowing, self.clock.today()))
    }

    /// Borrowings matching the query, newest first. Members only ever see their own.
    pub async fn list(
        &self,
        query: BorrowingQuery,
        requester: Requester,
    ) -> AppResult<PaginatedResponse<BorrowingView>> {
        let page = Page::new(query.page, query.limit)?;
        let today = self.clock.today();

        let member_id = match requester {
            Requester::Staff => query.member_id,
            Requester::Member(id) => {
                if query.member_id.is_some_and(|m| m != id) {
                    return Err(AppError::Authorization(
                        "Members may only list their own borrowings".to_string(),
                    ));
                }
                Some(id)
            }
        };
        let filter = BorrowingFilter {
            status: query.status,
            member_id,
            book_id: query.book_id,
            overdue_as_of: query.overdue.filter(|o| *o).map(|_| today),
        };

        let mut tx = self.store.begin().await?;
        let (rows, total) = tx
            .list_borrowings(&filter, BorrowingOrder::Newest, page)
            .await?;
        let items = rows
            .into_iter()
            .map(|b| BorrowingView::new(b, today))
            .collect();

        Ok(PaginatedResponse::new(items, total, page))
    }

    /// Issued loans past due, oldest due date first, with the fine each would incur today
    pub async fn overdue(&self, page: Page) -> AppResult<PaginatedResponse<OverdueLoan>> {
        let today = self.clock.today();
        let filter = BorrowingFilter {
            overdue_as_of: Some(today),
            ..Default::default()
        };

        let mut tx = self.store.begin().await?;
        let (rows, total) = tx
            .list_borrowings(&filter, BorrowingOrder::DueFirst, page)
            .await?;
        let items = rows
            .into_iter()
            .map(|borrowing| {
                let days_overdue = borrowing.days_late(today);
                OverdueLoan {
                    accrued_fine: borrowing.fine_amount + self.fines.compute(days_overdue),
                    days_overdue,
                    borrowing,
                }
            })
            .collect();

        Ok(PaginatedResponse::new(items, total, page))
    }

    /// Issued loans of a member, earliest due first
    pub async fn member_loans(&self, member_id: i32) -> AppResult<Vec<BorrowingView>> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;
        tx.get_member(member_id, Lock::Plain)
            .await?
            .ok_or(AppError::NotFound(Entity::Member, member_id))?;

        let loans = tx.open_loans_for_member(member_id).await?;
        Ok(loans
            .into_iter()
            .map(|b| BorrowingView::new(b, today))
            .collect())
    }

    /// The issued loan for a (member, book) pair, used to de-duplicate retried issues
    pub async fn find_open_loan(&self, member_id: i32, book_id: i32) -> AppResult<Option<Borrowing>> {
        let mut tx = self.store.begin().await?;
        let loan = tx.open_loan(member_id, book_id).await?;
        Ok(loan)
    }

    fn check_renewable(&self, borrowing: &Borrowing) -> AppResult<()> {
        if !borrowing.is_issued() {
            return Err(reject("renew", RejectReason::NotIssued));
        }
        if borrowing.renewal_count >= self.policy.max_renewals as i32 {
            return Err(reject("renew", RejectReason::RenewalLimitExceeded));
        }
        Ok(())
    }

    async fn locked_borrowing(
        &self,
        tx: &mut dyn Transaction,
        borrow_id: i32,
    ) -> AppResult<Borrowing> {
        tx.get_borrowing(borrow_id, Lock::ForUpdate)
            .await?
            .ok_or(AppError::NotFound(Entity::Borrowing, borrow_id))
    }
}
