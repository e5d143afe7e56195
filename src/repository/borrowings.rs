//! Borrowing persistence

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{Borrowing, BorrowingFilter, BorrowingStatus, NewBorrowing, Page},
};

use super::{
    postgres::{constraint_error, PgTransaction},
    BorrowingOrder, Lock,
};

#[async_trait]
pub trait BorrowingStore: Send {
    async fn get_borrowing(&mut self, id: i32, lock: Lock) -> AppResult<Option<Borrowing>>;

    async fn list_borrowings(
        &mut self,
        filter: &BorrowingFilter,
        order: BorrowingOrder,
        page: Page,
    ) -> AppResult<(Vec<Borrowing>, i64)>;

    /// Issued borrowings of a member, earliest due first
    async fn open_loans_for_member(&mut self, member_id: i32) -> AppResult<Vec<Borrowing>>;

    /// The issued borrowing linking this member and book, if any
    async fn open_loan(&mut self, member_id: i32, book_id: i32) -> AppResult<Option<Borrowing>>;

    async fn count_open_loans_for_book(&mut self, book_id: i32) -> AppResult<i64>;

    /// Borrowings of a member in any state
    async fn count_member_borrowings(&mut self, member_id: i32) -> AppResult<i64>;

    /// Sum of unpaid fines across a member's borrowings
    async fn outstanding_fines(&mut self, member_id: i32) -> AppResult<Decimal>;

    async fn insert_borrowing(&mut self, borrowing: &NewBorrowing) -> AppResult<Borrowing>;

    /// Overwrite the mutable fields: due/return dates, fines, status, renewal count
    async fn update_borrowing(&mut self, borrowing: &Borrowing) -> AppResult<Borrowing>;
}

fn push_borrowing_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BorrowingFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(member_id) = filter.member_id {
        qb.push(" AND member_id = ").push_bind(member_id);
    }
    if let Some(book_id) = filter.book_id {
        qb.push(" AND book_id = ").push_bind(book_id);
    }
    if let Some(today) = filter.overdue_as_of {
        qb.push(" AND status = 'ISSUED' AND due_date < ").push_bind(today);
    }
}

#[async_trait]
impl BorrowingStore for PgTransaction {
    async fn get_borrowing(&mut self, id: i32, lock: Lock) -> AppResult<Option<Borrowing>> {
        let sql = match lock {
            Lock::Plain => "SELECT * FROM borrowings WHERE id = $1",
            Lock::ForUpdate => "SELECT * FROM borrowings WHERE id = $1 FOR UPDATE",
        };
        let borrowing = sqlx::query_as::<_, Borrowing>(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(borrowing)
    }

    async fn list_borrowings(
        &mut self,
        filter: &BorrowingFilter,
        order: BorrowingOrder,
        page: Page,
    ) -> AppResult<(Vec<Borrowing>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM borrowings WHERE 1=1");
        push_borrowing_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM borrowings WHERE 1=1");
        push_borrowing_filters(&mut qb, filter);
        qb.push(match order {
            BorrowingOrder::Newest => " ORDER BY issue_date DESC, id DESC",
            BorrowingOrder::DueFirst => " ORDER BY due_date ASC, id ASC",
        });
        qb.push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let borrowings = qb
            .build_query_as::<Borrowing>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok((borrowings, total))
    }

    async fn open_loans_for_member(&mut self, member_id: i32) -> AppResult<Vec<Borrowing>> {
        let loans = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT * FROM borrowings
            WHERE member_id = $1 AND status = 'ISSUED'
            ORDER BY due_date, id
            "#,
        )
        .bind(member_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(loans)
    }

    async fn open_loan(&mut self, member_id: i32, book_id: i32) -> AppResult<Option<Borrowing>> {
        let loan = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE member_id = $1 AND book_id = $2 AND status = 'ISSUED'",
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(loan)
    }

    async fn count_open_loans_for_book(&mut self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE book_id = $1 AND status = 'ISSUED'",
        )
        .bind(book_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn count_member_borrowings(&mut self, member_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE member_id = $1")
            .bind(member_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn outstanding_fines(&mut self, member_id: i32) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(fine_amount), 0) FROM borrowings WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(total)
    }

    async fn insert_borrowing(&mut self, borrowing: &NewBorrowing) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (member_id, book_id, issue_date, due_date,
                                    fine_amount, status, renewal_count)
            VALUES ($1, $2, $3, $4, 0, $5, 0)
            RETURNING *
            "#,
        )
        .bind(borrowing.member_id)
        .bind(borrowing.book_id)
        .bind(borrowing.issue_date)
        .bind(borrowing.due_date)
        .bind(BorrowingStatus::Issued)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(constraint_error)
    }

    async fn update_borrowing(&mut self, borrowing: &Borrowing) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET due_date = $1, return_date = $2, assessed_fine = $3, fine_amount = $4,
                status = $5, renewal_count = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(borrowing.due_date)
        .bind(borrowing.return_date)
        .bind(borrowing.assessed_fine)
        .bind(borrowing.fine_amount)
        .bind(borrowing.status)
        .bind(borrowing.renewal_count)
        .bind(borrowing.id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(constraint_error)
    }
}
