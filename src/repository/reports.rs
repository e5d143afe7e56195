//! Report aggregation, computed by the store

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::{
    error::AppResult,
    models::{
        report::{
            Availability, CategoryCount, FineBreakdown, FineRecord, FineStatus, InventoryItem,
            InventoryQuery, InventorySummary, LibraryStats, MemberActivity, MonthlyCount,
            OverdueItem, PopularBook, StatusCount,
        },
        MemberStatus, Page,
    },
};

use super::postgres::PgStore;

/// Read-only aggregates over the whole library
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Dashboard figures. `borrowing_trends` holds only the months with loans issued on or after
    /// `trend_start`, oldest first.
    async fn library_stats(&self, today: NaiveDate, trend_start: NaiveDate) -> AppResult<LibraryStats>;

    /// Books by loans issued since `since` (all time when `None`), most borrowed first
    async fn popular_books(
        &self,
        since: Option<NaiveDate>,
        page: Page,
    ) -> AppResult<(Vec<PopularBook>, i64)>;

    /// Members by loans issued since `since`, most active first
    async fn member_activity(
        &self,
        since: Option<NaiveDate>,
        status: Option<MemberStatus>,
        page: Page,
    ) -> AppResult<(Vec<MemberActivity>, i64)>;

    /// Issued loans past due, longest overdue first. `accrued_fine` carries the fine already
    /// recorded on the loan.
    async fn overdue_loans(&self, today: NaiveDate, page: Page) -> AppResult<(Vec<OverdueItem>, i64)>;

    /// Fined returns since `since`, most recent return first
    async fn fine_records(
        &self,
        since: Option<NaiveDate>,
        status: FineStatus,
        page: Page,
    ) -> AppResult<(Vec<FineRecord>, i64)>;

    /// Stock per title ordered by title, with totals over every matching title
    async fn inventory(
        &self,
        query: &InventoryQuery,
        page: Page,
    ) -> AppResult<(Vec<InventoryItem>, InventorySummary)>;

    /// A member's borrowings with an unpaid fine, earliest due first
    async fn fine_breakdown(&self, member_id: i32) -> AppResult<Vec<FineBreakdown>>;
}

fn push_fine_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    since: Option<NaiveDate>,
    status: FineStatus,
) {
    qb.push(" WHERE b.return_date IS NOT NULL AND b.assessed_fine > 0");
    if let Some(since) = since {
        qb.push(" AND b.return_date >= ").push_bind(since);
    }
    match status {
        FineStatus::Paid => {
            qb.push(" AND b.fine_amount = 0");
        }
        FineStatus::Unpaid => {
            qb.push(" AND b.fine_amount > 0");
        }
        FineStatus::All => {}
    }
}

fn push_inventory_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &InventoryQuery) {
    qb.push(" WHERE 1=1");
    if let Some(ref category) = query.category {
        qb.push(" AND UPPER(category) = ")
            .push_bind(category.to_uppercase());
    }
    match query.availability.unwrap_or_default() {
        Availability::Available => {
            qb.push(" AND available_copies > 0");
        }
        Availability::Unavailable => {
            qb.push(" AND available_copies = 0");
        }
        Availability::All => {}
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn library_stats(&self, today: NaiveDate, trend_start: NaiveDate) -> AppResult<LibraryStats> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let books = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_books,
                COALESCE(SUM(total_copies), 0)::bigint AS total_copies,
                COALESCE(SUM(available_copies), 0)::bigint AS available_copies
            FROM books
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let members = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_members,
                COUNT(*) FILTER (WHERE status = 'ACTIVE') AS active_members
            FROM members
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let loans = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'ISSUED') AS active_loans,
                COUNT(*) FILTER (WHERE status = 'ISSUED' AND due_date < $1) AS overdue_loans,
                COALESCE(SUM(fine_amount), 0) AS outstanding_fines
            FROM borrowings
            "#,
        )
        .bind(today)
        .fetch_one(&mut *tx)
        .await?;

        let category_distribution = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS book_count,
                   COALESCE(SUM(total_copies), 0)::bigint AS total_copies
            FROM books
            GROUP BY category
            ORDER BY book_count DESC, category NULLS FIRST
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let member_status_distribution = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT s.status, COUNT(m.id) AS member_count
            FROM (VALUES ('ACTIVE'), ('SUSPENDED')) AS s (status)
            LEFT JOIN members m ON m.status = s.status
            GROUP BY s.status
            ORDER BY s.status
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let borrowing_trends = sqlx::query_as::<_, MonthlyCount>(
            r#"
            SELECT to_char(issue_date, 'YYYY-MM') AS month, COUNT(*) AS borrowings
            FROM borrowings
            WHERE issue_date >= $1
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(trend_start)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LibraryStats {
            total_books: books.try_get("total_books")?,
            total_copies: books.try_get("total_copies")?,
            available_copies: books.try_get("available_copies")?,
            total_members: members.try_get("total_members")?,
            active_members: members.try_get("active_members")?,
            active_loans: loans.try_get("active_loans")?,
            overdue_loans: loans.try_get("overdue_loans")?,
            outstanding_fines: loans.try_get("outstanding_fines")?,
            category_distribution,
            member_status_distribution,
            borrowing_trends,
        })
    }

    async fn popular_books(
        &self,
        since: Option<NaiveDate>,
        page: Page,
    ) -> AppResult<(Vec<PopularBook>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT book_id) FROM borrowings WHERE $1::date IS NULL OR issue_date >= $1",
        )
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        let books = sqlx::query_as::<_, PopularBook>(
            r#"
            SELECT bk.id AS book_id, bk.title, bk.author, bk.isbn, bk.category,
                   COUNT(b.id) AS borrow_count
            FROM borrowings b
            JOIN books bk ON bk.id = b.book_id
            WHERE $1::date IS NULL OR b.issue_date >= $1
            GROUP BY bk.id
            ORDER BY borrow_count DESC, bk.title, bk.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(since)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok((books, total))
    }

    async fn member_activity(
        &self,
        since: Option<NaiveDate>,
        status: Option<MemberStatus>,
        page: Page,
    ) -> AppResult<(Vec<MemberActivity>, i64)> {
        let status = status.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE $1::text IS NULL OR status = $1")
                .bind(status)
                .fetch_one(self.pool())
                .await?;

        let members = sqlx::query_as::<_, MemberActivity>(
            r#"
            SELECT m.id AS member_id, m.full_name, m.email, m.status, m.join_date,
                   COUNT(b.id) FILTER (WHERE $1::date IS NULL OR b.issue_date >= $1) AS total_borrows,
                   COUNT(b.id) FILTER (WHERE b.status = 'ISSUED') AS active_loans,
                   COALESCE(SUM(b.fine_amount)
                       FILTER (WHERE $1::date IS NULL OR b.issue_date >= $1), 0) AS total_fines,
                   MAX(b.issue_date) AS last_borrow_date
            FROM members m
            LEFT JOIN borrowings b ON b.member_id = m.id
            WHERE $2::text IS NULL OR m.status = $2
            GROUP BY m.id
            ORDER BY total_borrows DESC, m.full_name, m.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(since)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok((members, total))
    }

    async fn overdue_loans(&self, today: NaiveDate, page: Page) -> AppResult<(Vec<OverdueItem>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE status = 'ISSUED' AND due_date < $1",
        )
        .bind(today)
        .fetch_one(self.pool())
        .await?;

        let loans = sqlx::query_as::<_, OverdueItem>(
            r#"
            SELECT b.id AS borrow_id,
                   m.id AS member_id, m.full_name AS member_name,
                   m.email AS member_email, m.phone AS member_phone,
                   bk.id AS book_id, bk.title AS book_title, bk.author AS book_author,
                   b.issue_date, b.due_date,
                   ($1::date - b.due_date)::bigint AS days_overdue,
                   b.fine_amount AS accrued_fine
            FROM borrowings b
            JOIN members m ON m.id = b.member_id
            JOIN books bk ON bk.id = b.book_id
            WHERE b.status = 'ISSUED' AND b.due_date < $1
            ORDER BY b.due_date, b.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(today)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok((loans, total))
    }

    async fn fine_records(
        &self,
        since: Option<NaiveDate>,
        status: FineStatus,
        page: Page,
    ) -> AppResult<(Vec<FineRecord>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM borrowings b");
        push_fine_filters(&mut count_qb, since, status);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT b.id AS borrow_id, m.id AS member_id, m.full_name AS member_name,
                   bk.id AS book_id, bk.title AS book_title,
                   b.issue_date, b.due_date, b.return_date,
                   b.assessed_fine, b.fine_amount, (b.fine_amount = 0) AS paid
            FROM borrowings b
            JOIN members m ON m.id = b.member_id
            JOIN books bk ON bk.id = b.book_id
            "#,
        );
        push_fine_filters(&mut qb, since, status);
        qb.push(" ORDER BY b.return_date DESC, b.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let records = qb
            .build_query_as::<FineRecord>()
            .fetch_all(self.pool())
            .await?;

        Ok((records, total))
    }

    async fn inventory(
        &self,
        query: &InventoryQuery,
        page: Page,
    ) -> AppResult<(Vec<InventoryItem>, InventorySummary)> {
        let mut summary_qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COUNT(*) AS total_titles,
                COALESCE(SUM(total_copies), 0)::bigint AS total_copies,
                COALESCE(SUM(available_copies), 0)::bigint AS available_copies,
                COALESCE(SUM(total_copies - available_copies), 0)::bigint AS issued_copies,
                COUNT(*) FILTER (WHERE available_copies = 0) AS out_of_stock
            FROM books
            "#,
        );
        push_inventory_filters(&mut summary_qb, query);
        let summary = summary_qb
            .build_query_as::<InventorySummary>()
            .fetch_one(self.pool())
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id AS book_id, title, author, isbn, category, publication_year,
                   total_copies, available_copies,
                   total_copies - available_copies AS issued_copies,
                   ROUND(available_copies * 100.0 / total_copies, 2) AS availability_percentage
            FROM books
            "#,
        );
        push_inventory_filters(&mut qb, query);
        qb.push(" ORDER BY title, id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = qb
            .build_query_as::<InventoryItem>()
            .fetch_all(self.pool())
            .await?;

        Ok((items, summary))
    }

    async fn fine_breakdown(&self, member_id: i32) -> AppResult<Vec<FineBreakdown>> {
        let rows = sqlx::query_as::<_, FineBreakdown>(
            r#"
            SELECT b.id AS borrow_id, b.book_id,
                   bk.title AS book_title, bk.author AS book_author,
                   b.issue_date, b.due_date, b.return_date, b.fine_amount, b.status
            FROM borrowings b
            JOIN books bk ON bk.id = b.book_id
            WHERE b.member_id = $1 AND b.fine_amount > 0
            ORDER BY b.due_date, b.id
            "#,
        )
        .bind(member_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
