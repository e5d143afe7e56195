//! Read-only reporting; the store does the aggregation

use std::{collections::HashMap, sync::Arc};

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    clock::Clock,
    error::{AppError, AppResult, Entity},
    models::{
        report::{
            ActivityQuery, FineQuery, FineRecord, InventoryQuery, InventoryReport, LibraryStats,
            MemberActivity, MemberFines, MonthlyCount, OverdueItem, PageQuery, PeriodQuery,
            PopularBook,
        },
        Page, PaginatedResponse,
    },
    repository::{Lock, MemberStore, ReportStore, Store},
};

use super::fines::FinePolicy;

/// Months covered by the borrowing trend
const TREND_MONTHS: u32 = 12;

#[derive(Clone)]
pub struct ReportsService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    fines: FinePolicy,
}

impl ReportsService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, fines: FinePolicy) -> Self {
        Self {
            store,
            clock,
            fines,
        }
    }

    pub async fn stats(&self) -> AppResult<LibraryStats> {
        let today = self.clock.today();
        let mut stats = self.store.library_stats(today, trend_start(today)).await?;
        stats.borrowing_trends = fill_trend(std::mem::take(&mut stats.borrowing_trends), today);
        Ok(stats)
    }

    /// Books ranked by number of loans issued in the period
    pub async fn popular_books(&self, query: PeriodQuery) -> AppResult<PaginatedResponse<PopularBook>> {
        let page = Page::new(query.page, query.limit)?;
        let since = query.period.start(self.clock.today());
        let (rows, total) = self.store.popular_books(since, page).await?;
        Ok(PaginatedResponse::new(rows, total, page))
    }

    /// Per-member borrowing activity in the period, most active first
    pub async fn member_activity(
        &self,
        query: ActivityQuery,
    ) -> AppResult<PaginatedResponse<MemberActivity>> {
        let page = Page::new(query.page, query.limit)?;
        let since = query.period.start(self.clock.today());
        let (rows, total) = self.store.member_activity(since, query.status, page).await?;
        Ok(PaginatedResponse::new(rows, total, page))
    }

    /// Overdue loans with contact details, longest overdue first
    pub async fn overdue(&self, query: PageQuery) -> AppResult<PaginatedResponse<OverdueItem>> {
        let page = Page::new(query.page, query.limit)?;
        let (mut rows, total) = self.store.overdue_loans(self.clock.today(), page).await?;
        for row in &mut rows {
            row.accrued_fine += self.fines.compute(row.days_overdue);
        }
        Ok(PaginatedResponse::new(rows, total, page))
    }

    /// Fines charged on returned books in the period, most recent return first
    pub async fn fines(&self, query: FineQuery) -> AppResult<PaginatedResponse<FineRecord>> {
        let page = Page::new(query.page, query.limit)?;
        let since = query.period.start(self.clock.today());
        let (rows, total) = self
            .store
            .fine_records(since, query.status.unwrap_or_default(), page)
            .await?;
        Ok(PaginatedResponse::new(rows, total, page))
    }

    /// Stock per title with totals over the filtered catalog
    pub async fn inventory(&self, query: InventoryQuery) -> AppResult<InventoryReport> {
        let page = Page::new(query.page, query.limit)?;
        let (inventory, summary) = self.store.inventory(&query, page).await?;
        let total = summary.total_titles;

        Ok(InventoryReport {
            summary,
            inventory,
            total,
            page: page.page,
            per_page: page.limit,
            total_pages: (total + page.limit - 1) / page.limit,
        })
    }

    /// Unpaid fines of one member, earliest due first
    pub async fn member_fines(&self, member_id: i32) -> AppResult<MemberFines> {
        let member = {
            let mut tx = self.store.begin().await?;
            tx.get_member(member_id, Lock::Plain)
                .await?
                .ok_or(AppError::NotFound(Entity::Member, member_id))?
        };

        let fine_breakdown = self.store.fine_breakdown(member_id).await?;
        let outstanding_fines: Decimal = fine_breakdown.iter().map(|f| f.fine_amount).sum();

        Ok(MemberFines {
            member,
            outstanding_fines,
            fine_breakdown,
        })
    }
}

/// First day of the oldest month in the trend
fn trend_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(TREND_MONTHS - 1))
        .and_then(|d| d.with_day(1))
        .unwrap_or(NaiveDate::MIN)
}

/// Loans issued per calendar month, oldest month first, zero-filled
fn fill_trend(months: Vec<MonthlyCount>, today: NaiveDate) -> Vec<MonthlyCount> {
    let counts: HashMap<String, i64> = months
        .into_iter()
        .map(|m| (m.month, m.borrowings))
        .collect();

    (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| today.checked_sub_months(Months::new(back)))
        .map(|month| {
            let key = month.format("%Y-%m").to_string();
            MonthlyCount {
                borrowings: counts.get(&key).copied().unwrap_or(0),
                month: key,
            }
        })
        .collect()
}
