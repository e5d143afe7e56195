//! Member administration

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    clock::Clock,
    error::{AppError, AppResult, Entity, RejectReason},
    models::{
        member::{MemberDetails, MemberRequest, MemberStats},
        Member, MemberQuery, MemberStatus, NewMember, Page, PaginatedResponse,
    },
    repository::{BorrowingStore, Lock, MemberStore, Store, Transaction},
};

#[derive(Clone)]
pub struct MembersService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl MembersService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a new, active member joining today
    pub async fn create(&self, request: MemberRequest) -> AppResult<Member> {
        request.check()?;
        let email = request.normalized_email();

        let mut tx = self.store.begin().await?;
        if let Some(ref email) = email {
            if tx.email_exists(email, None).await? {
                return Err(AppError::Conflict(
                    "Member with this email already exists".to_string(),
                ));
            }
        }
        let member = tx
            .insert_member(&NewMember {
                full_name: request.full_name.trim().to_string(),
                email,
                phone: request.phone.clone(),
                join_date: self.clock.today(),
            })
            .await?;
        tx.commit().await?;

        tracing::info!(member_id = member.id, "Member registered");
        Ok(member)
    }

    pub async fn get(&self, id: i32) -> AppResult<MemberDetails> {
        let mut tx = self.store.begin().await?;
        let member = existing(tx.as_mut(), id, Lock::Plain).await?;
        let active_loans = tx.open_loans_for_member(id).await?.len() as i64;
        let outstanding_fines = tx.outstanding_fines(id).await?;

        Ok(MemberDetails {
            member,
            active_loans,
            outstanding_fines,
        })
    }

    pub async fn list(&self, query: MemberQuery) -> AppResult<PaginatedResponse<Member>> {
        let page = Page::new(query.page, query.limit)?;
        let mut tx = self.store.begin().await?;
        let (members, total) = tx.list_members(&query, page).await?;
        Ok(PaginatedResponse::new(members, total, page))
    }

    /// Replace contact details; status is changed only through suspend/activate
    pub async fn update(&self, id: i32, request: MemberRequest) -> AppResult<Member> {
        request.check()?;
        let email = request.normalized_email();

        let mut tx = self.store.begin().await?;
        let member = existing(tx.as_mut(), id, Lock::ForUpdate).await?;

        if let Some(ref email) = email {
            if tx.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(
                    "Member with this email already exists".to_string(),
                ));
            }
        }

        let updated = Member {
            full_name: request.full_name.trim().to_string(),
            email,
            phone: request.phone.clone(),
            ..member
        };
        let member = tx.update_member(&updated).await?;
        tx.commit().await?;

        tracing::info!(member_id = id, "Member updated");
        Ok(member)
    }

    /// Block new loans. Returns and fine payments stay possible.
    pub async fn suspend(&self, id: i32) -> AppResult<Member> {
        self.set_status(id, MemberStatus::Suspended).await
    }

    pub async fn activate(&self, id: i32) -> AppResult<Member> {
        self.set_status(id, MemberStatus::Active).await
    }

    async fn set_status(&self, id: i32, status: MemberStatus) -> AppResult<Member> {
        let mut tx = self.store.begin().await?;
        let member = existing(tx.as_mut(), id, Lock::ForUpdate).await?;
        if member.status == status {
            return Ok(member);
        }

        let member = tx.update_member(&Member { status, ..member }).await?;
        tx.commit().await?;

        tracing::info!(member_id = id, status = %status, "Member status changed");
        Ok(member)
    }

    /// Remove a member with no open loans and no unpaid fines, along with their history
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        existing(tx.as_mut(), id, Lock::ForUpdate).await?;

        if !tx.open_loans_for_member(id).await?.is_empty() {
            return Err(AppError::Rejected(RejectReason::MemberHasOpenLoans));
        }
        if tx.outstanding_fines(id).await? > Decimal::ZERO {
            return Err(AppError::Rejected(RejectReason::MemberHasOutstandingFines));
        }
        tx.delete_member(id).await?;
        tx.commit().await?;

        tracing::info!(member_id = id, "Member deleted");
        Ok(())
    }

    pub async fn stats(&self, id: i32) -> AppResult<MemberStats> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;
        existing(tx.as_mut(), id, Lock::Plain).await?;

        let open_loans = tx.open_loans_for_member(id).await?;
        let overdue_books = open_loans.iter().filter(|b| b.is_overdue(today)).count() as i64;

        Ok(MemberStats {
            active_loans: open_loans.len() as i64,
            total_borrows: tx.count_member_borrowings(id).await?,
            outstanding_fines: tx.outstanding_fines(id).await?,
            overdue_books,
        })
    }
}

async fn existing(tx: &mut dyn Transaction, id: i32, lock: Lock) -> AppResult<Member> {
    tx.get_member(id, lock)
        .await?
        .ok_or(AppError::NotFound(Entity::Member, id))
}
