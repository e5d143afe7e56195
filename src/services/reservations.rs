//! Reservation (hold) lookup used by renewals

use async_trait::async_trait;

use crate::error::AppResult;

/// Source of truth for outstanding holds on books
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationDirectory: Send + Sync {
    /// Whether someone other than `excluding_member_id` holds an active reservation on the book
    async fn has_active_reservation(&self, book_id: i32, excluding_member_id: i32) -> AppResult<bool>;
}

/// Directory for deployments without a hold system
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReservations;

#[async_trait]
impl ReservationDirectory for NoReservations {
    async fn has_active_reservation(&self, _book_id: i32, _excluding_member_id: i32) -> AppResult<bool> {
        Ok(false)
    }
}
