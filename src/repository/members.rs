//! Member persistence

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{Member, MemberQuery, NewMember, Page},
};

use super::{
    postgres::{constraint_error, like_pattern, PgTransaction},
    Lock,
};

#[async_trait]
pub trait MemberStore: Send {
    async fn get_member(&mut self, id: i32, lock: Lock) -> AppResult<Option<Member>>;

    /// Matching members ordered by name, with the total match count
    async fn list_members(&mut self, query: &MemberQuery, page: Page) -> AppResult<(Vec<Member>, i64)>;

    /// Case-insensitive email lookup
    async fn email_exists(&mut self, email: &str, exclude_id: Option<i32>) -> AppResult<bool>;

    /// Insert as an active member
    async fn insert_member(&mut self, member: &NewMember) -> AppResult<Member>;

    /// Overwrite contact details and status
    async fn update_member(&mut self, member: &Member) -> AppResult<Member>;

    /// Delete the member and, by cascade, their borrowing history
    async fn delete_member(&mut self, id: i32) -> AppResult<()>;
}

fn push_member_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &MemberQuery) {
    if let Some(ref search) = query.search {
        let pattern = like_pattern(search);
        qb.push(" AND (UPPER(full_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR UPPER(email) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl MemberStore for PgTransaction {
    async fn get_member(&mut self, id: i32, lock: Lock) -> AppResult<Option<Member>> {
        let sql = match lock {
            Lock::Plain => "SELECT * FROM members WHERE id = $1",
            Lock::ForUpdate => "SELECT * FROM members WHERE id = $1 FOR UPDATE",
        };
        let member = sqlx::query_as::<_, Member>(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(member)
    }

    async fn list_members(&mut self, query: &MemberQuery, page: Page) -> AppResult<(Vec<Member>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM members WHERE 1=1");
        push_member_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM members WHERE 1=1");
        push_member_filters(&mut qb, query);
        qb.push(" ORDER BY full_name, id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let members = qb
            .build_query_as::<Member>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok((members, total))
    }

    async fn email_exists(&mut self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM members
                WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_member(&mut self, member: &NewMember) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (full_name, email, phone, status, join_date)
            VALUES ($1, $2, $3, 'ACTIVE', $4)
            RETURNING *
            "#,
        )
        .bind(&member.full_name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.join_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(constraint_error)
    }

    async fn update_member(&mut self, member: &Member) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET full_name = $1, email = $2, phone = $3, status = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&member.full_name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.status)
        .bind(member.id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(constraint_error)
    }

    async fn delete_member(&mut self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
