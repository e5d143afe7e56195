//! Caller identity carried in bearer tokens

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, services::Requester};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Librarian,
    Member,
}

/// JWT Claims for authenticated callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Member record of the caller, for member accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<i32>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization("Librarian privileges required".to_string()))
        }
    }

    /// Who circulation requests are made for. A member token without a member id may do nothing.
    pub fn requester(&self) -> Result<Requester, AppError> {
        match (self.role, self.member_id) {
            (Role::Librarian, _) => Ok(Requester::Staff),
            (Role::Member, Some(id)) => Ok(Requester::Member(id)),
            (Role::Member, None) => Err(AppError::Authorization(
                "Token is not linked to a member".to_string(),
            )),
        }
    }

    /// Librarians may see any member, members only themselves
    pub fn require_member_access(&self, member_id: i32) -> Result<(), AppError> {
        if self.requester()?.may_access(member_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Access to another member's records denied".to_string(),
            ))
        }
    }
}
