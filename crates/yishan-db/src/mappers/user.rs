//! User entity <-> model mapper

use yishan_core::entities::User;
use yishan_core::error::DomainError;

use crate::models::UserModel;

/// Convert a users row to the entity. Unknown status/role strings are a data error.
impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        Ok(User {
            id: model.id,
            username: model.username,
            email: model.email,
            nickname: model.nickname,
            status: model.status.parse().map_err(DomainError::DatabaseError)?,
            role: model.role.parse().map_err(DomainError::DatabaseError)?,
            last_login_at: model.last_login_at,
            last_login_ip: model.last_login_ip,
            login_count: model.login_count,
            password_changed_at: model.password_changed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
