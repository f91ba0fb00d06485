//! Auth token entity <-> model mapper

use yishan_core::entities::{AuthToken, TokenStats};

use crate::models::{AuthTokenModel, TokenStatsModel};

impl From<AuthTokenModel> for AuthToken {
    fn from(model: AuthTokenModel) -> Self {
        AuthToken {
            id: model.id,
            user_id: model.user_id,
            access_token: model.access_token,
            refresh_token: model.refresh_token,
            access_expires_at: model.access_expires_at,
            refresh_expires_at: model.refresh_expires_at,
            is_revoked: model.is_revoked,
            revoked_at: model.revoked_at,
            rotated_at: model.rotated_at,
            client_ip: model.client_ip,
            user_agent: model.user_agent,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<TokenStatsModel> for TokenStats {
    fn from(model: TokenStatsModel) -> Self {
        TokenStats {
            total: model.total,
            active: model.active,
            expired: model.expired,
            revoked: model.revoked,
        }
    }
}
