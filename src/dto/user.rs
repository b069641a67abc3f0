use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::UserEntity;

/// Public projection of a demo user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
}

impl From<UserEntity> for UserView {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            age: entity.age,
        }
    }
}

/// Query string of the user delete endpoint; `id` is validated by the service.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserQuery {
    #[serde(default)]
    pub id: Option<String>,
}
