use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::auth::UserResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserResponse,
    pub roles: Vec<String>,
}
