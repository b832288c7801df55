//! Request types for auth and admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct CreateUserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// `"true"` or `"on"` (checkbox) grant the admin flag.
    #[serde(default, rename = "isAdmin")]
    pub is_admin: Option<String>,
}

impl CreateUserForm {
    #[must_use]
    pub fn wants_admin(&self) -> bool {
        matches!(self.is_admin.as_deref(), Some("true" | "on"))
    }
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub username: Option<String>,
}
