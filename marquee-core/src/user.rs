use serde::{Deserialize, Serialize};

/// Mirror of an external identity record.
///
/// Created, updated and deleted only in response to identity-provider
/// lifecycle events; the favorites list is the one locally owned field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub favorites: Vec<i64>,
}
