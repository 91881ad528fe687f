use serde::{Deserialize, Serialize};

/// Fetches a user by id.
///
/// Only users of the caller's tenant are visible.
///
/// path params:
/// - id: the id of the user
///
/// errors:
/// - NotFound: no user with that id
/// - PermissionDenied: the user belongs to another tenant,
///   or the caller lacks the `users.read` scope
#[api(auth, method = "GET", path = "/users/:id")]
pub async fn get(id: u32, params: &GetParams) -> Result<User, Error> {
    todo!()
}

/// Parameters for fetching a user.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetParams {
    /// Include the user's profile.
    pub include_profile: bool,
    /// Request correlation id.
    #[api(header)]
    pub request_id: String,
}

/// A user.
#[derive(Serialize)]
pub struct User {
    pub id: u32,
    /// Display name.
    #[serde(rename = "displayName")]
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile: Option<Profile>,
}

/// Public profile of a user.
pub struct Profile {
    /// Free-form biography.
    pub bio: String,
}

#[cfg(test)]
mod tests {
    pub struct TestOnly {
        pub value: u8,
    }

    #[api(public, method = "GET", path = "/test-only")]
    pub async fn test_only() {}
}
