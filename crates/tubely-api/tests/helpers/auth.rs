use chrono::Duration;
use tubely_api::auth::issue_access_token;
use uuid::Uuid;

use super::TEST_JWT_SECRET;

/// A valid access token for `user_id`.
pub fn token_for(user_id: Uuid) -> String {
    issue_access_token(user_id, TEST_JWT_SECRET, Duration::hours(1))
        .expect("Failed to issue test token")
}

pub fn bearer(user_id: Uuid) -> String {
    format!("Bearer {}", token_for(user_id))
}
