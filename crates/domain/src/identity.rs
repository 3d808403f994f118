use derive_new::new;
use serde::{Deserialize, Serialize};

/// Authenticated user an operation runs for.
///
/// Resolved once by the caller and passed in explicitly. Every row written is
/// stamped with `user_id` and every read is filtered by it.
#[derive(new, Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct Identity {
    #[new(into)]
    pub user_id: String,
}

impl Identity {
    pub fn owns(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
