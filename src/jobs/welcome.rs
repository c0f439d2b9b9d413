/// Welcome job processing: resolve the user and emit a welcome
/// notification. Single-step, same terminal failure semantics as the
/// thumbnail pipeline.
use crate::db::users::UserStore;
use crate::jobs::JobError;
use crate::notify::Notifier;
use serde::{Deserialize, Serialize};

pub const QUEUE_NAME: &str = "user-welcome-worker";

/// Wire payload `{userId}`, optional for the same reason as the
/// thumbnail payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeJob {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn process(
    users: &UserStore,
    notifier: &Notifier,
    job: &WelcomeJob,
) -> Result<(), JobError> {
    let user_id = job
        .user_id
        .as_deref()
        .ok_or_else(|| JobError::new("Missing userId"))?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| JobError::new("User not found"))?;

    notifier.send_welcome(&user).await?;
    Ok(())
}
