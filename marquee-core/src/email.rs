use async_trait::async_trait;

use crate::repository::BoxError;

/// Outbound transactional email. Delivery is attempted once per call and no
/// delivery guarantee is assumed; callers decide whether a failure matters.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), BoxError>;
}
