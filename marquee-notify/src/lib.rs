pub mod dispatch;
pub mod mailer;
pub mod templates;

pub use dispatch::{DispatchSummary, NotificationService, NotifyError};
pub use mailer::SmtpMailer;
