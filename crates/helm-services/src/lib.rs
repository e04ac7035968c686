mod backup;
mod reply;
mod services;

pub use backup::ImportReport;
pub use reply::{PendingReply, REPLY_DELAY, compose_reply};
pub use services::{AppServices, AppServicesBuilder, FlowSummary};
