// ==========================================
// 手术室排程系统 - 通知分发层
// ==========================================

pub mod dispatcher;

pub use dispatcher::{LogSender, Notification, NotificationDispatcher, NotificationSender};
