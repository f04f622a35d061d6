pub mod accounts;
pub mod dashboard;
pub mod moderation;
pub mod posts;
