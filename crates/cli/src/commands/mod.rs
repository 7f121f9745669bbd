pub mod chat;
pub mod onboard;
pub mod prompt;
pub mod serve;
