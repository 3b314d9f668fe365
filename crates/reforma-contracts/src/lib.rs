pub mod chat;
pub mod events;
pub mod report;
pub mod rooms;
