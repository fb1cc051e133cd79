pub mod bot;
pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod runtime;
pub mod sheets;
pub mod ticket_image;
pub mod utils;
