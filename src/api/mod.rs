pub mod auth;
pub mod dto;
pub mod handlers;
pub mod router;
