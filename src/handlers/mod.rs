pub mod health;
pub mod posts;
pub mod users;
pub mod ws;
