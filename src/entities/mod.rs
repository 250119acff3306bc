pub mod fairytale;
pub mod like;
pub mod user;
