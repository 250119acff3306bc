pub mod fairytales;
pub mod likes;
