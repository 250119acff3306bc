pub mod client;
pub mod repositories;
pub mod row_lock;
pub mod table_names;
