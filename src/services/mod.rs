pub mod distributed_exclusion;
pub mod exclusion;
pub mod like_service;
pub mod row_lock_exclusion;
