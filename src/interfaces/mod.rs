pub mod distributed_lock;
pub mod repositories;
