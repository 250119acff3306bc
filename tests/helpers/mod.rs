pub mod like_helpers;
pub mod test_with_server;
