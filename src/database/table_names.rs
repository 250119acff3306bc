pub const USER_TABLE_NAME: &'static str = "local_user";
pub const FAIRYTALE_TABLE_NAME: &'static str = "fairytale";
pub const LIKE_TABLE_NAME: &'static str = "likes";
