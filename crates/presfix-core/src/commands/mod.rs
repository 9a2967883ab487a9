pub mod fix;
pub mod restore;
