pub mod group;
pub mod group_member;
pub mod user;
