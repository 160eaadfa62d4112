pub mod captain;
pub mod ride;
pub mod user;
