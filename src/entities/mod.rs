pub mod prelude;

pub mod admins;
pub mod blogs;
pub mod users;
