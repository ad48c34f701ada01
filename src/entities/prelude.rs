pub use super::admins::Entity as Admins;
pub use super::blogs::Entity as Blogs;
pub use super::users::Entity as Users;
