pub mod validation;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountService, AccountUpdate, NewAccount};
pub use account_service_impl::SeaOrmAccountService;

pub mod blog_service;
pub mod blog_service_impl;
pub use blog_service::{BlogInput, BlogService};
pub use blog_service_impl::SeaOrmBlogService;
