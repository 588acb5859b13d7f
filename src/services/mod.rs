// Resource services built on the authenticated client

mod applications;
mod users;

pub use applications::ApplicationsService;
pub use users::UsersService;
