//! Domain entities - the core business objects.

mod actor;
mod group;
mod post;
mod user;

pub use actor::Actor;
pub use group::Group;
pub use post::Post;
pub use user::User;
