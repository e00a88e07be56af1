//! Services - compositions of ports that implement each page's logic.

mod account;
mod blog;

pub use account::AccountService;
pub use blog::{BlogService, CreateOutcome, EditOutcome, GroupFeed, PostCard, PostDetail, ProfileFeed};
