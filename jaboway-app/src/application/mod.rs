mod account;
mod admin_service;
pub mod authorization;
mod forum_service;
mod guide_service;
mod identity;
pub mod optimistic;
mod state;

pub use account::AccountService;
pub use admin_service::{AdminService, ContentOverview, ReviewQueue};
pub use forum_service::{DeleteMode, ForumService};
pub use guide_service::GuideService;
pub use identity::{GuestIdStore, IdentityResolver};
pub use state::{ClientState, SharedState};
