//! Type definitions for siteform storage.

mod companies;
mod ids;
mod invitations;
mod projects;
mod roles;
mod site_team;
mod status;
mod users;

pub use companies::*;
pub use ids::*;
pub use invitations::*;
pub use projects::*;
pub use roles::*;
pub use site_team::*;
pub use status::*;
pub use users::*;
