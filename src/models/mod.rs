pub mod ability;
pub mod character;
pub mod combat;
pub mod equipment;
pub mod faction;
pub mod matchmaking;
pub mod user;

pub use ability::*;
pub use character::*;
pub use combat::*;
pub use equipment::*;
pub use faction::*;
pub use matchmaking::*;
pub use user::*;
