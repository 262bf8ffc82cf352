pub mod auth;
pub mod character;
pub mod combat;
pub mod health;
pub mod pvp;
