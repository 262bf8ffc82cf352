pub mod derive;

pub use derive::*;
