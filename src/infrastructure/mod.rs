pub mod ai;
pub mod clock;
pub mod config;
pub mod seed;
pub mod store;

pub use ai::*;
pub use clock::*;
pub use config::*;
pub use seed::*;
pub use store::*;
