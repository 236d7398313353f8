pub mod detection;
pub mod profile;
pub mod session;
pub mod status;
pub mod subscription;

pub use detection::*;
pub use profile::*;
pub use session::*;
pub use status::*;
pub use subscription::*;
