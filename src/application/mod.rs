pub mod quota;
pub mod scan;
pub mod subscriptions;

pub use quota::*;
pub use scan::*;
pub use subscriptions::*;
