mod context;
mod error;
mod fetch;
mod session;


pub use context::ViewerContext;
pub use error::{AppError, Result};
pub use fetch::fetch_channel_stats;
pub use session::ViewerSession;
