pub mod render;
pub mod session;

pub use render::{render_event, render_recent, render_status};
pub use session::ClientSession;
