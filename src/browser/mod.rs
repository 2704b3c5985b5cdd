//! Chrome session management and the CDP-backed page capabilities

pub mod config;
pub mod page;
pub mod scripts;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use page::CdpPage;
pub use session::BrowserSession;
