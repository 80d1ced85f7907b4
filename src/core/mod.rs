pub mod browser;
pub mod config;
pub mod session;

pub use browser::BrowserTrait;
pub use config::Config;
pub use session::{AuthState, CookieData, Credentials, SessionToken};
