#[cfg(feature = "chrome")]
pub mod chrome;
pub mod navigation;
pub mod session;

#[cfg(feature = "chrome")]
pub use chrome::ChromeBrowser;
pub use navigation::{wait_until, NavigationManager, NavigationResult};
pub use session::WebSession;
