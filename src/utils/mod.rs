pub mod javascript;
pub mod screenshot;

pub use javascript::{JavaScriptRunner, ProbeCall};
pub use screenshot::ScreenshotManager;
