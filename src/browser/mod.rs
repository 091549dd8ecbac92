pub mod chrome;
pub mod locator;

pub use chrome::{ChromeDriver, ConnectionMode};
pub use locator::Locator;
