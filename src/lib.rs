pub mod browser;
pub mod config;
pub mod credentials;
pub mod error;
pub mod pages;
pub mod website;

// Re-export commonly used items
pub use browser::chrome::{ChromeDriver, ConnectionMode};
pub use browser::Locator;
pub use config::AppConfig;
pub use credentials::Credentials;
pub use error::{HarnessError, Result};
pub use pages::{parse_basket_count, HomePage, InventoryPage};
pub use website::Website;
