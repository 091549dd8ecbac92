//! Composition root for one scenario's browser session.

use crate::browser::ChromeDriver;
use crate::config::AppConfig;
use crate::error::Result;
use crate::pages::{HomePage, InventoryPage};

/// One driver plus the page objects that act through it
///
/// Page objects are handed out as short-lived borrows of the driver, so none
/// of them can be used after [`Website::quit`].
#[derive(Debug)]
pub struct Website {
    driver: ChromeDriver,
    config: AppConfig,
}

impl Website {
    /// Launch a browser configured from `config`
    pub async fn launch(config: &AppConfig) -> Result<Self> {
        let driver = ChromeDriver::launch(config).await?;
        Ok(Self::new(driver, config.clone()))
    }

    /// Wrap an already running driver
    pub fn new(driver: ChromeDriver, config: AppConfig) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &ChromeDriver {
        &self.driver
    }

    pub fn home_page(&self) -> HomePage<'_> {
        HomePage::new(&self.driver, &self.config.home_page_url)
    }

    pub fn inventory_page(&self) -> InventoryPage<'_> {
        InventoryPage::new(&self.driver)
    }

    /// Release the browser. Safe to call more than once; see [`ChromeDriver::quit`].
    pub async fn quit(&mut self) -> Result<bool> {
        self.driver.quit().await
    }
}
