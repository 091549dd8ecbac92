//! Page objects for the storefront.
//!
//! Each page borrows the session's [`ChromeDriver`] and resolves its locators on
//! every call, so a page object can never outlive the browser it drives.

pub mod home;
pub mod inventory;

pub use home::HomePage;
pub use inventory::{parse_basket_count, InventoryPage};

use crate::browser::{ChromeDriver, Locator};
use crate::error::Result;

/// Replace the content of an input with `value`
async fn fill(driver: &ChromeDriver, locator: &Locator, value: &str) -> Result<()> {
    let element = driver.find(locator).await?;
    element.click().await?;
    element
        .call_js_fn("function() { this.value = ''; }", false)
        .await?;
    element.type_str(value).await?;
    log::debug!("Filled {}", locator);
    Ok(())
}

async fn click(driver: &ChromeDriver, locator: &Locator) -> Result<()> {
    driver.find(locator).await?.click().await?;
    log::debug!("Clicked {}", locator);
    Ok(())
}

/// Text of the element if it is currently rendered
async fn text_if_present(driver: &ChromeDriver, locator: &Locator) -> Result<Option<String>> {
    match driver.try_find(locator).await? {
        Some(element) => Ok(element.inner_text().await?),
        None => Ok(None),
    }
}
