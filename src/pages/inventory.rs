use super::{click, text_if_present};
use crate::browser::{ChromeDriver, Locator};
use crate::error::Result;

const ADD_BACKPACK_BUTTON: Locator = Locator::Id("add-to-cart-sauce-labs-backpack");
const BASKET_COUNT: Locator = Locator::Id("basket-count");

/// The product catalogue shown after a successful sign-in
pub struct InventoryPage<'a> {
    driver: &'a ChromeDriver,
}

impl<'a> InventoryPage<'a> {
    pub fn new(driver: &'a ChromeDriver) -> Self {
        Self { driver }
    }

    /// Add the backpack to the basket
    pub async fn add_item_to_basket(&self) -> Result<()> {
        click(self.driver, &ADD_BACKPACK_BUTTON).await
    }

    /// Number shown on the basket badge
    ///
    /// An absent badge or unparsable text counts as 0. Only session failures
    /// are returned as errors.
    pub async fn basket_count(&self) -> Result<u32> {
        let text = text_if_present(self.driver, &BASKET_COUNT).await?;
        Ok(parse_basket_count(text.as_deref()))
    }
}

/// Interpret basket badge text, falling back to 0
pub fn parse_basket_count(text: Option<&str>) -> u32 {
    text.and_then(|t| t.trim().parse().ok()).unwrap_or(0)
}
