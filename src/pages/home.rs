use super::{click, fill, text_if_present};
use crate::browser::{ChromeDriver, Locator};
use crate::credentials::Credentials;
use crate::error::Result;
use std::time::Instant;

const USER_NAME_FIELD: Locator = Locator::Id("user-name");
const PASSWORD_FIELD: Locator = Locator::Id("password");
const LOGIN_BUTTON: Locator = Locator::Id("login-button");
const ERROR_MESSAGE: Locator = Locator::Css("h3[data-test=\"error\"]");

/// The sign-in form on the storefront's landing page
pub struct HomePage<'a> {
    driver: &'a ChromeDriver,
    url: &'a str,
}

impl<'a> HomePage<'a> {
    pub fn new(driver: &'a ChromeDriver, url: &'a str) -> Self {
        Self { driver, url }
    }

    pub async fn visit(&self) -> Result<()> {
        self.driver.navigate(self.url).await
    }

    /// Overwrites whatever the field held before
    pub async fn enter_user_name(&self, value: &str) -> Result<()> {
        fill(self.driver, &USER_NAME_FIELD, value).await
    }

    /// Overwrites whatever the field held before
    pub async fn enter_password(&self, value: &str) -> Result<()> {
        fill(self.driver, &PASSWORD_FIELD, value).await
    }

    pub async fn enter_signin_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.enter_user_name(&credentials.username).await?;
        self.enter_password(&credentials.password).await
    }

    pub async fn click_login_button(&self) -> Result<()> {
        click(self.driver, &LOGIN_BUTTON).await
    }

    /// Currently displayed error text, or an empty string when none is rendered
    pub async fn check_error_message(&self) -> Result<String> {
        Ok(text_if_present(self.driver, &ERROR_MESSAGE)
            .await?
            .unwrap_or_default())
    }

    /// Like [`HomePage::check_error_message`], but gives the page up to the
    /// element timeout to render a non-empty message
    pub async fn wait_for_error_message(&self) -> Result<String> {
        let deadline = Instant::now() + self.driver.element_timeout();
        loop {
            let message = self.check_error_message().await?;
            if !message.is_empty() || Instant::now() >= deadline {
                return Ok(message);
            }
            tokio::time::sleep(self.driver.poll_interval()).await;
        }
    }
}
