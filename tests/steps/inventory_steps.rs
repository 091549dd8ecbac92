use super::StorefrontWorld;
use anyhow::{ensure, Result};
use cucumber::{given, then, when};

#[given("I am logged in as a standard user")]
async fn i_am_logged_in(world: &mut StorefrontWorld) -> Result<()> {
    let config = world.config;
    let home = world.website.home_page();

    home.visit().await?;
    home.enter_user_name(&config.user_name).await?;
    home.enter_password(&config.password).await?;
    home.click_login_button().await?;

    let url = world
        .website
        .driver()
        .wait_for_url(&config.inventory_page_url)
        .await?;
    ensure!(
        url == config.inventory_page_url,
        "login did not reach the inventory page, the browser is on {}",
        url
    );
    Ok(())
}

#[when("I add the backpack to the basket")]
async fn i_add_the_backpack(world: &mut StorefrontWorld) -> Result<()> {
    world.website.inventory_page().add_item_to_basket().await?;
    Ok(())
}

#[then(expr = "the basket count should be {int}")]
async fn the_basket_count_should_be(world: &mut StorefrontWorld, expected: u32) -> Result<()> {
    let actual = world.website.inventory_page().basket_count().await?;
    ensure!(
        actual == expected,
        "expected {} item(s) in the basket, found {}",
        expected,
        actual
    );
    Ok(())
}
