use super::StorefrontWorld;
use anyhow::{anyhow, ensure, Result};
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use storefront_bdd::Credentials;

#[given("I am on the home page")]
async fn i_am_on_the_home_page(world: &mut StorefrontWorld) -> Result<()> {
    world.website.home_page().visit().await?;
    Ok(())
}

#[given("I have entered a valid e-mail")]
async fn i_have_entered_a_valid_email(world: &mut StorefrontWorld) -> Result<()> {
    let user_name = &world.config.user_name;
    world.website.home_page().enter_user_name(user_name).await?;
    Ok(())
}

#[given("I have entered a valid password")]
async fn i_have_entered_a_valid_password(world: &mut StorefrontWorld) -> Result<()> {
    let password = &world.config.password;
    world.website.home_page().enter_password(password).await?;
    Ok(())
}

#[given(regex = r#"^I have entered an invalid password of "([^"]*)"$"#)]
async fn i_have_entered_an_invalid_password(
    world: &mut StorefrontWorld,
    password: String,
) -> Result<()> {
    world.website.home_page().enter_password(&password).await?;
    Ok(())
}

#[given("I have the following credentials:")]
async fn i_have_the_following_credentials(world: &mut StorefrontWorld, step: &Step) -> Result<()> {
    let table = step
        .table
        .as_ref()
        .ok_or_else(|| anyhow!("this step needs a username/password table"))?;
    world.credentials = Some(Credentials::from_table(&table.rows)?);
    Ok(())
}

#[when("enter these credentials")]
async fn enter_these_credentials(world: &mut StorefrontWorld) -> Result<()> {
    let credentials = world
        .credentials
        .as_ref()
        .ok_or_else(|| anyhow!("no credentials were given earlier in this scenario"))?;
    world
        .website
        .home_page()
        .enter_signin_credentials(credentials)
        .await?;
    Ok(())
}

#[when("I click the login button")]
async fn i_click_the_login_button(world: &mut StorefrontWorld) -> Result<()> {
    world.website.home_page().click_login_button().await?;
    Ok(())
}

#[then(regex = r#"^I should see an error message that contains "([^"]*)"$"#)]
async fn i_should_see_an_error_message(world: &mut StorefrontWorld, expected: String) -> Result<()> {
    let actual = world.website.home_page().wait_for_error_message().await?;
    ensure!(
        actual.contains(&expected),
        "expected an error message containing {:?}, found {:?}",
        expected,
        actual
    );
    Ok(())
}

// Older feature files spell it "invetory"
#[then(regex = r"^I should land on the inven?tory page$")]
async fn i_should_land_on_the_inventory_page(world: &mut StorefrontWorld) -> Result<()> {
    let expected = &world.config.inventory_page_url;
    let actual = world.website.driver().wait_for_url(expected).await?;
    ensure!(
        &actual == expected,
        "expected to land on {}, but the browser is on {}",
        expected,
        actual
    );
    Ok(())
}
