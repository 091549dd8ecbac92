pub mod inventory_steps;
pub mod signin_steps;

use cucumber::event::ScenarioFinished;
use cucumber::gherkin::Scenario;
use cucumber::World;
use std::path::PathBuf;
use storefront_bdd::{AppConfig, Credentials, Website};

/// Per-scenario state: one browser session and whatever the steps recorded
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct StorefrontWorld {
    pub config: &'static AppConfig,
    pub website: Website,
    pub credentials: Option<Credentials>,
}

impl StorefrontWorld {
    async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::get()?;
        let website = Website::launch(config).await?;

        Ok(Self {
            config,
            website,
            credentials: None,
        })
    }

    /// Runs after every scenario, whatever its outcome
    ///
    /// Returns true when this call released the browser.
    pub async fn teardown(&mut self, scenario: &str, line: usize, failed: bool) -> bool {
        if failed {
            if let Some(dir) = &self.config.screenshot_dir {
                self.save_screenshot(dir.join(screenshot_file_name(scenario, line)))
                    .await;
            }
        }

        match self.website.quit().await {
            Ok(true) => {
                log::debug!("Released browser for scenario '{}'", scenario);
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::warn!("Failed to close browser for scenario '{}': {}", scenario, e);
                true
            }
        }
    }

    async fn save_screenshot(&self, path: PathBuf) {
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("Cannot create {}: {}", parent.display(), e);
                return;
            }
        }
        match self.website.driver().screenshot_to_file(&path).await {
            Ok(()) => log::info!("Saved failure screenshot to {}", path.display()),
            Err(e) => log::warn!("Failed to save screenshot {}: {}", path.display(), e),
        }
    }
}

/// Body of the runners' `after` hook
///
/// `world` is `None` when the world failed to build, and then there is no
/// browser to release.
pub async fn after_scenario(
    scenario: &Scenario,
    finished: &ScenarioFinished,
    world: Option<&mut StorefrontWorld>,
) -> bool {
    match world {
        Some(world) => {
            world
                .teardown(&scenario.name, scenario.position.line, scenario_failed(finished))
                .await
        }
        None => false,
    }
}

pub fn scenario_failed(finished: &ScenarioFinished) -> bool {
    matches!(
        finished,
        ScenarioFinished::StepFailed(..) | ScenarioFinished::BeforeHookFailed(_)
    )
}

/// Outline examples share a name, so the line keeps their screenshots apart
pub fn screenshot_file_name(scenario: &str, line: usize) -> String {
    let stem: String = scenario
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{}.png", stem.trim_matches('_'), line)
}
