//! Cucumber runner for the storefront scenarios
//!
//! By default the scenarios run against a local fake storefront. Pass `--live`
//! to run them against the storefront configured through `STOREFRONT_*`
//! variables; scenarios tagged `@fake-storefront` are skipped there.
//!
//! ```text
//! cargo test --test signin
//! cargo test --test signin -- --live --name "Valid credentials"
//! ```

mod steps;

use cucumber::{cli, World as _};
use futures::FutureExt;
use steps::StorefrontWorld;
use storefront_bdd::AppConfig;
use test_server::TestServer;

const FAKE_ONLY_TAG: &str = "fake-storefront";

#[derive(clap::Args)]
struct HarnessOpts {
    /// Run against the configured storefront instead of the local fake one
    #[arg(long)]
    live: bool,
}

#[tokio::main]
async fn main() {
    let _ = env_logger::try_init();

    let opts = cli::Opts::<_, _, _, HarnessOpts>::parsed();
    let live = opts.custom.live;

    // Held for the whole run so the fake storefront keeps serving
    let _server = if live {
        None
    } else {
        let server = TestServer::start().await;
        server
            .wait_ready()
            .await
            .expect("Fake storefront failed to start");
        let mut config = server.config();
        config.screenshot_dir = AppConfig::from_env()
            .expect("Invalid STOREFRONT_* configuration")
            .screenshot_dir;
        AppConfig::install(config).expect("Configuration already resolved");
        Some(server)
    };

    StorefrontWorld::cucumber()
        .max_concurrent_scenarios(4)
        .with_cli(opts)
        .after(|_feature, _rule, scenario, finished, world| {
            async move {
                steps::after_scenario(scenario, finished, world).await;
            }
            .boxed_local()
        })
        .filter_run_and_exit(
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/features"),
            move |feature, _rule, scenario| {
                !live
                    || !feature
                        .tags
                        .iter()
                        .chain(scenario.tags.iter())
                        .any(|tag| tag == FAKE_ONLY_TAG)
            },
        )
        .await;
}
