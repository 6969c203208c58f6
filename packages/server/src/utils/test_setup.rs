use dotenvy::dotenv;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

use crate::models::config::ServerConfig;
use crate::state::AppState;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        // テストではルールをデフォルトに固定する
        for var in [
            "RULE_SHERIFF_VOTE_WEIGHT",
            "RULE_WITCH_SELF_SAVE",
            "RULE_WITCH_BOTH_SAME_NIGHT",
            "RULE_HUNTER_SHOOT_WHEN_VOTED",
            "RULE_HUNTER_SHOOT_AT_NIGHT",
            "RULE_HUNTER_SHOOT_WHEN_POISONED",
        ] {
            std::env::remove_var(var);
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("warn,server=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Fresh state with the environment's config, after `setup_test_env`.
pub fn test_state() -> AppState {
    setup_test_env();
    AppState::new(ServerConfig::from_env())
}
