use std::env;
use std::net::SocketAddr;

use werewolf_engine::{HunterRules, RuleOptions, SheriffRules, WitchRules};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub cors_origins: Vec<String>,
    // 部屋ごとのbroadcastチャンネルのバッファサイズ
    pub room_channel_capacity: usize,
    // 新しいゲームに適用するルール
    pub rules: RuleOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_origins: vec![DEFAULT_ORIGIN.to_string()],
            room_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            rules: RuleOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080)));
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec![DEFAULT_ORIGIN.to_string()]);
        let room_channel_capacity = env::var("ROOM_CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);

        Self {
            addr,
            cors_origins,
            room_channel_capacity,
            rules: rules_from_env(),
        }
    }
}

fn rules_from_env() -> RuleOptions {
    let defaults = RuleOptions::default();
    let flag = |name: &str, default: bool| {
        env::var(name)
            .map(|v| v == "true")
            .unwrap_or(default)
    };

    RuleOptions {
        sheriff: SheriffRules {
            vote_weight: env::var("RULE_SHERIFF_VOTE_WEIGHT")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(defaults.sheriff.vote_weight),
        },
        witch: WitchRules {
            can_self_save: flag("RULE_WITCH_SELF_SAVE", defaults.witch.can_self_save),
            can_use_both_in_same_night: flag(
                "RULE_WITCH_BOTH_SAME_NIGHT",
                defaults.witch.can_use_both_in_same_night,
            ),
        },
        hunter: HunterRules {
            can_shoot_when_voted: flag(
                "RULE_HUNTER_SHOOT_WHEN_VOTED",
                defaults.hunter.can_shoot_when_voted,
            ),
            can_shoot_when_killed_at_night: flag(
                "RULE_HUNTER_SHOOT_AT_NIGHT",
                defaults.hunter.can_shoot_when_killed_at_night,
            ),
            can_shoot_when_poisoned: flag(
                "RULE_HUNTER_SHOOT_WHEN_POISONED",
                defaults.hunter.can_shoot_when_poisoned,
            ),
        },
    }
}
