use podharvest_config::BrowserConfig;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// User agent, viewport and locale presented by one browser session.
pub struct UserAgentProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub languages: Vec<String>,
}

const DESKTOP_AGENTS: [&str; 2] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Resolve the profile for a session: the configured user agent if any,
/// otherwise one of the built-in desktop agents.
pub fn session_profile(config: &BrowserConfig) -> UserAgentProfile {
    let user_agent = match &config.user_agent {
        Some(ua) if !ua.trim().is_empty() => ua.trim().to_string(),
        _ => DESKTOP_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DESKTOP_AGENTS[0])
            .to_string(),
    };

    UserAgentProfile {
        user_agent,
        viewport: (config.window_width, config.window_height),
        languages: vec!["en-US".to_string(), "en".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_agent_wins() {
        let config = BrowserConfig {
            user_agent: Some(" custom-agent/1.0 ".into()),
            window_width: 800,
            window_height: 600,
            ..BrowserConfig::default()
        };
        let profile = session_profile(&config);
        assert_eq!(profile.user_agent, "custom-agent/1.0");
        assert_eq!(profile.viewport, (800, 600));
    }

    #[test]
    fn falls_back_to_builtin_agents() {
        let profile = session_profile(&BrowserConfig::default());
        assert!(DESKTOP_AGENTS.contains(&profile.user_agent.as_str()));
    }
}
