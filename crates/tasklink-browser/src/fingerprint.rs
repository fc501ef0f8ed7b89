use tasklink_core::BrowserConfig;

/// Browser identity presented to the marketplace at launch.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub headless: bool,
}

impl LaunchProfile {
    /// Command-line switches passed to Chrome on launch.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        vec![
            "--disable-dev-shm-usage".to_string(),
            "--disable-extensions".to_string(),
            "--disable-gpu".to_string(),
            format!("--user-agent={}", self.user_agent),
        ]
    }
}

impl From<&BrowserConfig> for LaunchProfile {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            viewport_width: config.window_width,
            viewport_height: config.window_height,
            headless: config.headless,
        }
    }
}
