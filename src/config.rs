use glam::Vec3;

/// Feed endpoint used when nothing overrides it.
pub const DEFAULT_FEED_URL: &str = "ws://127.0.0.1:8989";

/// Startup settings for the viewer shells.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub feed_url: String,
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// World-space light position fed to the shader every frame
    pub light_position: Vec3,
    pub clear_color: wgpu::Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            width: 600,
            height: 600,
            title: "hotmesh".to_string(),
            light_position: Vec3::new(-2.0, 5.0, 2.0),
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl ViewerConfig {
    /// Defaults, with the feed URL taken from `HOTMESH_FEED_URL` when set.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("HOTMESH_FEED_URL") {
            if !url.trim().is_empty() {
                config.feed_url = url;
            }
        }
        config
    }
}
