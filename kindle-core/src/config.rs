//! # Bootstrap Configuration
//!
//! Every field has a default, so an empty (or absent) file reproduces the
//! stock bootstrap: a 1024x768 FIFO swapchain of two RGBA8 images.
//!
//! ```toml
//! application_name = "viewer"
//! validation = true
//!
//! [swapchain]
//! image_count = 3
//! present_mode = "mailbox"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::swapchain::{ColorSpace, Extent2D, PresentMode, SurfaceFormat, SwapchainDescriptor};
use crate::{ApplicationIdentity, KindleError, KindleResult, Version};

/// Swapchain section of the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapchainConfig {
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
    pub format: SurfaceFormat,
    pub color_space: ColorSpace,
    pub present_mode: PresentMode,
}

impl Default for SwapchainConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            image_count: 2,
            format: SurfaceFormat::Rgba8Unorm,
            color_space: ColorSpace::SrgbNonlinear,
            present_mode: PresentMode::Fifo,
        }
    }
}

/// Top-level bootstrap configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Application name reported to the graphics instance
    pub application_name: String,
    pub application_version: Version,
    pub engine_name: String,
    pub engine_version: Version,
    /// Graphics API version requested at instance creation
    pub api_version: Version,
    /// Request validation layers (skipped with a warning when unavailable)
    pub validation: bool,
    /// Fail discovery when the shell global is not advertised
    pub require_shell: bool,
    /// Give up waiting for device idle after this many failed attempts.
    /// `None` retries forever; zero is rejected.
    pub idle_retry_limit: Option<u32>,
    pub swapchain: SwapchainConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            application_name: "kindle".to_string(),
            application_version: Version::new(1, 0, 0),
            engine_name: "No Engine".to_string(),
            engine_version: Version::new(1, 0, 0),
            api_version: Version::new(1, 0, 0),
            validation: false,
            require_shell: false,
            idle_retry_limit: None,
            swapchain: SwapchainConfig::default(),
        }
    }
}

impl BootstrapConfig {
    pub fn load(path: impl AsRef<Path>) -> KindleResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KindleError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> KindleResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| KindleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KindleResult<()> {
        let sc = &self.swapchain;
        if sc.width == 0 || sc.height == 0 {
            return Err(KindleError::Config(format!(
                "swapchain extent must be non-zero, got {}x{}",
                sc.width, sc.height
            )));
        }
        if sc.image_count == 0 {
            return Err(KindleError::Config("swapchain image_count must be at least 1".into()));
        }
        if self.idle_retry_limit == Some(0) {
            return Err(KindleError::Config(
                "idle_retry_limit must be at least 1; leave it unset to retry forever".into(),
            ));
        }
        if self.application_name.contains('\0') || self.engine_name.contains('\0') {
            return Err(KindleError::Config("names must not contain NUL bytes".into()));
        }
        Ok(())
    }

    pub fn application(&self) -> ApplicationIdentity {
        ApplicationIdentity {
            name: self.application_name.clone(),
            version: self.application_version,
            engine_name: self.engine_name.clone(),
            engine_version: self.engine_version,
            api_version: self.api_version,
        }
    }

    pub fn swapchain_descriptor(&self) -> SwapchainDescriptor {
        let sc = &self.swapchain;
        SwapchainDescriptor {
            extent: Extent2D {
                width: sc.width,
                height: sc.height,
            },
            image_count: sc.image_count,
            format: sc.format,
            color_space: sc.color_space,
            present_mode: sc.present_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_stock_swapchain() {
        let config = BootstrapConfig::from_toml_str("").unwrap();
        let desc = config.swapchain_descriptor();
        assert_eq!(desc.extent, Extent2D { width: 1024, height: 768 });
        assert_eq!(desc.image_count, 2);
        assert_eq!(desc.format, SurfaceFormat::Rgba8Unorm);
        assert_eq!(desc.color_space, ColorSpace::SrgbNonlinear);
        assert_eq!(desc.present_mode, PresentMode::Fifo);
        assert_eq!(config.idle_retry_limit, None);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = BootstrapConfig::from_toml_str(
            r#"
            application_name = "viewer"
            idle_retry_limit = 8
            application_version = { major = 2, minor = 1, patch = 0 }

            [swapchain]
            present_mode = "mailbox"
            format = "bgra8_srgb"
            "#,
        )
        .unwrap();
        assert_eq!(config.application().name, "viewer");
        assert_eq!(config.application_version, Version::new(2, 1, 0));
        assert_eq!(config.idle_retry_limit, Some(8));
        assert_eq!(config.swapchain.present_mode, PresentMode::Mailbox);
        assert_eq!(config.swapchain.format, SurfaceFormat::Bgra8Srgb);
        assert_eq!(config.swapchain.width, 1024);
    }

    #[test]
    fn zero_extent_is_rejected() {
        let err = BootstrapConfig::from_toml_str("[swapchain]\nwidth = 0").unwrap_err();
        assert!(matches!(err, KindleError::Config(_)));
    }

    #[test]
    fn unknown_present_mode_is_rejected() {
        let err = BootstrapConfig::from_toml_str("[swapchain]\npresent_mode = \"vsync\"").unwrap_err();
        assert!(matches!(err, KindleError::Config(_)));
    }

    #[test]
    fn zero_idle_retry_limit_is_rejected() {
        let err = BootstrapConfig::from_toml_str("idle_retry_limit = 0").unwrap_err();
        assert!(matches!(err, KindleError::Config(msg) if msg.contains("idle_retry_limit")));
        assert!(BootstrapConfig::from_toml_str("idle_retry_limit = 1").is_ok());
    }
}
