//! Layered compiler configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `GLINT_FORCE_LAMBERT_OVER_BURLEY`,
//!    `GLINT_FORCE_BLINN_OVER_GGX`, `GLINT_PAD_UNIFORM_BUFFER`
//! 2. Project-local: `.glint/config.toml`
//! 3. Global: `~/.glint/config.toml`

use glint_core::{Result, ShaderError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[shading]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadingSection {
    #[serde(default)]
    pub force_lambert_over_burley: Option<bool>,
    #[serde(default)]
    pub force_blinn_over_ggx: Option<bool>,
}

/// `[layout]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSection {
    #[serde(default)]
    pub pad_uniform_buffer: Option<bool>,
}

/// Config file structure; unset keys leave lower layers untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfigFile {
    #[serde(default)]
    pub shading: ShadingSection,
    #[serde(default)]
    pub layout: LayoutSection,
}

/// Resolved configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompilerConfig {
    /// Drop the `diffuse_burley` render mode define
    pub force_lambert_over_burley: bool,
    /// Map `specular_schlick_ggx` to the Blinn define
    pub force_blinn_over_ggx: bool,
    /// Reserve one extra 16-byte slot after the material uniforms
    pub pad_uniform_buffer: bool,
}

impl CompilerConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = CompilerConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".glint/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config);
        Ok(Self::resolve(&config))
    }

    /// Load config from a specific file path only, then apply env vars
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(Self::resolve(&config))
    }

    /// Parse config text without consulting files or the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CompilerConfigFile = toml::from_str(content)?;
        Ok(Self::resolve(&file))
    }

    fn resolve(file: &CompilerConfigFile) -> Self {
        Self {
            force_lambert_over_burley: file.shading.force_lambert_over_burley.unwrap_or(false),
            force_blinn_over_ggx: file.shading.force_blinn_over_ggx.unwrap_or(false),
            pad_uniform_buffer: file.layout.pad_uniform_buffer.unwrap_or(false),
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".glint").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<CompilerConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ShaderError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut CompilerConfigFile, overlay: CompilerConfigFile) {
        if overlay.shading.force_lambert_over_burley.is_some() {
            base.shading.force_lambert_over_burley = overlay.shading.force_lambert_over_burley;
        }
        if overlay.shading.force_blinn_over_ggx.is_some() {
            base.shading.force_blinn_over_ggx = overlay.shading.force_blinn_over_ggx;
        }
        if overlay.layout.pad_uniform_buffer.is_some() {
            base.layout.pad_uniform_buffer = overlay.layout.pad_uniform_buffer;
        }
    }

    fn apply_env_overrides(config: &mut CompilerConfigFile) {
        if let Some(value) = env_flag("GLINT_FORCE_LAMBERT_OVER_BURLEY") {
            config.shading.force_lambert_over_burley = Some(value);
        }
        if let Some(value) = env_flag("GLINT_FORCE_BLINN_OVER_GGX") {
            config.shading.force_blinn_over_ggx = Some(value);
        }
        if let Some(value) = env_flag("GLINT_PAD_UNIFORM_BUFFER") {
            config.layout.pad_uniform_buffer = Some(value);
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => {
            log::warn!("ignoring {}={:?}, expected a boolean", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glint_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        std::fs::remove_file(path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert!(!config.force_lambert_over_burley);
        assert!(!config.force_blinn_over_ggx);
        assert!(!config.pad_uniform_buffer);
    }

    #[test]
    fn test_from_toml_str() {
        let config = CompilerConfig::from_toml_str(
            r#"
[shading]
force_blinn_over_ggx = true

[layout]
pad_uniform_buffer = true
"#,
        )
        .unwrap();
        assert!(config.force_blinn_over_ggx);
        assert!(!config.force_lambert_over_burley);
        assert!(config.pad_uniform_buffer);

        assert_eq!(
            CompilerConfig::from_toml_str("").unwrap(),
            CompilerConfig::default()
        );
        assert!(CompilerConfig::from_toml_str("[shading]\nforce_blinn_over_ggx = 3").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        std::env::remove_var("GLINT_FORCE_LAMBERT_OVER_BURLEY");

        let path = temp_config(
            r#"
[shading]
force_lambert_over_burley = true
"#,
        );
        let config = CompilerConfig::load_from_file(&path).unwrap();
        assert!(config.force_lambert_over_burley);

        cleanup(&path);
    }

    #[test]
    fn test_env_var_override() {
        let path = temp_config(
            r#"
[shading]
force_blinn_over_ggx = false
"#,
        );

        std::env::set_var("GLINT_FORCE_BLINN_OVER_GGX", "yes");
        let config = CompilerConfig::load_from_file(&path).unwrap();
        assert!(config.force_blinn_over_ggx);

        std::env::remove_var("GLINT_FORCE_BLINN_OVER_GGX");
        cleanup(&path);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let path = temp_config("[layout\npad_uniform_buffer = true");
        let err = CompilerConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ShaderError::Config(_)));
        cleanup(&path);
    }

    #[test]
    fn test_merge_keeps_unset_keys() {
        let mut base = CompilerConfigFile::default();
        base.shading.force_lambert_over_burley = Some(true);
        let mut overlay = CompilerConfigFile::default();
        overlay.layout.pad_uniform_buffer = Some(true);

        CompilerConfig::merge_into(&mut base, overlay);
        let config = CompilerConfig::resolve(&base);
        assert!(config.force_lambert_over_burley);
        assert!(config.pad_uniform_buffer);
    }
}
