//! Generator configuration.
//!
//! Loaded from `schemadoc.yaml` (or `.schemadoc.yaml`) in the working
//! directory; every field has a default so the file may be partial.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::{ScanMode, SchemaModules};
use crate::generator::{Generator, KindFilter, Selection};

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["schemadoc.yaml", ".schemadoc.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Provider name, e.g. `azurerm`.
    pub provider: String,
    /// Prefix stripped from resource names (default: `"<provider>_"`).
    pub prefix: Option<String>,
    /// Package directory to scan.
    pub source: PathBuf,
    /// Root directory pages are written under.
    pub output: PathBuf,
    /// Page template file (minijinja); the built-in layout when unset.
    pub template: Option<PathBuf>,
    pub scan: ScanMode,
    /// Report failed resources and continue (default: true).
    pub keep_going: bool,
    pub parallel: bool,
    pub modules: SchemaModules,
    /// Names to document; empty means every registered name.
    pub resources: Vec<String>,
    pub kind: KindFilter,
    /// Glob patterns for source files to skip (e.g. "**/zz_generated*.go").
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "azurerm".to_string(),
            prefix: None,
            source: PathBuf::from("azurerm"),
            output: PathBuf::from("website/docs"),
            template: None,
            scan: ScanMode::default(),
            keep_going: true,
            parallel: false,
            modules: SchemaModules::default(),
            resources: Vec::new(),
            kind: KindFilter::default(),
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find a config file in `dir`, if any.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Prefix stripped from resource names.
    pub fn prefix(&self) -> String {
        match &self.prefix {
            Some(prefix) => prefix.clone(),
            None => format!("{}_", self.provider),
        }
    }

    /// Check if a source file should be skipped based on `exclude` patterns.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.exclude {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }

    /// Generator configured from this config.
    pub fn generator(&self) -> Generator {
        Generator::new(&self.provider)
            .prefix(&self.prefix())
            .modules(self.modules.clone())
            .scan(self.scan)
            .keep_going(self.keep_going)
            .parallel(self.parallel)
    }

    /// Resource selection from this config.
    pub fn selection(&self) -> Selection {
        Selection::names(self.resources.iter().cloned()).kind(self.kind)
    }

    /// Validate the config for correctness.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.trim().is_empty() {
            anyhow::bail!("provider name must not be empty");
        }
        if self.modules.schema.is_empty() || self.modules.provider.is_empty() {
            anyhow::bail!("schema and provider module paths must not be empty");
        }
        for pattern in &self.exclude {
            globset::Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid exclude pattern {:?}: {}", pattern, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
provider: google
source: google
scan: all
keep_going: false
resources: [google_compute_image]
kind: datasource
modules:
  schema: github.com/hashicorp/terraform-plugin-sdk/helper/schema
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider, "google");
        assert_eq!(config.prefix(), "google_");
        assert_eq!(config.scan, ScanMode::All);
        assert!(!config.keep_going);
        assert_eq!(config.kind, KindFilter::Datasource);
        assert_eq!(
            config.modules.schema,
            "github.com/hashicorp/terraform-plugin-sdk/helper/schema"
        );
        // unset module keeps its default
        assert_eq!(config.modules.provider, SchemaModules::default().provider);
        assert_eq!(config.output, PathBuf::from("website/docs"));
        assert_eq!(config.template, None);

        let selection = config.selection();
        assert_eq!(selection.names, vec!["google_compute_image"]);
        assert_eq!(selection.kind, KindFilter::Datasource);
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.keep_going);
        assert_eq!(config.prefix(), "azurerm_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_path() {
        let config: Config =
            serde_yaml::from_str("provider: azurerm\ntemplate: docs/resource.tmpl").unwrap();
        assert_eq!(config.template, Some(PathBuf::from("docs/resource.tmpl")));
    }

    #[test]
    fn test_prefix_override() {
        let config: Config = serde_yaml::from_str("provider: azurerm\nprefix: arm_").unwrap();
        assert_eq!(config.prefix(), "arm_");
    }

    #[test]
    fn test_validate() {
        let config = Config {
            provider: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            exclude: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_path_excluded() {
        let config = Config {
            exclude: vec!["**/zz_generated*.go".to_string()],
            ..Default::default()
        };
        assert!(config.is_path_excluded(Path::new("azurerm/zz_generated_models.go")));
        assert!(!config.is_path_excluded(Path::new("azurerm/provider.go")));
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert!(Config::discover(temp.path()).is_none());

        std::fs::write(temp.path().join(".schemadoc.yaml"), "provider: azurerm").unwrap();
        let found = Config::discover(temp.path()).unwrap();
        assert!(found.ends_with(".schemadoc.yaml"));
        assert_eq!(Config::parse_file(found).unwrap().provider, "azurerm");
    }
}
