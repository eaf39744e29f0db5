use crate::domain::model::{Catalog, LabelTemplate, Printer, PrinterBinding};
use crate::utils::error::{LimsError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimsConfig {
    pub site: SiteConfig,
    #[serde(default)]
    pub printing: PrintingConfig,
    #[serde(default)]
    pub printers: Vec<Printer>,
    #[serde(default)]
    pub templates: Vec<LabelTemplate>,
    #[serde(default)]
    pub bindings: Vec<PrinterBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    /// Directory holding one record file per record type.
    pub data_dir: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintBackend {
    /// Spooler when the command exists, diagnostic output otherwise.
    #[default]
    Auto,
    Spooler,
    Diagnostic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintingConfig {
    #[serde(default)]
    pub backend: PrintBackend,
    #[serde(default = "default_spooler_command")]
    pub command: String,
}

fn default_spooler_command() -> String {
    "lpr".to_string()
}

impl Default for PrintingConfig {
    fn default() -> Self {
        Self {
            backend: PrintBackend::default(),
            command: default_spooler_command(),
        }
    }
}

impl LimsConfig {
    /// Load the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LimsError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replace `${VAR}` references with environment values. Unset variables
    /// are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LimsError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("site.name", &self.site.name)?;
        validation::validate_path("site.data_dir", &self.site.data_dir)?;
        validation::validate_non_empty_string("printing.command", &self.printing.command)?;

        validation::validate_unique_ids("printers.id", self.printers.iter().map(|p| p.id))?;
        validation::validate_unique_ids("templates.id", self.templates.iter().map(|t| t.id))?;
        validation::validate_unique_ids("bindings.id", self.bindings.iter().map(|b| b.id))?;

        for printer in &self.printers {
            validation::validate_queue_name("printers.name", &printer.name)?;
        }

        for template in &self.templates {
            validation::validate_non_empty_string("templates.name", &template.name)?;
            template
                .check()
                .map_err(|e| LimsError::ConfigValidationError {
                    field: format!("templates[{}].template", template.id),
                    message: e.to_string(),
                })?;
        }

        for binding in &self.bindings {
            if !self.templates.iter().any(|t| t.id == binding.template) {
                return Err(LimsError::InvalidConfigValueError {
                    field: format!("bindings[{}].template", binding.id),
                    value: binding.template.to_string(),
                    reason: "No template with this id".to_string(),
                });
            }
            if !self.printers.iter().any(|p| p.id == binding.printer) {
                return Err(LimsError::InvalidConfigValueError {
                    field: format!("bindings[{}].printer", binding.id),
                    value: binding.printer.to_string(),
                    reason: "No printer with this id".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Short field lists are not rejected here: they are reported per record
    /// when an action runs.
    pub fn short_bindings(&self) -> Vec<&PrinterBinding> {
        self.bindings
            .iter()
            .filter(|b| {
                self.templates
                    .iter()
                    .find(|t| t.id == b.template)
                    .is_some_and(|t| b.field_names().len() < t.nr_fields)
            })
            .collect()
    }

    pub fn catalog(&self) -> Catalog {
        Catalog {
            templates: self.templates.clone(),
            printers: self.printers.clone(),
            bindings: self.bindings.clone(),
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.site.data_dir
    }
}

impl Validate for LimsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RecordType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[site]
name = "Lab LIMS"
data_dir = "./data"

[[printers]]
id = 1
name = "zebra_lab1"

[[templates]]
id = 1
name = "tube"
template = "{}-{}"
nr_fields = 2

[[bindings]]
id = 1
record_type = "sample"
template = 1
printer = 1
fields = "barcode date"
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = LimsConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.site.name, "Lab LIMS");
        assert_eq!(config.printing.backend, PrintBackend::Auto);
        assert_eq!(config.printing.command, "lpr");
        assert_eq!(config.bindings[0].record_type, RecordType::Sample);
        assert!(config.validate().is_ok());

        let catalog = config.catalog();
        assert_eq!(catalog.bindings_for(RecordType::Sample).len(), 1);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LIMS_TEST_QUEUE", "brady_cold_room");

        let content = BASIC.replace("zebra_lab1", "${LIMS_TEST_QUEUE}");
        let config = LimsConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.printers[0].name, "brady_cold_room");

        std::env::remove_var("LIMS_TEST_QUEUE");
    }

    #[test]
    fn test_printing_section() {
        let content = format!(
            "{}\n[printing]\nbackend = \"diagnostic\"\ncommand = \"/usr/bin/lp\"\n",
            BASIC
        );
        let config = LimsConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.printing.backend, PrintBackend::Diagnostic);
        assert_eq!(config.printing.command, "/usr/bin/lp");

        let bad = format!("{}\n[printing]\nbackend = \"cups\"\n", BASIC);
        assert!(matches!(
            LimsConfig::from_toml_str(&bad),
            Err(LimsError::TomlParseError(_))
        ));
    }

    #[test]
    fn test_template_wider_than_nr_fields_is_rejected() {
        let content = BASIC.replace("template = \"{}-{}\"", "template = \"{}-{}-{}\"");
        let config = LimsConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(LimsError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_dangling_binding_is_rejected() {
        let content = BASIC.replace("printer = 1", "printer = 7");
        let config = LimsConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(LimsError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_short_bindings_are_valid_but_listed() {
        let content = BASIC.replace("fields = \"barcode date\"", "fields = \"barcode\"");
        let config = LimsConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.short_bindings().len(), 1);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = LimsConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data_dir(), "./data");
    }
}
