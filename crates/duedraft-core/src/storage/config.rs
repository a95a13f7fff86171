//! TOML-based application configuration.
//!
//! Holds:
//! - Notion endpoint, database ids and property names
//! - Sync trigger settings and placeholder labels
//! - The deadline rule table
//!
//! Configuration is stored at `<data_dir>/config.toml`. The Notion token is
//! never stored here; see [`crate::integrations::keyring_store`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::deadline::{OffsetRule, OffsetRuleTable, DEFAULT_OFFSET_DAYS};
use crate::error::{ConfigError, Result};

/// Property names on the project database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProperties {
    #[serde(default = "default_project_name_prop")]
    pub name: String,
    #[serde(default = "default_event_date_prop")]
    pub event_date: String,
    #[serde(default = "default_event_category_prop")]
    pub event_category: String,
}

/// Property names on the checklist database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProperties {
    #[serde(default = "default_product_name_prop")]
    pub product_name: String,
    #[serde(default = "default_work_category_prop")]
    pub work_category: String,
    #[serde(default = "default_final_due_text_prop")]
    pub final_due_text: String,
    #[serde(default = "default_event_category_prop")]
    pub event_category: String,
}

/// Property names on the task database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProperties {
    #[serde(default = "default_task_name_prop")]
    pub task_name: String,
    #[serde(default = "default_project_relation_prop")]
    pub project_relation: String,
    #[serde(default = "default_due_date_prop")]
    pub due_date: String,
    #[serde(default = "default_status_prop")]
    pub status: String,
    #[serde(default = "default_work_type_prop")]
    pub work_type: String,
}

/// Notion workspace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
    #[serde(default)]
    pub project_db_id: String,
    #[serde(default)]
    pub checklist_db_id: String,
    #[serde(default)]
    pub task_db_id: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub project_properties: ProjectProperties,
    #[serde(default)]
    pub checklist_properties: ChecklistProperties,
    #[serde(default)]
    pub task_properties: TaskProperties,
}

/// Sync trigger and write-back settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Status label given to tasks created on approval.
    #[serde(default = "default_task_status")]
    pub default_task_status: String,
    #[serde(default = "default_untitled_project")]
    pub untitled_project_name: String,
    #[serde(default = "default_untitled_item")]
    pub untitled_item_name: String,
    /// Select value written when the work category is empty.
    #[serde(default = "default_fallback_work_type")]
    pub fallback_work_type: String,
}

/// Rule table configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineConfig {
    #[serde(default = "default_offset_days")]
    pub default_offset_days: i64,
    #[serde(default = "OffsetRuleTable::builtin_rules")]
    pub rules: Vec<OffsetRule>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub deadline: DeadlineConfig,
}

// Default functions
fn default_project_name_prop() -> String {
    "프로젝트명".into()
}
fn default_event_date_prop() -> String {
    "행사 진행일".into()
}
fn default_event_category_prop() -> String {
    "행사 분류".into()
}
fn default_product_name_prop() -> String {
    "제작물".into()
}
fn default_work_category_prop() -> String {
    "작업 분류".into()
}
fn default_final_due_text_prop() -> String {
    "최종 완료 시점".into()
}
fn default_task_name_prop() -> String {
    "업무".into()
}
fn default_project_relation_prop() -> String {
    "귀속 프로젝트".into()
}
fn default_due_date_prop() -> String {
    "마감일".into()
}
fn default_status_prop() -> String {
    "상태".into()
}
fn default_work_type_prop() -> String {
    "업무구분".into()
}
fn default_api_base_url() -> String {
    "https://api.notion.com/v1".into()
}
fn default_notion_version() -> String {
    "2022-06-28".into()
}
fn default_page_size() -> u32 {
    100
}
fn default_interval_minutes() -> u64 {
    10
}
fn default_task_status() -> String {
    "진행 전".into()
}
fn default_untitled_project() -> String {
    "제목 없음 프로젝트".into()
}
fn default_untitled_item() -> String {
    "제작물".into()
}
fn default_fallback_work_type() -> String {
    "기타".into()
}
fn default_offset_days() -> i64 {
    DEFAULT_OFFSET_DAYS
}

impl Default for ProjectProperties {
    fn default() -> Self {
        Self {
            name: default_project_name_prop(),
            event_date: default_event_date_prop(),
            event_category: default_event_category_prop(),
        }
    }
}

impl Default for ChecklistProperties {
    fn default() -> Self {
        Self {
            product_name: default_product_name_prop(),
            work_category: default_work_category_prop(),
            final_due_text: default_final_due_text_prop(),
            event_category: default_event_category_prop(),
        }
    }
}

impl Default for TaskProperties {
    fn default() -> Self {
        Self {
            task_name: default_task_name_prop(),
            project_relation: default_project_relation_prop(),
            due_date: default_due_date_prop(),
            status: default_status_prop(),
            work_type: default_work_type_prop(),
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            notion_version: default_notion_version(),
            project_db_id: String::new(),
            checklist_db_id: String::new(),
            task_db_id: String::new(),
            page_size: default_page_size(),
            project_properties: ProjectProperties::default(),
            checklist_properties: ChecklistProperties::default(),
            task_properties: TaskProperties::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            default_task_status: default_task_status(),
            untitled_project_name: default_untitled_project(),
            untitled_item_name: default_untitled_item(),
            fallback_work_type: default_fallback_work_type(),
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            default_offset_days: DEFAULT_OFFSET_DAYS,
            rules: OffsetRuleTable::builtin_rules(),
        }
    }
}

impl DeadlineConfig {
    pub fn rule_table(&self) -> OffsetRuleTable {
        OffsetRuleTable::new(self.rules.clone(), self.default_offset_days)
    }
}

/// Environment variables that override `[notion]` ids at load time.
const ENV_OVERRIDES: [(&str, fn(&mut NotionConfig) -> &mut String); 3] = [
    ("NOTION_PROJECT_DB_ID", NotionConfig::project_db_id_mut),
    ("NOTION_CHECKLIST_DB_ID", NotionConfig::checklist_db_id_mut),
    ("NOTION_TASK_DB_ID", NotionConfig::task_db_id_mut),
];

impl NotionConfig {
    fn project_db_id_mut(&mut self) -> &mut String {
        &mut self.project_db_id
    }

    fn checklist_db_id_mut(&mut self) -> &mut String {
        &mut self.checklist_db_id
    }

    fn task_db_id_mut(&mut self) -> &mut String {
        &mut self.task_db_id
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default path, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseFailed(format!("{}: {e}", path.display())).into()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Load from disk and apply environment overrides. Used by commands that
    /// talk to Notion; never saved back.
    pub fn load_effective() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Apply `NOTION_*_DB_ID` style overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, field) in ENV_OVERRIDES {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *field(&mut self.notion) = value;
            }
        }
    }

    /// Persist to the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate_values()?;
        *self = updated;
        Ok(())
    }

    /// Checks that the Notion databases are configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_values()?;
        for (key, value) in [
            ("notion.project_db_id", &self.notion.project_db_id),
            ("notion.checklist_db_id", &self.notion.checklist_db_id),
            ("notion.task_db_id", &self.notion.task_db_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingKey(key.to_string()));
            }
        }
        Ok(())
    }

    fn validate_values(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.notion.api_base_url).map_err(|e| ConfigError::InvalidValue {
            key: "notion.api_base_url".into(),
            message: e.to_string(),
        })?;
        if self.notion.page_size == 0 || self.notion.page_size > 100 {
            return Err(ConfigError::InvalidValue {
                key: "notion.page_size".into(),
                message: "must be between 1 and 100".into(),
            });
        }
        if self.sync.interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sync.interval_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
