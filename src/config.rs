use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::{FieldmapGroupTable, Session, Subject, default_sessions};
use crate::error::BashGenError;
use crate::parse::{SUBJECT_RANGE_PATTERN, range_pattern, select_subjects};
use crate::template::FmriprepTemplate;

pub const CONFIG_FILE_NAME: &str = "fmriprep-bashgen.json";
pub const DEFAULT_PROJECT_DIR: &str = "/data/pt_02703/fMRIprep";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub project_dir: Option<String>,
    #[serde(default)]
    pub sessions: Option<Vec<String>>,
    #[serde(default)]
    pub fieldmap_groups: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub subject_range_pattern: Option<String>,
    #[serde(default)]
    pub template: Option<FmriprepTemplate>,
}

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub subjects: Vec<String>,
    pub exclude: Vec<String>,
    pub sessions: Option<Vec<String>>,
    pub project_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub subjects: Vec<Subject>,
    pub sessions: Vec<Session>,
    pub project_dir: Utf8PathBuf,
    pub fieldmap_groups: FieldmapGroupTable,
    pub template: FmriprepTemplate,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>, overrides: Overrides) -> Result<ResolvedConfig, BashGenError> {
        let config = match Self::locate(path) {
            Some(config_path) => Self::load(config_path)?,
            None => Config::default(),
        };
        Self::resolve_config(config, overrides)
    }

    pub fn load(config_path: PathBuf) -> Result<Config, BashGenError> {
        let content = fs::read_to_string(&config_path)
            .map_err(|_| BashGenError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| BashGenError::ConfigParse(err.to_string()))
    }

    fn locate(path: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = path {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "fmriprep-bashgen")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|candidate| candidate.exists())
    }

    pub fn resolve_config(config: Config, overrides: Overrides) -> Result<ResolvedConfig, BashGenError> {
        let pattern = range_pattern(
            config
                .subject_range_pattern
                .as_deref()
                .unwrap_or(SUBJECT_RANGE_PATTERN),
        )?;
        let subjects = select_subjects(&overrides.subjects, &overrides.exclude, &pattern)?;

        let mut sessions = match overrides.sessions.or(config.sessions) {
            Some(labels) => labels
                .iter()
                .map(|label| label.parse())
                .collect::<Result<Vec<Session>, BashGenError>>()?,
            None => default_sessions(),
        };
        let mut seen = HashSet::new();
        sessions.retain(|session| seen.insert(session.clone()));

        let project_dir = Utf8PathBuf::from(
            overrides
                .project_dir
                .or(config.project_dir)
                .unwrap_or_else(|| DEFAULT_PROJECT_DIR.to_string()),
        );

        let fieldmap_groups = config
            .fieldmap_groups
            .map(FieldmapGroupTable::new)
            .unwrap_or_default();
        if fieldmap_groups.is_empty() {
            return Err(BashGenError::ConfigParse(
                "fieldmap_groups must contain at least one group".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            subjects,
            sessions,
            project_dir,
            fieldmap_groups,
            template: config.template.unwrap_or_default(),
        })
    }
}
