use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use tracing::{debug, info};

use crate::domain::{B0Identifier, FieldmapGroupTable, RunNumber, Session, Subject};
use crate::error::BashGenError;
use crate::fieldmap;
use crate::layout::DirectoryLayout;

pub const FUNCTIONAL_SUFFIX: &str = "_bold.json";
pub const FIELDMAP_SUFFIX: &str = "_epi.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum B0Field {
    #[serde(rename = "B0FieldSource")]
    Source,
    #[serde(rename = "B0FieldIdentifier")]
    Identifier,
}

impl B0Field {
    pub fn key(self) -> &'static str {
        match self {
            B0Field::Source => "B0FieldSource",
            B0Field::Identifier => "B0FieldIdentifier",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            B0Field::Source => FUNCTIONAL_SUFFIX,
            B0Field::Identifier => FIELDMAP_SUFFIX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidecarPatch {
    pub path: Utf8PathBuf,
    pub field: B0Field,
    pub value: B0Identifier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SidecarPlan {
    pub patches: Vec<SidecarPatch>,
}

impl SidecarPlan {
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Writes every patch. Not transactional across files.
    pub fn apply(&self) -> Result<(), BashGenError> {
        for patch in &self.patches {
            write_field(&patch.path, patch.field, &patch.value)?;
            debug!("{} is: {} ({})", patch.field.key(), patch.value, patch.path);
        }
        Ok(())
    }
}

pub struct SidecarUpdater<'a> {
    layout: &'a DirectoryLayout,
    sessions: &'a [Session],
    table: &'a FieldmapGroupTable,
}

impl<'a> SidecarUpdater<'a> {
    pub fn new(
        layout: &'a DirectoryLayout,
        sessions: &'a [Session],
        table: &'a FieldmapGroupTable,
    ) -> Self {
        Self {
            layout,
            sessions,
            table,
        }
    }

    pub fn update_functional_sidecars(&self, subject: &Subject) -> Result<(), BashGenError> {
        self.plan_functional(subject)?.apply()
    }

    pub fn update_fieldmap_sidecars(&self, subject: &Subject) -> Result<(), BashGenError> {
        self.plan_fieldmaps(subject)?.apply()
    }

    pub fn plan(&self, subject: &Subject) -> Result<SidecarPlan, BashGenError> {
        let mut plan = self.plan_functional(subject)?;
        plan.patches.extend(self.plan_fieldmaps(subject)?.patches);
        Ok(plan)
    }

    pub fn plan_functional(&self, subject: &Subject) -> Result<SidecarPlan, BashGenError> {
        info!("getting B0 field source for {subject}");
        let mut patches = Vec::new();
        for session in self.sessions {
            info!("  session: {session}");
            let dir = self.layout.func_dir(subject, session);
            for path in list_sidecars(&dir, B0Field::Source.suffix())? {
                let run = run_number(&path)?;
                let group = fieldmap::resolve(&run, self.table)?;
                patches.push(SidecarPatch {
                    value: B0Identifier::compose(subject, session, group),
                    field: B0Field::Source,
                    path,
                });
            }
        }
        Ok(SidecarPlan { patches })
    }

    pub fn plan_fieldmaps(&self, subject: &Subject) -> Result<SidecarPlan, BashGenError> {
        info!("getting B0 field identifier for {subject}");
        let mut patches = Vec::new();
        for session in self.sessions {
            info!("  session: {session}");
            let dir = self.layout.fmap_dir(subject, session);
            for path in list_sidecars(&dir, B0Field::Identifier.suffix())? {
                let run = run_number(&path)?;
                patches.push(SidecarPatch {
                    value: B0Identifier::compose(subject, session, run.as_str()),
                    field: B0Field::Identifier,
                    path,
                });
            }
        }
        Ok(SidecarPlan { patches })
    }
}

/// Sorted `*<suffix>` files in `dir`, hidden files excluded; at least one is required.
pub fn list_sidecars(dir: &Utf8Path, suffix: &str) -> Result<Vec<Utf8PathBuf>, BashGenError> {
    let pattern = format!("{}/*{suffix}", glob::Pattern::escape(dir.as_str()));
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let mut paths = glob::glob_with(&pattern, options)
        .map_err(|err| BashGenError::InvalidPattern {
            pattern: pattern.clone(),
            message: err.to_string(),
        })?
        .map(|entry| {
            let path = entry.map_err(|err| BashGenError::Filesystem(err.to_string()))?;
            Utf8PathBuf::from_path_buf(path)
                .map_err(|_| BashGenError::Filesystem("non-utf8 sidecar path".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if paths.is_empty() {
        return Err(BashGenError::MissingData {
            pattern: format!("*{suffix}"),
            dir: dir.to_string(),
        });
    }
    paths.sort();
    debug!("sidecars in {dir}: {paths:?}");
    Ok(paths)
}

fn run_number(path: &Utf8Path) -> Result<RunNumber, BashGenError> {
    RunNumber::from_filename(path.file_name().unwrap_or(path.as_str()))
}

pub fn write_field(
    path: &Utf8Path,
    field: B0Field,
    value: &B0Identifier,
) -> Result<(), BashGenError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| BashGenError::Filesystem(format!("read {path}: {err}")))?;
    let mut document: Value = serde_json::from_str(&content).map_err(|err| BashGenError::Sidecar {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    let object = document
        .as_object_mut()
        .ok_or_else(|| BashGenError::Sidecar {
            path: path.to_string(),
            message: "top-level value is not an object".to_string(),
        })?;
    object.insert(
        field.key().to_string(),
        Value::String(value.as_str().to_string()),
    );

    let bytes = to_indented_json(&document).map_err(|err| BashGenError::Sidecar {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    write_atomic(path, &bytes)
}

fn to_indented_json(value: &Value) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(out)
}

fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), BashGenError> {
    let parent = path
        .parent()
        .ok_or_else(|| BashGenError::Filesystem(format!("invalid sidecar path {path}")))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".sidecar")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| BashGenError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| BashGenError::Filesystem(err.to_string()))?;
    // tempfiles are created 0600; keep the sidecar's own mode
    if let Ok(metadata) = fs::metadata(path.as_std_path()) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|err| BashGenError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| BashGenError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn temp_layout() -> (tempfile::TempDir, DirectoryLayout) {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, DirectoryLayout::new(root))
    }

    #[test]
    fn write_field_preserves_other_keys() {
        let (_temp, layout) = temp_layout();
        fs::create_dir_all(layout.bids_dir().as_std_path()).unwrap();
        let path = layout.bids_dir().join("sub-01_run-01_bold.json");
        fs::write(path.as_std_path(), r#"{"RepetitionTime": 2.0, "TaskName": "rest"}"#).unwrap();

        let subject: Subject = "sub-01".parse().unwrap();
        let session: Session = "ses-01".parse().unwrap();
        let value = B0Identifier::compose(&subject, &session, "01");
        write_field(&path, B0Field::Source, &value).unwrap();

        let content = fs::read_to_string(path.as_std_path()).unwrap();
        let keys: Vec<&str> = content
            .lines()
            .filter_map(|line| line.trim().split('"').nth(1))
            .collect();
        assert_eq!(keys, ["RepetitionTime", "TaskName", "B0FieldSource"]);
        assert!(content.contains("    \"B0FieldSource\": \"pepolarfmap010101\""));
    }

    #[test]
    fn write_field_rejects_non_object() {
        let (_temp, layout) = temp_layout();
        fs::create_dir_all(layout.bids_dir().as_std_path()).unwrap();
        let path = layout.bids_dir().join("sub-01_run-01_epi.json");
        fs::write(path.as_std_path(), "[1, 2]").unwrap();

        let subject: Subject = "sub-01".parse().unwrap();
        let session: Session = "ses-01".parse().unwrap();
        let value = B0Identifier::compose(&subject, &session, "01");
        assert_matches!(
            write_field(&path, B0Field::Identifier, &value),
            Err(BashGenError::Sidecar { .. })
        );
    }

    #[test]
    fn listing_an_absent_directory_is_missing_data() {
        let (_temp, layout) = temp_layout();
        let subject: Subject = "sub-01".parse().unwrap();
        let session: Session = "ses-01".parse().unwrap();
        assert_matches!(
            list_sidecars(&layout.func_dir(&subject, &session), FUNCTIONAL_SUFFIX),
            Err(BashGenError::MissingData { .. })
        );
    }
}
