#![allow(dead_code)]

use std::fs;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use fmriprep_bashgen::config::ResolvedConfig;
use fmriprep_bashgen::domain::{FieldmapGroupTable, default_sessions};
use fmriprep_bashgen::template::FmriprepTemplate;

/// A temporary project directory with a BIDS tree under `data/`.
pub struct Project {
    pub temp: TempDir,
    pub root: Utf8PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        Self { temp, root }
    }

    pub fn sidecar(&self, subject: &str, session: &str, kind: &str, name: &str) -> Utf8PathBuf {
        self.root
            .join("data")
            .join(subject)
            .join(session)
            .join(kind)
            .join(name)
    }

    pub fn write_sidecar(&self, subject: &str, session: &str, kind: &str, name: &str, body: &str) {
        let path = self.sidecar(subject, session, kind, name);
        fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
        fs::write(path.as_std_path(), body).unwrap();
    }

    /// Two functional runs (01 and 05) and two field maps per session.
    pub fn add_subject(&self, subject: &str) {
        for session in ["ses-01", "ses-02"] {
            for run in ["01", "05"] {
                self.write_sidecar(
                    subject,
                    session,
                    "func",
                    &format!("{subject}_{session}_task-rest_run-{run}_bold.json"),
                    r#"{"RepetitionTime": 2.0, "TaskName": "rest"}"#,
                );
            }
            for run in ["01", "02"] {
                self.write_sidecar(
                    subject,
                    session,
                    "fmap",
                    &format!("{subject}_{session}_dir-AP_run-{run}_epi.json"),
                    r#"{"PhaseEncodingDirection": "j-", "IntendedFor": []}"#,
                );
            }
        }
    }

    pub fn read_json(&self, path: &Utf8PathBuf) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path.as_std_path()).unwrap()).unwrap()
    }

    pub fn config(&self, subjects: &[&str]) -> ResolvedConfig {
        ResolvedConfig {
            subjects: subjects.iter().map(|s| s.parse().unwrap()).collect(),
            sessions: default_sessions(),
            project_dir: self.root.clone(),
            fieldmap_groups: FieldmapGroupTable::default(),
            template: FmriprepTemplate::default(),
        }
    }
}
