use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::domain::{Session, Subject};
use crate::error::BashGenError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    project_dir: Utf8PathBuf,
    bids_dir: Utf8PathBuf,
    derivatives_dir: Utf8PathBuf,
    code_dir: Utf8PathBuf,
    work_dir: Utf8PathBuf,
}

impl DirectoryLayout {
    pub fn new(project_dir: impl Into<Utf8PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let bids_dir = project_dir.join("data");
        let derivatives_dir = bids_dir.join("derivatives");
        let code_dir = project_dir
            .join("code")
            .join("preprocessing")
            .join("fmriprep");
        let work_dir = project_dir.join("fmriprep_work");
        Self {
            project_dir,
            bids_dir,
            derivatives_dir,
            code_dir,
            work_dir,
        }
    }

    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }

    pub fn bids_dir(&self) -> &Utf8Path {
        &self.bids_dir
    }

    pub fn derivatives_dir(&self) -> &Utf8Path {
        &self.derivatives_dir
    }

    pub fn fmriprep_derivatives_dir(&self) -> Utf8PathBuf {
        self.derivatives_dir.join("fmriprep")
    }

    pub fn code_dir(&self) -> &Utf8Path {
        &self.code_dir
    }

    pub fn work_dir(&self) -> &Utf8Path {
        &self.work_dir
    }

    pub fn condor_log_dir(&self) -> Utf8PathBuf {
        self.work_dir.join("condor_log")
    }

    pub fn subject_work_dir(&self, subject: &Subject) -> Utf8PathBuf {
        self.work_dir
            .join("fmriprep_wf")
            .join(format!("single_subject_{}_wf", subject.numeric_id()))
    }

    pub fn func_dir(&self, subject: &Subject, session: &Session) -> Utf8PathBuf {
        self.session_dir(subject, session).join("func")
    }

    pub fn fmap_dir(&self, subject: &Subject, session: &Session) -> Utf8PathBuf {
        self.session_dir(subject, session).join("fmap")
    }

    fn session_dir(&self, subject: &Subject, session: &Session) -> Utf8PathBuf {
        self.bids_dir.join(subject.as_str()).join(session.as_str())
    }

    pub fn materialize(&self) -> Result<(), BashGenError> {
        debug!("setting up directories in {}", self.project_dir);
        for dir in [
            self.bids_dir.clone(),
            self.code_dir.clone(),
            self.derivatives_dir.clone(),
            self.work_dir.clone(),
            self.fmriprep_derivatives_dir(),
            self.condor_log_dir(),
        ] {
            ensure_dir(&dir)?;
        }
        debug!("directories set up");
        Ok(())
    }
}

pub fn ensure_dir(path: &Utf8Path) -> Result<(), BashGenError> {
    if path.as_std_path().is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path.as_std_path())
        .map_err(|err| BashGenError::Filesystem(format!("create {path}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = DirectoryLayout::new("/study");
        let subject: Subject = "sub-04".parse().unwrap();
        let session: Session = "ses-02".parse().unwrap();

        assert_eq!(layout.bids_dir().as_str(), "/study/data");
        assert_eq!(layout.derivatives_dir().as_str(), "/study/data/derivatives");
        assert_eq!(layout.code_dir().as_str(), "/study/code/preprocessing/fmriprep");
        assert_eq!(layout.condor_log_dir().as_str(), "/study/fmriprep_work/condor_log");
        assert!(
            layout
                .subject_work_dir(&subject)
                .ends_with("fmriprep_wf/single_subject_04_wf")
        );
        assert_eq!(
            layout.fmap_dir(&subject, &session).as_str(),
            "/study/data/sub-04/ses-02/fmap"
        );
    }

    #[test]
    fn materialize_creates_shared_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let layout = DirectoryLayout::new(root);
        layout.materialize().unwrap();

        assert!(layout.fmriprep_derivatives_dir().as_std_path().is_dir());
        assert!(layout.code_dir().as_std_path().is_dir());
        assert!(layout.condor_log_dir().as_std_path().is_dir());
        layout.materialize().unwrap();
    }
}
