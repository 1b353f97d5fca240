mod common;

use std::sync::Mutex;

use camino::Utf8Path;

use fmriprep_bashgen::app::{App, GenerationMode};
use fmriprep_bashgen::error::BashGenError;
use fmriprep_bashgen::generator::ScriptGenerator;
use fmriprep_bashgen::output::{FsScriptWriter, ScriptWriter};

use common::Project;

#[derive(Default)]
struct RecordingWriter {
    written: Mutex<Vec<(String, String)>>,
}

impl RecordingWriter {
    fn file_names(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| Utf8Path::new(path).file_name().unwrap().to_string())
            .collect()
    }
}

impl ScriptWriter for RecordingWriter {
    fn write_script(&self, path: &Utf8Path, script: &str) -> Result<(), BashGenError> {
        let mut guard = self.written.lock().unwrap();
        guard.push((path.to_string(), script.to_string()));
        Ok(())
    }
}

fn project_with(subjects: &[&str]) -> Project {
    let project = Project::new();
    for subject in subjects {
        project.add_subject(subject);
    }
    project
}

#[test]
fn grouped_mode_names_files_by_range() {
    let subjects = ["sub-01", "sub-02", "sub-03", "sub-04"];
    let project = project_with(&subjects);
    let writer = RecordingWriter::default();

    let mut app = App::new(ScriptGenerator::new(&project.config(&subjects)), &writer);
    let report = app.generate(GenerationMode::Groups { group_size: 3 }).unwrap();

    assert_eq!(report.mode, "groups");
    assert_eq!(
        writer.file_names(),
        ["run_fmriprep_group_sub-01:03.sh", "run_fmriprep_group_sub-04.sh"]
    );
    assert_eq!(report.scripts[0].subjects.len(), 3);
    assert_eq!(report.scripts[1].subjects.len(), 1);
}

#[test]
fn sequence_mode_writes_one_script_per_subject() {
    let subjects = ["sub-01", "sub-02"];
    let project = project_with(&subjects);
    let writer = RecordingWriter::default();

    let mut app = App::new(ScriptGenerator::new(&project.config(&subjects)), &writer);
    app.generate(GenerationMode::Sequence).unwrap();

    assert_eq!(
        writer.file_names(),
        ["run_fmriprep_sub-01.sh", "run_fmriprep_sub-02.sh"]
    );
    let written = writer.written.lock().unwrap();
    assert!(written[1].1.contains("Subject: sub-02"));
    assert!(!written[1].1.contains("Subject: sub-01"));
}

#[test]
fn single_mode_writes_to_code_directory() {
    let project = project_with(&["sub-01"]);

    let mut app = App::new(
        ScriptGenerator::new(&project.config(&["sub-01"])),
        FsScriptWriter,
    );
    let report = app.generate(GenerationMode::Single).unwrap();

    let path = project.root.join("code/preprocessing/fmriprep/run_fmriprep.sh");
    assert_eq!(report.scripts[0].path, path.to_string());
    let script = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert!(script.starts_with("#! /bin/bash\n\n"));
    assert!(project.root.join("fmriprep_work/condor_log").as_std_path().is_dir());
    assert!(project.root.join("data/derivatives/fmriprep").as_std_path().is_dir());
}

#[test]
fn dry_run_plans_without_writing() {
    let project = project_with(&["sub-01", "sub-02"]);
    let sidecar = project.sidecar("sub-01", "ses-01", "func", "sub-01_ses-01_task-rest_run-01_bold.json");
    let before = std::fs::read_to_string(sidecar.as_std_path()).unwrap();
    let writer = RecordingWriter::default();

    let app = App::new(
        ScriptGenerator::new(&project.config(&["sub-01", "sub-02"])),
        &writer,
    );
    let report = app.plan(GenerationMode::Groups { group_size: 1 }).unwrap();

    assert_eq!(report.scripts.len(), 2);
    assert!(report.scripts[1].path.ends_with("run_fmriprep_group_sub-02.sh"));
    assert_eq!(report.subjects.len(), 2);
    assert!(writer.file_names().is_empty());
    assert_eq!(std::fs::read_to_string(sidecar.as_std_path()).unwrap(), before);
    assert!(!project.root.join("code").as_std_path().exists());
}
