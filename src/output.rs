use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{GenerationReport, PlanReport};
use crate::domain::Subject;
use crate::error::BashGenError;

pub const SINGLE_SCRIPT_NAME: &str = "run_fmriprep.sh";

pub fn subject_script_name(subject: &Subject) -> String {
    format!("run_fmriprep_{subject}.sh")
}

pub fn group_label(subjects: &[Subject]) -> String {
    match subjects {
        [] => String::new(),
        [only] => only.to_string(),
        [first, .., last] => format!("{first}:{}", last.numeric_id()),
    }
}

pub fn group_script_name(subjects: &[Subject]) -> String {
    format!("run_fmriprep_group_{}.sh", group_label(subjects))
}

pub trait ScriptWriter {
    fn write_script(&self, path: &Utf8Path, script: &str) -> Result<(), BashGenError>;
}

impl<T: ScriptWriter + ?Sized> ScriptWriter for &T {
    fn write_script(&self, path: &Utf8Path, script: &str) -> Result<(), BashGenError> {
        (**self).write_script(path, script)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsScriptWriter;

impl ScriptWriter for FsScriptWriter {
    fn write_script(&self, path: &Utf8Path, script: &str) -> Result<(), BashGenError> {
        fs::write(path.as_std_path(), script)
            .map_err(|err| BashGenError::Filesystem(format!("write {path}: {err}")))?;
        info!("script written to {path}");

        if let Err(err) = make_executable(path) {
            warn!("error changing permissions of {path}: {err}");
        }
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Utf8Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path.as_std_path(), fs::Permissions::from_mode(0o777))
}

#[cfg(not(unix))]
fn make_executable(_path: &Utf8Path) -> io::Result<()> {
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_generation(result: &GenerationReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_plan(result: &PlanReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
