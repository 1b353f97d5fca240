use camino::Utf8PathBuf;
use serde::Serialize;

use crate::domain::Subject;
use crate::error::BashGenError;
use crate::generator::{ScriptGenerator, SubjectPlan};
use crate::output::{SINGLE_SCRIPT_NAME, ScriptWriter, group_script_name, subject_script_name};

pub const DEFAULT_GROUP_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Single,
    Sequence,
    Groups { group_size: usize },
}

impl GenerationMode {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationMode::Single => "single",
            GenerationMode::Sequence => "sequence",
            GenerationMode::Groups { .. } => "groups",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptEntry {
    pub path: String,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub mode: String,
    pub generated_at: String,
    pub project_dir: String,
    pub scripts: Vec<ScriptEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub mode: String,
    pub project_dir: String,
    pub scripts: Vec<ScriptEntry>,
    pub subjects: Vec<SubjectPlan>,
}

pub struct App<W: ScriptWriter> {
    generator: ScriptGenerator,
    writer: W,
}

impl<W: ScriptWriter> App<W> {
    pub fn new(generator: ScriptGenerator, writer: W) -> Self {
        Self { generator, writer }
    }

    pub fn generate(&mut self, mode: GenerationMode) -> Result<GenerationReport, BashGenError> {
        let code_dir = self.generator.ensure_directories()?.code_dir().to_owned();
        let outputs: Vec<(Utf8PathBuf, Vec<Subject>, String)> = match mode {
            GenerationMode::Single => {
                let script = self.generator.generate_concatenated()?;
                vec![(
                    code_dir.join(SINGLE_SCRIPT_NAME),
                    self.generator.subjects().to_vec(),
                    script,
                )]
            }
            GenerationMode::Sequence => self
                .generator
                .generate_per_subject()?
                .into_iter()
                .map(|item| {
                    (
                        code_dir.join(subject_script_name(&item.subject)),
                        vec![item.subject],
                        item.script,
                    )
                })
                .collect(),
            GenerationMode::Groups { group_size } => self
                .generator
                .generate_grouped(group_size)?
                .into_iter()
                .map(|batch| {
                    (
                        code_dir.join(group_script_name(&batch.subjects)),
                        batch.subjects,
                        batch.script,
                    )
                })
                .collect(),
        };

        let mut scripts = Vec::with_capacity(outputs.len());
        for (path, subjects, script) in outputs {
            self.writer.write_script(&path, &script)?;
            scripts.push(ScriptEntry {
                path: path.to_string(),
                subjects,
            });
        }

        Ok(GenerationReport {
            mode: mode.name().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            project_dir: self.generator.layout().project_dir().to_string(),
            scripts,
        })
    }

    pub fn plan(&self, mode: GenerationMode) -> Result<PlanReport, BashGenError> {
        let layout = self.generator.layout();
        let subjects = self.generator.subjects();
        let entry = |name: String, subjects: &[Subject]| ScriptEntry {
            path: layout.code_dir().join(name).to_string(),
            subjects: subjects.to_vec(),
        };
        let scripts = match mode {
            GenerationMode::Single => vec![entry(SINGLE_SCRIPT_NAME.to_string(), subjects)],
            GenerationMode::Sequence => subjects
                .iter()
                .map(|subject| entry(subject_script_name(subject), std::slice::from_ref(subject)))
                .collect(),
            GenerationMode::Groups { group_size } => {
                if group_size == 0 {
                    return Err(BashGenError::InvalidGroupSize(group_size));
                }
                subjects
                    .chunks(group_size)
                    .map(|chunk| entry(group_script_name(chunk), chunk))
                    .collect()
            }
        };

        Ok(PlanReport {
            mode: mode.name().to_string(),
            project_dir: layout.project_dir().to_string(),
            scripts,
            subjects: self.generator.plan_all()?,
        })
    }
}
