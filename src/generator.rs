use serde::Serialize;
use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::domain::{FieldmapGroupTable, Session, Subject};
use crate::error::BashGenError;
use crate::layout::DirectoryLayout;
use crate::sidecar::{SidecarPlan, SidecarUpdater};
use crate::template::{FmriprepTemplate, KERNEL};

#[derive(Debug, Clone)]
enum DirectoryState {
    Pending(DirectoryLayout),
    Ready(DirectoryLayout),
}

impl DirectoryState {
    fn layout(&self) -> &DirectoryLayout {
        match self {
            DirectoryState::Pending(layout) | DirectoryState::Ready(layout) => layout,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectPlan {
    pub subject: Subject,
    pub sidecars: SidecarPlan,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectScript {
    pub subject: Subject,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptBatch {
    pub subjects: Vec<Subject>,
    pub script: String,
}

pub struct ScriptGenerator {
    subjects: Vec<Subject>,
    sessions: Vec<Session>,
    fieldmaps: FieldmapGroupTable,
    template: FmriprepTemplate,
    directories: DirectoryState,
}

impl ScriptGenerator {
    pub fn new(config: &ResolvedConfig) -> Self {
        info!(
            "subjects are: {}",
            config
                .subjects
                .iter()
                .map(Subject::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            subjects: config.subjects.clone(),
            sessions: config.sessions.clone(),
            fieldmaps: config.fieldmap_groups.clone(),
            template: config.template.clone(),
            directories: DirectoryState::Pending(DirectoryLayout::new(config.project_dir.clone())),
        }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn layout(&self) -> &DirectoryLayout {
        self.directories.layout()
    }

    pub fn directories_ready(&self) -> bool {
        matches!(self.directories, DirectoryState::Ready(_))
    }

    pub fn ensure_directories(&mut self) -> Result<&DirectoryLayout, BashGenError> {
        if let DirectoryState::Pending(layout) = &self.directories {
            layout.materialize()?;
            let layout = layout.clone();
            self.directories = DirectoryState::Ready(layout);
        }
        Ok(self.directories.layout())
    }

    pub fn plan_subject(&self, subject: &Subject) -> Result<SubjectPlan, BashGenError> {
        let layout = self.layout();
        let sidecars = SidecarUpdater::new(layout, &self.sessions, &self.fieldmaps).plan(subject)?;
        debug!("generating bash for {subject}");
        let script = self.template.render(
            subject,
            layout.bids_dir(),
            layout.derivatives_dir(),
            layout.work_dir(),
            &layout.subject_work_dir(subject),
        );
        Ok(SubjectPlan {
            subject: subject.clone(),
            sidecars,
            script,
        })
    }

    pub fn plan_all(&self) -> Result<Vec<SubjectPlan>, BashGenError> {
        self.subjects
            .iter()
            .map(|subject| self.plan_subject(subject))
            .collect()
    }

    pub fn apply(&mut self, plan: SubjectPlan) -> Result<String, BashGenError> {
        self.ensure_directories()?;
        plan.sidecars.apply()?;
        Ok(plan.script)
    }

    pub fn process(&mut self, subject: &Subject) -> Result<String, BashGenError> {
        self.ensure_directories()?;
        let plan = self.plan_subject(subject)?;
        self.apply(plan)
    }

    /// Processes subjects one at a time as the iterator is consumed.
    pub fn iterate_all(&mut self) -> impl Iterator<Item = Result<String, BashGenError>> + '_ {
        let subjects = self.subjects.clone();
        subjects
            .into_iter()
            .map(move |subject| self.process(&subject))
    }

    pub fn generate_concatenated(&mut self) -> Result<String, BashGenError> {
        let mut out = KERNEL.to_string();
        for script in self.iterate_all() {
            out.push_str(&script?);
        }
        Ok(out)
    }

    pub fn generate_per_subject(&mut self) -> Result<Vec<SubjectScript>, BashGenError> {
        let subjects = self.subjects.clone();
        subjects
            .into_iter()
            .map(|subject| {
                let script = self.process(&subject)?;
                Ok(SubjectScript {
                    subject,
                    script: format!("{KERNEL}{script}"),
                })
            })
            .collect()
    }

    pub fn generate_grouped(&mut self, group_size: usize) -> Result<Vec<ScriptBatch>, BashGenError> {
        if group_size == 0 {
            return Err(BashGenError::InvalidGroupSize(group_size));
        }
        let scripts = self.iterate_all().collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .subjects
            .chunks(group_size)
            .zip(scripts.chunks(group_size))
            .map(|(subjects, scripts)| ScriptBatch {
                subjects: subjects.to_vec(),
                script: format!("{KERNEL}{}", scripts.concat()),
            })
            .collect())
    }
}
