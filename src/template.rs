use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::Subject;

pub const KERNEL: &str = "#! /bin/bash\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmriprepTemplate {
    pub container: String,
    pub freesurfer_dir: String,
    pub license_file: String,
    pub output_spaces: Vec<String>,
}

impl Default for FmriprepTemplate {
    fn default() -> Self {
        Self {
            container: "/data/p_SoftwareServiceLinux_sc/fmriprep/22.0.1/1".to_string(),
            freesurfer_dir: "/afs/cbs/software/freesurfer/".to_string(),
            license_file: "/afs/cbs/software/freesurfer/licensekeys".to_string(),
            output_spaces: vec!["T1w".to_string(), "MNI152NLin6Asym".to_string()],
        }
    }
}

impl FmriprepTemplate {
    pub fn render(
        &self,
        subject: &Subject,
        bids_dir: &Utf8Path,
        derivatives_dir: &Utf8Path,
        work_dir: &Utf8Path,
        subject_work_dir: &Utf8Path,
    ) -> String {
        let mut out = String::new();
        out.push_str(&format!("echo \"Subject: {subject}\"\n"));
        out.push_str("echo \"Clearing fmriprep working directory...\"\n");
        out.push_str(&format!("rm -rf {subject_work_dir}\n\n"));

        out.push_str(&format!(
            "singularity run --cleanenv -B {bids_dir}/,{derivatives_dir}/,{work_dir}/,{} {} ",
            self.freesurfer_dir, self.container
        ));
        out.push_str(&format!("{bids_dir}/ {derivatives_dir}/ "));
        out.push_str(&format!(
            "participant --participant-label {} ",
            subject.numeric_id()
        ));
        out.push_str(&format!(
            "--use-aroma --output-spaces {} ",
            self.output_spaces.join(" ")
        ));
        out.push_str(&format!(
            "--dummy-scans 0 --fs-license-file {} ",
            self.license_file
        ));
        out.push_str(&format!(
            "--fs-no-reconall -w {subject_work_dir} --clean-workdir "
        ));
        out.push_str(
            "--write-graph --stop-on-first-crash --notrack --verbose --skip-bids-validation\n\n",
        );

        out.push_str("echo \"Fmriprep done. Removing fmriprep working directory...\"\n");
        out.push_str(&format!("rm -rf {subject_work_dir}\n\n"));
        out
    }
}
