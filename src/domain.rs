use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BashGenError;
use crate::parse::extract_numeric_id;

pub const SUBJECT_PATTERN: &str = r"sub-(\d+)";
pub const SESSION_PATTERN: &str = r"ses-(\d+)";
pub const RUN_PATTERN: &str = r"run-(\d+)";

pub const B0_IDENTIFIER_PREFIX: &str = "pepolarfmap";

static SUBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SUBJECT_PATTERN).expect("subject pattern compiles"));
static SESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SESSION_PATTERN).expect("session pattern compiles"));
static RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RUN_PATTERN).expect("run pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject {
    label: String,
    id: String,
}

impl Subject {
    pub fn from_number(number: u32) -> Self {
        let id = format!("{number:02}");
        Self {
            label: format!("sub-{id}"),
            id,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }

    pub fn numeric_id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl FromStr for Subject {
    type Err = BashGenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let label = value.trim().to_string();
        let id = extract_numeric_id(&label, &SUBJECT_RE)?;
        Ok(Self { label, id })
    }
}

impl TryFrom<String> for Subject {
    type Error = BashGenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Session {
    label: String,
    id: String,
}

impl Session {
    pub fn as_str(&self) -> &str {
        &self.label
    }

    pub fn numeric_id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl FromStr for Session {
    type Err = BashGenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let label = value.trim().to_string();
        let id = extract_numeric_id(&label, &SESSION_RE)?;
        Ok(Self { label, id })
    }
}

impl TryFrom<String> for Session {
    type Error = BashGenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Session> for String {
    fn from(value: Session) -> Self {
        value.label
    }
}

pub fn default_sessions() -> Vec<Session> {
    ["ses-01", "ses-02"]
        .into_iter()
        .map(|label| Session {
            label: label.to_string(),
            id: label.trim_start_matches("ses-").to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunNumber(String);

impl RunNumber {
    pub fn from_filename(filename: &str) -> Result<Self, BashGenError> {
        extract_numeric_id(filename, &RUN_RE).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldmapGroupTable(BTreeMap<String, Vec<String>>);

impl FieldmapGroupTable {
    pub fn new(groups: BTreeMap<String, Vec<String>>) -> Self {
        Self(groups)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(group, runs)| (group.as_str(), runs.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FieldmapGroupTable {
    fn default() -> Self {
        let groups = [
            ("01", &["01", "02", "03"][..]),
            ("02", &["04", "05", "06"][..]),
            ("03", &["07", "08", "09", "10"][..]),
        ]
        .into_iter()
        .map(|(group, runs)| {
            (
                group.to_string(),
                runs.iter().map(|run| run.to_string()).collect(),
            )
        })
        .collect();
        Self(groups)
    }
}

impl<const N: usize> From<[(&str, &[&str]); N]> for FieldmapGroupTable {
    fn from(entries: [(&str, &[&str]); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(group, runs)| {
                    (
                        group.to_string(),
                        runs.iter().map(|run| run.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Cross-reference value written to both sides of a functional/field-map pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct B0Identifier(String);

impl B0Identifier {
    pub fn compose(subject: &Subject, session: &Session, suffix: &str) -> Self {
        Self(format!(
            "{B0_IDENTIFIER_PREFIX}{}{}{suffix}",
            subject.numeric_id(),
            session.numeric_id()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for B0Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
