use crate::domain::{FieldmapGroupTable, RunNumber};
use crate::error::BashGenError;

pub fn resolve<'a>(run: &RunNumber, table: &'a FieldmapGroupTable) -> Result<&'a str, BashGenError> {
    table
        .groups()
        .find(|(_, runs)| runs.iter().any(|member| member == run.as_str()))
        .map(|(group, _)| group)
        .ok_or_else(|| BashGenError::Lookup {
            run: run.as_str().to_string(),
        })
}
