use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Subject;
use crate::error::BashGenError;

pub const SUBJECT_RANGE_PATTERN: &str = r"sub-\d{2}:\d{2}";

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern compiles"));

pub fn range_pattern(pattern: &str) -> Result<Regex, BashGenError> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|err| BashGenError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

pub fn expand_range(token: &str) -> Result<Vec<Subject>, BashGenError> {
    let numbers = DIGITS_RE
        .find_iter(token)
        .map(|m| {
            m.as_str()
                .parse::<u32>()
                .map_err(|_| BashGenError::Format(format!("invalid range: {token}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let [start, end] = numbers[..] else {
        return Err(BashGenError::Format(format!("invalid range: {token}")));
    };
    if start > end {
        return Err(BashGenError::Format(format!(
            "reversed range: {token} ({start} > {end})"
        )));
    }

    Ok((start..=end).map(Subject::from_number).collect())
}

pub fn expand_subset<S: AsRef<str>>(
    tokens: &[S],
    range_pattern: &Regex,
) -> Result<BTreeSet<Subject>, BashGenError> {
    let mut out = BTreeSet::new();
    for token in tokens {
        let token = token.as_ref();
        if let Some(found) = range_pattern.find(token) {
            // a range must span the whole token
            if found.end() != token.len() {
                return Err(BashGenError::Format(format!("invalid range: {token}")));
            }
            out.extend(expand_range(token)?);
        } else {
            out.insert(token.parse()?);
        }
    }
    Ok(out)
}

pub fn select_subjects<S: AsRef<str>>(
    included: &[S],
    excluded: &[S],
    range_pattern: &Regex,
) -> Result<Vec<Subject>, BashGenError> {
    let included = expand_subset(included, range_pattern)?;
    let excluded = expand_subset(excluded, range_pattern)?;
    Ok(included.difference(&excluded).cloned().collect())
}

pub fn extract_numeric_id(label: &str, capture_pattern: &Regex) -> Result<String, BashGenError> {
    capture_pattern
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| BashGenError::NotFound {
            pattern: capture_pattern.as_str().to_string(),
            input: label.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn labels(subjects: &[Subject]) -> Vec<&str> {
        subjects.iter().map(Subject::as_str).collect()
    }

    #[test]
    fn expand_simple_range() {
        let subjects = expand_range("sub-01:03").unwrap();
        assert_eq!(labels(&subjects), ["sub-01", "sub-02", "sub-03"]);
    }

    #[test]
    fn expand_single_element_range() {
        let subjects = expand_range("sub-05:05").unwrap();
        assert_eq!(labels(&subjects), ["sub-05"]);
    }

    #[test]
    fn expand_rejects_wrong_arity() {
        assert_matches!(expand_range("sub-01"), Err(BashGenError::Format(_)));
        assert_matches!(expand_range("sub-01:02:03"), Err(BashGenError::Format(_)));
    }

    #[test]
    fn expand_rejects_reversed_range() {
        assert_matches!(expand_range("sub-05:02"), Err(BashGenError::Format(_)));
    }

    #[test]
    fn range_pattern_is_anchored() {
        let re = range_pattern(SUBJECT_RANGE_PATTERN).unwrap();
        assert!(re.is_match("sub-01:03"));
        assert!(!re.is_match("xsub-01:03"));
    }

    #[test]
    fn trailing_text_after_range_is_rejected() {
        let re = range_pattern(SUBJECT_RANGE_PATTERN).unwrap();
        assert_matches!(
            expand_subset(&["sub-00:4000000000"], &re),
            Err(BashGenError::Format(_))
        );
        assert_matches!(
            expand_subset(&["sub-01:02:03"], &re),
            Err(BashGenError::Format(_))
        );
    }

    #[test]
    fn invalid_range_pattern() {
        assert_matches!(
            range_pattern("sub-(\\d"),
            Err(BashGenError::InvalidPattern { .. })
        );
    }

    #[test]
    fn numeric_id_missing() {
        let re = Regex::new(r"ses-(\d+)").unwrap();
        assert_matches!(
            extract_numeric_id("session-one", &re),
            Err(BashGenError::NotFound { .. })
        );
    }
}
