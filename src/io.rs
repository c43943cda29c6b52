//! Reading evidence, name lists and coordinates from delimited text.
//!
//! ```text
//!   isolectic sets   language <TAB> lemma <TAB> [c1, c2, ...]
//!   name lists       one name per line, `#` comments
//!   coordinates      name <TAB> x <TAB> y
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hashbrown::HashMap;

use crate::model::EvidenceRecord;
use crate::{Error, Result};

/// Concept name → 2-D position, used only for rendering.
pub type Coordinates = BTreeMap<String, (f64, f64)>;

// ============================================================================
// Evidence
// ============================================================================

/// Parse isolectic-set rows. Duplicate rows collapse into one record.
pub fn read_evidence<R: BufRead>(reader: R, source_name: &str) -> Result<Vec<EvidenceRecord>> {
    read_evidence_with_substitutions(reader, source_name, &HashMap::new())
}

/// Like [`read_evidence`], renaming concepts found in `substitutions`.
pub fn read_evidence_with_substitutions<R: BufRead>(
    reader: R,
    source_name: &str,
    substitutions: &HashMap<String, String>,
) -> Result<Vec<EvidenceRecord>> {
    let mut records = BTreeSet::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 3 {
            return Err(Error::MalformedInput {
                source_name: source_name.to_string(),
                line: idx + 1,
                message: format!("expected language, lemma and concept list, found {} column(s)", columns.len()),
            });
        }

        let Some(list) = concept_list(columns[2]) else {
            skipped += 1;
            continue;
        };
        let concepts: BTreeSet<String> = list
            .split(", ")
            .filter(|c| !c.is_empty())
            .map(|c| substitutions.get(c).cloned().unwrap_or_else(|| c.to_string()))
            .collect();
        records.insert(EvidenceRecord { language: columns[0].to_string(), lemma: columns[1].to_string(), concepts });
    }

    tracing::debug!(source = source_name, records = records.len(), skipped, "evidence read");
    Ok(records.into_iter().collect())
}

/// Strip the enclosing brackets; `None` when the field is too short to hold
/// a concept.
fn concept_list(field: &str) -> Option<&str> {
    if field.chars().count() <= 2 {
        return None;
    }
    let mut chars = field.chars();
    chars.next();
    chars.next_back();
    Some(chars.as_str())
}

pub fn read_evidence_file(path: impl AsRef<Path>) -> Result<Vec<EvidenceRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_evidence(BufReader::new(file), &path.display().to_string())
}

// ============================================================================
// Name lists and coordinates
// ============================================================================

/// One trimmed name per line; blank lines and `#` comments are ignored.
pub fn read_name_list<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        names.push(name.to_string());
    }
    Ok(names)
}

pub fn read_name_list_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    read_name_list(BufReader::new(File::open(path)?))
}

/// `name<TAB>x<TAB>y` rows. Short rows are skipped; unparsable numbers fail.
pub fn read_coordinates<R: BufRead>(reader: R, source_name: &str) -> Result<Coordinates> {
    let mut coordinates = Coordinates::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
        if columns.len() < 3 {
            continue;
        }
        let parse = |value: &str| {
            value.parse::<f64>().map_err(|e| Error::MalformedInput {
                source_name: source_name.to_string(),
                line: idx + 1,
                message: format!("invalid coordinate {value:?}: {e}"),
            })
        };
        coordinates.insert(columns[0].to_string(), (parse(columns[1])?, parse(columns[2])?));
    }
    Ok(coordinates)
}

pub fn read_coordinates_file(path: impl AsRef<Path>) -> Result<Coordinates> {
    let path = path.as_ref();
    read_coordinates(BufReader::new(File::open(path)?), &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SETS: &str = "\
deu\tBaum\t[TREE, WOOD]
deu\tHolz\t[WOOD]
deu\tHolz\t[WOOD]
fra\tbois\t[FOREST, WOOD]
fra\t?\t[]

eng\ttree\t[TREE]
";

    #[test]
    fn test_read_evidence_collapses_and_skips() {
        let records = read_evidence(SETS.as_bytes(), "sets.tsv").unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], EvidenceRecord::new("deu", "Baum", ["TREE", "WOOD"]));
        assert!(records.iter().all(|r| !r.concepts.is_empty()));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let err = read_evidence("deu\tBaum\t[TREE]\ndeu\tHolz\n".as_bytes(), "bad.tsv").unwrap_err();
        match err {
            Error::MalformedInput { source_name, line, .. } => {
                assert_eq!(source_name, "bad.tsv");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_substitutions_merge_concepts() {
        let mut substitutions = HashMap::new();
        substitutions.insert("FOREST".to_string(), "WOOD".to_string());
        let records = read_evidence_with_substitutions(SETS.as_bytes(), "sets.tsv", &substitutions).unwrap();
        let bois = records.iter().find(|r| r.lemma == "bois").unwrap();
        assert_eq!(bois.concepts.iter().collect::<Vec<_>>(), vec!["WOOD"]);
    }

    #[test]
    fn test_name_list_ignores_comments() {
        let names = read_name_list("# vocabulary\nTREE\n\n  WOOD \n".as_bytes()).unwrap();
        assert_eq!(names, vec!["TREE".to_string(), "WOOD".to_string()]);
    }

    #[test]
    fn test_coordinates() {
        let coords = read_coordinates("TREE\t1.5\t-2\nshort\t1\nWOOD\t0\t0\n".as_bytes(), "xy.tsv").unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords["TREE"], (1.5, -2.0));
        assert!(read_coordinates("TREE\tx\t1\n".as_bytes(), "xy.tsv").is_err());
    }
}
