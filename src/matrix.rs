//! Decoding of matrix-style profiles.
//!
//! A matrix-style profile stores one delimiter-joined value string per gene.
//! Position `i` of that string belongs to whichever internal sample key sits
//! at position `i` of the profile's ordered sample index. Rows are decoded
//! against a [`ResolvedColumns`] table built once per request, so every row
//! of a profile is read through that profile's own index.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{
    CohortId, EncodedRow, InternalKey, OrderedSampleIndex, ProfileId, SampleId, ValueDatum,
};
use crate::error::KiraError;
use crate::repository::{MatrixStore, SampleDirectory};
use crate::scope::{ResolvedScope, SampleScope};

pub const DEFAULT_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeFaultKind {
    /// A value position has no column in the profile's index.
    MissingColumn,
    /// The column's internal key does not resolve to a stable sample id.
    UnmappedSampleKey { key: InternalKey },
    /// An index token is not a numeric internal key.
    MalformedIndexToken { token: String },
}

/// Upstream index or data corruption; the offending position is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeFault {
    pub genetic_profile_id: ProfileId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrez_gene_id: Option<i64>,
    pub position: usize,
    #[serde(flatten)]
    pub kind: DecodeFaultKind,
}

impl DecodeFault {
    fn log(self) -> Self {
        warn!(
            profile = %self.genetic_profile_id,
            gene = self.entrez_gene_id,
            position = self.position,
            kind = ?self.kind,
            "decode fault"
        );
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Empty index token: a withdrawn or placeholder column.
    Withdrawn,
    Key(InternalKey),
}

/// Per-profile position -> internal key table.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    profiles: HashMap<ProfileId, Vec<Slot>>,
    faults: Vec<DecodeFault>,
}

impl ColumnIndex {
    pub fn build(indices: &[OrderedSampleIndex], delimiter: char) -> Self {
        let mut index = ColumnIndex::default();
        for entry in indices {
            if index.profiles.contains_key(&entry.genetic_profile_id) {
                warn!(
                    profile = %entry.genetic_profile_id,
                    "duplicate ordered sample index, keeping the first"
                );
                continue;
            }
            let mut slots = Vec::new();
            for (position, token) in entry.ordered_sample_list.split(delimiter).enumerate() {
                if token.trim().is_empty() {
                    slots.push(Slot::Withdrawn);
                    continue;
                }
                match token.parse::<InternalKey>() {
                    Ok(key) => slots.push(Slot::Key(key)),
                    Err(_) => {
                        index.faults.push(
                            DecodeFault {
                                genetic_profile_id: entry.genetic_profile_id.clone(),
                                entrez_gene_id: None,
                                position,
                                kind: DecodeFaultKind::MalformedIndexToken {
                                    token: token.to_string(),
                                },
                            }
                            .log(),
                        );
                        slots.push(Slot::Withdrawn);
                    }
                }
            }
            index
                .profiles
                .insert(entry.genetic_profile_id.clone(), slots);
        }
        index
    }

    /// Every internal key referenced by any profile, deduplicated and sorted.
    pub fn internal_keys(&self) -> Vec<InternalKey> {
        self.profiles
            .values()
            .flatten()
            .filter_map(|slot| match slot {
                Slot::Key(key) => Some(*key),
                Slot::Withdrawn => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[cfg(test)]
    fn width(&self, profile: &ProfileId) -> Option<usize> {
        self.profiles.get(profile).map(Vec::len)
    }

    pub fn resolve(self, stable_ids: &HashMap<InternalKey, SampleId>) -> ResolvedColumns {
        let profiles = self
            .profiles
            .into_iter()
            .map(|(profile, slots)| {
                let columns = slots
                    .into_iter()
                    .map(|slot| match slot {
                        Slot::Withdrawn => Column::Withdrawn,
                        Slot::Key(key) => match stable_ids.get(&key) {
                            Some(sample) => Column::Sample(sample.clone()),
                            None => Column::Unmapped(key),
                        },
                    })
                    .collect();
                (profile, columns)
            })
            .collect();
        ResolvedColumns {
            profiles,
            faults: self.faults,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    Withdrawn,
    Sample(SampleId),
    Unmapped(InternalKey),
}

/// Column tables with internal keys translated to stable sample ids.
#[derive(Debug, Clone, Default)]
pub struct ResolvedColumns {
    profiles: HashMap<ProfileId, Vec<Column>>,
    faults: Vec<DecodeFault>,
}

impl ResolvedColumns {
    /// Decodes `rows`, keeping in-scope values and recording faults.
    pub fn decode(
        &self,
        rows: &[EncodedRow],
        scope: &SampleScope,
        cohort: Option<&CohortId>,
        delimiter: char,
    ) -> MatrixDecode {
        let mut decoded = MatrixDecode {
            data: Vec::new(),
            faults: self.faults.clone(),
        };
        for row in rows {
            let columns = self
                .profiles
                .get(&row.genetic_profile_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (position, token) in row.values.split(delimiter).enumerate() {
                if token.is_empty() {
                    continue;
                }
                let fault = |kind: DecodeFaultKind| {
                    DecodeFault {
                        genetic_profile_id: row.genetic_profile_id.clone(),
                        entrez_gene_id: Some(row.gene.entrez_gene_id),
                        position,
                        kind,
                    }
                    .log()
                };
                match columns.get(position) {
                    Some(Column::Withdrawn) => {}
                    Some(Column::Sample(sample)) => {
                        if scope.contains(sample) {
                            decoded.data.push(ValueDatum {
                                sample_id: sample.clone(),
                                genetic_profile_id: row.genetic_profile_id.clone(),
                                study_id: row.study_id.clone(),
                                gene: row.gene.clone(),
                                profile_data: token.to_string(),
                                cohort_id: cohort.cloned(),
                            });
                        }
                    }
                    Some(Column::Unmapped(key)) => decoded
                        .faults
                        .push(fault(DecodeFaultKind::UnmappedSampleKey { key: *key })),
                    None => decoded.faults.push(fault(DecodeFaultKind::MissingColumn)),
                }
            }
        }
        decoded
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixDecode {
    pub data: Vec<ValueDatum>,
    pub faults: Vec<DecodeFault>,
}

/// Fetches rows and indices for matrix-style `profiles`, translates the
/// referenced internal keys in one batch and decodes every row.
pub fn decode_matrix_data<S>(
    store: &S,
    profiles: &[ProfileId],
    genes: &[i64],
    scope: &ResolvedScope,
    delimiter: char,
) -> Result<MatrixDecode, KiraError>
where
    S: MatrixStore + SampleDirectory + ?Sized,
{
    if profiles.is_empty() {
        return Ok(MatrixDecode::default());
    }

    let requested = profiles.iter().collect::<HashSet<_>>();
    let rows = store
        .encoded_rows(profiles, genes)?
        .into_iter()
        .filter(|row| requested.contains(&row.genetic_profile_id))
        .collect::<Vec<_>>();
    let indices = store
        .ordered_sample_indices(profiles)?
        .into_iter()
        .filter(|entry| requested.contains(&entry.genetic_profile_id))
        .collect::<Vec<_>>();

    let index = ColumnIndex::build(&indices, delimiter);
    let keys = index.internal_keys();
    let stable_ids = if keys.is_empty() {
        HashMap::new()
    } else {
        store.stable_ids(&keys)?
    };
    debug!(
        rows = rows.len(),
        indices = indices.len(),
        keys = keys.len(),
        resolved = stable_ids.len(),
        "decoding matrix profiles"
    );

    let columns = index.resolve(&stable_ids);
    Ok(columns.decode(&rows, &scope.scope, scope.cohort.as_ref(), delimiter))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::Gene;

    fn profile(id: &str) -> ProfileId {
        id.parse().unwrap()
    }

    fn sample(id: &str) -> SampleId {
        id.parse().unwrap()
    }

    fn row(profile_id: &str, entrez: i64, values: &str) -> EncodedRow {
        EncodedRow {
            genetic_profile_id: profile(profile_id),
            study_id: "brca".parse().unwrap(),
            gene: Gene {
                hugo_gene_symbol: format!("G{entrez}"),
                entrez_gene_id: entrez,
            },
            values: values.to_string(),
        }
    }

    fn index(profile_id: &str, list: &str) -> OrderedSampleIndex {
        OrderedSampleIndex {
            genetic_profile_id: profile(profile_id),
            ordered_sample_list: list.to_string(),
        }
    }

    fn translation() -> HashMap<InternalKey, SampleId> {
        [(101, "SAMPLE-A"), (102, "SAMPLE-B"), (103, "SAMPLE-C")]
            .into_iter()
            .map(|(key, id)| (InternalKey::new(key), sample(id)))
            .collect()
    }

    fn decoded_pairs(decode: &MatrixDecode) -> Vec<(String, String)> {
        decode
            .data
            .iter()
            .map(|datum| (datum.sample_id.to_string(), datum.profile_data.clone()))
            .collect()
    }

    #[test]
    fn skips_empty_values_and_withdrawn_columns() {
        let columns =
            ColumnIndex::build(&[index("p1", "101,102,,103")], ',').resolve(&translation());
        let decode = columns.decode(&[row("p1", 1, "5,,7,8")], &SampleScope::All, None, ',');
        assert_eq!(
            decoded_pairs(&decode),
            vec![
                ("SAMPLE-A".to_string(), "5".to_string()),
                ("SAMPLE-C".to_string(), "8".to_string())
            ]
        );
        assert!(decode.faults.is_empty());
    }

    #[test]
    fn scope_filters_decoded_values() {
        let columns =
            ColumnIndex::build(&[index("p1", "101,102,,103")], ',').resolve(&translation());
        let scope = SampleScope::Only(BTreeSet::from([sample("SAMPLE-C")]));
        let cohort: CohortId = "brca_all".parse().unwrap();
        let decode = columns.decode(&[row("p1", 1, "5,,7,8")], &scope, Some(&cohort), ',');
        assert_eq!(decode.data.len(), 1);
        assert_eq!(decode.data[0].sample_id, sample("SAMPLE-C"));
        assert_eq!(decode.data[0].cohort_id, Some(cohort));
    }

    #[test]
    fn indices_are_never_shared_across_profiles() {
        let columns = ColumnIndex::build(&[index("p1", "101,102"), index("p2", "102,101")], ',')
            .resolve(&translation());
        let decode = columns.decode(
            &[row("p1", 1, "x,y"), row("p2", 1, "x,y")],
            &SampleScope::All,
            None,
            ',',
        );
        assert_eq!(
            decoded_pairs(&decode),
            vec![
                ("SAMPLE-A".to_string(), "x".to_string()),
                ("SAMPLE-B".to_string(), "y".to_string()),
                ("SAMPLE-B".to_string(), "x".to_string()),
                ("SAMPLE-A".to_string(), "y".to_string())
            ]
        );
    }

    #[test]
    fn positions_beyond_index_are_faults() {
        let columns = ColumnIndex::build(&[index("p1", "101")], ',').resolve(&translation());
        let decode = columns.decode(&[row("p1", 7, "1,2,")], &SampleScope::All, None, ',');
        assert_eq!(decode.data.len(), 1);
        assert_eq!(
            decode.faults,
            vec![DecodeFault {
                genetic_profile_id: profile("p1"),
                entrez_gene_id: Some(7),
                position: 1,
                kind: DecodeFaultKind::MissingColumn,
            }]
        );
    }

    #[test]
    fn unmapped_and_malformed_keys_are_faults() {
        let columns = ColumnIndex::build(&[index("p1", "101,999,abc")], ',').resolve(&translation());
        let decode = columns.decode(&[row("p1", 1, "1,2,3")], &SampleScope::All, None, ',');
        assert_eq!(decode.data.len(), 1);
        let kinds = decode
            .faults
            .iter()
            .map(|fault| fault.kind.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                DecodeFaultKind::MalformedIndexToken {
                    token: "abc".to_string()
                },
                DecodeFaultKind::UnmappedSampleKey {
                    key: InternalKey::new(999)
                },
            ]
        );
    }

    #[test]
    fn row_without_index_faults_every_value() {
        let columns = ColumnIndex::default().resolve(&translation());
        let decode = columns.decode(&[row("p9", 1, "1,,3")], &SampleScope::All, None, ',');
        assert!(decode.data.is_empty());
        assert_eq!(decode.faults.len(), 2);
    }

    #[test]
    fn decoding_is_repeatable() {
        let columns =
            ColumnIndex::build(&[index("p1", "101,102,,103")], ',').resolve(&translation());
        let rows = [row("p1", 1, "5,,7,8"), row("p1", 2, "1,2,3,4")];
        let first = columns.decode(&rows, &SampleScope::All, None, ',');
        let second = columns.decode(&rows, &SampleScope::All, None, ',');
        assert_eq!(first, second);
    }

    #[test]
    fn internal_keys_are_deduplicated() {
        let index = ColumnIndex::build(&[index("p1", "103,101,,"), index("p2", "101,102")], ',');
        assert_eq!(
            index.internal_keys(),
            vec![
                InternalKey::new(101),
                InternalKey::new(102),
                InternalKey::new(103)
            ]
        );
        assert_eq!(index.width(&profile("p1")), Some(4));
    }
}
