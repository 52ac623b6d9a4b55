use tracing::debug;

use crate::domain::{MutationDatum, ProfileId};
use crate::error::KiraError;
use crate::repository::MutationStore;
use crate::scope::ResolvedScope;

/// Mutation records for mutation-style profiles. A cohort alone is pushed
/// down to the store; any explicit sample list goes through the by-sample
/// query with the full resolved scope.
pub fn fetch_mutation_data<S>(
    store: &S,
    profiles: &[ProfileId],
    genes: &[i64],
    scope: &ResolvedScope,
) -> Result<Vec<MutationDatum>, KiraError>
where
    S: MutationStore + ?Sized,
{
    if profiles.is_empty() {
        return Ok(Vec::new());
    }

    let data = match (&scope.cohort, scope.has_explicit_samples) {
        (None, false) => store.mutation_data(profiles, genes)?,
        (Some(cohort), false) => store.mutation_data_by_cohort(profiles, genes, cohort)?,
        (_, true) => {
            let samples = scope.scope.members().unwrap_or_default();
            store.mutation_data_by_sample(profiles, genes, &samples)?
        }
    };
    debug!(profiles = profiles.len(), records = data.len(), "fetched mutation data");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{CohortId, Gene, SampleId};
    use crate::repository::StudyCount;
    use crate::scope::SampleScope;

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn record(&self, call: String) -> Vec<MutationDatum> {
            self.calls.lock().unwrap().push(call);
            vec![MutationDatum {
                sample_id: "S-A".parse().unwrap(),
                genetic_profile_id: "brca_mutations".parse().unwrap(),
                study_id: "brca".parse().unwrap(),
                gene: Gene {
                    hugo_gene_symbol: "TP53".to_string(),
                    entrez_gene_id: 7157,
                },
                amino_acid_change: Some("R175H".to_string()),
                mutation_type: Some("Missense_Mutation".to_string()),
                mutation_status: None,
                validation_status: None,
                chr: None,
                start_position: None,
                end_position: None,
                reference_allele: None,
                variant_allele: None,
                protein_start_position: Some(175),
                protein_end_position: Some(175),
            }]
        }
    }

    impl MutationStore for RecordingStore {
        fn mutation_data(
            &self,
            _profiles: &[ProfileId],
            _genes: &[i64],
        ) -> Result<Vec<MutationDatum>, KiraError> {
            Ok(self.record("all".to_string()))
        }

        fn mutation_data_by_sample(
            &self,
            _profiles: &[ProfileId],
            _genes: &[i64],
            samples: &[SampleId],
        ) -> Result<Vec<MutationDatum>, KiraError> {
            let names = samples.iter().map(|s| s.as_str()).collect::<Vec<_>>();
            Ok(self.record(format!("samples:{}", names.join(","))))
        }

        fn mutation_data_by_cohort(
            &self,
            _profiles: &[ProfileId],
            _genes: &[i64],
            cohort: &CohortId,
        ) -> Result<Vec<MutationDatum>, KiraError> {
            Ok(self.record(format!("cohort:{cohort}")))
        }

        fn mutation_counts(
            &self,
            _gene: &crate::domain::GeneRef,
            _start: i64,
            _end: i64,
            _per_study: bool,
        ) -> Result<Vec<StudyCount>, KiraError> {
            Ok(Vec::new())
        }
    }

    fn profiles() -> Vec<ProfileId> {
        vec!["brca_mutations".parse().unwrap()]
    }

    fn scope(samples: Option<&[&str]>, cohort: Option<&str>) -> ResolvedScope {
        let members = samples
            .unwrap_or_default()
            .iter()
            .map(|id| id.parse().unwrap())
            .collect();
        ResolvedScope {
            scope: if samples.is_none() && cohort.is_none() {
                SampleScope::All
            } else {
                SampleScope::Only(members)
            },
            cohort: cohort.map(|id| id.parse().unwrap()),
            has_explicit_samples: samples.is_some(),
        }
    }

    #[test]
    fn unrestricted_fetches_everything() {
        let store = RecordingStore::default();
        let data = fetch_mutation_data(&store, &profiles(), &[7157], &scope(None, None)).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(*store.calls.lock().unwrap(), vec!["all".to_string()]);
    }

    #[test]
    fn cohort_is_pushed_down() {
        let store = RecordingStore::default();
        fetch_mutation_data(&store, &profiles(), &[7157], &scope(None, Some("brca_all"))).unwrap();
        assert_eq!(*store.calls.lock().unwrap(), vec!["cohort:brca_all".to_string()]);
    }

    #[test]
    fn explicit_samples_use_resolved_scope() {
        let store = RecordingStore::default();
        fetch_mutation_data(
            &store,
            &profiles(),
            &[7157],
            &scope(Some(&["S-B", "S-A"][..]), Some("brca_all")),
        )
        .unwrap();
        assert_eq!(*store.calls.lock().unwrap(), vec!["samples:S-A,S-B".to_string()]);
    }

    #[test]
    fn no_profiles_no_fetch() {
        let store = RecordingStore::default();
        let data = fetch_mutation_data(&store, &[], &[7157], &scope(None, None)).unwrap();
        assert!(data.is_empty());
        assert!(store.calls.lock().unwrap().is_empty());
    }
}
