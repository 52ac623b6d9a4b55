use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::{BufReader, Read};

use camino::Utf8Path;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Cohort, CohortId, EncodedRow, Gene, GeneRef, InternalKey, MutationDatum, OrderedSampleIndex,
    Profile, ProfileId, Sample, SampleId, StudyId,
};
use crate::error::KiraError;
use crate::repository::{
    CohortDirectory, GeneDirectory, MatrixStore, MutationStore, ProfileDirectory,
    SampleDirectory, StudyCount,
};

/// Already-fetched portal tables, as exported to a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub genes: Vec<Gene>,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub cohorts: Vec<Cohort>,
    #[serde(default)]
    pub mutations: Vec<MutationDatum>,
    #[serde(default)]
    pub encoded_rows: Vec<EncodedRow>,
    #[serde(default)]
    pub sample_indices: Vec<OrderedSampleIndex>,
}

/// In-memory repository over a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: Snapshot,
    profiles_by_id: HashMap<ProfileId, usize>,
    cohorts_by_id: HashMap<CohortId, usize>,
    stable_ids: HashMap<InternalKey, SampleId>,
    rows_by_key: HashMap<(ProfileId, i64), Vec<usize>>,
}

impl SnapshotStore {
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, KiraError> {
        let mut profiles_by_id = HashMap::new();
        for (pos, profile) in snapshot.profiles.iter().enumerate() {
            if profiles_by_id.insert(profile.id.clone(), pos).is_some() {
                return Err(KiraError::SnapshotParse(format!(
                    "duplicate profile id {}",
                    profile.id
                )));
            }
        }

        let mut cohorts_by_id = HashMap::new();
        for (pos, cohort) in snapshot.cohorts.iter().enumerate() {
            if cohorts_by_id.insert(cohort.id.clone(), pos).is_some() {
                return Err(KiraError::SnapshotParse(format!(
                    "duplicate cohort id {}",
                    cohort.id
                )));
            }
        }

        let mut stable_ids = HashMap::new();
        for sample in &snapshot.samples {
            if stable_ids
                .insert(sample.internal_id, sample.id.clone())
                .is_some()
            {
                return Err(KiraError::SnapshotParse(format!(
                    "duplicate internal sample key {}",
                    sample.internal_id
                )));
            }
        }

        let mut rows_by_key = HashMap::<(ProfileId, i64), Vec<usize>>::new();
        for (pos, row) in snapshot.encoded_rows.iter().enumerate() {
            rows_by_key
                .entry((row.genetic_profile_id.clone(), row.gene.entrez_gene_id))
                .or_default()
                .push(pos);
        }

        Ok(Self {
            snapshot,
            profiles_by_id,
            cohorts_by_id,
            stable_ids,
            rows_by_key,
        })
    }

    /// Reads a snapshot document; `.gz` files are decompressed on the fly.
    pub fn load(path: &Utf8Path) -> Result<Self, KiraError> {
        let file = fs::File::open(path.as_std_path())
            .map_err(|err| KiraError::SnapshotRead(format!("open {path}: {err}")))?;
        let reader: Box<dyn Read> = if path.extension() == Some("gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(reader))
            .map_err(|err| KiraError::SnapshotParse(format!("{path}: {err}")))?;
        Self::from_snapshot(snapshot)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn cohort(&self, id: &CohortId) -> Option<&Cohort> {
        self.cohorts_by_id
            .get(id)
            .map(|pos| &self.snapshot.cohorts[*pos])
    }

    fn select_mutations<F>(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
        keep: F,
    ) -> Vec<MutationDatum>
    where
        F: Fn(&MutationDatum) -> bool,
    {
        let profiles = profiles.iter().collect::<HashSet<_>>();
        let genes = genes.iter().collect::<HashSet<_>>();
        self.snapshot
            .mutations
            .iter()
            .filter(|datum| {
                profiles.contains(&datum.genetic_profile_id)
                    && genes.contains(&datum.gene.entrez_gene_id)
                    && keep(datum)
            })
            .cloned()
            .collect()
    }
}

impl ProfileDirectory for SnapshotStore {
    fn profiles(&self, ids: &[ProfileId]) -> Result<Vec<Profile>, KiraError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.profiles_by_id.get(id))
            .map(|pos| self.snapshot.profiles[*pos].clone())
            .collect())
    }

    fn profiles_by_study(&self, study: Option<&StudyId>) -> Result<Vec<Profile>, KiraError> {
        Ok(self
            .snapshot
            .profiles
            .iter()
            .filter(|profile| study.is_none_or(|study| &profile.study_id == study))
            .cloned()
            .collect())
    }
}

impl GeneDirectory for SnapshotStore {
    fn genes(&self, genes: &[GeneRef]) -> Result<Vec<Gene>, KiraError> {
        let mut seen = HashSet::new();
        Ok(genes
            .iter()
            .filter_map(|gene| self.snapshot.genes.iter().find(|known| known.matches(gene)))
            .filter(|gene| seen.insert(gene.entrez_gene_id))
            .cloned()
            .collect())
    }

    fn all_genes(&self) -> Result<Vec<Gene>, KiraError> {
        Ok(self.snapshot.genes.clone())
    }
}

impl MutationStore for SnapshotStore {
    fn mutation_data(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
    ) -> Result<Vec<MutationDatum>, KiraError> {
        Ok(self.select_mutations(profiles, genes, |_| true))
    }

    fn mutation_data_by_sample(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
        samples: &[SampleId],
    ) -> Result<Vec<MutationDatum>, KiraError> {
        let samples = samples.iter().collect::<HashSet<_>>();
        Ok(self.select_mutations(profiles, genes, |datum| {
            samples.contains(&datum.sample_id)
        }))
    }

    fn mutation_data_by_cohort(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
        cohort: &CohortId,
    ) -> Result<Vec<MutationDatum>, KiraError> {
        let Some(cohort) = self.cohort(cohort) else {
            return Ok(Vec::new());
        };
        let members = cohort.sample_ids.iter().collect::<HashSet<_>>();
        Ok(self.select_mutations(profiles, genes, |datum| {
            members.contains(&datum.sample_id)
        }))
    }

    fn mutation_counts(
        &self,
        gene: &GeneRef,
        start: i64,
        end: i64,
        per_study: bool,
    ) -> Result<Vec<StudyCount>, KiraError> {
        let mut by_study = BTreeMap::<&StudyId, HashSet<&SampleId>>::new();
        for datum in &self.snapshot.mutations {
            if datum.gene.matches(gene) && datum.overlaps_protein_range(start, end) {
                by_study
                    .entry(&datum.study_id)
                    .or_default()
                    .insert(&datum.sample_id);
            }
        }

        if per_study {
            return Ok(by_study
                .into_iter()
                .map(|(study, samples)| StudyCount {
                    study_id: Some(study.clone()),
                    count: samples.len(),
                })
                .collect());
        }
        Ok(vec![StudyCount {
            study_id: None,
            count: by_study.values().map(HashSet::len).sum(),
        }])
    }
}

impl MatrixStore for SnapshotStore {
    fn encoded_rows(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
    ) -> Result<Vec<EncodedRow>, KiraError> {
        let mut rows = Vec::new();
        for profile in profiles {
            for gene in genes {
                if let Some(positions) = self.rows_by_key.get(&(profile.clone(), *gene)) {
                    rows.extend(
                        positions
                            .iter()
                            .map(|pos| self.snapshot.encoded_rows[*pos].clone()),
                    );
                }
            }
        }
        Ok(rows)
    }

    fn ordered_sample_indices(
        &self,
        profiles: &[ProfileId],
    ) -> Result<Vec<OrderedSampleIndex>, KiraError> {
        Ok(profiles
            .iter()
            .flat_map(|profile| {
                self.snapshot
                    .sample_indices
                    .iter()
                    .filter(move |entry| &entry.genetic_profile_id == profile)
            })
            .cloned()
            .collect())
    }
}

impl SampleDirectory for SnapshotStore {
    fn stable_ids(
        &self,
        keys: &[InternalKey],
    ) -> Result<HashMap<InternalKey, SampleId>, KiraError> {
        Ok(keys
            .iter()
            .filter_map(|key| self.stable_ids.get(key).map(|id| (*key, id.clone())))
            .collect())
    }
}

impl CohortDirectory for SnapshotStore {
    fn cohort_members(&self, cohort: &CohortId) -> Result<Option<Vec<SampleId>>, KiraError> {
        Ok(self.cohort(cohort).map(|cohort| cohort.sample_ids.clone()))
    }

    fn cohorts(&self, study: Option<&StudyId>) -> Result<Vec<Cohort>, KiraError> {
        Ok(self
            .snapshot
            .cohorts
            .iter()
            .filter(|cohort| study.is_none_or(|study| &cohort.study_id == study))
            .cloned()
            .collect())
    }

    fn cohorts_by_id(&self, ids: &[CohortId]) -> Result<Vec<Cohort>, KiraError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.cohort(id))
            .cloned()
            .collect())
    }
}
