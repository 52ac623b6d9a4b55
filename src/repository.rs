use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    Cohort, CohortId, EncodedRow, Gene, GeneRef, InternalKey, MutationDatum, OrderedSampleIndex,
    Profile, ProfileId, SampleId, StudyId,
};
use crate::error::KiraError;

pub trait ProfileDirectory: Send + Sync {
    /// Profiles matching `ids`; unknown ids are omitted.
    fn profiles(&self, ids: &[ProfileId]) -> Result<Vec<Profile>, KiraError>;
    fn profiles_by_study(&self, study: Option<&StudyId>) -> Result<Vec<Profile>, KiraError>;
}

pub trait GeneDirectory: Send + Sync {
    /// Genes matching `genes`; unknown references are omitted.
    fn genes(&self, genes: &[GeneRef]) -> Result<Vec<Gene>, KiraError>;
    fn all_genes(&self) -> Result<Vec<Gene>, KiraError>;
}

pub trait MutationStore: Send + Sync {
    fn mutation_data(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
    ) -> Result<Vec<MutationDatum>, KiraError>;
    fn mutation_data_by_sample(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
        samples: &[SampleId],
    ) -> Result<Vec<MutationDatum>, KiraError>;
    fn mutation_data_by_cohort(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
        cohort: &CohortId,
    ) -> Result<Vec<MutationDatum>, KiraError>;
    /// Number of distinct samples with a mutation in `gene` overlapping the
    /// protein range, in total (`study_id` unset) or one entry per study.
    fn mutation_counts(
        &self,
        gene: &GeneRef,
        start: i64,
        end: i64,
        per_study: bool,
    ) -> Result<Vec<StudyCount>, KiraError>;
}

pub trait MatrixStore: Send + Sync {
    fn encoded_rows(
        &self,
        profiles: &[ProfileId],
        genes: &[i64],
    ) -> Result<Vec<EncodedRow>, KiraError>;
    fn ordered_sample_indices(
        &self,
        profiles: &[ProfileId],
    ) -> Result<Vec<OrderedSampleIndex>, KiraError>;
}

pub trait SampleDirectory: Send + Sync {
    /// Stable ids for the given keys; keys without a sample are omitted.
    fn stable_ids(
        &self,
        keys: &[InternalKey],
    ) -> Result<HashMap<InternalKey, SampleId>, KiraError>;
}

pub trait CohortDirectory: Send + Sync {
    /// Member stable ids, or `None` when the cohort does not exist.
    fn cohort_members(&self, cohort: &CohortId) -> Result<Option<Vec<SampleId>>, KiraError>;
    fn cohorts(&self, study: Option<&StudyId>) -> Result<Vec<Cohort>, KiraError>;
    fn cohorts_by_id(&self, ids: &[CohortId]) -> Result<Vec<Cohort>, KiraError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyCount {
    pub study_id: Option<StudyId>,
    pub count: usize,
}

/// Every collaborator the resolution engine reads from.
pub trait PortalRepository:
    ProfileDirectory + GeneDirectory + MutationStore + MatrixStore + SampleDirectory + CohortDirectory
{
}

impl<T> PortalRepository for T where
    T: ProfileDirectory
        + GeneDirectory
        + MutationStore
        + MatrixStore
        + SampleDirectory
        + CohortDirectory
{
}
