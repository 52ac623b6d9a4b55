use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::classify_profiles;
use crate::counts::{AltCount, AltCountInput, count_mutations};
use crate::domain::{
    Cohort, CohortId, Gene, GeneRef, Profile, ProfileDatum, ProfileId, SampleId, StudyId,
};
use crate::error::KiraError;
use crate::matrix::{DEFAULT_DELIMITER, DecodeFault, decode_matrix_data};
use crate::mutation::fetch_mutation_data;
use crate::repository::PortalRepository;
use crate::scope::resolve_scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fail on profiles that are neither mutation- nor matrix-style instead
    /// of dropping them.
    pub strict_alteration_types: bool,
    pub value_delimiter: char,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict_alteration_types: false,
            value_delimiter: DEFAULT_DELIMITER,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileDataResult {
    pub data: Vec<ProfileDatum>,
    pub fault_count: usize,
    pub faults: Vec<DecodeFault>,
}

#[derive(Clone)]
pub struct App<R: PortalRepository> {
    repository: R,
    options: EngineOptions,
}

impl<R: PortalRepository> App<R> {
    pub fn new(repository: R, options: EngineOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Resolves profile data for `profiles` x `genes`, optionally restricted
    /// to `samples` and/or the members of `cohort`. Mutation-path data comes
    /// first, then matrix-path data in (row, position) order.
    pub fn resolve_profile_data(
        &self,
        profiles: &[ProfileId],
        genes: &[GeneRef],
        samples: Option<&[SampleId]>,
        cohort: Option<&CohortId>,
    ) -> Result<ProfileDataResult, KiraError> {
        let partition = classify_profiles(&self.repository, profiles)?;
        for profile in &partition.unrecognized {
            if self.options.strict_alteration_types {
                return Err(KiraError::UnrecognizedAlterationType {
                    profile: profile.id.to_string(),
                    alteration_type: profile.alteration_type.to_string(),
                });
            }
            warn!(
                profile = %profile.id,
                alteration_type = %profile.alteration_type,
                "skipping profile with unrecognized alteration type"
            );
        }

        let genes = self.resolve_genes(genes)?;
        let scope = resolve_scope(&self.repository, samples, cohort)?;
        if partition.is_empty() || genes.is_empty() {
            debug!("no routable profiles or genes, nothing to fetch");
            return Ok(ProfileDataResult::default());
        }
        debug!(
            mutation = partition.mutation.len(),
            matrix = partition.matrix.len(),
            genes = genes.len(),
            unrestricted = scope.scope.is_all(),
            "fetching profile data"
        );

        let mutations =
            fetch_mutation_data(&self.repository, &partition.mutation, &genes, &scope)?;
        let matrix = decode_matrix_data(
            &self.repository,
            &partition.matrix,
            &genes,
            &scope,
            self.options.value_delimiter,
        )?;

        let mut data = Vec::with_capacity(mutations.len() + matrix.data.len());
        data.extend(mutations.into_iter().map(ProfileDatum::Mutation));
        data.extend(matrix.data.into_iter().map(ProfileDatum::Value));
        debug!(
            data = data.len(),
            faults = matrix.faults.len(),
            "resolved profile data"
        );
        Ok(ProfileDataResult {
            data,
            fault_count: matrix.faults.len(),
            faults: matrix.faults,
        })
    }

    pub fn profile_data(
        &self,
        profiles: &[ProfileId],
        genes: &[GeneRef],
    ) -> Result<ProfileDataResult, KiraError> {
        self.resolve_profile_data(profiles, genes, None, None)
    }

    pub fn profile_data_by_samples(
        &self,
        profiles: &[ProfileId],
        genes: &[GeneRef],
        samples: &[SampleId],
    ) -> Result<ProfileDataResult, KiraError> {
        self.resolve_profile_data(profiles, genes, Some(samples), None)
    }

    pub fn profile_data_by_cohort(
        &self,
        profiles: &[ProfileId],
        genes: &[GeneRef],
        cohort: &CohortId,
    ) -> Result<ProfileDataResult, KiraError> {
        self.resolve_profile_data(profiles, genes, None, Some(cohort))
    }

    pub fn mutation_counts(&self, input: &AltCountInput) -> Result<Vec<AltCount>, KiraError> {
        count_mutations(&self.repository, input)
    }

    pub fn profiles(&self, study: Option<&StudyId>) -> Result<Vec<Profile>, KiraError> {
        self.repository.profiles_by_study(study)
    }

    pub fn profiles_by_id(&self, ids: &[ProfileId]) -> Result<Vec<Profile>, KiraError> {
        self.repository.profiles(ids)
    }

    pub fn cohorts(&self, study: Option<&StudyId>) -> Result<Vec<Cohort>, KiraError> {
        self.repository.cohorts(study)
    }

    pub fn cohorts_by_id(&self, ids: &[CohortId]) -> Result<Vec<Cohort>, KiraError> {
        self.repository.cohorts_by_id(ids)
    }

    pub fn genes(&self, genes: Option<&[GeneRef]>) -> Result<Vec<Gene>, KiraError> {
        match genes {
            Some(genes) => self.repository.genes(genes),
            None => self.repository.all_genes(),
        }
    }

    /// Entrez ids for `genes`, in request order; every reference must resolve.
    fn resolve_genes(&self, genes: &[GeneRef]) -> Result<Vec<i64>, KiraError> {
        if genes.is_empty() {
            return Ok(Vec::new());
        }
        let known = self.repository.genes(genes)?;
        let mut ids = Vec::with_capacity(genes.len());
        for gene in genes {
            let found = known
                .iter()
                .find(|known| known.matches(gene))
                .ok_or_else(|| KiraError::GeneNotFound(gene.to_string()))?;
            if !ids.contains(&found.entrez_gene_id) {
                ids.push(found.entrez_gene_id);
            }
        }
        Ok(ids)
    }
}
