use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{CohortId, SampleId};
use crate::error::KiraError;
use crate::repository::CohortDirectory;

/// Effective set of stable sample ids a request is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleScope {
    /// No restriction was requested.
    All,
    Only(BTreeSet<SampleId>),
}

impl SampleScope {
    pub fn contains(&self, sample: &SampleId) -> bool {
        match self {
            SampleScope::All => true,
            SampleScope::Only(samples) => samples.contains(sample),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SampleScope::All)
    }

    pub fn members(&self) -> Option<Vec<SampleId>> {
        match self {
            SampleScope::All => None,
            SampleScope::Only(samples) => Some(samples.iter().cloned().collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    pub scope: SampleScope,
    /// Cohort the request was scoped by; tagged onto matrix-path data.
    pub cohort: Option<CohortId>,
    pub has_explicit_samples: bool,
}

impl ResolvedScope {
    pub fn unrestricted() -> Self {
        Self {
            scope: SampleScope::All,
            cohort: None,
            has_explicit_samples: false,
        }
    }
}

/// Union of the explicit sample list and the cohort members. Neither given
/// means [`SampleScope::All`]; an explicit but empty list matches nothing.
pub fn resolve_scope<D>(
    directory: &D,
    samples: Option<&[SampleId]>,
    cohort: Option<&CohortId>,
) -> Result<ResolvedScope, KiraError>
where
    D: CohortDirectory + ?Sized,
{
    if samples.is_none() && cohort.is_none() {
        return Ok(ResolvedScope::unrestricted());
    }

    let mut members = BTreeSet::new();
    if let Some(cohort) = cohort {
        let cohort_members = directory
            .cohort_members(cohort)?
            .ok_or_else(|| KiraError::CohortNotFound(cohort.to_string()))?;
        members.extend(cohort_members);
    }
    if let Some(samples) = samples {
        members.extend(samples.iter().cloned());
    }

    debug!(
        samples = members.len(),
        cohort = cohort.map(|id| id.as_str()),
        "resolved sample scope"
    );
    Ok(ResolvedScope {
        scope: SampleScope::Only(members),
        cohort: cohort.cloned(),
        has_explicit_samples: samples.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::{Cohort, StudyId};

    struct Cohorts(HashMap<CohortId, Vec<SampleId>>);

    impl CohortDirectory for Cohorts {
        fn cohort_members(&self, cohort: &CohortId) -> Result<Option<Vec<SampleId>>, KiraError> {
            Ok(self.0.get(cohort).cloned())
        }

        fn cohorts(&self, _study: Option<&StudyId>) -> Result<Vec<Cohort>, KiraError> {
            Ok(Vec::new())
        }

        fn cohorts_by_id(&self, _ids: &[CohortId]) -> Result<Vec<Cohort>, KiraError> {
            Ok(Vec::new())
        }
    }

    fn sample(id: &str) -> SampleId {
        id.parse().unwrap()
    }

    fn directory() -> Cohorts {
        let mut map = HashMap::new();
        map.insert(
            "brca_sequenced".parse().unwrap(),
            vec![sample("S-A"), sample("S-B")],
        );
        Cohorts(map)
    }

    #[test]
    fn no_restriction_is_all() {
        let resolved = resolve_scope(&directory(), None, None).unwrap();
        assert!(resolved.scope.is_all());
        assert!(resolved.scope.contains(&sample("anything")));
        assert_eq!(resolved.cohort, None);
    }

    #[test]
    fn cohort_and_samples_union() {
        let cohort: CohortId = "brca_sequenced".parse().unwrap();
        let explicit = vec![sample("S-C"), sample("S-A")];
        let resolved = resolve_scope(&directory(), Some(explicit.as_slice()), Some(&cohort)).unwrap();
        assert_eq!(
            resolved.scope.members().unwrap(),
            vec![sample("S-A"), sample("S-B"), sample("S-C")]
        );
        assert_eq!(resolved.cohort, Some(cohort));
        assert!(resolved.has_explicit_samples);
    }

    #[test]
    fn explicit_empty_list_matches_nothing() {
        let empty: Vec<SampleId> = Vec::new();
        let resolved = resolve_scope(&directory(), Some(empty.as_slice()), None).unwrap();
        assert!(!resolved.scope.is_all());
        assert!(!resolved.scope.contains(&sample("S-A")));
    }

    #[test]
    fn unknown_cohort_is_reported() {
        let cohort: CohortId = "missing".parse().unwrap();
        let err = resolve_scope(&directory(), None, Some(&cohort)).unwrap_err();
        assert_matches!(err, KiraError::CohortNotFound(_));
    }
}
