use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{Profile, ProfileId, ProfileKind};
use crate::error::KiraError;
use crate::repository::ProfileDirectory;

/// Requested profiles split by storage representation, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePartition {
    pub mutation: Vec<ProfileId>,
    pub matrix: Vec<ProfileId>,
    pub unrecognized: Vec<Profile>,
}

impl ProfilePartition {
    pub fn is_empty(&self) -> bool {
        self.mutation.is_empty() && self.matrix.is_empty()
    }
}

pub fn classify_profiles<D>(directory: &D, ids: &[ProfileId]) -> Result<ProfilePartition, KiraError>
where
    D: ProfileDirectory + ?Sized,
{
    let mut seen = HashSet::new();
    let requested = ids
        .iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect::<Vec<_>>();
    if requested.is_empty() {
        return Ok(ProfilePartition::default());
    }

    let mut by_id = directory
        .profiles(&requested)?
        .into_iter()
        .map(|profile| (profile.id.clone(), profile))
        .collect::<HashMap<_, _>>();

    let mut ordered = Vec::with_capacity(requested.len());
    for id in &requested {
        let profile = by_id
            .remove(id)
            .ok_or_else(|| KiraError::ProfileNotFound(id.to_string()))?;
        ordered.push(profile);
    }

    let partition = partition_profiles(ordered);
    debug!(
        mutation = partition.mutation.len(),
        matrix = partition.matrix.len(),
        unrecognized = partition.unrecognized.len(),
        "classified profiles"
    );
    Ok(partition)
}

pub fn partition_profiles(profiles: Vec<Profile>) -> ProfilePartition {
    let mut partition = ProfilePartition::default();
    for profile in profiles {
        match profile.alteration_type.kind() {
            ProfileKind::Mutation => partition.mutation.push(profile.id),
            ProfileKind::Matrix => partition.matrix.push(profile.id),
            ProfileKind::Unrecognized => partition.unrecognized.push(profile),
        }
    }
    partition
}
