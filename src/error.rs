use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid genetic profile id: {0}")]
    InvalidProfileId(String),

    #[error("invalid sample id: {0}")]
    InvalidSampleId(String),

    #[error("invalid cohort id: {0}")]
    InvalidCohortId(String),

    #[error("invalid study id: {0}")]
    InvalidStudyId(String),

    #[error("invalid gene identifier: {0}")]
    InvalidGene(String),

    #[error("invalid internal sample key: {0}")]
    InvalidInternalKey(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("genetic profile not found: {0}")]
    ProfileNotFound(String),

    #[error("cohort not found: {0}")]
    CohortNotFound(String),

    #[error("gene not found: {0}")]
    GeneNotFound(String),

    #[error("profile {profile} has unrecognized alteration type {alteration_type}")]
    UnrecognizedAlterationType {
        profile: String,
        alteration_type: String,
    },

    #[error("missing config file kira-pd.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read snapshot: {0}")]
    SnapshotRead(String),

    #[error("invalid snapshot: {0}")]
    SnapshotParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl KiraError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KiraError::ProfileNotFound(_) | KiraError::CohortNotFound(_) | KiraError::GeneNotFound(_)
        )
    }
}
