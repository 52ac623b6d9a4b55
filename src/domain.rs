use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").unwrap());

static GENE_SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-/@]*$").unwrap());

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $err:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = KiraError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                if !IDENTIFIER_RE.is_match(trimmed) {
                    return Err($err(value.to_string()));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = KiraError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

identifier!(
    /// Genetic profile identifier, e.g. `brca_tcga_gistic`.
    ProfileId,
    KiraError::InvalidProfileId
);
identifier!(
    /// Externally stable sample identifier, e.g. `TCGA-A1-A0SB-01`.
    SampleId,
    KiraError::InvalidSampleId
);
identifier!(
    /// Named, curated sample set (a "sample list").
    CohortId,
    KiraError::InvalidCohortId
);
identifier!(StudyId, KiraError::InvalidStudyId);

/// Storage-internal numeric sample key. Never part of any output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalKey(u64);

impl InternalKey {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InternalKey {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| KiraError::InvalidInternalKey(value.to_string()))
    }
}

/// A gene as requested by a caller: Hugo symbol or Entrez id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeneRef {
    Entrez(i64),
    Symbol(String),
}

impl fmt::Display for GeneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneRef::Entrez(id) => write!(f, "{id}"),
            GeneRef::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

impl FromStr for GeneRef {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return trimmed
                .parse::<i64>()
                .map(GeneRef::Entrez)
                .map_err(|_| KiraError::InvalidGene(value.to_string()));
        }
        if !GENE_SYMBOL_RE.is_match(trimmed) {
            return Err(KiraError::InvalidGene(value.to_string()));
        }
        Ok(GeneRef::Symbol(trimmed.to_uppercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gene {
    pub hugo_gene_symbol: String,
    pub entrez_gene_id: i64,
}

impl Gene {
    pub fn matches(&self, gene: &GeneRef) -> bool {
        match gene {
            GeneRef::Entrez(id) => self.entrez_gene_id == *id,
            GeneRef::Symbol(symbol) => self.hugo_gene_symbol.eq_ignore_ascii_case(symbol),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Mutation,
    Matrix,
    Unrecognized,
}

/// Alteration-type tag of a genetic profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlterationType {
    MutationExtended,
    CopyNumberAlteration,
    MrnaExpression,
    MrnaExpressionNormals,
    RnaExpression,
    MicroRnaExpression,
    Methylation,
    MethylationBinary,
    ProteinLevel,
    ProteinArrayProteinLevel,
    ProteinArrayPhosphorylation,
    Phosphorylation,
    GenesetScore,
    GenericAssay,
    Other(String),
}

impl AlterationType {
    pub fn as_str(&self) -> &str {
        match self {
            AlterationType::MutationExtended => "MUTATION_EXTENDED",
            AlterationType::CopyNumberAlteration => "COPY_NUMBER_ALTERATION",
            AlterationType::MrnaExpression => "MRNA_EXPRESSION",
            AlterationType::MrnaExpressionNormals => "MRNA_EXPRESSION_NORMALS",
            AlterationType::RnaExpression => "RNA_EXPRESSION",
            AlterationType::MicroRnaExpression => "MICRO_RNA_EXPRESSION",
            AlterationType::Methylation => "METHYLATION",
            AlterationType::MethylationBinary => "METHYLATION_BINARY",
            AlterationType::ProteinLevel => "PROTEIN_LEVEL",
            AlterationType::ProteinArrayProteinLevel => "PROTEIN_ARRAY_PROTEIN_LEVEL",
            AlterationType::ProteinArrayPhosphorylation => "PROTEIN_ARRAY_PHOSPHORYLATION",
            AlterationType::Phosphorylation => "PHOSPHORYLATION",
            AlterationType::GenesetScore => "GENESET_SCORE",
            AlterationType::GenericAssay => "GENERIC_ASSAY",
            AlterationType::Other(tag) => tag,
        }
    }

    pub fn kind(&self) -> ProfileKind {
        match self {
            AlterationType::MutationExtended => ProfileKind::Mutation,
            AlterationType::Other(_) => ProfileKind::Unrecognized,
            _ => ProfileKind::Matrix,
        }
    }
}

impl From<String> for AlterationType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "MUTATION_EXTENDED" => AlterationType::MutationExtended,
            "COPY_NUMBER_ALTERATION" => AlterationType::CopyNumberAlteration,
            "MRNA_EXPRESSION" => AlterationType::MrnaExpression,
            "MRNA_EXPRESSION_NORMALS" => AlterationType::MrnaExpressionNormals,
            "RNA_EXPRESSION" => AlterationType::RnaExpression,
            "MICRO_RNA_EXPRESSION" => AlterationType::MicroRnaExpression,
            "METHYLATION" => AlterationType::Methylation,
            "METHYLATION_BINARY" => AlterationType::MethylationBinary,
            "PROTEIN_LEVEL" => AlterationType::ProteinLevel,
            "PROTEIN_ARRAY_PROTEIN_LEVEL" => AlterationType::ProteinArrayProteinLevel,
            "PROTEIN_ARRAY_PHOSPHORYLATION" => AlterationType::ProteinArrayPhosphorylation,
            "PHOSPHORYLATION" => AlterationType::Phosphorylation,
            "GENESET_SCORE" => AlterationType::GenesetScore,
            "GENERIC_ASSAY" => AlterationType::GenericAssay,
            _ => AlterationType::Other(value),
        }
    }
}

impl From<AlterationType> for String {
    fn from(value: AlterationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AlterationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub study_id: StudyId,
    #[serde(rename = "genetic_alteration_type")]
    pub alteration_type: AlterationType,
    #[serde(default)]
    pub datatype: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub show_profile_in_analysis_tab: bool,
}

/// One gene of one matrix-style profile: values joined by the delimiter,
/// positionally keyed by the profile's [`OrderedSampleIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRow {
    pub genetic_profile_id: ProfileId,
    pub study_id: StudyId,
    #[serde(flatten)]
    pub gene: Gene,
    pub values: String,
}

/// Internal sample keys occupying each value position of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedSampleIndex {
    pub genetic_profile_id: ProfileId,
    pub ordered_sample_list: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub internal_id: InternalKey,
    pub id: SampleId,
    pub study_id: StudyId,
    #[serde(default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub study_id: StudyId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sample_ids: Vec<SampleId>,
}

/// A mutation call, already keyed by stable sample id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationDatum {
    pub sample_id: SampleId,
    pub genetic_profile_id: ProfileId,
    pub study_id: StudyId,
    #[serde(flatten)]
    pub gene: Gene,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amino_acid_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_allele: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_allele: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_start_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_end_position: Option<i64>,
}

impl MutationDatum {
    /// True when the protein span of this call intersects `[start, end]`.
    pub fn overlaps_protein_range(&self, start: i64, end: i64) -> bool {
        let Some(mut_start) = self.protein_start_position else {
            return false;
        };
        let mut_end = self.protein_end_position.unwrap_or(mut_start);
        mut_start <= end && mut_end >= start
    }
}

/// One decoded matrix-style value for a (sample, gene, profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDatum {
    pub sample_id: SampleId,
    pub genetic_profile_id: ProfileId,
    pub study_id: StudyId,
    #[serde(flatten)]
    pub gene: Gene,
    pub profile_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<CohortId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileDatum {
    /// Listed first: only values carry the required `profile_data`.
    Value(ValueDatum),
    Mutation(MutationDatum),
}

impl ProfileDatum {
    pub fn sample_id(&self) -> &SampleId {
        match self {
            ProfileDatum::Mutation(datum) => &datum.sample_id,
            ProfileDatum::Value(datum) => &datum.sample_id,
        }
    }

    pub fn profile_id(&self) -> &ProfileId {
        match self {
            ProfileDatum::Mutation(datum) => &datum.genetic_profile_id,
            ProfileDatum::Value(datum) => &datum.genetic_profile_id,
        }
    }
}
