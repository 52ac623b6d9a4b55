use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{GeneRef, StudyId};
use crate::error::KiraError;
use crate::repository::{GeneDirectory, MutationStore};

pub const COUNT_TYPE: &str = "count";

/// Query-item field that can be echoed back onto each count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EchoField {
    Id,
    Gene,
    Start,
    End,
}

impl EchoField {
    pub const ALL: [EchoField; 4] = [EchoField::Id, EchoField::Gene, EchoField::Start, EchoField::End];
}

impl fmt::Display for EchoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EchoField::Id => write!(f, "id"),
            EchoField::Gene => write!(f, "gene"),
            EchoField::Start => write!(f, "start"),
            EchoField::End => write!(f, "end"),
        }
    }
}

impl FromStr for EchoField {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "id" => Ok(EchoField::Id),
            "gene" => Ok(EchoField::Gene),
            "start" => Ok(EchoField::Start),
            "end" => Ok(EchoField::End),
            other => Err(KiraError::InvalidArgument(format!(
                "unknown echo field: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltCountItem {
    #[serde(default)]
    pub id: Option<String>,
    pub gene: String,
    pub start: i64,
    pub end: i64,
}

/// Body of a mutation-count request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltCountInput {
    #[serde(rename = "type")]
    pub count_type: String,
    #[serde(default)]
    pub per_study: bool,
    pub data: Vec<AltCountItem>,
    #[serde(default)]
    pub echo: Option<Vec<String>>,
}

impl AltCountInput {
    /// Builds a request from parallel query-parameter lists.
    pub fn from_lists(
        count_type: &str,
        per_study: bool,
        ids: Vec<String>,
        genes: Vec<String>,
        starts: Vec<i64>,
        ends: Vec<i64>,
        echo: Option<Vec<String>>,
    ) -> Result<Self, KiraError> {
        let len = genes.len();
        if starts.len() != len || ends.len() != len || (!ids.is_empty() && ids.len() != len) {
            return Err(KiraError::InvalidArgument(format!(
                "mismatched list lengths: ids={}, genes={len}, starts={}, ends={}",
                ids.len(),
                starts.len(),
                ends.len()
            )));
        }
        let mut ids = ids.into_iter();
        let data = genes
            .into_iter()
            .zip(starts)
            .zip(ends)
            .map(|((gene, start), end)| AltCountItem {
                id: ids.next(),
                gene,
                start,
                end,
            })
            .collect();
        Ok(Self {
            count_type: count_type.to_string(),
            per_study,
            data,
            echo,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltCount {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_id: Option<StudyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

struct ValidatedItem<'a> {
    item: &'a AltCountItem,
    gene: GeneRef,
}

pub fn count_mutations<S>(store: &S, input: &AltCountInput) -> Result<Vec<AltCount>, KiraError>
where
    S: MutationStore + GeneDirectory + ?Sized,
{
    if input.count_type != COUNT_TYPE {
        return Err(KiraError::InvalidArgument(format!(
            "unsupported count type: {}",
            input.count_type
        )));
    }
    let echo = match &input.echo {
        None => EchoField::ALL.into_iter().collect::<HashSet<_>>(),
        Some(fields) => fields
            .iter()
            .map(|field| field.parse::<EchoField>())
            .collect::<Result<HashSet<_>, _>>()?,
    };
    let items = input
        .data
        .iter()
        .map(|item| {
            if item.start > item.end {
                return Err(KiraError::InvalidArgument(format!(
                    "start {} is after end {} for gene {}",
                    item.start, item.end, item.gene
                )));
            }
            Ok(ValidatedItem {
                item,
                gene: item.gene.parse()?,
            })
        })
        .collect::<Result<Vec<_>, KiraError>>()?;

    let requested = items
        .iter()
        .map(|validated| validated.gene.clone())
        .collect::<Vec<_>>();
    let known = if requested.is_empty() {
        Vec::new()
    } else {
        store.genes(&requested)?
    };
    let mut resolved = Vec::with_capacity(items.len());
    for ValidatedItem { item, gene } in items {
        let found = known
            .iter()
            .find(|known| known.matches(&gene))
            .ok_or_else(|| KiraError::GeneNotFound(gene.to_string()))?;
        resolved.push((item, GeneRef::Entrez(found.entrez_gene_id)));
    }

    let mut counts = Vec::new();
    for (item, gene) in resolved {
        for study_count in store.mutation_counts(&gene, item.start, item.end, input.per_study)? {
            counts.push(AltCount {
                count: study_count.count,
                study_id: study_count.study_id,
                id: echo
                    .contains(&EchoField::Id)
                    .then(|| item.id.clone())
                    .flatten(),
                gene: echo.contains(&EchoField::Gene).then(|| item.gene.clone()),
                start: echo.contains(&EchoField::Start).then_some(item.start),
                end: echo.contains(&EchoField::End).then_some(item.end),
            });
        }
    }
    debug!(items = input.data.len(), counts = counts.len(), "counted mutations");
    Ok(counts)
}
