use assert_matches::assert_matches;

use kira_portal_data::domain::{
    AlterationType, CohortId, Gene, GeneRef, MutationDatum, ProfileDatum, ProfileId, ProfileKind,
    SampleId, ValueDatum,
};
use kira_portal_data::error::KiraError;

#[test]
fn parse_identifiers() {
    let profile: ProfileId = "brca_tcga_pub_gistic".parse().unwrap();
    assert_eq!(profile.as_str(), "brca_tcga_pub_gistic");
    let sample: SampleId = "TCGA-A1-A0SB-01".parse().unwrap();
    assert_eq!(sample.to_string(), "TCGA-A1-A0SB-01");
    assert_matches!("".parse::<CohortId>(), Err(KiraError::InvalidCohortId(_)));
    assert_matches!("-lead".parse::<SampleId>(), Err(KiraError::InvalidSampleId(_)));
}

#[test]
fn gene_refs() {
    assert_eq!("  672 ".parse::<GeneRef>().unwrap(), GeneRef::Entrez(672));
    assert_eq!(
        "hla-a".parse::<GeneRef>().unwrap(),
        GeneRef::Symbol("HLA-A".to_string())
    );
    assert_matches!("TP 53".parse::<GeneRef>(), Err(KiraError::InvalidGene(_)));
}

#[test]
fn alteration_types_round_trip_through_serde() {
    let parsed: AlterationType = serde_json::from_str("\"METHYLATION\"").unwrap();
    assert_eq!(parsed, AlterationType::Methylation);
    assert_eq!(parsed.kind(), ProfileKind::Matrix);
    let other: AlterationType = serde_json::from_str("\"STRUCTURAL_VARIANT\"").unwrap();
    assert_eq!(other.kind(), ProfileKind::Unrecognized);
    assert_eq!(
        serde_json::to_string(&other).unwrap(),
        "\"STRUCTURAL_VARIANT\""
    );
}

#[test]
fn identifiers_are_validated_on_deserialize() {
    assert!(serde_json::from_str::<SampleId>("\"SAMPLE-A\"").is_ok());
    assert!(serde_json::from_str::<SampleId>("\"SAMPLE A\"").is_err());
}

#[test]
fn value_datum_serializes_flat() {
    let datum = ProfileDatum::Value(ValueDatum {
        sample_id: "SAMPLE-A".parse().unwrap(),
        genetic_profile_id: "brca_gistic".parse().unwrap(),
        study_id: "brca".parse().unwrap(),
        gene: Gene {
            hugo_gene_symbol: "TP53".to_string(),
            entrez_gene_id: 7157,
        },
        profile_data: "-2".to_string(),
        cohort_id: None,
    });
    let json = serde_json::to_value(&datum).unwrap();
    assert_eq!(json["entrez_gene_id"], 7157);
    assert_eq!(json["profile_data"], "-2");
    assert!(json.get("cohort_id").is_none());
}

#[test]
fn profile_data_deserializes_to_the_right_variant() {
    let gene = Gene {
        hugo_gene_symbol: "TP53".to_string(),
        entrez_gene_id: 7157,
    };
    let value = ProfileDatum::Value(ValueDatum {
        sample_id: "SAMPLE-A".parse().unwrap(),
        genetic_profile_id: "brca_gistic".parse().unwrap(),
        study_id: "brca".parse().unwrap(),
        gene: gene.clone(),
        profile_data: "5".to_string(),
        cohort_id: Some("brca_all".parse().unwrap()),
    });
    let mutation = ProfileDatum::Mutation(MutationDatum {
        sample_id: "SAMPLE-A".parse().unwrap(),
        genetic_profile_id: "brca_mutations".parse().unwrap(),
        study_id: "brca".parse().unwrap(),
        gene,
        amino_acid_change: Some("R175H".to_string()),
        mutation_type: None,
        mutation_status: None,
        validation_status: None,
        chr: None,
        start_position: None,
        end_position: None,
        reference_allele: None,
        variant_allele: None,
        protein_start_position: Some(175),
        protein_end_position: Some(175),
    });

    for datum in [value, mutation] {
        let json = serde_json::to_string(&datum).unwrap();
        let parsed: ProfileDatum = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, datum);
    }
}
