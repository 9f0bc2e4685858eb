// src/model/records.rs

//! Typed rows ingested from the pipeline's result tables.
//!
//! All three record kinds produced for one task share the same ordinal key
//! space (`ordinal`, the `N` column), which is what the associator joins on.

use serde::{Deserialize, Serialize};

use super::method::Method;

/// Per-task record identifier shared across the result tables.
pub type Ordinal = u64;

/// One predicted epitope (a row of `epitope-detail.tsv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpitopeRecord {
    pub ordinal: Ordinal,
    pub epitope_id: String,
    pub sequence: String,
    pub start: u32,
    pub end: u32,
    pub length: u32,
    /// Raw N-glycosylation site annotation as written by the pipeline.
    pub n_glyc: String,
    pub n_glyc_count: u32,
    pub molecular_weight: f64,
    pub isoelectric_point: f64,
    pub hydropathy: f64,
    pub scores: AntigenicityScores,
    #[serde(default)]
    pub topologies: Vec<TopologyRecord>,
    #[serde(default)]
    pub blast_hits: Vec<BlastHitRecord>,
}

/// Per-method antigenicity scores carried on an epitope row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AntigenicityScores {
    pub bepipred3: f64,
    pub emini: f64,
    pub kolaskar: f64,
    pub chou_fasman: f64,
    pub karplus_schulz: f64,
    pub parker: f64,
}

/// One method's verdict on an epitope (a row of `topology.tsv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecord {
    pub ordinal: Ordinal,
    pub method: Method,
    pub threshold: f64,
    pub avg_score: f64,
    /// Fraction of the epitope covered by the prediction.
    pub cover: f64,
    pub topology: String,
}

/// One BLAST hit of an epitope against a proteome database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastHitRecord {
    pub ordinal: Ordinal,
    pub subject_accession: String,
    pub percent_identity: f64,
    pub query_coverage: f64,
    pub query_sequence: String,
    pub subject_sequence: String,
    /// Alias of the proteome database the hit came from.
    pub database: String,
}

/// Records that can be attached to an [`EpitopeRecord`] by ordinal.
pub trait Attachable {
    fn ordinal(&self) -> Ordinal;
    fn attach_to(self, epitope: &mut EpitopeRecord);
}

impl Attachable for TopologyRecord {
    fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    fn attach_to(self, epitope: &mut EpitopeRecord) {
        epitope.topologies.push(self);
    }
}

impl Attachable for BlastHitRecord {
    fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    fn attach_to(self, epitope: &mut EpitopeRecord) {
        epitope.blast_hits.push(self);
    }
}
