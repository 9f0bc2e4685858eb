// src/ingest/associate.rs

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::model::{Attachable, EpitopeRecord, Ordinal};

/// Attach every record in `records` to the epitope with the same ordinal.
///
/// Attachment appends, so calling this once per BLAST table accumulates hits
/// on the same epitope. Records whose ordinal matches no epitope are
/// dropped. Returns how many records were attached.
pub fn associate<T: Attachable>(epitopes: &mut [EpitopeRecord], records: Vec<T>) -> usize {
    let index = index_by_ordinal(epitopes);
    let total = records.len();
    let mut attached = 0;

    for record in records {
        if let Some(&slot) = index.get(&record.ordinal()) {
            record.attach_to(&mut epitopes[slot]);
            attached += 1;
        }
    }

    let dropped = total - attached;
    if dropped > 0 {
        debug!(attached, dropped, "records without a matching epitope were dropped");
    }
    attached
}

/// Position of each ordinal in `epitopes`. The first epitope wins when an
/// ordinal repeats.
fn index_by_ordinal(epitopes: &[EpitopeRecord]) -> HashMap<Ordinal, usize> {
    let mut index = HashMap::with_capacity(epitopes.len());
    for (slot, epitope) in epitopes.iter().enumerate() {
        match index.entry(epitope.ordinal) {
            Entry::Vacant(e) => {
                e.insert(slot);
            }
            Entry::Occupied(_) => {
                warn!(ordinal = epitope.ordinal, "duplicate epitope ordinal; keeping the first")
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AntigenicityScores, BlastHitRecord, Method, TopologyRecord};

    fn epitope(ordinal: Ordinal) -> EpitopeRecord {
        EpitopeRecord {
            ordinal,
            epitope_id: format!("EPI_{ordinal}"),
            sequence: "PEPTIDE".to_string(),
            start: 1,
            end: 7,
            length: 7,
            n_glyc: String::new(),
            n_glyc_count: 0,
            molecular_weight: 0.0,
            isoelectric_point: 0.0,
            hydropathy: 0.0,
            scores: AntigenicityScores::default(),
            topologies: Vec::new(),
            blast_hits: Vec::new(),
        }
    }

    fn topology(ordinal: Ordinal) -> TopologyRecord {
        TopologyRecord {
            ordinal,
            method: Method::Emini,
            threshold: 1.0,
            avg_score: 1.0,
            cover: 100.0,
            topology: "EEEE".to_string(),
        }
    }

    fn hit(ordinal: Ordinal, database: &str) -> BlastHitRecord {
        BlastHitRecord {
            ordinal,
            subject_accession: "P1".to_string(),
            percent_identity: 100.0,
            query_coverage: 100.0,
            query_sequence: "PEP".to_string(),
            subject_sequence: "PEP".to_string(),
            database: database.to_string(),
        }
    }

    #[test]
    fn unmatched_ordinals_are_dropped() {
        let mut epitopes = vec![epitope(1), epitope(2)];
        let attached = associate(&mut epitopes, vec![topology(1), topology(1), topology(3)]);

        assert_eq!(attached, 2);
        assert_eq!(epitopes[0].topologies.len(), 2);
        assert!(epitopes[1].topologies.is_empty());
    }

    #[test]
    fn repeated_calls_accumulate() {
        let mut epitopes = vec![epitope(1)];
        associate(&mut epitopes, vec![hit(1, "human")]);
        associate(&mut epitopes, vec![hit(1, "mouse")]);

        let dbs: Vec<_> = epitopes[0].blast_hits.iter().map(|h| h.database.as_str()).collect();
        assert_eq!(dbs, vec!["human", "mouse"]);
    }

    #[test]
    fn duplicate_epitope_ordinal_keeps_first() {
        let mut epitopes = vec![epitope(4), epitope(4)];
        associate(&mut epitopes, vec![topology(4)]);
        assert_eq!(epitopes[0].topologies.len(), 1);
        assert!(epitopes[1].topologies.is_empty());
    }

    #[test]
    fn empty_inputs_attach_nothing() {
        let mut epitopes: Vec<EpitopeRecord> = Vec::new();
        assert_eq!(associate(&mut epitopes, vec![topology(1)]), 0);
    }
}
