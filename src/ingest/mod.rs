// src/ingest/mod.rs

//! Result ingestion for a terminated pipeline run.
//!
//! [`Ingestor::ingest`] is all-or-nothing: it either returns every epitope
//! of the run with its topologies and BLAST hits attached, or an error and
//! nothing at all.

pub mod associate;
pub mod parser;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{EpitrackError, Result};
use crate::fs::FileSystem;
use crate::model::EpitopeRecord;
use crate::pipeline::layout::{WorkDirLayout, blast_database_alias, is_blast_file};

pub use associate::associate;

/// Everything recovered from one task directory.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionResult {
    pub epitopes: Vec<EpitopeRecord>,
    pub proteome_size: usize,
    /// BLAST tables that were read, in the order they were applied.
    pub blast_files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Ingestor {
    fs: Arc<dyn FileSystem>,
}

impl Ingestor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn ingest(&self, layout: &WorkDirLayout, blast_enabled: bool) -> Result<IngestionResult> {
        let fs = self.fs.as_ref();
        let dir = layout.dir();

        if !fs.is_dir(dir) {
            return Err(EpitrackError::MissingResultFiles {
                dir: dir.to_path_buf(),
                missing: vec![dir.display().to_string()],
            });
        }

        let missing: Vec<String> = layout
            .required_results()
            .iter()
            .filter(|p| !fs.is_file(p))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        if !missing.is_empty() {
            return Err(EpitrackError::MissingResultFiles {
                dir: dir.to_path_buf(),
                missing,
            });
        }

        let mut epitopes = parser::parse_epitopes(fs, &layout.epitope_table())?;
        let topologies = parser::parse_topologies(fs, &layout.topology_table())?;
        let attached = associate(&mut epitopes, topologies);
        debug!(epitopes = epitopes.len(), attached, "attached topologies");

        let mut blast_files = Vec::new();
        if blast_enabled {
            blast_files = self.blast_tables(layout)?;
            if blast_files.is_empty() {
                info!(dir = ?dir, "BLAST was requested but produced no tables");
            }
            for path in &blast_files {
                let database = blast_database_alias(path);
                let hits = parser::parse_blast_hits(fs, path, &database)?;
                let attached = associate(&mut epitopes, hits);
                debug!(path = ?path, database, attached, "attached BLAST hits");
            }
        }

        let proteome_size = parser::count_proteins(fs, &layout.protein_summary())?;

        Ok(IngestionResult {
            epitopes,
            proteome_size,
            blast_files,
        })
    }

    /// `blast-*.csv` files in the task directory, sorted by name.
    fn blast_tables(&self, layout: &WorkDirLayout) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .fs
            .read_dir(layout.dir())?
            .into_iter()
            .filter(|p| is_blast_file(p) && self.fs.is_file(p))
            .collect();
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const DIR: &str = "/www/alice/run_20250101_000000";

    fn populated() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file(
            format!("{DIR}/epitope-detail.tsv"),
            "N\tid\tseq\tstart\tend\tng\tngc\tx\tlen\tmw\tpi\thyd\tx\tx\tb\te\tk\tc\tks\tp\n\
             1\tE1\tPEPTIDEK\t1\t8\t-\t0\t-\t8\t900\t5.5\t0.1\t-\t-\t0.5\t1\t1\t1\t1\t1\n\
             2\tE2\tKLMNPQRS\t9\t16\t-\t0\t-\t8\t950\t6.5\t0.2\t-\t-\t0.6\t1\t1\t1\t1\t1\n",
        );
        fs.add_file(
            format!("{DIR}/topology.tsv"),
            "N\tseq\tmethod\tthr\tavg\tcover\ttopo\n\
             1\tPEPTIDEK\tEmini\t1\t1.1\t100\tEEEEEEEE\n\
             \tPEPTIDEK\tParker\t1\t1.2\t50\tEEEE----\n\
             9\tXXXX\tParker\t1\t1.2\t50\tEEEE\n",
        );
        fs.add_file(format!("{DIR}/protein-summary.tsv"), "id\tlen\nP1\t10\nP2\t20\n");
        fs
    }

    fn ingestor(fs: MockFileSystem) -> Ingestor {
        Ingestor::new(Arc::new(fs))
    }

    #[test]
    fn joins_tables_and_counts_proteins() {
        let result = ingestor(populated())
            .ingest(&WorkDirLayout::new(DIR), false)
            .unwrap();

        assert_eq!(result.epitopes.len(), 2);
        assert_eq!(result.epitopes[0].topologies.len(), 2);
        assert!(result.epitopes[1].topologies.is_empty());
        assert_eq!(result.proteome_size, 2);
        assert!(result.blast_files.is_empty());
    }

    #[test]
    fn blast_tables_are_ignored_unless_requested() {
        let fs = populated();
        fs.add_file(format!("{DIR}/blast-human.csv"), "q\ts\tp\tc\tqs\tss\n1-a\tP1\t100\t100\tA\tA\n");

        let off = ingestor(fs.clone()).ingest(&WorkDirLayout::new(DIR), false).unwrap();
        assert!(off.epitopes[0].blast_hits.is_empty());

        let on = ingestor(fs).ingest(&WorkDirLayout::new(DIR), true).unwrap();
        assert_eq!(on.epitopes[0].blast_hits.len(), 1);
        assert_eq!(on.epitopes[0].blast_hits[0].database, "human");
    }

    #[test]
    fn requested_blast_without_tables_is_tolerated() {
        let result = ingestor(populated())
            .ingest(&WorkDirLayout::new(DIR), true)
            .unwrap();
        assert!(result.blast_files.is_empty());
        assert_eq!(result.epitopes.len(), 2);
    }

    #[test]
    fn missing_topology_is_reported() {
        let fs = populated();
        fs.remove(format!("{DIR}/topology.tsv"));

        let err = ingestor(fs).ingest(&WorkDirLayout::new(DIR), false).unwrap_err();
        match err {
            EpitrackError::MissingResultFiles { missing, .. } => {
                assert_eq!(missing, vec!["topology.tsv".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_directory_is_reported() {
        let err = ingestor(MockFileSystem::new())
            .ingest(&WorkDirLayout::new("/nowhere"), false)
            .unwrap_err();
        assert!(matches!(err, EpitrackError::MissingResultFiles { .. }));
    }
}
