//! Result tables in the layout the pipeline writes them.

use std::path::Path;

use epitrack::fs::FileSystem;

pub const EPITOPE_HEADER: &str = "N\tEpitope ID\tSequence\tStart\tEnd\tN-Glyc\tN-Glyc count\tSignal\tLength\tMW\tpI\tHydropathy\tTM\tSurface\tBepiPred-3.0\tEmini\tKolaskar\tChou Fasman\tKarplus Schulz\tParker";
pub const TOPOLOGY_HEADER: &str = "N\tSequence\tMethod\tThreshold\tAvg score\tCover\tTopology";
pub const BLAST_HEADER: &str = "qacc\tsacc\tpident\tqcovs\tqseq\tsseq";
pub const PROTEIN_HEADER: &str = "Protein\tLength\tEpitopes";

/// An `epitope-detail.tsv` with one row per ordinal.
pub fn epitope_table(ordinals: &[u64]) -> String {
    let mut out = format!("{EPITOPE_HEADER}\n");
    for n in ordinals {
        let start = n * 10;
        out.push_str(&format!(
            "{n}\tEPI_{n}\tPEPTIDEK\t{start}\t{end}\tY\t2\t-\t8\t1200.5\t6.1\t-0.3\t-\t-\t0.8\t0.7\t0.6\t0.5\t0.4\t0.3\n",
            end = start + 7,
        ));
    }
    out
}

/// A `topology.tsv` from `(N, method)` rows. An empty `N` continues the
/// previous epitope.
pub fn topology_table(rows: &[(&str, &str)]) -> String {
    let mut out = format!("{TOPOLOGY_HEADER}\n");
    for (n, method) in rows {
        out.push_str(&format!("{n}\tPEPTIDEK\t{method}\t1.0\t1.2\t100\tEEEEEEEE\n"));
    }
    out
}

/// A `blast-<alias>.csv` with one hit per ordinal.
pub fn blast_table(ordinals: &[u64]) -> String {
    let mut out = format!("{BLAST_HEADER}\n");
    for n in ordinals {
        out.push_str(&format!("{n}-EPI_{n}\tSUBJ_{n}\t98.5\t100\tPEPTIDEK\tPEPTIDEK\n"));
    }
    out
}

/// A `protein-summary.tsv` with `proteins` data rows.
pub fn protein_summary(proteins: usize) -> String {
    let mut out = format!("{PROTEIN_HEADER}\n");
    for i in 0..proteins {
        out.push_str(&format!("P{i}\t{}\t1\n", 100 + i));
    }
    out
}

/// Write a complete, consistent set of results into `dir`:
/// epitopes 1 and 2, three topologies for epitope 1 and one for 2, and
/// `proteins` proteins.
pub fn write_standard_results(fs: &dyn FileSystem, dir: &Path, proteins: usize) {
    fs.write(&dir.join("epitope-detail.tsv"), epitope_table(&[1, 2]).as_bytes())
        .expect("write epitope table");
    fs.write(
        &dir.join("topology.tsv"),
        topology_table(&[("1", "BepiPred-3.0"), ("", "Emini"), ("", "Parker"), ("2", "Kolaskar")])
            .as_bytes(),
    )
    .expect("write topology table");
    fs.write(&dir.join("protein-summary.tsv"), protein_summary(proteins).as_bytes())
        .expect("write protein summary");
}
