use std::collections::HashSet;
use std::path::Path;

use proptest::prelude::*;
use epitrack::config::DefaultsSection;
use epitrack::model::{BlastParams, Proteome, TaskParams};
use epitrack::pipeline::{proteome_spec, CommandBuilder};
use epitrack::types::ActionType;
use epitrack_test_utils::builders::ConfigFileBuilder;

// Aliases drawn from a small pool so duplicates are common.
fn proteomes_strategy() -> impl Strategy<Value = Vec<Proteome>> {
    proptest::collection::vec(
        (prop::sample::select(vec!["human", "mouse", "bat", "camel"]), 0..3u8),
        1..8,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(alias, v)| Proteome::new(alias, format!("/db/{alias}-{v}.fa")))
            .collect()
    })
}

fn builder() -> CommandBuilder {
    CommandBuilder::from_config(&ConfigFileBuilder::new().build())
}

proptest! {
    #[test]
    fn blast_cutoff_flags_only_when_not_default(
        proteomes in proteomes_strategy(),
        cover in 0..=100u32,
        identity in 0..=100u32,
        word_size in 1..=10u32,
    ) {
        let d = DefaultsSection::default();
        let params = TaskParams {
            blast: Some(BlastParams { proteomes, cover, identity, word_size }),
            ..TaskParams::default()
        };

        let cmd = builder().build(Path::new("/in.fasta"), Path::new("/www/a/r"), &params);

        prop_assert_eq!(cmd.has_flag("--cover"), cover != d.cover);
        prop_assert_eq!(cmd.has_flag("--identity"), identity != d.identity);
        prop_assert_eq!(cmd.has_flag("--word-size"), word_size != d.word_size);
        prop_assert_eq!(cmd.flag_value("--search"), Some("blast"));
    }

    #[test]
    fn proteome_spec_has_one_entry_per_alias(proteomes in proteomes_strategy()) {
        let unique: HashSet<&str> = proteomes.iter().map(|p| p.alias.as_str()).collect();

        let spec = proteome_spec(&proteomes);
        let entries: Vec<&str> = spec.split(':').collect();

        prop_assert_eq!(entries.len(), unique.len());
        // First occurrence wins.
        let first_prefix = format!("{}=", proteomes[0].alias);
        prop_assert!(entries[0].starts_with(&first_prefix));
    }

    #[test]
    fn default_action_never_passes_prediction_tuning(
        threshold in 0.0..5.0f64,
        min in 1..50u32,
        max in 1..50u32,
    ) {
        let params = TaskParams {
            action: ActionType::Default,
            threshold: Some(threshold),
            min_length: Some(min),
            max_length: Some(max),
            ..TaskParams::default()
        };

        let cmd = builder().build(Path::new("/in.fasta"), Path::new("/www/a/r"), &params);

        prop_assert!(!cmd.has_flag("--threshold"));
        prop_assert!(!cmd.has_flag("--min-length"));
        prop_assert!(!cmd.has_flag("--max-length"));
        prop_assert!(!cmd.has_flag("--search"));
    }
}
