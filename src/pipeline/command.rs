// src/pipeline/command.rs

//! Turns a task's parameters into the pipeline's command line.
//!
//! Pure and deterministic: the same parameters always produce the same
//! argument list, and nothing here touches the filesystem or spawns
//! anything.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::{ConfigFile, DefaultsSection, PipelineSection};
use crate::model::{Proteome, TaskParams};
use crate::types::ActionType;

/// Separator between `alias=path` entries in `--proteomes`.
pub const PROTEOME_SEPARATOR: &str = ":";

/// A fully built pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PipelineCommand {
    /// Whether `flag` appears as an argument.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// POSIX-shell rendering with every token single-quoted as needed.
    pub fn to_shell_string(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|token| shell_quote(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for PipelineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

/// Builds [`PipelineCommand`]s from task parameters.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    pipeline: PipelineSection,
    defaults: DefaultsSection,
}

impl CommandBuilder {
    pub fn new(pipeline: PipelineSection, defaults: DefaultsSection) -> Self {
        Self { pipeline, defaults }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.pipeline.clone(), cfg.defaults)
    }

    /// Parameters as they will actually be used.
    ///
    /// The `Default` action clears every tunable prediction parameter,
    /// whatever the caller supplied.
    pub fn effective_params(params: &TaskParams) -> TaskParams {
        let mut params = params.clone();
        if params.action == ActionType::Default {
            params.threshold = None;
            params.min_length = None;
            params.max_length = None;
        }
        params
    }

    /// Build the invocation for one run.
    ///
    /// Always passes `--input_file` and `--basename`. Every other flag is
    /// emitted only when its value differs from the pipeline default.
    pub fn build(&self, input_file: &Path, basename: &Path, params: &TaskParams) -> PipelineCommand {
        let params = Self::effective_params(params);
        let d = &self.defaults;

        let mut args = self.pipeline.prefix_args.clone();
        push_flag(&mut args, "--input_file", input_file.display());
        push_flag(&mut args, "--basename", basename.display());

        if let Some(threshold) = params.threshold {
            if (threshold - d.threshold).abs() > f64::EPSILON {
                push_flag(&mut args, "--threshold", threshold);
            }
        }
        if let Some(min) = params.min_length.filter(|v| *v != d.min_length) {
            push_flag(&mut args, "--min-length", min);
        }
        if let Some(max) = params.max_length.filter(|v| *v != d.max_length) {
            push_flag(&mut args, "--max-length", max);
        }

        if let Some(blast) = &params.blast {
            push_flag(&mut args, "--search", "blast");

            let spec = proteome_spec(&blast.proteomes);
            if spec.is_empty() {
                warn!("BLAST enabled without proteomes; omitting --proteomes");
            } else {
                push_flag(&mut args, "--proteomes", spec);
            }

            if blast.cover != d.cover {
                push_flag(&mut args, "--cover", blast.cover);
            }
            if blast.identity != d.identity {
                push_flag(&mut args, "--identity", blast.identity);
            }
            if blast.word_size != d.word_size {
                push_flag(&mut args, "--word-size", blast.word_size);
            }
        }

        let cmd = PipelineCommand {
            program: self.pipeline.program.clone(),
            args,
        };
        debug!(command = %cmd, "built pipeline command");
        cmd
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: impl fmt::Display) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

/// Serialize proteomes as `alias=path` pairs joined by
/// [`PROTEOME_SEPARATOR`], keeping the first occurrence of each alias.
pub fn proteome_spec(proteomes: &[Proteome]) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries = Vec::with_capacity(proteomes.len());

    for proteome in proteomes {
        if !seen.insert(proteome.alias.as_str()) {
            continue;
        }
        entries.push(format!("{}={}", proteome.alias, proteome.path.display()));
    }

    entries.join(PROTEOME_SEPARATOR)
}

/// Quote `token` for a POSIX shell. Tokens made only of safe characters are
/// returned unchanged.
pub fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlastParams;
    use std::path::PathBuf;

    fn builder() -> CommandBuilder {
        CommandBuilder::new(PipelineSection::default(), DefaultsSection::default())
    }

    fn blast(cover: u32, identity: u32, word_size: u32) -> BlastParams {
        BlastParams {
            proteomes: vec![Proteome::new("human", "/db/human.fasta")],
            cover,
            identity,
            word_size,
        }
    }

    fn build(params: &TaskParams) -> PipelineCommand {
        builder().build(
            Path::new("/www/u/r/input.fasta"),
            Path::new("/www/u/r"),
            params,
        )
    }

    #[test]
    fn always_passes_input_and_basename_after_prefix() {
        let cmd = build(&TaskParams::default());
        assert_eq!(cmd.program, "nextflow");
        assert_eq!(
            cmd.args,
            vec![
                "run",
                "/pipeline/main.nf",
                "--input_file",
                "/www/u/r/input.fasta",
                "--basename",
                "/www/u/r",
            ]
        );
    }

    #[test]
    fn default_blast_cutoffs_are_elided() {
        let params = TaskParams {
            blast: Some(blast(90, 90, 4)),
            ..TaskParams::default()
        };
        let cmd = build(&params);
        assert_eq!(cmd.flag_value("--search"), Some("blast"));
        assert!(!cmd.has_flag("--cover"));
        assert!(!cmd.has_flag("--identity"));
        assert!(!cmd.has_flag("--word-size"));
    }

    #[test]
    fn non_default_blast_cutoffs_are_passed() {
        let params = TaskParams {
            blast: Some(blast(80, 95, 3)),
            ..TaskParams::default()
        };
        let cmd = build(&params);
        assert_eq!(cmd.flag_value("--cover"), Some("80"));
        assert_eq!(cmd.flag_value("--identity"), Some("95"));
        assert_eq!(cmd.flag_value("--word-size"), Some("3"));
    }

    #[test]
    fn proteomes_are_deduplicated_by_alias() {
        let proteomes = vec![
            Proteome::new("db1", "/a"),
            Proteome::new("db1", "/a"),
            Proteome::new("db2", "/b"),
        ];
        let spec = proteome_spec(&proteomes);
        assert_eq!(spec, "db1=/a:db2=/b");
        assert_eq!(spec.split(PROTEOME_SEPARATOR).count(), 2);
    }

    #[test]
    fn default_action_clears_caller_values() {
        let params = TaskParams {
            action: ActionType::Default,
            threshold: Some(0.5),
            min_length: Some(5),
            max_length: Some(50),
            blast: None,
        };
        let cmd = build(&params);
        assert!(!cmd.has_flag("--threshold"));
        assert!(!cmd.has_flag("--min-length"));
        assert!(!cmd.has_flag("--max-length"));
    }

    #[test]
    fn customized_action_passes_only_non_default_bounds() {
        let params = TaskParams {
            action: ActionType::Customized,
            threshold: Some(0.1512),
            min_length: Some(8),
            max_length: Some(30),
            blast: None,
        };
        let cmd = build(&params);
        assert!(!cmd.has_flag("--threshold"));
        assert_eq!(cmd.flag_value("--min-length"), Some("8"));
        assert!(!cmd.has_flag("--max-length"));
    }

    #[test]
    fn blast_disabled_omits_search_and_proteomes() {
        let cmd = build(&TaskParams::default());
        assert!(!cmd.has_flag("--search"));
        assert!(!cmd.has_flag("--proteomes"));
    }

    #[test]
    fn building_is_deterministic() {
        let params = TaskParams {
            action: ActionType::Customized,
            threshold: Some(0.3),
            blast: Some(blast(70, 90, 4)),
            ..TaskParams::default()
        };
        assert_eq!(build(&params), build(&params));
    }

    #[test]
    fn shell_rendering_quotes_unsafe_tokens() {
        let cmd = PipelineCommand {
            program: "nextflow".to_string(),
            args: vec!["--basename".to_string(), "/www/it's here".to_string()],
        };
        assert_eq!(cmd.to_shell_string(), r"nextflow --basename '/www/it'\''s here'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote(&PathBuf::from("/a/b.fa").display().to_string()), "/a/b.fa");
    }
}
