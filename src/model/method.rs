// src/model/method.rs

//! Prediction methods that appear in the topology table.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Closed set of prediction methods.
///
/// `AllMatches` doubles as the catch-all for labels that match nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    Bepipred,
    Emini,
    ChouFasman,
    Kolaskar,
    KarplusSchulz,
    Parker,
    AllMatches,
    NGlyc,
    Hydropathy,
}

/// Trailing version suffix on a label, e.g. the `-3.0` in `BepiPred-3.0`.
static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]*v?\d+(\.\d+)*$").expect("static regex"));

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Bepipred,
        Method::Emini,
        Method::ChouFasman,
        Method::Kolaskar,
        Method::KarplusSchulz,
        Method::Parker,
        Method::AllMatches,
        Method::NGlyc,
        Method::Hydropathy,
    ];

    /// The label the pipeline writes for this method.
    pub fn description(self) -> &'static str {
        match self {
            Method::Bepipred => "BepiPred",
            Method::Emini => "Emini",
            Method::ChouFasman => "Chou Fasman",
            Method::Kolaskar => "Kolaskar",
            Method::KarplusSchulz => "Karplus Schulz",
            Method::Parker => "Parker",
            Method::AllMatches => "All matches",
            Method::NGlyc => "N-Glyc",
            // Spelled the way the pipeline emits it.
            Method::Hydropathy => "Hidropathy",
        }
    }

    /// Strict, case-insensitive lookup by description or known alias.
    pub fn from_description(label: &str) -> Option<Method> {
        let label = label.trim();
        if let Some(method) = Self::exact(label) {
            return Some(method);
        }
        if label.eq_ignore_ascii_case("hydropathy") {
            return Some(Method::Hydropathy);
        }

        // Versioned labels collapse onto their canonical form. `N-Glyc` has no
        // digits so it is never touched here.
        let unversioned = VERSION_SUFFIX.replace(label, "");
        if unversioned != label {
            return Self::exact(unversioned.trim());
        }
        None
    }

    /// Lenient lookup used by the topology parser: unknown labels fall back
    /// to [`Method::AllMatches`] with a warning.
    pub fn normalize(label: &str) -> Method {
        match Self::from_description(label) {
            Some(method) => method,
            None => {
                warn!(label = %label, "unknown method label; using 'All matches'");
                Method::AllMatches
            }
        }
    }

    fn exact(label: &str) -> Option<Method> {
        Self::ALL
            .into_iter()
            .find(|m| m.description().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
