use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::enums::TestType;

/// Reference entry for one substance code.
#[derive(Debug, Clone, Serialize)]
pub struct Substance {
    pub code: &'static str,
    pub label: &'static str,
    pub panels: &'static [TestType],
}

const INSTANT: &[TestType] = &[TestType::Instant15Panel];
const LAB: &[TestType] = &[TestType::Lab11Panel];
const BOTH: &[TestType] = &[TestType::Instant15Panel, TestType::Lab11Panel];

static SUBSTANCES: &[Substance] = &[
    Substance { code: "6-mam", label: "Heroin (6-MAM)", panels: LAB },
    Substance { code: "amphetamines", label: "Amphetamines", panels: BOTH },
    Substance { code: "barbiturates", label: "Barbiturates", panels: BOTH },
    Substance { code: "benzodiazepines", label: "Benzodiazepines", panels: BOTH },
    Substance { code: "buprenorphine", label: "Buprenorphine", panels: BOTH },
    Substance { code: "cocaine", label: "Cocaine", panels: BOTH },
    Substance { code: "fentanyl", label: "Fentanyl", panels: BOTH },
    Substance { code: "mdma", label: "Ecstasy (MDMA)", panels: INSTANT },
    Substance { code: "methadone", label: "Methadone", panels: BOTH },
    Substance { code: "methamphetamine", label: "Methamphetamine", panels: INSTANT },
    Substance { code: "opiates", label: "Opiates", panels: BOTH },
    Substance { code: "oxycodone", label: "Oxycodone", panels: BOTH },
    Substance { code: "pcp", label: "Phencyclidine (PCP)", panels: INSTANT },
    Substance { code: "propoxyphene", label: "Propoxyphene", panels: INSTANT },
    Substance { code: "thc", label: "Marijuana (THC)", panels: BOTH },
    Substance { code: "tramadol", label: "Tramadol", panels: INSTANT },
];

/// Canonical form of a substance code: trimmed and lowercased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize a list of codes into a sorted, de-duplicated set. Blank codes are dropped.
pub fn normalize_codes<S: AsRef<str>>(codes: &[S]) -> BTreeSet<String> {
    codes
        .iter()
        .map(|c| normalize_code(c.as_ref()))
        .filter(|c| !c.is_empty())
        .collect()
}

pub fn lookup(code: &str) -> Option<&'static Substance> {
    let code = normalize_code(code);
    SUBSTANCES.iter().find(|s| s.code == code)
}

/// Display label, falling back to the code itself for substances outside the catalog.
pub fn display_label(code: &str) -> String {
    lookup(code)
        .map(|s| s.label.to_string())
        .unwrap_or_else(|| normalize_code(code))
}

pub fn all_substances() -> &'static [Substance] {
    SUBSTANCES
}

pub fn panel_substances(panel: TestType) -> Vec<&'static Substance> {
    SUBSTANCES
        .iter()
        .filter(|s| s.panels.contains(&panel))
        .collect()
}

pub fn is_on_panel(code: &str, panel: TestType) -> bool {
    lookup(code).is_some_and(|s| s.panels.contains(&panel))
}
