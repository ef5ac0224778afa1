//! JSON-based assumption loader
//!
//! Loads a raw assumption mapping from disk and validates it.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;

use super::{AssumptionSet, RawAssumptions};

/// Default path to the sample assumption file
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions.json";

/// Read a raw mapping without validating it
pub fn load_raw(path: &Path) -> anyhow::Result<RawAssumptions> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(raw)
}

/// Load and validate assumptions from a JSON file
pub fn load_assumptions(path: &Path) -> anyhow::Result<AssumptionSet> {
    let assumptions = load_raw(path)?
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(assumptions)
}

/// Load assumptions from the default location
pub fn load_default() -> anyhow::Result<AssumptionSet> {
    load_assumptions(Path::new(DEFAULT_ASSUMPTIONS_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn test_load_default_assumptions() {
        let result = load_default();
        assert!(result.is_ok(), "Failed to load assumptions: {:?}", result.err());

        let assumptions = result.unwrap();
        assert!(assumptions.starting_revenue > 0.0);
        assert!(!assumptions.equity_events.is_empty());
        assert!(!assumptions.capex_events.is_empty());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_assumptions(Path::new("data/does_not_exist.json")).unwrap_err();
        assert!(err.to_string().contains("does_not_exist.json"));
    }

    #[test]
    fn test_validation_error_survives_context() {
        let dir = std::env::temp_dir().join("finproj_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(
            &path,
            r#"{"starting_revenue": -5, "monthly_growth_rate": 0.1, "cogs_fraction": 0.3,
                "fixed_opex": 1000, "variable_opex_fraction": 0.1, "tax_rate": 0.2,
                "starting_cash": 0}"#,
        )
        .unwrap();

        let err = load_assumptions(&path).unwrap_err();
        let model_err = err.downcast_ref::<ModelError>().expect("validation error kept");
        assert!(model_err.is_validation());
    }
}
