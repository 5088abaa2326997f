//! Deployment parameters for a token instance.
//!
//! [`TokenParams::default`] reproduces the TENZ deployment. Other values can
//! be layered on top from a config file and `TENZ_*` environment variables
//! (`TENZ_SYMBOL`, `TENZ_LAST_PERIOD`, ...). Supplies are given in whole
//! tokens and scaled by `10^decimals`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::constants::{
    DECIMALS, INIT_SUPPLY_TOKENS, LAST_PERIOD, MAX_DECIMALS, MAX_SUPPLY_TOKENS, PERIOD_UNIT,
    TOKEN_NAME, TOKEN_SYMBOL,
};
use crate::error::ConfigError;
use crate::schedule::EmissionCurve;

/// Environment variable prefix for parameter overrides.
pub const ENV_PREFIX: &str = "TENZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Supply credited to the deployer, in whole tokens.
    pub init_supply_tokens: u64,
    /// Absolute cap, in whole tokens.
    pub max_supply_tokens: u64,
    /// Seconds per emission period.
    pub period_unit_secs: u64,
    /// Period from which the full cap is mintable.
    pub last_period: u64,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: DECIMALS,
            init_supply_tokens: INIT_SUPPLY_TOKENS,
            max_supply_tokens: MAX_SUPPLY_TOKENS,
            period_unit_secs: PERIOD_UNIT,
            last_period: LAST_PERIOD,
        }
    }
}

impl TokenParams {
    /// Defaults, overlaid by `path` (TOML, JSON, YAML... by extension) if
    /// given, overlaid by `TENZ_*` environment variables. Validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let params: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Initial supply in base units.
    pub fn init_supply(&self) -> Result<Amount, ConfigError> {
        Amount::from_units(self.init_supply_tokens, self.decimals)
            .map_err(|_| invalid("init_supply_tokens", "overflows 128-bit base units"))
    }

    /// Supply cap in base units.
    pub fn max_supply(&self) -> Result<Amount, ConfigError> {
        Amount::from_units(self.max_supply_tokens, self.decimals)
            .map_err(|_| invalid("max_supply_tokens", "overflows 128-bit base units"))
    }

    /// The emission curve these parameters describe.
    pub fn curve(&self) -> Result<EmissionCurve, ConfigError> {
        Ok(EmissionCurve {
            init_supply: self.init_supply()?,
            max_supply: self.max_supply()?,
            period_unit: self.period_unit_secs,
            last_period: self.last_period,
        })
    }

    /// Reject parameter sets the ledger or schedule cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol", "must not be empty"));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(invalid(
                "decimals",
                format!("{} exceeds {MAX_DECIMALS}", self.decimals),
            ));
        }
        if self.max_supply_tokens < self.init_supply_tokens {
            return Err(invalid("max_supply_tokens", "below init_supply_tokens"));
        }
        if self.period_unit_secs == 0 {
            return Err(invalid("period_unit_secs", "must be positive"));
        }
        if self.last_period < 2 {
            return Err(invalid("last_period", "must be at least 2"));
        }

        // S(p) peaks just before last_period; if that evaluates, every
        // earlier period does too.
        let curve = self.curve()?;
        curve
            .max_allowed_supply(self.last_period - 1)
            .map_err(|_| invalid("last_period", "emission curve overflows 128-bit arithmetic"))?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INIT_SUPPLY, MAX_SUPPLY};
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let params = TokenParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.init_supply().unwrap(), Amount::new(INIT_SUPPLY));
        assert_eq!(params.max_supply().unwrap(), Amount::new(MAX_SUPPLY));
        assert_eq!(params.curve().unwrap(), EmissionCurve::default());
    }

    #[test]
    fn rejects_cap_below_initial() {
        let params = TokenParams {
            max_supply_tokens: 1,
            init_supply_tokens: 2,
            ..TokenParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidParameter { field: "max_supply_tokens", .. })
        ));
    }

    #[test]
    fn rejects_zero_period_unit() {
        let params = TokenParams {
            period_unit_secs: 0,
            ..TokenParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidParameter { field: "period_unit_secs", .. })
        ));
    }

    #[test]
    fn rejects_single_period_schedule() {
        let params = TokenParams {
            last_period: 1,
            ..TokenParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidParameter { field: "last_period", .. })
        ));
    }

    #[test]
    fn rejects_too_many_decimals() {
        let params = TokenParams {
            decimals: 39,
            ..TokenParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidParameter { field: "decimals", .. })
        ));
    }

    #[test]
    fn rejects_overflowing_supply() {
        let params = TokenParams {
            decimals: 38,
            init_supply_tokens: 1,
            max_supply_tokens: u64::MAX,
            ..TokenParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidParameter { field: "max_supply_tokens", .. })
        ));
    }

    #[test]
    fn rejects_empty_symbol() {
        let params = TokenParams {
            symbol: "  ".to_string(),
            ..TokenParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn load_overlays_file_on_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "symbol = \"TST\"").unwrap();
        writeln!(file, "init_supply_tokens = 1000").unwrap();
        writeln!(file, "max_supply_tokens = 2000").unwrap();
        writeln!(file, "last_period = 10").unwrap();
        file.flush().unwrap();

        let params = TokenParams::load(Some(file.path())).unwrap();
        assert_eq!(params.symbol, "TST");
        assert_eq!(params.init_supply_tokens, 1_000);
        assert_eq!(params.last_period, 10);
        // Untouched keys keep their defaults.
        assert_eq!(params.name, TOKEN_NAME);
        assert_eq!(params.period_unit_secs, PERIOD_UNIT);
    }

    #[test]
    fn load_validates() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "period_unit_secs = 0").unwrap();
        file.flush().unwrap();
        assert!(TokenParams::load(Some(file.path())).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let missing = Path::new("/nonexistent/tenz-params.toml");
        assert!(matches!(
            TokenParams::load(Some(missing)),
            Err(ConfigError::Load(_))
        ));
    }
}
