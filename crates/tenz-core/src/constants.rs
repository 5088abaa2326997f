//! Token constants. All supply values in base units (1 TENZ = 10^18 units).

/// Display name of the token.
pub const TOKEN_NAME: &str = "Tenzorum Token";

/// Ticker symbol.
pub const TOKEN_SYMBOL: &str = "TENZ";

/// Number of decimal places of the base unit.
pub const DECIMALS: u8 = 18;

/// One whole token in base units.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Supply credited to the deployer at deployment, in whole tokens.
pub const INIT_SUPPLY_TOKENS: u64 = 1_237_433_627;

/// Absolute supply cap in whole tokens (exactly twice the initial supply).
pub const MAX_SUPPLY_TOKENS: u64 = 2 * INIT_SUPPLY_TOKENS;

/// Supply at deployment in base units.
pub const INIT_SUPPLY: u128 = INIT_SUPPLY_TOKENS as u128 * UNIT;

/// Absolute supply cap in base units.
pub const MAX_SUPPLY: u128 = MAX_SUPPLY_TOKENS as u128 * UNIT;

/// Length of one emission period in seconds (10 minutes).
pub const PERIOD_UNIT: u64 = 600;

/// Period index from which the full `MAX_SUPPLY` is reachable.
///
/// 1,051,200 ten-minute periods is twenty 365-day years.
pub const LAST_PERIOD: u64 = 1_051_200;

/// Largest supported number of decimals (10^38 still fits in 128 bits).
pub const MAX_DECIMALS: u8 = 38;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_supply_is_twice_initial() {
        assert_eq!(MAX_SUPPLY, 2 * INIT_SUPPLY);
    }

    #[test]
    fn unit_matches_decimals() {
        assert_eq!(UNIT, 10u128.pow(DECIMALS as u32));
    }

    #[test]
    fn last_period_is_twenty_years() {
        assert_eq!(LAST_PERIOD * PERIOD_UNIT, 20 * 365 * 24 * 60 * 60);
    }
}
