//! Emission schedule: how much supply may exist at each period.
//!
//! New supply is released as a decreasing arithmetic sequence of per-period
//! allotments. With `E = max_supply - init_supply` and `L = last_period`:
//!
//! ```text
//! a1   = 2 * E / L             first allotment
//! r    = a1 / (L - 1)          common decrease per period
//! S(p) = p * (2*a1 - r*(p-1)) / 2
//! max_allowed_supply(p) = min(init_supply + S(p), max_supply)   for p < L
//!                       = max_supply                             for p >= L
//! ```
//!
//! Every division truncates toward zero, in exactly this order. Changing the
//! order shifts the curve by a few base units per period, which the deployed
//! token's published values would expose.
//!
//! The ceiling depends only on elapsed time, never on how often or by how
//! much minting has happened, so a mint can be retried or split freely.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::constants::{INIT_SUPPLY, LAST_PERIOD, MAX_SUPPLY, PERIOD_UNIT};
use crate::error::TokenError;

/// Immutable parameters of the emission curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionCurve {
    pub init_supply: Amount,
    pub max_supply: Amount,
    /// Seconds per period.
    pub period_unit: u64,
    /// First period at which the whole `max_supply` is reachable.
    pub last_period: u64,
}

impl Default for EmissionCurve {
    fn default() -> Self {
        Self {
            init_supply: Amount::new(INIT_SUPPLY),
            max_supply: Amount::new(MAX_SUPPLY),
            period_unit: PERIOD_UNIT,
            last_period: LAST_PERIOD,
        }
    }
}

impl EmissionCurve {
    /// Total supply the schedule may add on top of the initial supply.
    pub fn emission(&self) -> Result<Amount, TokenError> {
        self.max_supply.checked_sub(self.init_supply)
    }

    /// `a1`: allotment of the first period.
    pub fn first_allotment(&self) -> Result<Amount, TokenError> {
        self.emission()?
            .checked_mul(Amount::new(2))?
            .checked_div(Amount::from(self.last_period))
    }

    /// `r`: how much each allotment shrinks relative to the previous one.
    pub fn common_difference(&self) -> Result<Amount, TokenError> {
        let terms_after_first = self
            .last_period
            .checked_sub(1)
            .ok_or(TokenError::ArithmeticOverflow)?;
        self.first_allotment()?
            .checked_div(Amount::from(terms_after_first))
    }

    /// `S(p)`: total released by the end of `periods` whole periods.
    ///
    /// Only meaningful for `periods < last_period`; past that the quadratic
    /// turns over, which is why [`max_allowed_supply`](Self::max_allowed_supply)
    /// pins the result to `max_supply` instead.
    pub fn cumulative_emission(&self, periods: u64) -> Result<Amount, TokenError> {
        if periods == 0 {
            return Ok(Amount::ZERO);
        }
        let a1 = self.first_allotment()?;
        let r = self.common_difference()?;
        let p = Amount::from(periods);
        let decrease = r.checked_mul(Amount::from(periods - 1))?;
        a1.checked_mul(Amount::new(2))?
            .checked_sub(decrease)?
            .checked_mul(p)?
            .checked_div(Amount::new(2))
    }

    /// Ceiling on total supply once `period` whole periods have elapsed.
    ///
    /// Non-decreasing in `period`, equal to `init_supply` at 0 and to
    /// `max_supply` from `last_period` on.
    pub fn max_allowed_supply(&self, period: u64) -> Result<Amount, TokenError> {
        if period >= self.last_period {
            return Ok(self.max_supply);
        }
        let ceiling = self
            .init_supply
            .checked_add(self.cumulative_emission(period)?)?;
        Ok(ceiling.min(self.max_supply))
    }

    /// New supply released during `period` alone (`S(p) - S(p-1)`).
    ///
    /// Zero for period 0, since no time has elapsed yet.
    pub fn period_allotment(&self, period: u64) -> Result<Amount, TokenError> {
        if period == 0 {
            return Ok(Amount::ZERO);
        }
        let now = self.max_allowed_supply(period)?;
        let before = self.max_allowed_supply(period - 1)?;
        now.checked_sub(before)
    }

    /// Whole periods elapsed between `start` and `now`.
    ///
    /// Saturates to zero if `now` precedes `start`.
    pub fn period_at(&self, start: u64, now: u64) -> u64 {
        if self.period_unit == 0 {
            return 0;
        }
        now.saturating_sub(start) / self.period_unit
    }
}

/// Minting clock: when the first period began, if it has.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    curve: EmissionCurve,
    first_period_start: Option<u64>,
}

impl EmissionSchedule {
    pub fn new(curve: EmissionCurve) -> Self {
        Self {
            curve,
            first_period_start: None,
        }
    }

    pub fn curve(&self) -> &EmissionCurve {
        &self.curve
    }

    pub fn first_period_start(&self) -> Option<u64> {
        self.first_period_start
    }

    pub fn is_started(&self) -> bool {
        self.first_period_start.is_some()
    }

    /// Start period 0 at `now`.
    ///
    /// The caller decides whether starting is allowed (gate open, owner
    /// privilege); this only enforces that it happens once.
    ///
    /// # Errors
    ///
    /// - [`TokenError::AlreadyStarted`] if the schedule has a start time
    pub fn start(&mut self, now: u64) -> Result<(), TokenError> {
        if self.is_started() {
            return Err(TokenError::AlreadyStarted);
        }
        self.first_period_start = Some(now);
        Ok(())
    }

    /// Current period index; 0 until started.
    pub fn current_period(&self, now: u64) -> u64 {
        match self.first_period_start {
            Some(start) => self.curve.period_at(start, now),
            None => 0,
        }
    }

    pub fn max_allowed_supply(&self, period: u64) -> Result<Amount, TokenError> {
        self.curve.max_allowed_supply(period)
    }

    /// How much may be minted at `now` given the current `total_supply`.
    ///
    /// Zero before the schedule starts or when supply already meets the
    /// ceiling.
    pub fn available(&self, total_supply: Amount, now: u64) -> Result<Amount, TokenError> {
        if !self.is_started() {
            return Ok(Amount::ZERO);
        }
        let ceiling = self.max_allowed_supply(self.current_period(now))?;
        Ok(ceiling.saturating_sub(total_supply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::UNIT;

    fn curve() -> EmissionCurve {
        EmissionCurve::default()
    }

    fn whole(a: Amount) -> u128 {
        a.get() / UNIT
    }

    // ------------------------------------------------------------------
    // closed-form coefficients
    // ------------------------------------------------------------------

    #[test]
    fn first_allotment_matches_reference() {
        assert_eq!(
            curve().first_allotment().unwrap(),
            Amount::new(2_354_325_774_353_120_243_531)
        );
    }

    #[test]
    fn common_difference_matches_reference() {
        assert_eq!(
            curve().common_difference().unwrap(),
            Amount::new(2_239_657_547_574_836)
        );
    }

    #[test]
    fn cumulative_emission_zero_periods() {
        assert_eq!(curve().cumulative_emission(0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn cumulative_emission_one_period_is_first_allotment() {
        let c = curve();
        assert_eq!(
            c.cumulative_emission(1).unwrap(),
            c.first_allotment().unwrap()
        );
    }

    // ------------------------------------------------------------------
    // max_allowed_supply
    // ------------------------------------------------------------------

    #[test]
    fn period_zero_is_initial_supply() {
        assert_eq!(
            curve().max_allowed_supply(0).unwrap(),
            Amount::new(INIT_SUPPLY)
        );
    }

    #[test]
    fn first_periods_match_published_values() {
        let expected: [u128; 11] = [
            1_237_433_627,
            1_237_435_981,
            1_237_438_335,
            1_237_440_689,
            1_237_443_044,
            1_237_445_398,
            1_237_447_752,
            1_237_450_107,
            1_237_452_461,
            1_237_454_815,
            1_237_457_170,
        ];
        for (p, want) in expected.iter().enumerate() {
            let got = whole(curve().max_allowed_supply(p as u64).unwrap());
            assert_eq!(got, *want, "mismatch at period {p}");
        }
    }

    #[test]
    fn last_periods_match_published_values() {
        let expected: [u128; 6] = [
            2_474_867_253,
            2_474_867_253,
            2_474_867_254,
            2_474_867_254,
            2_474_867_254,
            2_474_867_254,
        ];
        for (i, want) in expected.iter().enumerate() {
            let p = 1_051_197 + i as u64;
            let got = whole(curve().max_allowed_supply(p).unwrap());
            assert_eq!(got, *want, "mismatch at period {p}");
        }
    }

    #[test]
    fn reaches_cap_exactly_at_last_period() {
        let c = curve();
        assert_eq!(c.max_allowed_supply(LAST_PERIOD).unwrap(), c.max_supply);
        assert!(c.max_allowed_supply(LAST_PERIOD - 1).unwrap() <= c.max_supply);
    }

    #[test]
    fn far_future_is_capped() {
        assert_eq!(
            curve().max_allowed_supply(u64::MAX).unwrap(),
            Amount::new(MAX_SUPPLY)
        );
    }

    #[test]
    fn monotonic_near_the_turnover() {
        let c = curve();
        let mut prev = c.max_allowed_supply(LAST_PERIOD - 20).unwrap();
        for p in (LAST_PERIOD - 19)..=(LAST_PERIOD + 5) {
            let v = c.max_allowed_supply(p).unwrap();
            assert!(v >= prev, "not monotonic at period {p}");
            prev = v;
        }
    }

    #[test]
    fn allotments_shrink() {
        let c = curve();
        let first = c.period_allotment(1).unwrap();
        let later = c.period_allotment(500_000).unwrap();
        assert!(later < first);
        assert_eq!(c.period_allotment(0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn degenerate_curve_reports_overflow() {
        let c = EmissionCurve {
            last_period: 1,
            ..curve()
        };
        assert_eq!(c.common_difference(), Err(TokenError::ArithmeticOverflow));
    }

    // ------------------------------------------------------------------
    // EmissionSchedule
    // ------------------------------------------------------------------

    #[test]
    fn unstarted_schedule_is_period_zero() {
        let s = EmissionSchedule::new(curve());
        assert_eq!(s.current_period(1_000_000), 0);
        assert_eq!(
            s.available(Amount::new(INIT_SUPPLY), 1_000_000).unwrap(),
            Amount::ZERO
        );
    }

    #[test]
    fn start_is_one_shot() {
        let mut s = EmissionSchedule::new(curve());
        s.start(100).unwrap();
        assert_eq!(s.first_period_start(), Some(100));
        assert_eq!(s.start(200), Err(TokenError::AlreadyStarted));
        assert_eq!(s.first_period_start(), Some(100));
    }

    #[test]
    fn current_period_counts_whole_periods() {
        let mut s = EmissionSchedule::new(curve());
        s.start(1_000).unwrap();
        assert_eq!(s.current_period(1_000), 0);
        assert_eq!(s.current_period(1_000 + PERIOD_UNIT - 1), 0);
        assert_eq!(s.current_period(1_000 + PERIOD_UNIT), 1);
        assert_eq!(s.current_period(1_000 + 2 * PERIOD_UNIT), 2);
    }

    #[test]
    fn current_period_never_underflows() {
        let mut s = EmissionSchedule::new(curve());
        s.start(1_000).unwrap();
        assert_eq!(s.current_period(0), 0);
    }

    #[test]
    fn available_is_ceiling_minus_supply() {
        let mut s = EmissionSchedule::new(curve());
        s.start(0).unwrap();
        let ceiling = curve().max_allowed_supply(1).unwrap();
        let supply = Amount::new(INIT_SUPPLY);
        assert_eq!(
            s.available(supply, PERIOD_UNIT).unwrap(),
            ceiling.checked_sub(supply).unwrap()
        );
        // Supply at or above the ceiling leaves nothing to mint.
        assert_eq!(s.available(Amount::new(MAX_SUPPLY), PERIOD_UNIT).unwrap(), Amount::ZERO);
    }
}
