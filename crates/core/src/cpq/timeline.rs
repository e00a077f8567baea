use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Tunables for timeline pricing. Defaults reproduce the published price
/// curve; deployments may narrow or widen the delivery window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelinePolicy {
    pub min_delivery_ratio: f64,
    pub max_delivery_ratio: f64,
    pub extension_discount_floor: Decimal,
}

impl Default for TimelinePolicy {
    fn default() -> Self {
        Self {
            min_delivery_ratio: 0.5,
            max_delivery_ratio: 1.5,
            extension_discount_floor: Decimal::new(75, 2),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryBounds {
    pub min_weeks: u32,
    pub max_weeks: u32,
    pub standard_weeks: u32,
}

impl DeliveryBounds {
    pub fn contains(&self, weeks: u32) -> bool {
        (self.min_weeks..=self.max_weeks).contains(&weeks)
    }

    pub fn clamp(&self, weeks: u32) -> u32 {
        weeks.clamp(self.min_weeks, self.max_weeks)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineAdjustment {
    Standard,
    Expedited,
    Extended,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineInput {
    pub requested_weeks: u32,
    pub standard_weeks: u32,
    pub base_cost: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineQuote {
    pub requested_weeks: u32,
    pub standard_weeks: u32,
    pub base_cost: Decimal,
    pub multiplier: Decimal,
    pub adjusted_cost: Decimal,
    pub adjustment: TimelineAdjustment,
}

impl TimelineQuote {
    /// Within one currency unit of the base cost.
    pub fn is_standard_price(&self) -> bool {
        (self.adjusted_cost - self.base_cost).abs() <= Decimal::ONE
    }
}

pub trait TimelinePricingEngine: Send + Sync {
    fn price(&self, input: &TimelineInput) -> TimelineQuote;

    fn bounds(&self, standard_weeks: u32) -> DeliveryBounds;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicTimelinePricer {
    policy: TimelinePolicy,
}

impl DeterministicTimelinePricer {
    pub fn new(policy: TimelinePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TimelinePolicy {
        &self.policy
    }
}

impl TimelinePricingEngine for DeterministicTimelinePricer {
    fn price(&self, input: &TimelineInput) -> TimelineQuote {
        price_timeline_with_policy(input, &self.policy)
    }

    fn bounds(&self, standard_weeks: u32) -> DeliveryBounds {
        delivery_bounds(standard_weeks, &self.policy)
    }
}

pub fn price_timeline(input: &TimelineInput) -> TimelineQuote {
    price_timeline_with_policy(input, &TimelinePolicy::default())
}

/// Expediting costs `1 + r²` where `r` is the fraction of the standard
/// duration removed; extending discounts linearly at half rate down to the
/// policy floor. Zero standard or requested weeks price at the base cost.
pub fn price_timeline_with_policy(input: &TimelineInput, policy: &TimelinePolicy) -> TimelineQuote {
    let TimelineInput { requested_weeks, standard_weeks, base_cost } = *input;

    let (multiplier, adjustment) = if standard_weeks == 0
        || requested_weeks == 0
        || requested_weeks == standard_weeks
    {
        (Decimal::ONE, TimelineAdjustment::Standard)
    } else if requested_weeks < standard_weeks {
        let reduction =
            Decimal::from(standard_weeks - requested_weeks) / Decimal::from(standard_weeks);
        (Decimal::ONE + reduction * reduction, TimelineAdjustment::Expedited)
    } else {
        let extension = Decimal::from(requested_weeks - standard_weeks)
            / Decimal::from(u64::from(standard_weeks) * 2);
        let discounted = Decimal::ONE - extension;
        (discounted.max(policy.extension_discount_floor), TimelineAdjustment::Extended)
    };

    let adjusted_cost = (base_cost * multiplier)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    TimelineQuote {
        requested_weeks,
        standard_weeks,
        base_cost,
        multiplier: multiplier.normalize(),
        adjusted_cost,
        adjustment,
    }
}

/// Range a caller should offer for the requested delivery weeks. Never empty:
/// the upper bound is raised to the lower bound when the standard duration is
/// too short to produce a wider window.
pub fn delivery_bounds(standard_weeks: u32, policy: &TimelinePolicy) -> DeliveryBounds {
    let scaled = |ratio: f64| -> u32 {
        let value = (f64::from(standard_weeks) * ratio).round();
        if value.is_finite() && value > 0.0 {
            value as u32
        } else {
            0
        }
    };

    let min_weeks = scaled(policy.min_delivery_ratio).max(1);
    let max_weeks = scaled(policy.max_delivery_ratio).max(min_weeks);

    DeliveryBounds { min_weeks, max_weeks, standard_weeks }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::{
        delivery_bounds, price_timeline, price_timeline_with_policy, DeterministicTimelinePricer,
        TimelineAdjustment, TimelineInput, TimelinePolicy, TimelinePricingEngine,
    };

    fn quote(requested_weeks: u32, standard_weeks: u32, base_cost: i64) -> super::TimelineQuote {
        price_timeline(&TimelineInput {
            requested_weeks,
            standard_weeks,
            base_cost: Decimal::new(base_cost, 0),
        })
    }

    #[test]
    fn standard_delivery_keeps_base_cost() {
        let result = quote(10, 10, 1000);

        assert_eq!(result.multiplier, Decimal::ONE);
        assert_eq!(result.adjusted_cost, Decimal::new(1000, 0));
        assert_eq!(result.adjustment, TimelineAdjustment::Standard);
        assert!(result.is_standard_price());
    }

    #[test]
    fn halving_the_timeline_costs_a_quarter_more() {
        let result = quote(5, 10, 1000);

        assert_eq!(result.multiplier, Decimal::new(125, 2));
        assert_eq!(result.adjusted_cost, Decimal::new(1250, 0));
        assert_eq!(result.adjustment, TimelineAdjustment::Expedited);
    }

    #[test]
    fn extension_discount_reaches_floor() {
        let fifteen = quote(15, 10, 1000);
        assert_eq!(fifteen.multiplier, Decimal::new(75, 2));
        assert_eq!(fifteen.adjusted_cost, Decimal::new(750, 0));
        assert_eq!(fifteen.adjustment, TimelineAdjustment::Extended);

        let twenty = quote(20, 10, 1000);
        assert_eq!(twenty.multiplier, Decimal::new(75, 2));
        assert_eq!(twenty.adjusted_cost, Decimal::new(750, 0));
    }

    #[test]
    fn small_extension_discounts_linearly() {
        let result = quote(12, 10, 1000);

        assert_eq!(result.multiplier, Decimal::new(9, 1));
        assert_eq!(result.adjusted_cost, Decimal::new(900, 0));
    }

    #[test]
    fn degenerate_inputs_price_at_base_cost() {
        assert_eq!(quote(4, 0, 1000).adjusted_cost, Decimal::new(1000, 0));
        assert_eq!(quote(0, 10, 1000).multiplier, Decimal::ONE);
        assert_eq!(quote(0, 0, 0).adjusted_cost, Decimal::ZERO);
    }

    #[test]
    fn adjusted_cost_rounds_half_away_from_zero() {
        // r = 1/2 on a base of 2 gives 2.5
        assert_eq!(quote(1, 2, 2).adjusted_cost, Decimal::new(3, 0));
        // r = 1/3: 1000 * (1 + 1/9) = 1111.11...
        assert_eq!(quote(2, 3, 1000).adjusted_cost, Decimal::new(1111, 0));
    }

    #[test]
    fn expedite_beyond_the_offered_window_still_prices() {
        let result = quote(1, 10, 1000);

        assert_eq!(result.multiplier, Decimal::new(181, 2));
        assert_eq!(result.adjusted_cost, Decimal::new(1810, 0));
    }

    #[test]
    fn custom_floor_applies_to_extension() {
        let policy = TimelinePolicy {
            extension_discount_floor: Decimal::new(9, 1),
            ..TimelinePolicy::default()
        };
        let result = price_timeline_with_policy(
            &TimelineInput {
                requested_weeks: 15,
                standard_weeks: 10,
                base_cost: Decimal::new(1000, 0),
            },
            &policy,
        );

        assert_eq!(result.adjusted_cost, Decimal::new(900, 0));
    }

    #[test]
    fn bounds_follow_delivery_ratios() {
        let policy = TimelinePolicy::default();

        let ten = delivery_bounds(10, &policy);
        assert_eq!((ten.min_weeks, ten.max_weeks), (5, 15));
        assert!(ten.contains(10));
        assert_eq!(ten.clamp(40), 15);

        let one = delivery_bounds(1, &policy);
        assert_eq!((one.min_weeks, one.max_weeks), (1, 2));

        let zero = delivery_bounds(0, &policy);
        assert_eq!((zero.min_weeks, zero.max_weeks), (1, 1));

        let pricer = DeterministicTimelinePricer::default();
        assert_eq!(pricer.bounds(10), ten);
    }

    proptest! {
        /// within the offered window the multiplier stays between the floor and 1.25
        #[test]
        fn prop_multiplier_within_window_is_bounded(
            standard in 1u32..200,
            offset in 0.0f64..=1.0,
            base in 0i64..1_000_000,
        ) {
            let bounds = delivery_bounds(standard, &TimelinePolicy::default());
            let span = f64::from(bounds.max_weeks - bounds.min_weeks);
            let requested = bounds.min_weeks + (span * offset).floor() as u32;
            let result = quote(requested, standard, base);

            prop_assert!(result.multiplier >= Decimal::new(75, 2));
            prop_assert!(result.multiplier <= Decimal::new(126, 2));
            prop_assert!(result.adjusted_cost >= Decimal::ZERO);
        }

        /// asking for more time never costs more
        #[test]
        fn prop_price_is_non_increasing_in_requested_weeks(
            standard in 1u32..100,
            requested in 1u32..150,
            base in 0i64..1_000_000,
        ) {
            let shorter = quote(requested, standard, base);
            let longer = quote(requested + 1, standard, base);

            prop_assert!(longer.adjusted_cost <= shorter.adjusted_cost);
        }

        /// pricing is referentially transparent
        #[test]
        fn prop_pricing_is_repeatable(
            standard in 0u32..100,
            requested in 0u32..150,
            base in 0i64..100_000,
        ) {
            prop_assert_eq!(quote(requested, standard, base), quote(requested, standard, base));
        }
    }
}
