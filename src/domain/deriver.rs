//! Pure transforms from raw figures to the quantities the optimizer and the
//! site tables work with.

use super::value_objects::GroupId;

/// Demand not covered by `allocated`, floored at zero.
///
/// NaN or negative inputs are a caller contract violation and are not checked.
pub fn derive_shortage(demand: f64, allocated: f64) -> f64 {
    (demand - allocated).max(0.0)
}

/// Splits `total` across groups as `total * percentage / 100`.
///
/// Percentages are not required to sum to 100; a split summing to 120 simply
/// yields 1.2 × `total` in aggregate. Group order is preserved.
pub fn derive_group_demand(total: f64, percentages: &[(GroupId, f64)]) -> Vec<(GroupId, f64)> {
    percentages
        .iter()
        .map(|(group, pct)| (group.clone(), total * pct / 100.0))
        .collect()
}

/// Sum of a percentage split, used to warn about splits that are not 100.
pub fn percentage_total(percentages: &[(GroupId, f64)]) -> f64 {
    percentages.iter().map(|(_, pct)| pct).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn split(values: &[(&str, f64)]) -> Vec<(GroupId, f64)> {
        values
            .iter()
            .map(|(name, pct)| (GroupId::new(*name), *pct))
            .collect()
    }

    #[rstest]
    #[case::shortfall(12.0, 5.0, 7.0)]
    #[case::exact(5.0, 5.0, 0.0)]
    #[case::surplus(3.0, 10.0, 0.0)]
    #[case::fractional(7.5, 2.25, 5.25)]
    fn shortage_is_floored_difference(
        #[case] demand: f64,
        #[case] allocated: f64,
        #[case] expected: f64,
    ) {
        assert_float_eq!(derive_shortage(demand, allocated), expected, abs <= 1e-12);
    }

    #[test]
    fn group_demand_follows_percentages_in_order() {
        let demand = derive_group_demand(
            100.0,
            &split(&[("moderate", 30.0), ("severe", 40.0), ("critical", 30.0)]),
        );

        let names: Vec<&str> = demand.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(names, ["moderate", "severe", "critical"]);
        assert_float_eq!(demand[0].1, 30.0, abs <= 1e-12);
        assert_float_eq!(demand[1].1, 40.0, abs <= 1e-12);
        assert_float_eq!(demand[2].1, 30.0, abs <= 1e-12);
    }

    #[test]
    fn over_hundred_split_inflates_total_demand() {
        let pct = split(&[("a", 70.0), ("b", 50.0)]);
        let demand = derive_group_demand(200.0, &pct);
        let total: f64 = demand.iter().map(|(_, d)| d).sum();

        assert_float_eq!(percentage_total(&pct), 120.0, abs <= 1e-12);
        assert_float_eq!(total, 240.0, abs <= 1e-9);
    }

    proptest! {
        #[test]
        fn shortage_never_negative(demand in 0.0f64..1e6, allocated in 0.0f64..1e6) {
            let shortage = derive_shortage(demand, allocated);
            prop_assert!(shortage >= 0.0);
            prop_assert_eq!(shortage, (demand - allocated).max(0.0));
        }

        #[test]
        fn full_split_preserves_total(total in 0.0f64..1e5, a in 0.0f64..=100.0, b_frac in 0.0f64..=1.0) {
            let b = (100.0 - a) * b_frac;
            let c = 100.0 - a - b;
            let demand = derive_group_demand(total, &split(&[("a", a), ("b", b), ("c", c)]));
            let sum: f64 = demand.iter().map(|(_, d)| d).sum();
            prop_assert!((sum - total).abs() <= 1e-9 * total.max(1.0));
        }
    }
}
