//! Read-only index over the commission reference data.

use crate::models::{CommissionCategory, CommissionRule};
use rust_decimal::Decimal;
use std::collections::HashMap;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Commission rules in their original order, indexed by id.
#[derive(Debug, Default, Clone)]
pub struct CommissionBook {
    rules: Vec<CommissionRule>,
    by_id: HashMap<u32, usize>,
}

impl CommissionBook {
    /// Build the index. On duplicate ids the first rule wins, matching a
    /// front-to-back search of the list.
    pub fn new(rules: Vec<CommissionRule>) -> Self {
        let mut by_id = HashMap::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            by_id.entry(rule.id).or_insert(idx);
        }
        Self { rules, by_id }
    }

    /// Look up a referenced rule; an unset reference finds nothing.
    pub fn get(&self, id: Option<u32>) -> Option<&CommissionRule> {
        id.and_then(|id| self.by_id.get(&id))
            .map(|&idx| &self.rules[idx])
    }

    /// Like [`get`](Self::get) but inactive rules are treated as missing.
    pub fn get_active(&self, id: Option<u32>) -> Option<&CommissionRule> {
        self.get(id).filter(|r| r.is_active)
    }

    /// First active rule of `category`, used to pre-fill a route when its
    /// type is chosen.
    pub fn default_for(&self, category: CommissionCategory) -> Option<&CommissionRule> {
        self.rules
            .iter()
            .find(|r| r.category == category && r.is_active)
    }

    /// Apply one rule to `amount`.
    ///
    /// * fixed-currency rule with a non-zero fixed amount ➜ `amount + fixed`
    /// * otherwise a non-zero percentage ➜ `amount × (1 + percent/100)`
    /// * otherwise, or with no rule at all ➜ `amount` unchanged
    ///
    /// Returns `None` only on decimal overflow.
    pub fn apply(amount: Decimal, rule: Option<&CommissionRule>) -> Option<Decimal> {
        let Some(rule) = rule else {
            return Some(amount);
        };
        match (rule.is_fixed_currency, rule.commission_fixed, rule.commission_percent) {
            (true, Some(fixed), _) if !fixed.is_zero() => amount.checked_add(fixed),
            (_, _, Some(pct)) if !pct.is_zero() => {
                let factor = Decimal::ONE.checked_add(pct.checked_div(HUNDRED)?)?;
                amount.checked_mul(factor)
            }
            _ => Some(amount),
        }
    }

    /// Take one rule off `amount`, the way payouts leaving the desk are
    /// figured.
    ///
    /// * fixed-currency rule with a non-zero fixed amount ➜ `amount - fixed`
    /// * otherwise a non-zero percentage ➜ `amount × (1 - percent/100)`
    pub fn deduct(amount: Decimal, rule: Option<&CommissionRule>) -> Option<Decimal> {
        match rule {
            Some(CommissionRule {
                is_fixed_currency: true,
                commission_fixed: Some(fixed),
                ..
            }) if !fixed.is_zero() => amount.checked_sub(*fixed),
            _ => Self::deduct_percent(amount, rule),
        }
    }

    /// Percentage-only deduction; fixed amounts are ignored.
    pub fn deduct_percent(amount: Decimal, rule: Option<&CommissionRule>) -> Option<Decimal> {
        match rule.and_then(|r| r.commission_percent) {
            Some(pct) if !pct.is_zero() => {
                let factor = Decimal::ONE.checked_sub(pct.checked_div(HUNDRED)?)?;
                amount.checked_mul(factor)
            }
            _ => Some(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(id: u32, category: CommissionCategory) -> CommissionRule {
        CommissionRule {
            id,
            category,
            commission_percent: None,
            commission_fixed: None,
            is_fixed_currency: false,
            currency: None,
            is_active: true,
        }
    }

    #[test]
    fn percent_scales_amount() {
        let r = CommissionRule {
            commission_percent: Some(dec!(1)),
            ..rule(1, CommissionCategory::Agent)
        };
        assert_eq!(CommissionBook::apply(dec!(1200), Some(&r)), Some(dec!(1212)));
    }

    #[test]
    fn fixed_wins_over_percent_when_flagged() {
        let r = CommissionRule {
            commission_percent: Some(dec!(3)),
            commission_fixed: Some(dec!(5)),
            is_fixed_currency: true,
            currency: Some("EUR".into()),
            ..rule(2, CommissionCategory::Exchange)
        };
        assert_eq!(CommissionBook::apply(dec!(1212), Some(&r)), Some(dec!(1217)));
    }

    #[test]
    fn unflagged_fixed_amount_is_ignored() {
        let r = CommissionRule {
            commission_fixed: Some(dec!(5)),
            ..rule(3, CommissionCategory::Direct)
        };
        assert_eq!(CommissionBook::apply(dec!(100), Some(&r)), Some(dec!(100)));
    }

    #[test]
    fn flagged_rule_without_fixed_falls_back_to_percent() {
        let r = CommissionRule {
            is_fixed_currency: true,
            commission_fixed: Some(dec!(0)),
            commission_percent: Some(dec!(10)),
            ..rule(4, CommissionCategory::Direct)
        };
        assert_eq!(CommissionBook::apply(dec!(100), Some(&r)), Some(dec!(110)));
    }

    #[test]
    fn deductions_subtract() {
        let pct = CommissionRule {
            commission_percent: Some(dec!(2)),
            ..rule(6, CommissionCategory::Partner)
        };
        let flat = CommissionRule {
            commission_percent: Some(dec!(2)),
            commission_fixed: Some(dec!(5)),
            is_fixed_currency: true,
            ..rule(7, CommissionCategory::Exchange)
        };
        assert_eq!(CommissionBook::deduct(dec!(1000), Some(&pct)), Some(dec!(980)));
        assert_eq!(CommissionBook::deduct(dec!(1000), Some(&flat)), Some(dec!(995)));
        assert_eq!(CommissionBook::deduct_percent(dec!(1000), Some(&flat)), Some(dec!(980)));
        assert_eq!(CommissionBook::deduct(dec!(1000), None), Some(dec!(1000)));
    }

    #[test]
    fn missing_rule_is_no_adjustment() {
        assert_eq!(CommissionBook::apply(dec!(42), None), Some(dec!(42)));
    }

    #[test]
    fn overflow_is_none() {
        let r = CommissionRule {
            commission_percent: Some(dec!(100)),
            ..rule(5, CommissionCategory::Direct)
        };
        assert_eq!(CommissionBook::apply(Decimal::MAX, Some(&r)), None);
    }

    #[test]
    fn lookup_and_defaults() {
        let inactive = CommissionRule {
            is_active: false,
            ..rule(1, CommissionCategory::Agent)
        };
        let book = CommissionBook::new(vec![
            inactive,
            rule(2, CommissionCategory::Agent),
            rule(3, CommissionCategory::Agent),
        ]);

        assert_eq!(book.get(Some(1)).map(|r| r.id), Some(1));
        assert!(book.get_active(Some(1)).is_none());
        assert!(book.get(None).is_none());
        assert!(book.get(Some(99)).is_none());
        assert_eq!(book.default_for(CommissionCategory::Agent).map(|r| r.id), Some(2));
        assert!(book.default_for(CommissionCategory::Partner).is_none());
    }
}
