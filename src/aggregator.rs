//! Group-level totals and deal-amount propagation.

use crate::calculator::{amount_to_partner, exchange_amount, route_income};
use crate::commissions::CommissionBook;
use crate::models::{DealContext, TransactionGroup};
use crate::numeric::positive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, trace};

/// Minimum change in `amount_for_client` a deal-amount propagation must
/// produce before it is written back.
pub const PROPAGATION_TOLERANCE: Decimal = dec!(0.01);

/// Recompute every route of `group`, then its total.
///
/// Route payouts (`exchange_amount`, `amount_to_partner`) are refreshed
/// alongside income but never feed the total. A group without routes has
/// no total (`None`); otherwise undefined route incomes count as zero.
pub fn recompute_group(group: &mut TransactionGroup, book: &CommissionBook) {
    let incomes: Vec<Option<Decimal>> = group
        .routes
        .iter()
        .map(|route| route_income(route, group, book))
        .collect();

    for (route, income) in group.routes.iter_mut().zip(incomes) {
        route.exchange_amount = exchange_amount(route, book);
        route.amount_to_partner = amount_to_partner(route, book);
        route.final_income = income;
    }

    group.final_income = if group.routes.is_empty() {
        None
    } else {
        Some(
            group
                .routes
                .iter()
                .filter_map(|r| r.final_income)
                .fold(Decimal::ZERO, |acc, v| acc.checked_add(v).unwrap_or(acc)),
        )
    };
    trace!(routes = group.routes.len(), total = ?group.final_income, "group recomputed");
}

/// Derive `amount_for_client` from the deal amount when this group is the
/// deal's own currency pair.
///
/// Returns `true` when the amount was replaced, in which case the group has
/// already been recomputed.
pub fn propagate_deal_amount(
    group: &mut TransactionGroup,
    deal: &DealContext,
    book: &CommissionBook,
) -> bool {
    let (Some(deal_amount), Some(send), Some(receive)) = (
        deal.deal_amount,
        deal.client_sends_currency.as_deref(),
        deal.client_receives_currency.as_deref(),
    ) else {
        return false;
    };
    if !group.converts(send, receive) {
        return false;
    }
    let Some(rate) = positive(group.exchange_rate) else {
        return false;
    };
    let Some(candidate) = deal_amount.checked_div(rate) else {
        return false;
    };

    let current = group.amount_for_client.unwrap_or(Decimal::ZERO);
    if let Some(delta) = candidate.checked_sub(current) {
        if delta.abs() <= PROPAGATION_TOLERANCE {
            return false;
        }
    }

    debug!(%deal_amount, %rate, from = %current, to = %candidate, "amount_for_client from deal");
    group.amount_for_client = Some(candidate);
    recompute_group(group, book);
    true
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Route, RouteType};

    fn direct() -> Route {
        Route {
            route_type: Some(RouteType::Direct),
            ..Route::default()
        }
    }

    fn partner(sends: Decimal) -> Route {
        Route {
            route_type: Some(RouteType::Partner),
            amount_partner_sends: Some(sends),
            ..Route::default()
        }
    }

    fn group_with(routes: Vec<Route>) -> TransactionGroup {
        TransactionGroup {
            source_currency: Some("USDT".into()),
            target_currency: Some("EUR".into()),
            exchange_rate: Some(dec!(0.85)),
            amount_for_client: Some(dec!(1000)),
            routes,
            ..TransactionGroup::default()
        }
    }

    fn deal(amount: Decimal) -> DealContext {
        DealContext {
            deal_amount: Some(amount),
            client_sends_currency: Some("USDT".into()),
            client_receives_currency: Some("EUR".into()),
        }
    }

    #[test]
    fn empty_group_has_no_total() {
        let mut g = group_with(vec![]);
        g.final_income = Some(dec!(5));
        recompute_group(&mut g, &CommissionBook::default());
        assert_eq!(g.final_income, None);
    }

    #[test]
    fn undefined_routes_count_as_zero() {
        let mut g = group_with(vec![partner(dec!(100)), Route::new(), partner(dec!(50))]);
        recompute_group(&mut g, &CommissionBook::default());

        assert_eq!(g.routes[1].final_income, None);
        assert_eq!(g.final_income, Some(dec!(150)));
    }

    #[test]
    fn all_undefined_routes_total_zero() {
        let mut g = group_with(vec![Route::new()]);
        recompute_group(&mut g, &CommissionBook::default());
        assert_eq!(g.final_income, Some(dec!(0)));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut g = group_with(vec![direct(), partner(dec!(10))]);
        let book = CommissionBook::default();
        recompute_group(&mut g, &book);
        let first = g.clone();
        recompute_group(&mut g, &book);

        assert_eq!(g, first);
        assert_eq!(g.final_income, Some(dec!(860)));
    }

    #[test]
    fn payouts_are_refreshed_but_not_summed() {
        let mut exchange = Route {
            route_type: Some(RouteType::Exchange),
            amount_from_account: Some(dec!(200)),
            crypto_exchange_rate: Some(dec!(0.5)),
            ..Route::default()
        };
        exchange.amount_to_partner = Some(dec!(9)); // stale
        let mut g = group_with(vec![exchange, partner(dec!(40))]);
        recompute_group(&mut g, &CommissionBook::default());

        assert_eq!(g.routes[0].exchange_amount, Some(dec!(100)));
        assert_eq!(g.routes[0].amount_to_partner, None);
        assert_eq!(g.routes[1].amount_to_partner, Some(dec!(40)));
        assert_eq!(g.routes[1].exchange_amount, None);
        // 1000 × 0.85 + 40
        assert_eq!(g.final_income, Some(dec!(890)));
    }

    #[test]
    fn deal_amount_sets_amount_for_client_once() {
        let mut g = group_with(vec![direct()]);
        g.amount_for_client = None;
        let book = CommissionBook::default();

        assert!(propagate_deal_amount(&mut g, &deal(dec!(10000)), &book));
        let amount = g.amount_for_client.unwrap();
        assert_eq!(amount.round_dp(4), dec!(11764.7059));
        assert!(g.final_income.is_some());

        assert!(!propagate_deal_amount(&mut g, &deal(dec!(10000)), &book));
        assert_eq!(g.amount_for_client, Some(amount));
    }

    #[test]
    fn deal_amount_within_tolerance_is_ignored() {
        let mut g = group_with(vec![]);
        g.exchange_rate = Some(dec!(1));
        g.amount_for_client = Some(dec!(100.005));
        assert!(!propagate_deal_amount(&mut g, &deal(dec!(100)), &CommissionBook::default()));
        assert_eq!(g.amount_for_client, Some(dec!(100.005)));
    }

    #[test]
    fn deal_amount_needs_matching_pair_and_rate() {
        let book = CommissionBook::default();

        let mut other_pair = group_with(vec![]);
        other_pair.target_currency = Some("USD".into());
        assert!(!propagate_deal_amount(&mut other_pair, &deal(dec!(10000)), &book));

        let mut no_rate = group_with(vec![]);
        no_rate.exchange_rate = None;
        assert!(!propagate_deal_amount(&mut no_rate, &deal(dec!(10000)), &book));

        let mut g = group_with(vec![]);
        assert!(!propagate_deal_amount(&mut g, &DealContext::default(), &book));
    }
}
