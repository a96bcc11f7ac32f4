//! Per-route figures: income in the target currency, plus the payout
//! amounts shown next to exchange and partner legs.

use crate::commissions::CommissionBook;
use crate::models::{Route, RouteType, TransactionGroup};
use crate::numeric::positive;
use rust_decimal::Decimal;

/// Income of a single route, in the group's target currency.
///
/// `None` means "not computable yet": the group has no positive
/// `amount_for_client` or `exchange_rate`, or the route type is unset.
/// Callers must keep that distinct from a computed zero.
///
/// Missing commission references never fail, they simply leave the
/// amount unadjusted.
pub fn route_income(
    route: &Route,
    group: &TransactionGroup,
    book: &CommissionBook,
) -> Option<Decimal> {
    let amount = positive(group.amount_for_client)?;
    let rate = positive(group.exchange_rate)?;

    match route.route_type? {
        RouteType::Direct => CommissionBook::apply(
            amount.checked_mul(rate)?,
            book.get(route.bank_commission_id),
        ),

        // agent → exchange → bank; each step compounds on the previous one
        RouteType::Exchange => exchange_fees(route)
            .try_fold(amount.checked_mul(rate)?, |acc, id| {
                CommissionBook::apply(acc, book.get_active(id))
            }),

        RouteType::Partner => Some(partner_sends(route)),

        RouteType::Partner5050 => CommissionBook::apply(
            partner_sends(route),
            book.get(route.partner_50_50_commission_id),
        ),
    }
}

/// What an exchange leg buys: `amount_from_account` less the agent,
/// exchange and bank fees (in that order), times `crypto_exchange_rate`.
///
/// `None` for other route types or while either input is missing.
pub fn exchange_amount(route: &Route, book: &CommissionBook) -> Option<Decimal> {
    if route.route_type != Some(RouteType::Exchange) {
        return None;
    }
    let amount = positive(route.amount_from_account)?;
    let rate = positive(route.crypto_exchange_rate)?;

    exchange_fees(route)
        .try_fold(amount, |acc, id| CommissionBook::deduct(acc, book.get_active(id)))?
        .checked_mul(rate)
}

/// What a partner leg hands to the partner: `amount_partner_sends` less
/// the partner's percentage.
///
/// `None` for non-partner routes or while `amount_partner_sends` is unset.
pub fn amount_to_partner(route: &Route, book: &CommissionBook) -> Option<Decimal> {
    let commission = match route.route_type? {
        RouteType::Partner => route.partner_commission_id,
        RouteType::Partner5050 => route.partner_50_50_commission_id,
        RouteType::Direct | RouteType::Exchange => return None,
    };
    CommissionBook::deduct_percent(route.amount_partner_sends?, book.get(commission))
}

fn exchange_fees(route: &Route) -> impl Iterator<Item = Option<u32>> {
    [
        route.agent_commission_id,
        route.exchange_commission_id,
        route.exchange_bank_commission_id,
    ]
    .into_iter()
}

fn partner_sends(route: &Route) -> Decimal {
    route.amount_partner_sends.unwrap_or(Decimal::ZERO)
}
