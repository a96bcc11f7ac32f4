//! Edit-driven recalculation: feed one user edit at a time, then read
//! `engine.groups()` for the up-to-date incomes.

use crate::aggregator::{propagate_deal_amount, recompute_group};
use crate::commissions::CommissionBook;
use crate::models::{
    CommissionCategory, DealContext, DealDraft, DealSummary, Route, RouteType, TransactionGroup,
};
use crate::numeric::{lenient_decimal, lenient_id, lenient_route_type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Amount fields a user can type into a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAmount {
    AmountFromAccount,
    CryptoExchangeRate,
    AmountPartnerSends,
}

/// Commission reference slots on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionSlot {
    Bank,
    Agent,
    Exchange,
    ExchangeBank,
    Partner,
    #[serde(rename = "partner_50_50")]
    Partner5050,
}

/// A single user mutation of the draft.
///
/// `group` and `route` are positions; edits pointing past the end are
/// dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddGroup,
    RemoveGroup {
        group: usize,
    },
    SetGroupCurrencies {
        group: usize,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        target: Option<String>,
    },
    SetAmountForClient {
        group: usize,
        #[serde(default, deserialize_with = "lenient_decimal")]
        value: Option<Decimal>,
    },
    SetExchangeRate {
        group: usize,
        #[serde(default, deserialize_with = "lenient_decimal")]
        value: Option<Decimal>,
    },
    AddRoute {
        group: usize,
    },
    RemoveRoute {
        group: usize,
        route: usize,
    },
    SetRouteType {
        group: usize,
        route: usize,
        #[serde(default, deserialize_with = "lenient_route_type")]
        route_type: Option<RouteType>,
    },
    SetRouteAmount {
        group: usize,
        route: usize,
        field: RouteAmount,
        #[serde(default, deserialize_with = "lenient_decimal")]
        value: Option<Decimal>,
    },
    SetCommission {
        group: usize,
        route: usize,
        slot: CommissionSlot,
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<u32>,
    },
    SetDealAmount {
        #[serde(default, deserialize_with = "lenient_decimal")]
        value: Option<Decimal>,
    },
    SetDealCurrencies {
        #[serde(default)]
        send: Option<String>,
        #[serde(default)]
        receive: Option<String>,
    },
}

/// In-memory recalculation engine for one deal draft.
///
/// ```rust,ignore
/// let mut eng = Engine::new(book, draft);
/// for edit in user_edits {
///     eng.process(edit);
/// }
/// let totals = eng.summary();
/// ```
pub struct Engine {
    book: CommissionBook,
    context: DealContext,
    groups: Vec<TransactionGroup>,
}

impl Engine {
    /// Wrap a loaded draft and bring every computed field up to date.
    pub fn new(book: CommissionBook, draft: DealDraft) -> Self {
        let mut eng = Self {
            book,
            context: draft.context,
            groups: draft.transactions,
        };
        eng.recompute_all();
        eng
    }

    pub fn groups(&self) -> &[TransactionGroup] {
        &self.groups
    }

    /// Snapshot of the current state in its serialisable form.
    pub fn draft(&self) -> DealDraft {
        DealDraft {
            context: self.context.clone(),
            transactions: self.groups.clone(),
        }
    }

    /// Propagate the deal amount into every group, then recompute all of
    /// them.
    pub fn recompute_all(&mut self) {
        for group in &mut self.groups {
            if !propagate_deal_amount(group, &self.context, &self.book) {
                recompute_group(group, &self.book);
            }
        }
    }

    /// Apply a single edit and recompute whatever it touched.
    ///
    /// * Edits addressing a missing group or route are ignored.
    /// * Choosing a route type wipes the route and pre-selects the default
    ///   active commissions for that type.
    pub fn process(&mut self, edit: Edit) {
        match edit {
            // ------------------------------------------------------- groups
            Edit::AddGroup => {
                let mut group = TransactionGroup::new();
                recompute_group(&mut group, &self.book);
                self.groups.push(group);
            }
            Edit::RemoveGroup { group } => {
                if group < self.groups.len() {
                    self.groups.remove(group);
                } else {
                    debug!(group, "remove_group: no such group");
                }
            }
            Edit::SetGroupCurrencies {
                group,
                source,
                target,
            } => self.with_group(group, true, |g| {
                g.source_currency = source;
                g.target_currency = target;
            }),
            Edit::SetAmountForClient { group, value } => {
                self.with_group(group, false, |g| g.amount_for_client = value)
            }
            Edit::SetExchangeRate { group, value } => {
                self.with_group(group, true, |g| g.exchange_rate = value)
            }

            // ------------------------------------------------------- routes
            Edit::AddRoute { group } => self.with_group(group, false, |g| g.routes.push(Route::new())),
            Edit::RemoveRoute { group, route } => self.with_group(group, false, |g| {
                if route < g.routes.len() {
                    g.routes.remove(route);
                } else {
                    debug!(group, route, "remove_route: no such route");
                }
            }),
            Edit::SetRouteType {
                group,
                route,
                route_type,
            } => self.with_route(group, route, |r, book| {
                r.reset_to(route_type);
                assign_default_commissions(r, book);
            }),
            Edit::SetRouteAmount {
                group,
                route,
                field,
                value,
            } => self.with_route(group, route, |r, _| match field {
                RouteAmount::AmountFromAccount => r.amount_from_account = value,
                RouteAmount::CryptoExchangeRate => r.crypto_exchange_rate = value,
                RouteAmount::AmountPartnerSends => r.amount_partner_sends = value,
            }),
            Edit::SetCommission {
                group,
                route,
                slot,
                id,
            } => self.with_route(group, route, |r, _| match slot {
                CommissionSlot::Bank => r.bank_commission_id = id,
                CommissionSlot::Agent => r.agent_commission_id = id,
                CommissionSlot::Exchange => r.exchange_commission_id = id,
                CommissionSlot::ExchangeBank => r.exchange_bank_commission_id = id,
                CommissionSlot::Partner => r.partner_commission_id = id,
                CommissionSlot::Partner5050 => r.partner_50_50_commission_id = id,
            }),

            // --------------------------------------------------------- deal
            Edit::SetDealAmount { value } => {
                self.context.deal_amount = value;
                self.recompute_all();
            }
            Edit::SetDealCurrencies { send, receive } => {
                self.context.client_sends_currency = send;
                self.context.client_receives_currency = receive;
                self.recompute_all();
            }
        }
    }

    /// Totals over every group.
    pub fn summary(&self) -> DealSummary {
        let total_amount_for_client = self
            .groups
            .iter()
            .filter_map(|g| g.amount_for_client)
            .fold(Decimal::ZERO, |acc, v| acc.checked_add(v).unwrap_or(acc));

        let total_final_income = self
            .groups
            .iter()
            .filter_map(|g| g.final_income)
            .reduce(|acc, v| acc.checked_add(v).unwrap_or(acc));

        DealSummary {
            total_amount_for_client,
            total_final_income,
        }
    }

    /// Mutate one group, then recompute it. With `propagate`, the deal
    /// amount is offered to the group first.
    fn with_group<F>(&mut self, idx: usize, propagate: bool, f: F)
    where
        F: FnOnce(&mut TransactionGroup),
    {
        let Some(group) = self.groups.get_mut(idx) else {
            debug!(group = idx, "edit ignored: no such group");
            return;
        };
        f(group);
        if !(propagate && propagate_deal_amount(group, &self.context, &self.book)) {
            recompute_group(group, &self.book);
        }
    }

    fn with_route<F>(&mut self, group: usize, route: usize, f: F)
    where
        F: FnOnce(&mut Route, &CommissionBook),
    {
        let Some(g) = self.groups.get_mut(group) else {
            debug!(group, "edit ignored: no such group");
            return;
        };
        let Some(r) = g.routes.get_mut(route) else {
            debug!(group, route, "edit ignored: no such route");
            return;
        };
        f(r, &self.book);
        recompute_group(g, &self.book);
    }
}

/// Pre-select the first active rule of each category a route type uses.
fn assign_default_commissions(route: &mut Route, book: &CommissionBook) {
    let default_id = |category| book.default_for(category).map(|r| r.id);
    match route.route_type {
        Some(RouteType::Direct) => {
            route.bank_commission_id = default_id(CommissionCategory::Direct);
        }
        Some(RouteType::Exchange) => {
            route.agent_commission_id = default_id(CommissionCategory::Agent);
            route.exchange_commission_id = default_id(CommissionCategory::Exchange);
            route.exchange_bank_commission_id = default_id(CommissionCategory::Direct);
        }
        Some(RouteType::Partner) => {
            route.partner_commission_id = default_id(CommissionCategory::Partner);
        }
        Some(RouteType::Partner5050) => {
            route.partner_50_50_commission_id = default_id(CommissionCategory::Partner5050);
        }
        None => {}
    }
}
