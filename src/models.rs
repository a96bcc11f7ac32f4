//! Common domain types: commission rules, routes, transaction groups and
//! the deal context they are computed against.

use crate::numeric::{lenient_decimal, lenient_id, lenient_route_type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The four ways a route can move funds.
///
/// An unset route type is modelled as `Option<RouteType>::None`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Direct,
    Exchange,
    Partner,
    #[serde(rename = "partner_50_50")]
    Partner5050,
}

impl RouteType {
    /// Wire name, as used in the JSON draft and the report.
    pub fn as_str(self) -> &'static str {
        match self {
            RouteType::Direct => "direct",
            RouteType::Exchange => "exchange",
            RouteType::Partner => "partner",
            RouteType::Partner5050 => "partner_50_50",
        }
    }

    /// Parse a wire name; empty or unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "direct" => Some(RouteType::Direct),
            "exchange" => Some(RouteType::Exchange),
            "partner" => Some(RouteType::Partner),
            "partner_50_50" => Some(RouteType::Partner5050),
            _ => None,
        }
    }
}

/// Category a commission rule belongs to.
///
/// Same set as [`RouteType`] plus `agent`, which only exists as a fee
/// applied inside exchange routes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommissionCategory {
    Direct,
    Exchange,
    Agent,
    Partner,
    #[serde(rename = "partner_50_50")]
    Partner5050,
}

/// A reference-data fee record.
///
/// * `is_fixed_currency` + `commission_fixed` – add a flat amount
/// * otherwise `commission_percent` – scale by `1 + percent/100`
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionRule {
    pub id: u32,
    pub category: CommissionCategory,
    pub commission_percent: Option<Decimal>,
    pub commission_fixed: Option<Decimal>,
    pub is_fixed_currency: bool,
    pub currency: Option<String>,
    pub is_active: bool,
}

/// One leg of fund movement inside a [`TransactionGroup`].
///
/// Which optional fields matter depends on `route_type`; the rest stay
/// `None`. `exchange_amount`, `amount_to_partner` and `final_income` are
/// outputs, overwritten on every recomputation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Route {
    #[serde(default, deserialize_with = "lenient_route_type")]
    pub route_type: Option<RouteType>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount_from_account: Option<Decimal>,

    // direct
    #[serde(default, deserialize_with = "lenient_id")]
    pub bank_commission_id: Option<u32>,

    // exchange
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub crypto_exchange_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub agent_commission_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub exchange_commission_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub exchange_bank_commission_id: Option<u32>,

    // partner / partner_50_50
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount_partner_sends: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub partner_commission_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub partner_50_50_commission_id: Option<u32>,

    // derived
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub exchange_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount_to_partner: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub final_income: Option<Decimal>,
}

impl Route {
    /// A fresh route with no type selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the route type, dropping every field that belonged to the
    /// previous type.
    pub fn reset_to(&mut self, route_type: Option<RouteType>) {
        *self = Route {
            route_type,
            ..Route::default()
        };
    }
}

/// One currency-pair leg of a deal ("TransactionRoute" in the UI).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionGroup {
    #[serde(default)]
    pub source_currency: Option<String>,
    #[serde(default)]
    pub target_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub company_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount_for_client: Option<Decimal>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub final_income: Option<Decimal>,
}

impl TransactionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when this leg converts `send` into `receive`.
    pub fn converts(&self, send: &str, receive: &str) -> bool {
        self.source_currency.as_deref() == Some(send)
            && self.target_currency.as_deref() == Some(receive)
    }
}

/// Deal-level inputs that may drive each group's `amount_for_client`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DealContext {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub deal_amount: Option<Decimal>,
    #[serde(default)]
    pub client_sends_currency: Option<String>,
    #[serde(default)]
    pub client_receives_currency: Option<String>,
}

/// A deal under construction: its context plus the ordered groups.
///
/// This is the JSON shape the CLI reads and writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DealDraft {
    #[serde(flatten)]
    pub context: DealContext,
    #[serde(default)]
    pub transactions: Vec<TransactionGroup>,
}

/// Totals across every group of a draft.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DealSummary {
    pub total_amount_for_client: Decimal,
    /// `None` when no group has a computable income yet.
    pub total_final_income: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn route_type_wire_names() {
        assert_eq!(RouteType::parse("partner_50_50"), Some(RouteType::Partner5050));
        assert_eq!(RouteType::parse(" direct "), Some(RouteType::Direct));
        assert_eq!(RouteType::parse(""), None);
        assert_eq!(RouteType::parse("crypto"), None);
        assert_eq!(RouteType::Exchange.as_str(), "exchange");
    }

    #[test]
    fn reset_clears_type_specific_fields() {
        let mut route = Route {
            route_type: Some(RouteType::Direct),
            amount_from_account: Some(dec!(500)),
            bank_commission_id: Some(3),
            final_income: Some(dec!(600)),
            ..Route::default()
        };
        route.reset_to(Some(RouteType::Partner));

        assert_eq!(route.route_type, Some(RouteType::Partner));
        assert_eq!(route.amount_from_account, None);
        assert_eq!(route.bank_commission_id, None);
        assert_eq!(route.final_income, None);
    }

    #[test]
    fn group_currency_match() {
        let group = TransactionGroup {
            source_currency: Some("USDT".into()),
            target_currency: Some("EUR".into()),
            ..TransactionGroup::default()
        };
        assert!(group.converts("USDT", "EUR"));
        assert!(!group.converts("EUR", "USDT"));
    }
}
