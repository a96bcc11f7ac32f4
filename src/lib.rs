//! Public API for the route income calculator.
//!
//! A deal is split into transaction groups, each group into routes. Every
//! route yields an income in the group's target currency once the group's
//! `amount_for_client` and `exchange_rate` are known; the group total is
//! the sum over its routes.

pub mod aggregator;
pub mod calculator;
pub mod commissions;
pub mod engine;
pub mod errors;
pub mod input;
pub mod models;
pub mod numeric;
pub mod report;

pub use aggregator::{PROPAGATION_TOLERANCE, propagate_deal_amount, recompute_group};
pub use calculator::{amount_to_partner, exchange_amount, route_income};
pub use commissions::CommissionBook;
pub use engine::{CommissionSlot, Edit, Engine, RouteAmount};
pub use models::{
    CommissionCategory, CommissionRule, DealContext, DealDraft, DealSummary, Route, RouteType,
    TransactionGroup,
};
