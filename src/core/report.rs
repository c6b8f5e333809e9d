//! Catalog and order summaries.
//!
//! This module turns a [`StoreState`] into structured summary data plus a few
//! text formatters, used by the binary's startup log.

use crate::core::models::{DealProduct, EditRequestStatus, OrderStatus};
use crate::core::state::StoreState;
use chrono::{DateTime, Utc};
use std::fmt;

/// Sell-through of a single deal.
#[derive(Debug, Clone, PartialEq)]
pub struct DealReport {
    pub id: String,
    pub name: String,
    pub sold: u32,
    pub stock: u32,
    /// Sold as a percentage of stock (0-100, above 100 when oversold)
    pub sold_percent: f64,
    pub expired: bool,
}

/// Overview of the whole store at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSummary {
    pub product_count: usize,
    pub deal_count: usize,
    pub active_deal_count: usize,
    pub order_count: usize,
    /// Sum of totals over orders that were not cancelled
    pub revenue: f64,
    pub cart_lines: usize,
    pub cart_units: u32,
    pub wishlist_count: usize,
    pub pending_edit_requests: usize,
    pub average_rating: Option<f64>,
    pub deals: Vec<DealReport>,
}

/// Builds a [`DealReport`] for one deal as of `now`.
#[must_use]
pub fn report_deal(deal: &DealProduct, now: DateTime<Utc>) -> DealReport {
    DealReport {
        id: deal.product.id.clone(),
        name: deal.product.name.clone(),
        sold: deal.sold,
        stock: deal.stock,
        sold_percent: calculate_sold_percent(deal.sold, deal.stock),
        expired: deal.is_expired(now),
    }
}

#[must_use]
pub fn summarize(state: &StoreState, now: DateTime<Utc>) -> CatalogSummary {
    let deals: Vec<DealReport> = state.deals().iter().map(|d| report_deal(d, now)).collect();
    let revenue = state
        .orders()
        .iter()
        .filter(|order| order.status != OrderStatus::Cancelled)
        .fold(0.0, |revenue, order| revenue + order.total);

    CatalogSummary {
        product_count: state.products().len(),
        deal_count: deals.len(),
        active_deal_count: deals.iter().filter(|d| !d.expired).count(),
        order_count: state.orders().len(),
        revenue,
        cart_lines: state.cart().len(),
        cart_units: state.cart().unit_count(),
        wishlist_count: state.wishlist().len(),
        pending_edit_requests: state
            .edit_requests()
            .iter()
            .filter(|r| r.status == EditRequestStatus::Pending)
            .count(),
        average_rating: state.average_rating(),
        deals,
    }
}

/// Sold units as a percentage of stock; zero stock reports 0.
#[must_use]
pub fn calculate_sold_percent(sold: u32, stock: u32) -> f64 {
    if stock == 0 {
        return 0.0;
    }

    f64::from(sold) / f64::from(stock) * 100.0
}

/// Renders sell-through as `sold/stock` followed by a bar of `width` cells.
/// Each cell stands for `stock / width` units and only fully sold cells are
/// marked. Oversold deals mark every cell and carry a `+extra` suffix.
#[must_use]
pub fn format_sell_through(sold: u32, stock: u32, width: usize) -> String {
    let marked = if stock == 0 {
        0
    } else {
        let capped = u64::from(sold.min(stock));
        let cells = u64::try_from(width).unwrap_or(u64::MAX);
        usize::try_from(capped.saturating_mul(cells) / u64::from(stock)).unwrap_or(width)
    };

    let mut text = format!("{sold}/{stock} |");
    for cell in 0..width {
        text.push(if cell < marked { '#' } else { '.' });
    }
    text.push('|');
    if sold > stock {
        text.push_str(&format!(" +{}", sold - stock));
    }
    text
}

#[must_use]
pub fn format_price(amount: f64) -> String {
    format!("${amount:.2}")
}

impl fmt::Display for DealReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.0}%",
            self.name,
            format_sell_through(self.sold, self.stock, 12),
            self.sold_percent
        )?;
        if self.expired {
            f.write_str(" (expired)")?;
        }
        Ok(())
    }
}

impl fmt::Display for CatalogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} products, {} deals ({} active)",
            self.product_count, self.deal_count, self.active_deal_count
        )?;
        writeln!(
            f,
            "{} orders, revenue {}",
            self.order_count,
            format_price(self.revenue)
        )?;
        writeln!(
            f,
            "Cart: {} lines / {} units, wishlist: {}",
            self.cart_lines, self.cart_units, self.wishlist_count
        )?;
        match self.average_rating {
            Some(rating) => writeln!(f, "Average rating: {rating:.1}")?,
            None => writeln!(f, "No ratings yet")?,
        }
        write!(f, "Pending edit requests: {}", self.pending_edit_requests)?;
        for deal in &self.deals {
            write!(f, "\n  {deal}")?;
        }
        Ok(())
    }
}
