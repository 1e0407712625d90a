use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::logo::Logo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: ItemId,
    pub description: String,
    pub quantity: i64,
    pub rate: f64,
    /// Always `quantity * rate`; only the item list writes it.
    pub amount: f64,
}

impl LineItem {
    pub fn new(id: ItemId, description: impl Into<String>, quantity: i64, rate: f64) -> Self {
        LineItem {
            id,
            description: description.into(),
            quantity,
            rate,
            amount: quantity as f64 * rate,
        }
    }
}

/// Name and contact block for either side of the invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartyInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl PartyInfo {
    pub fn sample_business() -> Self {
        PartyInfo {
            name: "Your Business Name".into(),
            email: "your.email@example.com".into(),
            phone: "(123) 456-7890".into(),
            address: "123 Business St, City, State, ZIP".into(),
        }
    }

    pub fn sample_client() -> Self {
        PartyInfo {
            name: "Client Name".into(),
            email: "client@example.com".into(),
            phone: "(987) 654-3210".into(),
            address: "456 Client Ave, City, State, ZIP".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceMeta {
    pub number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub logo: Option<Logo>,
    /// Display symbol only; amounts are never converted.
    pub currency: String,
    pub tax_percent: f64,
}

/// `start` plus `days`, or `None` when that leaves chrono's date range.
pub fn due_after(start: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| start.checked_add_signed(d))
}

impl InvoiceMeta {
    /// Terms that overflow the calendar leave the due date on the issue date.
    pub fn new(currency: &str, tax_percent: f64, payment_terms_days: i64) -> Self {
        let today = Local::now().date_naive();
        InvoiceMeta {
            number: "001".into(),
            issue_date: today,
            due_date: due_after(today, payment_terms_days).unwrap_or(today),
            logo: None,
            currency: currency.to_string(),
            tax_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Edit,
    Preview,
}

impl ViewMode {
    pub fn flipped(self) -> Self {
        match self {
            ViewMode::Edit => ViewMode::Preview,
            ViewMode::Preview => ViewMode::Edit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub symbol: &'static str,
    pub code: &'static str,
}

impl Currency {
    pub fn label(&self) -> String {
        format!("{} ({})", self.symbol, self.code)
    }
}

pub const CURRENCIES: &[Currency] = &[
    Currency { symbol: "$", code: "USD" },
    Currency { symbol: "€", code: "EUR" },
    Currency { symbol: "£", code: "GBP" },
    Currency { symbol: "¥", code: "JPY" },
    Currency { symbol: "GH₵", code: "GHS" },
    Currency { symbol: "₹", code: "INR" },
    Currency { symbol: "₦", code: "NGN" },
    Currency { symbol: "R", code: "ZAR" },
    Currency { symbol: "A$", code: "AUD" },
    Currency { symbol: "C$", code: "CAD" },
];

pub fn find_currency(symbol: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.symbol == symbol)
}

pub fn format_money(currency: &str, value: f64) -> String {
    format!("{} {:.2}", currency, value)
}

/// `Oct 16, 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
