//! Print-oriented snapshot of the preview.
//!
//! Holds only what the read-only preview shows, already formatted, so the
//! export thread never touches the live form.

use crate::form::InvoiceForm;
use crate::logo::Logo;
use crate::model::{PartyInfo, format_date, format_money};
use crate::totals::Totals;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDocument {
    pub number: String,
    pub issue_date: String,
    pub due_date: String,
    pub logo: Option<Logo>,
    pub from: PartyInfo,
    pub bill_to: PartyInfo,
    pub rows: Vec<DocumentRow>,
    pub subtotal: String,
    pub tax_label: String,
    pub tax_amount: String,
    pub total: String,
    pub notes: Option<String>,
}

impl InvoiceDocument {
    /// Snapshot of the preview. Money carries the selected currency symbol.
    pub fn from_form(form: &InvoiceForm) -> Self {
        let meta = &form.meta;
        let currency = meta.currency.as_str();
        let totals: Totals = form.totals();
        let rows = form
            .items()
            .iter()
            .map(|item| DocumentRow {
                description: item.description.clone(),
                quantity: item.quantity.to_string(),
                rate: format_money(currency, item.rate),
                amount: format_money(currency, item.amount),
            })
            .collect();

        InvoiceDocument {
            number: meta.number.clone(),
            issue_date: format_date(meta.issue_date),
            due_date: format_date(meta.due_date),
            logo: meta.logo.clone(),
            from: form.issuer.clone(),
            bill_to: form.recipient.clone(),
            rows,
            subtotal: format_money(currency, totals.subtotal),
            tax_label: format!("Tax ({}%)", meta.tax_percent),
            tax_amount: format_money(currency, totals.tax_amount),
            total: format_money(currency, totals.total),
            notes: Some(form.notes.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// `Invoice-<number>.pdf`, with characters that break paths replaced.
    pub fn file_name(&self) -> String {
        let cleaned: String = self
            .number
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c if c.is_control() => '-',
                c => c,
            })
            .collect();
        if cleaned.is_empty() {
            "Invoice.pdf".to_string()
        } else {
            format!("Invoice-{}.pdf", cleaned)
        }
    }
}
