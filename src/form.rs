use chrono::NaiveDate;
use log::debug;

use crate::config::Settings;
use crate::items::{ItemUpdate, LineItems};
use crate::logo::Logo;
use crate::model::{InvoiceMeta, ItemId, LineItem, PartyInfo};
use crate::totals::Totals;
use crate::view::{Action, ViewState};

/// The whole form. All edits go through these methods; nothing else holds
/// mutable invoice state.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceForm {
    pub meta: InvoiceMeta,
    pub issuer: PartyInfo,
    pub recipient: PartyInfo,
    pub notes: String,
    items: LineItems,
    view: ViewState,
}

impl InvoiceForm {
    pub fn new(settings: &Settings) -> Self {
        InvoiceForm {
            meta: InvoiceMeta::new(
                &settings.currency,
                settings.tax_percent,
                settings.payment_terms_days,
            ),
            issuer: settings.business.clone(),
            recipient: PartyInfo::sample_client(),
            notes: settings.notes.clone(),
            items: LineItems::from_items(vec![LineItem::new(
                ItemId(1),
                "Service/Product 1",
                1,
                100.0,
            )]),
            view: ViewState::default(),
        }
    }

    pub fn items(&self) -> &LineItems {
        &self.items
    }

    pub fn add_item(&mut self) -> ItemId {
        self.items.add_item()
    }

    pub fn remove_item(&mut self, id: ItemId) -> bool {
        self.items.remove_item(id)
    }

    pub fn update_item(&mut self, id: ItemId, update: ItemUpdate) -> bool {
        self.items.update_item(id, update)
    }

    pub fn totals(&self) -> Totals {
        Totals::derive(self.items.as_slice(), self.meta.tax_percent)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn toggle_preview(&mut self) {
        self.view.toggle();
    }

    pub fn request(&mut self, action: Action) -> Option<Action> {
        self.view.request(action)
    }

    pub fn render_committed(&mut self) -> Option<Action> {
        let mode = self.view.mode();
        self.view.committed(mode)
    }

    pub fn set_logo(&mut self, logo: Logo) {
        self.meta.logo = Some(logo);
    }

    pub fn clear_logo(&mut self) {
        self.meta.logo = None;
    }

    pub fn set_tax_text(&mut self, text: &str) {
        self.meta.tax_percent = coerce_decimal(text);
    }

    /// Unparsable text keeps the current date.
    pub fn set_issue_date_text(&mut self, text: &str) {
        if let Some(date) = parse_date(text) {
            self.meta.issue_date = date;
        }
    }

    pub fn set_due_date_text(&mut self, text: &str) {
        if let Some(date) = parse_date(text) {
            self.meta.due_date = date;
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .inspect_err(|e| debug!("Ignoring date {:?}: {}", text, e))
        .ok()
}

/// Longest prefix of `text` that reads as a number; `allow_fraction`
/// controls whether a decimal point and exponent are accepted.
fn numeric_prefix(text: &str, allow_fraction: bool) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if allow_fraction {
        if end < bytes.len() && bytes[end] == b'.' {
            let mut frac = end + 1;
            while frac < bytes.len() && bytes[frac].is_ascii_digit() {
                frac += 1;
            }
            if frac > end + 1 || end > digits_start {
                end = frac;
            }
        }
        if end > digits_start && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
                exp += 1;
            }
            let exp_digits = exp;
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            if exp > exp_digits {
                end = exp;
            }
        }
    }
    &text[..end]
}

/// Integer coercion: `"12abc"` is 12, anything unreadable is 0.
pub fn coerce_quantity(text: &str) -> i64 {
    let trimmed = text.trim();
    numeric_prefix(trimmed, false).parse().unwrap_or_else(|_| {
        debug!("Coerced quantity {:?} to 0", text);
        0
    })
}

/// Decimal coercion for rates and tax: `"7.5%"` is 7.5, anything unreadable is 0.
pub fn coerce_decimal(text: &str) -> f64 {
    let trimmed = text.trim();
    match numeric_prefix(trimmed, true).parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            debug!("Coerced decimal {:?} to 0", text);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewMode;
    use pretty_assertions::assert_eq;

    fn form() -> InvoiceForm {
        InvoiceForm::new(&Settings::default())
    }

    #[test]
    fn starts_with_sample_values() {
        let form = form();
        assert_eq!(form.meta.number, "001");
        assert_eq!(form.meta.currency, "$");
        assert_eq!(form.meta.tax_percent, 10.0);
        assert_eq!(form.items().len(), 1);
        assert_eq!(form.recipient.name, "Client Name");
        assert_eq!(form.notes, "Thank you for your business!");
        assert_eq!(form.view().mode(), ViewMode::Edit);
    }

    #[test]
    fn totals_follow_edits() {
        let mut form = form();
        assert_eq!(form.totals().total, 110.0);
        let id = form.add_item();
        form.update_item(id, ItemUpdate::Quantity(2));
        form.update_item(id, ItemUpdate::Rate(50.0));
        let totals = form.totals();
        assert_eq!(totals.subtotal, 200.0);
        assert_eq!(totals.total, 220.0);
        form.remove_item(ItemId(1));
        form.remove_item(id);
        assert_eq!(form.totals().total, 0.0);
    }

    #[test]
    fn toggling_twice_changes_nothing_else() {
        let mut form = form();
        let before = form.clone();
        form.toggle_preview();
        form.toggle_preview();
        assert_eq!(form, before);
    }

    #[test]
    fn export_waits_for_preview_frame() {
        let mut form = form();
        assert_eq!(form.render_committed(), None);
        assert_eq!(form.request(Action::Export), None);
        assert_eq!(form.render_committed(), Some(Action::Export));
    }

    #[test]
    fn tax_text_is_coerced() {
        let mut form = form();
        form.set_tax_text("7.5");
        assert_eq!(form.meta.tax_percent, 7.5);
        form.set_tax_text("abc");
        assert_eq!(form.meta.tax_percent, 0.0);
    }

    #[test]
    fn bad_date_text_keeps_previous_date() {
        let mut form = form();
        form.set_issue_date_text("2026-02-03");
        assert_eq!(form.meta.issue_date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        form.set_issue_date_text("2026-02-31");
        assert_eq!(form.meta.issue_date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        form.set_due_date_text(" 2026-03-05 ");
        assert_eq!(form.meta.due_date, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    }

    #[test]
    fn logo_can_be_set_and_cleared() {
        let mut form = form();
        form.set_logo(Logo::from_bytes("l.png", vec![1, 2, 3]));
        assert!(form.meta.logo.is_some());
        form.clear_logo();
        assert!(form.meta.logo.is_none());
    }

    #[test]
    fn quantity_coercion() {
        assert_eq!(coerce_quantity("3"), 3);
        assert_eq!(coerce_quantity(" 12abc"), 12);
        assert_eq!(coerce_quantity("2.9"), 2);
        assert_eq!(coerce_quantity("-4"), -4);
        assert_eq!(coerce_quantity(""), 0);
        assert_eq!(coerce_quantity("x1"), 0);
        assert_eq!(coerce_quantity("-"), 0);
    }

    #[test]
    fn decimal_coercion() {
        assert_eq!(coerce_decimal("19.99"), 19.99);
        assert_eq!(coerce_decimal(".5"), 0.5);
        assert_eq!(coerce_decimal("5."), 5.0);
        assert_eq!(coerce_decimal("7.5%"), 7.5);
        assert_eq!(coerce_decimal("1e2"), 100.0);
        assert_eq!(coerce_decimal("3e"), 3.0);
        assert_eq!(coerce_decimal("."), 0.0);
        assert_eq!(coerce_decimal("NaN"), 0.0);
        assert_eq!(coerce_decimal("inf"), 0.0);
        assert_eq!(coerce_decimal("1e999"), 0.0);
    }
}
