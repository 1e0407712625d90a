use crate::model::LineItem;

/// Subtotal, tax and total at full precision. Rounding is left to display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl Totals {
    pub fn derive(items: &[LineItem], tax_percent: f64) -> Self {
        let subtotal: f64 = items.iter().map(|item| item.amount).sum();
        let tax_amount = subtotal * tax_percent / 100.0;
        Totals {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;

    #[test]
    fn empty_list_is_all_zero() {
        assert_eq!(Totals::derive(&[], 10.0), Totals::default());
        assert_eq!(Totals::derive(&[], 0.0).total, 0.0);
    }

    #[test]
    fn single_item_with_ten_percent_tax() {
        let items = [LineItem::new(ItemId(1), "Work", 2, 50.0)];
        let totals = Totals::derive(&items, 10.0);
        assert_eq!(items[0].amount, 100.0);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.tax_amount, 10.0);
        assert_eq!(totals.total, 110.0);
    }

    #[test]
    fn subtotal_is_sum_of_amounts() {
        let items = [
            LineItem::new(ItemId(1), "A", 3, 19.99),
            LineItem::new(ItemId(2), "B", 1, 0.01),
            LineItem::new(ItemId(3), "C", 7, 12.5),
        ];
        for tax in [0.0, 7.25, 10.0, 100.0] {
            let totals = Totals::derive(&items, tax);
            let expected: f64 = items.iter().map(|i| i.amount).sum();
            assert_eq!(totals.subtotal, expected);
            assert_eq!(totals.total, totals.subtotal + totals.subtotal * tax / 100.0);
        }
    }

    #[test]
    fn keeps_full_precision() {
        let items = [LineItem::new(ItemId(1), "Third", 1, 1.0 / 3.0)];
        let totals = Totals::derive(&items, 8.875);
        assert_eq!(totals.tax_amount, (1.0 / 3.0) * 8.875 / 100.0);
    }
}
