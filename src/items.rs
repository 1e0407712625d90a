use log::{debug, info};

use crate::model::{ItemId, LineItem};

/// One field edit on a line item. The amount has no variant: it is always
/// derived from quantity and rate.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemUpdate {
    Description(String),
    Quantity(i64),
    Rate(f64),
}

/// Ordered line items. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineItems {
    items: Vec<LineItem>,
}

impl LineItems {
    pub fn from_items(items: Vec<LineItem>) -> Self {
        LineItems { items }
    }

    fn next_id(&self) -> ItemId {
        self.items
            .iter()
            .map(|i| i.id.0)
            .max()
            .map_or(ItemId(1), |max| ItemId(max + 1))
    }

    /// Appends a blank item (quantity 1, rate 0) and returns its id.
    pub fn add_item(&mut self) -> ItemId {
        let id = self.next_id();
        self.items.push(LineItem::new(id, "", 1, 0.0));
        info!("Added line item {}", id);
        id
    }

    /// Returns `false` if no item had that id.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            info!("Removed line item {}", id);
        } else {
            debug!("Remove ignored, no line item {}", id);
        }
        removed
    }

    pub fn update_item(&mut self, id: ItemId, update: ItemUpdate) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!("Update ignored, no line item {}", id);
            return false;
        };

        match update {
            ItemUpdate::Description(text) => item.description = text,
            ItemUpdate::Quantity(quantity) => {
                item.quantity = quantity;
                item.amount = item.quantity as f64 * item.rate;
            }
            ItemUpdate::Rate(rate) => {
                item.rate = rate;
                item.amount = item.quantity as f64 * item.rate;
            }
        }
        true
    }

    pub fn get(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[LineItem] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn assert_unique(items: &LineItems) {
        let ids = items.ids();
        let set: HashSet<_> = ids.iter().collect();
        assert_eq!(set.len(), ids.len(), "duplicate ids in {:?}", ids);
    }

    #[test]
    fn first_item_gets_id_one() {
        let mut items = LineItems::default();
        assert_eq!(items.add_item(), ItemId(1));
        let item = items.get(ItemId(1)).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.rate, 0.0);
        assert_eq!(item.amount, 0.0);
        assert_eq!(item.description, "");
    }

    #[test]
    fn new_id_is_max_plus_one() {
        let mut items = LineItems::default();
        items.add_item();
        items.add_item();
        items.add_item();
        items.remove_item(ItemId(2));
        assert_eq!(items.add_item(), ItemId(4));
        items.remove_item(ItemId(4));
        items.remove_item(ItemId(3));
        assert_eq!(items.add_item(), ItemId(2));
    }

    #[test]
    fn ids_stay_unique_over_mixed_edits() {
        let mut items = LineItems::default();
        for round in 0..20u32 {
            items.add_item();
            items.add_item();
            if round % 3 == 0 {
                let first = items.ids()[0];
                items.remove_item(first);
            }
            if round % 4 == 1 {
                let last = *items.ids().last().unwrap();
                items.remove_item(last);
            }
            assert_unique(&items);
        }
    }

    #[test]
    fn remove_unknown_id_leaves_list_identical() {
        let mut items = LineItems::from_items(vec![
            LineItem::new(ItemId(1), "A", 1, 10.0),
            LineItem::new(ItemId(5), "B", 2, 3.5),
        ]);
        let before = items.clone();
        assert!(!items.remove_item(ItemId(9)));
        assert_eq!(items, before);
    }

    #[test]
    fn quantity_and_rate_updates_recompute_amount() {
        let mut items = LineItems::default();
        let id = items.add_item();
        items.update_item(id, ItemUpdate::Quantity(2));
        assert_eq!(items.get(id).unwrap().amount, 0.0);
        items.update_item(id, ItemUpdate::Rate(50.0));
        assert_eq!(items.get(id).unwrap().amount, 100.0);
        items.update_item(id, ItemUpdate::Quantity(3));
        let item = items.get(id).unwrap();
        assert_eq!(item.amount, item.quantity as f64 * item.rate);
        assert_eq!(item.amount, 150.0);
    }

    #[test]
    fn description_update_keeps_amount() {
        let mut items = LineItems::from_items(vec![LineItem::new(ItemId(1), "Old", 4, 2.5)]);
        items.update_item(ItemId(1), ItemUpdate::Description("New".into()));
        let item = items.get(ItemId(1)).unwrap();
        assert_eq!(item.description, "New");
        assert_eq!(item.amount, 10.0);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut items = LineItems::default();
        items.add_item();
        let before = items.clone();
        assert!(!items.update_item(ItemId(7), ItemUpdate::Rate(99.0)));
        assert_eq!(items, before);
    }

    #[test]
    fn negative_values_are_not_rejected() {
        let mut items = LineItems::default();
        let id = items.add_item();
        items.update_item(id, ItemUpdate::Quantity(-2));
        items.update_item(id, ItemUpdate::Rate(5.0));
        assert_eq!(items.get(id).unwrap().amount, -10.0);
    }
}
