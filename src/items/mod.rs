//! Items

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

pub mod groups;

/// A discrete, unsplittable production item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    name: String,
    model: String,
    submodel: Option<String>,
    quantity: u64,
    order: String,
    due_date: Date,
}

impl Item {
    /// Creates a new item without a submodel.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        quantity: u64,
        order: impl Into<String>,
        due_date: Date,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            submodel: None,
            quantity,
            order: order.into(),
            due_date,
        }
    }

    /// Returns the item with the given submodel attached.
    #[must_use]
    pub fn with_submodel(mut self, submodel: impl Into<String>) -> Self {
        self.submodel = Some(submodel.into());
        self
    }

    /// Unique item name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model key used for plant compatibility and grouping
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Optional submodel, carried through for reporting only
    pub fn submodel(&self) -> Option<&str> {
        self.submodel.as_deref()
    }

    /// Quantity that must be produced at a single plant
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Owning order id
    pub fn order(&self) -> &str {
        &self.order
    }

    /// Due date of the owning order
    pub fn due_date(&self) -> Date {
        self.due_date
    }
}

/// Sum of the quantities of the given items, saturating at `u64::MAX`.
pub fn total_quantity<'a>(items: impl IntoIterator<Item = &'a Item>) -> u64 {
    items
        .into_iter()
        .fold(0_u64, |acc, item| acc.saturating_add(item.quantity()))
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn with_submodel_attaches_submodel() {
        let item = Item::new("i1", "M1", 4, "O1", date(2025, 8, 21)).with_submodel("S1");

        assert_eq!(item.submodel(), Some("S1"));
        assert_eq!(item.model(), "M1");
        assert_eq!(item.quantity(), 4);
    }

    #[test]
    fn total_quantity_sums_items() {
        let items = [
            Item::new("a", "M1", 4, "O1", date(2025, 8, 21)),
            Item::new("b", "M1", 2, "O1", date(2025, 8, 21)),
        ];

        assert_eq!(total_quantity(&items), 6);
    }
}
