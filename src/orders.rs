//! Orders
//!
//! Input arrives as orders; each order line becomes one unsplittable [`Item`] carrying the
//! order's due date.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::items::Item;

/// A customer order with a single due date and one or more lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: String,

    /// Due date shared by every line of the order
    pub due_date: Date,

    /// Order lines, each of which becomes one item
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

/// A single line of an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Optional item name; derived from the order id and line position when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Model key
    pub model: String,

    /// Optional submodel
    #[serde(default)]
    pub submodel: Option<String>,

    /// Quantity to produce
    pub quantity: u64,
}

impl Order {
    /// Create an order without lines.
    pub fn new(id: impl Into<String>, due_date: Date) -> Self {
        Self {
            id: id.into(),
            due_date,
            lines: Vec::new(),
        }
    }

    /// Returns the order with an additional line.
    #[must_use]
    pub fn with_line(mut self, line: OrderLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Name of the item produced by the line at `line_idx`.
    ///
    /// Unnamed lines are named `"<order id>/<line number>"`, counting from 1.
    pub fn line_item_name(&self, line_idx: usize) -> Option<String> {
        let line = self.lines.get(line_idx)?;

        Some(match &line.name {
            Some(name) => name.clone(),
            None => format!("{}/{}", self.id, line_idx.saturating_add(1)),
        })
    }
}

impl OrderLine {
    /// Create an unnamed line.
    pub fn new(model: impl Into<String>, quantity: u64) -> Self {
        Self {
            name: None,
            model: model.into(),
            submodel: None,
            quantity,
        }
    }

    /// Returns the line with an explicit item name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the line with a submodel.
    #[must_use]
    pub fn with_submodel(mut self, submodel: impl Into<String>) -> Self {
        self.submodel = Some(submodel.into());
        self
    }
}

/// Flatten orders into items, in order then line order.
pub fn flatten(orders: &[Order]) -> Vec<Item> {
    orders
        .iter()
        .flat_map(|order| {
            order.lines.iter().enumerate().filter_map(move |(line_idx, line)| {
                let name = order.line_item_name(line_idx)?;
                let item = Item::new(name, &line.model, line.quantity, &order.id, order.due_date);

                Some(match &line.submodel {
                    Some(submodel) => item.with_submodel(submodel),
                    None => item,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn flatten_preserves_order_and_line_order() {
        let orders = [
            Order::new("O1", date(2025, 8, 21))
                .with_line(OrderLine::new("M1", 4))
                .with_line(OrderLine::new("M2", 2).named("custom")),
            Order::new("O2", date(2025, 9, 1)).with_line(OrderLine::new("M1", 1).with_submodel("S")),
        ];

        let items = flatten(&orders);
        let names: Vec<&str> = items.iter().map(Item::name).collect();

        assert_eq!(names, vec!["O1/1", "custom", "O2/1"]);
        assert_eq!(items.get(2).and_then(Item::submodel), Some("S"));
        assert_eq!(items.get(2).map(Item::due_date), Some(date(2025, 9, 1)));
        assert_eq!(items.first().map(Item::order), Some("O1"));
    }

    #[test]
    fn orders_deserialize_from_yaml() -> testresult::TestResult {
        let yaml = "
id: O7
due_date: 2025-08-21
lines:
  - model: M1
    quantity: 3
  - name: special
    model: M2
    submodel: X
    quantity: 0
";

        let order: Order = serde_norway::from_str(yaml)?;

        assert_eq!(order.due_date, date(2025, 8, 21));
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.line_item_name(1).as_deref(), Some("special"));

        Ok(())
    }
}
