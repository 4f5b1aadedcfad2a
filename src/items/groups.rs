//! Model Groups

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{items::Item, plants::Plant};

/// Eligible items sharing one model key, together with the plants allowed to produce that model.
///
/// Groups are derived per solve and exist only to express presence, grouping and minimum-lot
/// rules; they are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGroup {
    model: String,
    items: SmallVec<[usize; 8]>,
    plants: SmallVec<[usize; 4]>,
}

impl ModelGroup {
    /// Build model groups over the eligible item indexes, in first-seen model order.
    pub fn collect(items: &[Item], plants: &[Plant], eligible: &[usize]) -> Vec<ModelGroup> {
        let mut groups: Vec<ModelGroup> = Vec::new();
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();

        for &item_idx in eligible {
            let Some(item) = items.get(item_idx) else {
                continue;
            };

            let group_idx = *index.entry(item.model()).or_insert_with(|| {
                groups.push(ModelGroup {
                    model: item.model().to_string(),
                    items: SmallVec::new(),
                    plants: plants
                        .iter()
                        .enumerate()
                        .filter(|(_, plant)| plant.allows(item.model()))
                        .map(|(plant_idx, _)| plant_idx)
                        .collect(),
                });

                groups.len() - 1
            });

            if let Some(group) = groups.get_mut(group_idx) {
                group.items.push(item_idx);
            }
        }

        groups
    }

    /// Model key shared by every item in the group.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Indexes (into the problem's item list) of the group's eligible items.
    pub fn items(&self) -> &[usize] {
        &self.items
    }

    /// Indexes of the plants whose allowed-model set contains the group's model.
    pub fn plants(&self) -> &[usize] {
        &self.plants
    }

    /// Maximum number of plants beyond the first this group could ever be spread across.
    pub fn max_extra_plants(&self) -> usize {
        self.plants.len().min(self.items.len()).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn items() -> Vec<Item> {
        let due = date(2025, 8, 21);

        vec![
            Item::new("i1", "red", 3, "O1", due),
            Item::new("i2", "blue", 2, "O1", due),
            Item::new("i3", "red", 2, "O2", due),
            Item::new("i4", "green", 1, "O2", due),
        ]
    }

    fn plants() -> Vec<Plant> {
        vec![
            Plant::new("North", 9, ["red", "blue"]),
            Plant::new("East", 6, ["red", "green"]),
        ]
    }

    #[test]
    fn groups_follow_first_seen_model_order() {
        let groups = ModelGroup::collect(&items(), &plants(), &[0, 1, 2, 3]);

        let models: Vec<&str> = groups.iter().map(ModelGroup::model).collect();

        assert_eq!(models, vec!["red", "blue", "green"]);
    }

    #[test]
    fn groups_only_contain_eligible_items() {
        let groups = ModelGroup::collect(&items(), &plants(), &[0, 1]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.first().map(ModelGroup::items), Some(&[0_usize][..]));
    }

    #[test]
    fn groups_record_compatible_plants() {
        let groups = ModelGroup::collect(&items(), &plants(), &[0, 1, 2, 3]);

        let red = groups.first().map(ModelGroup::plants);
        let green = groups.get(2).map(ModelGroup::plants);

        assert_eq!(red, Some(&[0_usize, 1][..]));
        assert_eq!(green, Some(&[1_usize][..]));
    }

    #[test]
    fn max_extra_plants_is_bounded_by_items_and_plants() {
        let groups = ModelGroup::collect(&items(), &plants(), &[0, 1, 2, 3]);

        let extras: Vec<usize> = groups.iter().map(ModelGroup::max_extra_plants).collect();

        // red: 2 items, 2 plants -> 1; blue: 1 item -> 0; green: 1 item -> 0
        assert_eq!(extras, vec![1, 0, 0]);
    }
}
