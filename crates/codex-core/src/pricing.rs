//! Upgrade-cost calculators over the nested ship shape.

use crate::ship::{Armor, NormalizedShip, SlotPrice};
use serde::Serialize;

/// Breakdown of what it costs to buy a ship and fill every upgrade slot.
/// Sums saturate at `i64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeCost {
    pub base: i64,
    pub armors: i64,
    pub cortex: i64,
    pub drones: i64,
    /// Paint and rename. Reported separately; not part of `total`.
    pub misc: i64,
    pub total: i64,
}

fn slot(slots: &[SlotPrice], number: i64) -> Option<&SlotPrice> {
    slots.iter().find(|s| s.slot == number)
}

fn sum_buy(slots: &[SlotPrice], first: Option<usize>) -> i64 {
    let take = first.unwrap_or(slots.len());
    slots.iter().take(take).map(|s| s.buy_price).fold(0, i64::saturating_add)
}

impl NormalizedShip {
    pub fn cortex_slot_price(&self, number: i64) -> i64 {
        slot(&self.cortex_slots, number).map(|s| s.buy_price).unwrap_or(0)
    }

    pub fn cortex_slot_sell_price(&self, number: i64) -> i64 {
        slot(&self.cortex_slots, number).map(|s| s.sell_price).unwrap_or(0)
    }

    pub fn drone_slot_price(&self, number: i64) -> i64 {
        slot(&self.drone_slots, number).map(|s| s.buy_price).unwrap_or(0)
    }

    pub fn drone_slot_sell_price(&self, number: i64) -> i64 {
        slot(&self.drone_slots, number).map(|s| s.sell_price).unwrap_or(0)
    }

    pub fn armor_by_name(&self, name: &str) -> Option<&Armor> {
        self.armors.iter().find(|a| a.name == name)
    }

    pub fn armor_price(&self, name: &str) -> i64 {
        self.armor_by_name(name).map(|a| a.price).unwrap_or(0)
    }

    pub fn armor_sell_price(&self, name: &str) -> i64 {
        self.armor_by_name(name).map(|a| a.sell_price).unwrap_or(0)
    }

    /// Buy price of the cortex slots in stored order; `first` limits to the first N.
    pub fn total_cortex_cost(&self, first: Option<usize>) -> i64 {
        sum_buy(&self.cortex_slots, first)
    }

    pub fn total_drone_cost(&self, first: Option<usize>) -> i64 {
        sum_buy(&self.drone_slots, first)
    }

    pub fn total_armors_cost(&self) -> i64 {
        self.armors.iter().map(|a| a.price).fold(0, i64::saturating_add)
    }

    pub fn full_upgrade_cost(&self) -> UpgradeCost {
        let base = self.crionita;
        let armors = self.total_armors_cost();
        let cortex = self.total_cortex_cost(None);
        let drones = self.total_drone_cost(None);
        UpgradeCost {
            base,
            armors,
            cortex,
            drones,
            misc: self.paint_cost.saturating_add(self.rename_cost),
            total: [armors, cortex, drones].into_iter().fold(base, i64::saturating_add),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> NormalizedShip {
        NormalizedShip {
            crionita: 1000,
            paint_cost: 30,
            rename_cost: 20,
            armors: vec![
                Armor { name: "Plate".into(), price: 200, sell_price: 100 },
                Armor { name: "Mesh".into(), price: 50, sell_price: 25 },
            ],
            cortex_slots: vec![
                SlotPrice { slot: 1, buy_price: 10, sell_price: 5 },
                SlotPrice { slot: 2, buy_price: 20, sell_price: 10 },
                SlotPrice { slot: 3, buy_price: 40, sell_price: 20 },
            ],
            drone_slots: vec![SlotPrice { slot: 1, buy_price: 7, sell_price: 3 }],
            ..Default::default()
        }
    }

    #[test]
    fn slot_prices_by_number() {
        let s = ship();
        assert_eq!(s.cortex_slot_price(2), 20);
        assert_eq!(s.cortex_slot_sell_price(3), 20);
        assert_eq!(s.drone_slot_sell_price(1), 3);
        assert_eq!(s.drone_slot_price(9), 0);
    }

    #[test]
    fn armor_lookup() {
        let s = ship();
        assert_eq!(s.armor_price("Mesh"), 50);
        assert_eq!(s.armor_sell_price("Plate"), 100);
        assert_eq!(s.armor_price("Nope"), 0);
    }

    #[test]
    fn partial_cortex_total() {
        assert_eq!(ship().total_cortex_cost(Some(2)), 30);
        assert_eq!(ship().total_cortex_cost(None), 70);
    }

    #[test]
    fn full_cost_excludes_misc_from_total() {
        let cost = ship().full_upgrade_cost();
        assert_eq!(cost.armors, 250);
        assert_eq!(cost.misc, 50);
        assert_eq!(cost.total, 1000 + 250 + 70 + 7);
    }

    #[test]
    fn oversized_prices_saturate() {
        let s = NormalizedShip {
            crionita: i64::MAX,
            paint_cost: i64::MAX,
            rename_cost: 1,
            armors: vec![
                Armor { name: "Plate".into(), price: i64::MAX, sell_price: 0 },
                Armor { name: "Mesh".into(), price: 1, sell_price: 0 },
            ],
            cortex_slots: vec![
                SlotPrice { slot: 1, buy_price: i64::MAX, sell_price: 0 },
                SlotPrice { slot: 2, buy_price: 1, sell_price: 0 },
            ],
            ..Default::default()
        };
        assert_eq!(s.total_armors_cost(), i64::MAX);
        assert_eq!(s.total_cortex_cost(None), i64::MAX);
        let cost = s.full_upgrade_cost();
        assert_eq!(cost.total, i64::MAX);
        assert_eq!(cost.misc, i64::MAX);
    }
}
