//! Mining: gather resources and craft tools at unique stations.

use super::{GameConfig, GameKind, ObjectParam, Operation, SubtaskParam};
use crate::core::types::{Action, OperationKind};

const WORKSPACE: usize = 0;
const FURNACE: usize = 1;
const TREE: usize = 2;
const STONE: usize = 3;
const GRASS: usize = 4;
const PIG: usize = 5;
const COAL: usize = 6;
const IRON: usize = 7;
const SILVER: usize = 8;
const GOLD: usize = 9;
const DIAMOND: usize = 10;
const JEWELER: usize = 11;
const LUMBERSHOP: usize = 12;

pub(super) fn config() -> GameConfig {
    // Stations transform into themselves so they survive every use.
    let objects = vec![
        ObjectParam::new("workspace", false, true).outcome(WORKSPACE).unique(),
        ObjectParam::new("furnace", false, true).outcome(FURNACE).unique(),
        ObjectParam::new("tree", true, false).max_filler(3),
        ObjectParam::new("stone", true, false).max_filler(3),
        ObjectParam::new("grass", true, false).max_filler(2),
        ObjectParam::new("pig", true, false).max_filler(1),
        ObjectParam::new("coal", true, false).max_filler(1),
        ObjectParam::new("iron", true, false).max_filler(1),
        ObjectParam::new("silver", true, false).max_filler(1),
        ObjectParam::new("gold", true, false).max_filler(1),
        ObjectParam::new("diamond", true, false).max_filler(3),
        ObjectParam::new("jeweler", false, true).outcome(JEWELER).unique(),
        ObjectParam::new("lumbershop", false, true).outcome(LUMBERSHOP).unique(),
    ];

    let mut operations = vec![Operation {
        action: Action::Pickup,
        name: "pickup",
        kind: OperationKind::Pickup,
        key: 'p',
    }];
    for (action, name, key) in [
        (Action::Use1, "use_1", '1'),
        (Action::Use2, "use_2", '2'),
        (Action::Use3, "use_3", '3'),
        (Action::Use4, "use_4", '4'),
        (Action::Use5, "use_5", '5'),
    ] {
        operations.push(Operation {
            action,
            name,
            kind: OperationKind::Transform,
            key,
        });
    }

    let subtasks = [
        ("Cut wood", Action::Pickup, TREE),
        ("Get stone", Action::Pickup, STONE),
        ("Get string", Action::Pickup, GRASS),
        ("Make firewood", Action::Use1, LUMBERSHOP),
        ("Make stick", Action::Use2, LUMBERSHOP),
        ("Make arrow", Action::Use3, LUMBERSHOP),
        ("Make bow", Action::Use4, LUMBERSHOP),
        ("Make stone pickaxe", Action::Use1, WORKSPACE),
        ("Hit pig", Action::Pickup, PIG),
        ("Get coal", Action::Pickup, COAL),
        ("Get iron ore", Action::Pickup, IRON),
        ("Get silver ore", Action::Pickup, SILVER),
        ("Light furnace", Action::Use1, FURNACE),
        ("Smelt iron", Action::Use2, FURNACE),
        ("Smelt silver", Action::Use3, FURNACE),
        ("Bake pork", Action::Use5, FURNACE),
        ("Make iron pickaxe", Action::Use2, WORKSPACE),
        ("Make silverware", Action::Use3, WORKSPACE),
        ("Get gold ore", Action::Pickup, GOLD),
        ("Get diamond ore", Action::Pickup, DIAMOND),
        ("Smelt gold", Action::Use4, FURNACE),
        ("Craft earrings", Action::Use1, JEWELER),
        ("Craft rings", Action::Use2, JEWELER),
        ("Make goldware", Action::Use4, WORKSPACE),
        ("Make bracelet", Action::Use5, WORKSPACE),
        ("Craft necklace", Action::Use3, JEWELER),
    ]
    .into_iter()
    .map(|(name, action, object)| SubtaskParam {
        name: name.to_string(),
        action,
        object,
    })
    .collect();

    GameConfig::new(
        GameKind::Mining,
        (10, 10),
        (1, 3),
        (1, 3),
        objects,
        operations,
        subtasks,
    )
}
