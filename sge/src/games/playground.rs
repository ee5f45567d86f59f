//! Playground: farm animals and treasures on an open field.

use super::{GameConfig, GameKind, ObjectParam, Operation, SubtaskParam};
use crate::core::types::{Action, OperationKind};

const ICE: usize = 8;

pub(super) fn config() -> GameConfig {
    let objects = vec![
        ObjectParam::new("cow", true, true).outcome(ICE).speed(0.1),
        ObjectParam::new("duck", true, true).outcome(ICE).speed(0.2),
        ObjectParam::new("milk", true, true).outcome(ICE),
        ObjectParam::new("chest", true, true).outcome(ICE),
        ObjectParam::new("diamond", true, true).outcome(ICE),
        ObjectParam::new("steak", true, true).outcome(ICE),
        ObjectParam::new("egg", true, true).outcome(ICE),
        ObjectParam::new("heart", true, true).outcome(ICE),
        ObjectParam::new("ice", false, false).outcome(ICE),
    ];

    let operations = vec![
        Operation {
            action: Action::Pickup,
            name: "pickup",
            kind: OperationKind::Pickup,
            key: 'p',
        },
        Operation {
            action: Action::TRANSFORM,
            name: "transform",
            kind: OperationKind::Transform,
            key: 't',
        },
    ];

    // One subtask per applicable (operation, object) pair, operations outermost.
    let mut subtasks = Vec::new();
    for op in &operations {
        for (kind, obj) in objects.iter().enumerate() {
            let applicable = match op.kind {
                OperationKind::Pickup => obj.pickable,
                OperationKind::Transform => obj.transformable,
            };
            if applicable {
                subtasks.push(SubtaskParam {
                    name: format!("{} {}", op.name, obj.name),
                    action: op.action,
                    object: kind,
                });
            }
        }
    }

    GameConfig::new(
        GameKind::Playground,
        (10, 10),
        (0, 4),
        (0, 0),
        objects,
        operations,
        subtasks,
    )
}
