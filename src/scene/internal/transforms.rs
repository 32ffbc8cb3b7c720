use crate::scene::components::{Children, Parent, TransformComponent, WorldTransform};
use crate::scene::transform::Transform;
use hecs::{Entity, World};

/// Recomputes `WorldTransform` for every hierarchy rooted at a parentless entity.
pub(crate) fn propagate_transforms(world: &mut World) {
    let roots: Vec<Entity> = world
        .query::<&TransformComponent>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    log::trace!("Propagating transforms from {} root entities", roots.len());

    for root in roots {
        propagate_subtree(world, root, Transform::IDENTITY);
    }
}

/// Recomputes `WorldTransform` for `root` and its descendants, treating
/// `parent_world` as the transform `root` is attached to.
pub(crate) fn propagate_subtree(world: &mut World, root: Entity, parent_world: Transform) {
    let mut stack: Vec<(Entity, Transform)> = vec![(root, parent_world)];

    while let Some((entity, parent_world)) = stack.pop() {
        let local = match world.get::<&TransformComponent>(entity) {
            Ok(t) => t.0,
            Err(_) => {
                log::trace!("Entity {:?} has no TransformComponent, skipping", entity);
                continue;
            }
        };

        let world_transform = parent_world.mul_transform(&local);

        let updated = match world.get::<&mut WorldTransform>(entity) {
            Ok(mut wt) => {
                wt.0 = world_transform;
                true
            }
            Err(_) => false,
        };

        if !updated {
            if let Err(e) = world.insert_one(entity, WorldTransform(world_transform)) {
                log::error!(
                    "Failed to insert WorldTransform for entity {:?}: {:?}",
                    entity,
                    e
                );
                continue;
            }
        }

        if let Ok(children) = world.get::<&Children>(entity) {
            for &child in children.0.iter().rev() {
                stack.push((child, world_transform));
            }
        }
    }
}
