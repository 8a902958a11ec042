use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    /// Positioned independently of the background; removed once collected.
    Prop,
    /// Region fixed to the background; never removed.
    Hotspot,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Prop, EntityKind::Hotspot];

    pub fn is_collectable(self) -> bool {
        matches!(self, EntityKind::Prop)
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Prop => "Prop",
            EntityKind::Hotspot => "Hotspot",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
}

impl Entity {
    pub fn prop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Prop,
        }
    }

    pub fn hotspot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Hotspot,
        }
    }
}

/// Interactable entities keyed by name, in registration order.
///
/// Registration is forgiving: duplicates and unknown removals are no-ops.
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    index_by_name: HashMap<String, usize>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an entity with the same name already exists.
    pub fn register(&mut self, entity: Entity) -> bool {
        if self.index_by_name.contains_key(&entity.name) {
            debug!(entity = %entity.name, "entity_register_ignored_duplicate");
            return false;
        }
        self.index_by_name
            .insert(entity.name.clone(), self.entities.len());
        self.entities.push(entity);
        true
    }

    /// Returns `false` when no entity has this name.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(index) = self.index_by_name.remove(name) else {
            debug!(entity = name, "entity_unregister_ignored_absent");
            return false;
        };
        self.entities.remove(index);
        for slot in self.index_by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        true
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index_by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.index_by_name
            .get(name)
            .and_then(|index| self.entities.get(*index))
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|entity| entity.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<Entity> for EntityRegistry {
    fn from_iter<T: IntoIterator<Item = Entity>>(iter: T) -> Self {
        let mut registry = Self::new();
        for entity in iter {
            registry.register(entity);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_registry() -> EntityRegistry {
        [
            Entity::prop("bucket"),
            Entity::hotspot("Pirate"),
            Entity::prop("rope"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn kind_labels_parse_back_exactly() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(EntityKind::from_label("prop"), None);
    }

    #[test]
    fn register_keeps_insertion_order() {
        let registry = demo_registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["bucket", "Pirate", "rope"]);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut registry = demo_registry();
        assert!(!registry.register(Entity::hotspot("bucket")));
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.get("bucket").expect("bucket").kind,
            EntityKind::Prop
        );
    }

    #[test]
    fn unregister_absent_is_noop() {
        let mut registry = demo_registry();
        assert!(!registry.unregister("parrot"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unregister_keeps_lookup_consistent() {
        let mut registry = demo_registry();
        assert!(registry.unregister("bucket"));

        assert!(!registry.exists("bucket"));
        assert_eq!(registry.get("Pirate").expect("pirate").name, "Pirate");
        assert_eq!(registry.get("rope").expect("rope").name, "rope");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn names_are_case_sensitive() {
        let registry = demo_registry();
        assert!(registry.exists("Pirate"));
        assert!(!registry.exists("pirate"));
    }

    #[test]
    fn only_props_are_collectable() {
        assert!(EntityKind::Prop.is_collectable());
        assert!(!EntityKind::Hotspot.is_collectable());
    }
}
