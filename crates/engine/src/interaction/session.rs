use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::host::{InputEvents, UiHost};
use super::info_line::compose_info_line;
use super::registry::{Entity, EntityRegistry};
use super::resolver::{RemarkTable, RuleTable, StateEffect};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    active_verb: String,
    active_mouseover: String,
    inventory: Vec<String>,
    flags: BTreeSet<String>,
}

impl SessionState {
    pub fn active_verb(&self) -> &str {
        &self.active_verb
    }

    pub fn active_mouseover(&self) -> &str {
        &self.active_mouseover
    }

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    pub fn info_line(&self) -> String {
        compose_info_line(&self.active_verb, &self.active_mouseover)
    }

    fn add_to_inventory(&mut self, item: &str) -> bool {
        if self.has_item(item) {
            return false;
        }
        self.inventory.push(item.to_string());
        true
    }

    fn set_flag(&mut self, flag: &str) -> bool {
        self.flags.insert(flag.to_string())
    }

    fn clear_selection(&mut self) {
        self.active_verb.clear();
        self.active_mouseover.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub active_verb: String,
    pub active_mouseover: String,
    pub info_line: String,
    pub inventory: Vec<String>,
    pub flags: Vec<String>,
    pub entities: Vec<Entity>,
}

/// Owns the session state and drives one [`UiHost`].
pub struct Session<H: UiHost> {
    state: SessionState,
    registry: EntityRegistry,
    rules: RuleTable,
    remarks: RemarkTable,
    host: H,
}

impl<H: UiHost> Session<H> {
    pub fn new(registry: EntityRegistry, rules: RuleTable, remarks: RemarkTable, host: H) -> Self {
        Self {
            state: SessionState::default(),
            registry,
            rules,
            remarks,
            host,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn set_active_verb(&mut self, verb: &str) {
        if self.state.active_verb == verb {
            return;
        }
        self.state.active_verb = verb.to_string();
        self.emit_info_line();
    }

    /// An empty name clears the mouseover.
    pub fn set_mouseover(&mut self, entity_name: &str) {
        if self.state.active_mouseover == entity_name {
            return;
        }
        self.state.active_mouseover = entity_name.to_string();
        self.emit_info_line();
    }

    pub fn handle_click(&mut self, entity_name: &str) {
        let resolution =
            self.rules
                .resolve_detailed(&self.registry, &self.state.active_verb, entity_name);
        if let Some(miss) = resolution.miss {
            debug!(
                verb = %self.state.active_verb,
                entity = entity_name,
                reason = %miss,
                "interaction_fallback"
            );
        }
        let outcome = resolution.outcome;

        let mut inventory_changed = false;
        let mut collected = false;
        for effect in &outcome.effects {
            match effect {
                StateEffect::AddToInventory(item) => {
                    collected = true;
                    inventory_changed |= self.state.add_to_inventory(item);
                }
                StateEffect::SetFlag(flag) => {
                    if self.state.set_flag(flag) {
                        debug!(flag = %flag, "flag_set");
                    }
                }
            }
        }

        let removed = collected
            && self
                .registry
                .get(entity_name)
                .is_some_and(|entity| entity.kind.is_collectable())
            && self.registry.unregister(entity_name);

        if let Some(line) = &outcome.dialogue_line {
            self.host.notify_dialogue(line);
        }
        if inventory_changed {
            info!(inventory = ?self.state.inventory, "inventory_changed");
            self.host.notify_inventory_changed(&self.state.inventory);
        }
        if removed {
            info!(entity = entity_name, "entity_removed");
            self.host.notify_entity_removed(entity_name);
        }

        self.state.clear_selection();
        self.emit_info_line();
    }

    /// Inventory remarks ignore the active verb.
    pub fn handle_inventory_click(&mut self, item_name: &str) {
        match self.remarks.remark(item_name) {
            Some(line) => self.host.notify_dialogue(line),
            None => debug!(item = item_name, "inventory_click_without_remark"),
        }
    }

    /// Per-tick simulation hook; nothing in the scene advances on its own yet.
    pub fn update_model(&mut self, _dt: Duration) {}

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_verb: self.state.active_verb.clone(),
            active_mouseover: self.state.active_mouseover.clone(),
            info_line: self.state.info_line(),
            inventory: self.state.inventory.clone(),
            flags: self.state.flags.iter().cloned().collect(),
            entities: self.registry.entities().to_vec(),
        }
    }

    fn emit_info_line(&mut self) {
        let line = self.state.info_line();
        self.host.notify_info_line_changed(&line);
    }
}

impl<H: UiHost> InputEvents for Session<H> {
    fn on_verb_selected(&mut self, verb: &str) {
        self.set_active_verb(verb);
    }

    fn on_entity_hover_enter(&mut self, entity_name: &str) {
        self.set_mouseover(entity_name);
    }

    fn on_entity_hover_leave(&mut self, entity_name: &str) {
        // A late leave for a previously hovered entity must not clear the new target.
        if self.state.active_mouseover == entity_name {
            self.set_mouseover("");
        }
    }

    fn on_entity_clicked(&mut self, entity_name: &str) {
        self.handle_click(entity_name);
    }

    fn on_inventory_item_clicked(&mut self, item_name: &str) {
        self.handle_inventory_click(item_name);
    }
}
