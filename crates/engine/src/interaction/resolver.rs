use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::registry::EntityRegistry;

pub const DEFAULT_FALLBACK_LINE: &str = "That doesn't seem to work.";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateEffect {
    AddToInventory(String),
    SetFlag(String),
}

/// Dialogue and state changes produced by an interaction.
///
/// Effects are descriptions only; the session applies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub dialogue_line: Option<String>,
    pub effects: Vec<StateEffect>,
}

impl Outcome {
    /// No dialogue and no effect.
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn fallback() -> Self {
        Self::say(DEFAULT_FALLBACK_LINE)
    }

    pub fn say(line: impl Into<String>) -> Self {
        Self {
            dialogue_line: Some(line.into()),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: StateEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_nothing(&self) -> bool {
        self.dialogue_line.is_none() && self.effects.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRule {
    pub entity_name: String,
    pub verb: String,
    pub outcome: Outcome,
}

/// Why a resolution fell back to a default outcome. Never surfaced as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveMiss {
    #[error("entity is not registered")]
    UnknownEntity,
    #[error("verb is not configured for any entity")]
    UnknownVerb,
    #[error("entity has no rule for this verb")]
    NoRuleForEntity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub miss: Option<ResolveMiss>,
}

#[derive(Debug, Default, Clone)]
pub struct RuleTable {
    outcomes_by_entity: HashMap<String, HashMap<String, Outcome>>,
    known_verbs: HashSet<String>,
    rule_count: usize,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the outcome this rule replaced, if one existed for the same pair.
    pub fn insert(&mut self, rule: InteractionRule) -> Option<Outcome> {
        self.known_verbs.insert(rule.verb.clone());
        let replaced = self
            .outcomes_by_entity
            .entry(rule.entity_name)
            .or_default()
            .insert(rule.verb, rule.outcome);
        if replaced.is_none() {
            self.rule_count += 1;
        }
        replaced
    }

    pub fn resolve(&self, registry: &EntityRegistry, verb: &str, entity_name: &str) -> Outcome {
        self.resolve_detailed(registry, verb, entity_name).outcome
    }

    pub fn resolve_detailed(
        &self,
        registry: &EntityRegistry,
        verb: &str,
        entity_name: &str,
    ) -> Resolution {
        if !registry.exists(entity_name) {
            return Resolution {
                outcome: Outcome::nothing(),
                miss: Some(ResolveMiss::UnknownEntity),
            };
        }

        if let Some(outcome) = self
            .outcomes_by_entity
            .get(entity_name)
            .and_then(|by_verb| by_verb.get(verb))
        {
            return Resolution {
                outcome: outcome.clone(),
                miss: None,
            };
        }

        let miss = if self.known_verbs.contains(verb) {
            ResolveMiss::NoRuleForEntity
        } else {
            ResolveMiss::UnknownVerb
        };
        Resolution {
            outcome: Outcome::fallback(),
            miss: Some(miss),
        }
    }

    pub fn len(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }
}

impl FromIterator<InteractionRule> for RuleTable {
    fn from_iter<T: IntoIterator<Item = InteractionRule>>(iter: T) -> Self {
        let mut table = Self::new();
        for rule in iter {
            table.insert(rule);
        }
        table
    }
}

/// Canned remarks for inventory items, looked up by item name only.
#[derive(Debug, Default, Clone)]
pub struct RemarkTable {
    remarks: HashMap<String, String>,
}

impl RemarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: impl Into<String>, line: impl Into<String>) -> Option<String> {
        self.remarks.insert(item.into(), line.into())
    }

    pub fn remark(&self, item: &str) -> Option<&str> {
        self.remarks.get(item).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.remarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remarks.is_empty()
    }
}
