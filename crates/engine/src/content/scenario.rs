use crate::interaction::{
    Entity, EntityRegistry, InteractionRule, RemarkTable, RuleTable, Session, UiHost,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRemark {
    pub item: String,
    pub line: String,
}

/// Compiled scenario content: everything a session needs at startup.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    entities: Vec<Entity>,
    rules: Vec<InteractionRule>,
    remarks: Vec<InventoryRemark>,
}

impl Scenario {
    pub(crate) fn new(
        entities: Vec<Entity>,
        rules: Vec<InteractionRule>,
        remarks: Vec<InventoryRemark>,
    ) -> Self {
        Self {
            entities,
            rules,
            remarks,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    pub fn remarks(&self) -> &[InventoryRemark] {
        &self.remarks
    }

    pub fn registry(&self) -> EntityRegistry {
        self.entities.iter().cloned().collect()
    }

    pub fn rule_table(&self) -> RuleTable {
        self.rules.iter().cloned().collect()
    }

    pub fn remark_table(&self) -> RemarkTable {
        let mut table = RemarkTable::new();
        for remark in &self.remarks {
            table.insert(remark.item.clone(), remark.line.clone());
        }
        table
    }

    pub fn into_session<H: UiHost>(self, host: H) -> Session<H> {
        Session::new(
            self.registry(),
            self.rule_table(),
            self.remark_table(),
            host,
        )
    }
}
