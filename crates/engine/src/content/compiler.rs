use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, info, warn};

use crate::interaction::{Entity, EntityKind, InteractionRule, Outcome, StateEffect, Verb};
use crate::AppPaths;

use super::discovery::discover_mod_sources;
use super::scenario::{InventoryRemark, Scenario};
use super::types::{ContentPlanError, ContentPlanRequest};

const INLINE_MOD_ID: &str = "inline";
const INLINE_FILE_PATH: &str = "<inline>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDefInMod,
    UnknownRuleEntity,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone)]
struct PendingRule {
    rule: InteractionRule,
    mod_id: String,
    file_path: PathBuf,
    location: SourceLocation,
}

#[derive(Debug, Clone)]
enum ParsedDef {
    Entity(Entity),
    Rule(PendingRule),
    Remark(InventoryRemark),
}

/// Keeps first-seen order while letting later inserts replace the value.
#[derive(Debug)]
struct MergedDefs<K, V> {
    order: Vec<K>,
    values: HashMap<K, V>,
}

impl<K: Clone + Eq + Hash, V> MergedDefs<K, V> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    fn insert(&mut self, key: K, value: V) {
        if self.values.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    fn contains_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    fn into_values(self) -> Vec<V> {
        let mut values = self.values;
        self.order
            .into_iter()
            .filter_map(|key| values.remove(&key))
            .collect()
    }
}

#[derive(Debug, Default)]
struct ModSeen {
    entities: HashSet<String>,
    rules: HashSet<(String, String)>,
    remarks: HashSet<String>,
}

struct ScenarioBuilder {
    entities: MergedDefs<String, Entity>,
    rules: MergedDefs<(String, String), PendingRule>,
    remarks: MergedDefs<String, InventoryRemark>,
}

impl ScenarioBuilder {
    fn new() -> Self {
        Self {
            entities: MergedDefs::new(),
            rules: MergedDefs::new(),
            remarks: MergedDefs::new(),
        }
    }

    fn push_defs(
        &mut self,
        mod_id: &str,
        file_path: &Path,
        defs: Vec<ParsedDef>,
        seen: &mut ModSeen,
    ) -> Result<(), ContentCompileError> {
        for def in defs {
            // Cross-mod duplicates are override points (last mod wins).
            match def {
                ParsedDef::Entity(entity) => {
                    if !seen.entities.insert(entity.name.clone()) {
                        return Err(duplicate_in_mod(
                            format!("EntityDef '{}'", entity.name),
                            mod_id,
                            file_path,
                        ));
                    }
                    self.entities.insert(entity.name.clone(), entity);
                }
                ParsedDef::Rule(pending) => {
                    let key = (
                        pending.rule.entity_name.clone(),
                        pending.rule.verb.clone(),
                    );
                    if !seen.rules.insert(key.clone()) {
                        return Err(duplicate_in_mod(
                            format!("RuleDef '{}' / '{}'", key.0, key.1),
                            mod_id,
                            file_path,
                        ));
                    }
                    self.rules.insert(key, pending);
                }
                ParsedDef::Remark(remark) => {
                    if !seen.remarks.insert(remark.item.clone()) {
                        return Err(duplicate_in_mod(
                            format!("RemarkDef '{}'", remark.item),
                            mod_id,
                            file_path,
                        ));
                    }
                    self.remarks.insert(remark.item.clone(), remark);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Scenario, ContentCompileError> {
        let mut rules = Vec::new();
        for pending in self.rules.into_values() {
            if !self.entities.contains_key(&pending.rule.entity_name) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::UnknownRuleEntity,
                    message: format!(
                        "RuleDef targets entity '{}' which no loaded EntityDef defines",
                        pending.rule.entity_name
                    ),
                    mod_id: pending.mod_id,
                    file_path: pending.file_path,
                    location: Some(pending.location),
                });
            }
            rules.push(pending.rule);
        }

        Ok(Scenario::new(
            self.entities.into_values(),
            rules,
            self.remarks.into_values(),
        ))
    }
}

/// Compiles the base scenario plus enabled mods into one [`Scenario`].
pub fn compile_scenario(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<Scenario, ContentCompileError> {
    let sources = discover_mod_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;

    let mut builder = ScenarioBuilder::new();
    let mut file_count = 0usize;

    for source in &sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.mod_id, error.path, error.source))?;
        debug!(
            mod_id = %source.mod_id,
            mod_load_index = source.mod_load_index,
            xml_files = xml_files.len(),
            "scenario_source"
        );
        let mut seen = ModSeen::default();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.mod_id, xml_file.clone(), source_err))?;
            let defs = parse_defs_document(&source.mod_id, &xml_file, &raw)?;
            builder.push_defs(&source.mod_id, &xml_file, defs, &mut seen)?;
            file_count += 1;
        }
    }

    let scenario = builder.finish()?;
    info!(
        mods = sources.len(),
        xml_files = file_count,
        entity_count = scenario.entities().len(),
        rule_count = scenario.rules().len(),
        remark_count = scenario.remarks().len(),
        "scenario_compiled"
    );
    Ok(scenario)
}

/// Compiles a single in-memory `<Defs>` document.
pub fn parse_scenario_str(raw: &str) -> Result<Scenario, ContentCompileError> {
    let file_path = Path::new(INLINE_FILE_PATH);
    let defs = parse_defs_document(INLINE_MOD_ID, file_path, raw)?;
    let mut builder = ScenarioBuilder::new();
    builder.push_defs(INLINE_MOD_ID, file_path, defs, &mut ModSeen::default())?;
    builder.finish()
}

fn parse_defs_document(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<ParsedDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(error_at_node(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            mod_id,
            file_path,
            &doc,
            root,
        ));
    }

    let ctx = DocContext {
        mod_id,
        file_path,
        doc: &doc,
    };
    let mut defs = Vec::<ParsedDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        let def = match child.tag_name().name() {
            "EntityDef" => ParsedDef::Entity(parse_entity_def(&ctx, child)?),
            "RuleDef" => ParsedDef::Rule(parse_rule_def(&ctx, child)?),
            "RemarkDef" => ParsedDef::Remark(parse_remark_def(&ctx, child)?),
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{other}>; expected <EntityDef>, <RuleDef> or <RemarkDef>"
                    ),
                    child,
                ))
            }
        };
        defs.push(def);
    }

    Ok(defs)
}

struct DocContext<'a, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DocContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        error_at_node(code, message, self.mod_id, self.file_path, self.doc, node)
    }

    fn location_of(&self, node: Node<'_, '_>) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }
    }

    /// Iterates element fields, rejecting repeats.
    fn fields<'n, 'i>(
        &self,
        node: Node<'n, 'i>,
        def_type: &str,
    ) -> Result<Vec<(String, Node<'n, 'i>)>, ContentCompileError> {
        let mut seen_fields = HashSet::<String>::new();
        let mut fields = Vec::new();
        for field in node.children().filter(|child| child.is_element()) {
            let field_name = field.tag_name().name().to_string();
            if !seen_fields.insert(field_name.clone()) {
                return Err(self.error_at(
                    ContentErrorCode::DuplicateField,
                    format!("duplicate field <{field_name}> in <{def_type}>"),
                    field,
                ));
            }
            fields.push((field_name, field));
        }
        Ok(fields)
    }

    fn unknown_field(
        &self,
        field_name: &str,
        def_type: &str,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        self.error_at(
            ContentErrorCode::UnknownField,
            format!("unknown field <{field_name}> in <{def_type}>"),
            node,
        )
    }

    fn missing_field(
        &self,
        field_name: &str,
        def_type: &str,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        self.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{field_name}> in <{def_type}>"),
            node,
        )
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }
}

fn parse_entity_def(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Entity, ContentCompileError> {
    let mut name: Option<String> = None;
    let mut kind: Option<EntityKind> = None;

    for (field_name, field) in ctx.fields(node, "EntityDef")? {
        match field_name.as_str() {
            "name" => name = Some(ctx.required_text(field, "name")?),
            "kind" => {
                let value = ctx.required_text(field, "kind")?;
                let parsed = EntityKind::from_label(&value).ok_or_else(|| {
                    let allowed: Vec<&str> =
                        EntityKind::ALL.into_iter().map(EntityKind::label).collect();
                    ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "invalid kind '{value}'; allowed values: {}",
                            allowed.join(", ")
                        ),
                        field,
                    )
                })?;
                kind = Some(parsed);
            }
            _ => return Err(ctx.unknown_field(&field_name, "EntityDef", field)),
        }
    }

    let Some(name) = name else {
        return Err(ctx.missing_field("name", "EntityDef", node));
    };
    let Some(kind) = kind else {
        return Err(ctx.missing_field("kind", "EntityDef", node));
    };

    Ok(Entity { name, kind })
}

fn parse_rule_def(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PendingRule, ContentCompileError> {
    let mut entity: Option<String> = None;
    let mut verb: Option<String> = None;
    let mut line: Option<String> = None;
    let mut add_to_inventory: Option<String> = None;
    let mut set_flag: Option<String> = None;

    for (field_name, field) in ctx.fields(node, "RuleDef")? {
        match field_name.as_str() {
            "entity" => entity = Some(ctx.required_text(field, "entity")?),
            "verb" => verb = Some(ctx.required_text(field, "verb")?),
            "line" => line = Some(ctx.required_text(field, "line")?),
            "addToInventory" => {
                add_to_inventory = Some(ctx.required_text(field, "addToInventory")?)
            }
            "setFlag" => set_flag = Some(ctx.required_text(field, "setFlag")?),
            _ => return Err(ctx.unknown_field(&field_name, "RuleDef", field)),
        }
    }

    let Some(entity_name) = entity else {
        return Err(ctx.missing_field("entity", "RuleDef", node));
    };
    let Some(verb) = verb else {
        return Err(ctx.missing_field("verb", "RuleDef", node));
    };
    if Verb::from_label(&verb).is_none() {
        warn!(
            mod_id = ctx.mod_id,
            file = %ctx.file_path.display(),
            verb = %verb,
            "rule_uses_verb_outside_grid"
        );
    }

    let mut outcome = Outcome {
        dialogue_line: line,
        effects: Vec::new(),
    };
    if let Some(item) = add_to_inventory {
        outcome = outcome.with_effect(StateEffect::AddToInventory(item));
    }
    if let Some(flag) = set_flag {
        outcome = outcome.with_effect(StateEffect::SetFlag(flag));
    }

    Ok(PendingRule {
        rule: InteractionRule {
            entity_name,
            verb,
            outcome,
        },
        mod_id: ctx.mod_id.to_string(),
        file_path: ctx.file_path.to_path_buf(),
        location: ctx.location_of(node),
    })
}

fn parse_remark_def(
    ctx: &DocContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<InventoryRemark, ContentCompileError> {
    let mut item: Option<String> = None;
    let mut line: Option<String> = None;

    for (field_name, field) in ctx.fields(node, "RemarkDef")? {
        match field_name.as_str() {
            "item" => item = Some(ctx.required_text(field, "item")?),
            "line" => line = Some(ctx.required_text(field, "line")?),
            _ => return Err(ctx.unknown_field(&field_name, "RemarkDef", field)),
        }
    }

    let Some(item) = item else {
        return Err(ctx.missing_field("item", "RemarkDef", node));
    };
    let Some(line) = line else {
        return Err(ctx.missing_field("line", "RemarkDef", node));
    };

    Ok(InventoryRemark { item, line })
}

fn error_at_node(
    code: ContentErrorCode,
    message: String,
    mod_id: &str,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> ContentCompileError {
    let pos = doc.text_pos_at(node.range().start);
    ContentCompileError {
        code,
        message,
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}

fn duplicate_in_mod(what: String, mod_id: &str, file_path: &Path) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::DuplicateDefInMod,
        message: format!("duplicate {what} in mod '{mod_id}'; each mod may define it only once"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: None,
    }
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_cached_key(|path| {
        normalize_rel_path(path.strip_prefix(root).unwrap_or(path.as_path()))
    });
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: ContentPlanError, root: &Path) -> ContentCompileError {
    match error {
        ContentPlanError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check enabled mod list",
                mod_id,
                expected_dir.display()
            ),
            mod_id,
            file_path: expected_dir,
            location: None,
        },
        other => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: other.to_string(),
            mod_id: "<discovery>".to_string(),
            file_path: root.to_path_buf(),
            location: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::interaction::DEFAULT_FALLBACK_LINE;

    const BUCKET_DEFS: &str = r#"<Defs>
        <EntityDef><name>bucket</name><kind>Prop</kind></EntityDef>
        <EntityDef><name>Pirate</name><kind>Hotspot</kind></EntityDef>
        <RuleDef>
            <entity>bucket</entity><verb>Pick up</verb><line>Yeah! A bucket!</line>
            <addToInventory>bucket</addToInventory><setFlag>got_bucket</setFlag>
        </RuleDef>
        <RuleDef><entity>bucket</entity><verb>Look at</verb><line>I want it!</line></RuleDef>
        <RemarkDef><item>bucket</item><line>It's a nice bucket.</line></RemarkDef>
    </Defs>"#;

    fn setup_app_paths(root: &Path) -> AppPaths {
        let base = root.join("assets").join("base");
        let mods = root.join("mods");
        fs::create_dir_all(&base).expect("base");
        fs::create_dir_all(&mods).expect("mods");
        AppPaths {
            root: root.to_path_buf(),
            base_content_dir: base,
            mods_dir: mods,
        }
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn with_mods(mods: &[&str]) -> ContentPlanRequest {
        ContentPlanRequest {
            enabled_mods: mods.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[test]
    fn inline_document_compiles_entities_rules_and_remarks() {
        let scenario = parse_scenario_str(BUCKET_DEFS).expect("compile");

        assert_eq!(
            scenario.entities(),
            &[Entity::prop("bucket"), Entity::hotspot("Pirate")]
        );
        assert_eq!(scenario.rules().len(), 2);
        assert_eq!(
            scenario.rules()[0].outcome,
            Outcome::say("Yeah! A bucket!")
                .with_effect(StateEffect::AddToInventory("bucket".to_string()))
                .with_effect(StateEffect::SetFlag("got_bucket".to_string()))
        );
        assert_eq!(
            scenario.remark_table().remark("bucket"),
            Some("It's a nice bucket.")
        );
    }

    #[test]
    fn compiled_tables_resolve_with_fallback() {
        let scenario = parse_scenario_str(BUCKET_DEFS).expect("compile");
        let registry = scenario.registry();
        let rules = scenario.rule_table();

        assert_eq!(
            rules.resolve(&registry, "Look at", "bucket"),
            Outcome::say("I want it!")
        );
        assert_eq!(
            rules
                .resolve(&registry, "Talk to", "Pirate")
                .dialogue_line
                .as_deref(),
            Some(DEFAULT_FALLBACK_LINE)
        );
    }

    #[test]
    fn rule_without_line_has_no_dialogue() {
        let scenario = parse_scenario_str(
            r#"<Defs>
                <EntityDef><name>door</name><kind>Hotspot</kind></EntityDef>
                <RuleDef><entity>door</entity><verb>Open</verb><setFlag>door_open</setFlag></RuleDef>
            </Defs>"#,
        )
        .expect("compile");

        let outcome = &scenario.rules()[0].outcome;
        assert_eq!(outcome.dialogue_line, None);
        assert_eq!(
            outcome.effects,
            vec![StateEffect::SetFlag("door_open".to_string())]
        );
    }

    #[test]
    fn missing_entity_name_reports_location() {
        let err = parse_scenario_str(r#"<Defs><EntityDef><kind>Prop</kind></EntityDef></Defs>"#)
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert_eq!(err.mod_id, "inline");
        assert!(err.location.is_some());
    }

    #[test]
    fn invalid_kind_errors() {
        let err = parse_scenario_str(
            r#"<Defs><EntityDef><name>bucket</name><kind>Actor</kind></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
        assert!(
            err.message.contains("allowed values: Prop, Hotspot"),
            "{}",
            err.message
        );
    }

    #[test]
    fn unknown_field_errors() {
        let err = parse_scenario_str(
            r#"<Defs><EntityDef><name>a</name><kind>Prop</kind><mood>Happy</mood></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);
    }

    #[test]
    fn duplicate_field_errors() {
        let err = parse_scenario_str(
            r#"<Defs><EntityDef><name>a</name><name>b</name><kind>Prop</kind></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateField);
    }

    #[test]
    fn unknown_def_type_and_root_error() {
        let err = parse_scenario_str(r#"<Defs><ActorDef/></Defs>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownDefType);

        let err = parse_scenario_str(r#"<Scene/>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidRoot);
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = parse_scenario_str(r#"<Defs><EntityDef><name>a</name></Defs>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn rule_for_undefined_entity_errors() {
        let err = parse_scenario_str(
            r#"<Defs><RuleDef><entity>ghost</entity><verb>Look at</verb><line>Boo.</line></RuleDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownRuleEntity);
        assert!(err.location.is_some());
    }

    #[test]
    fn same_mod_duplicate_rule_errors_across_files() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(&app.base_content_dir.join("a.xml"), BUCKET_DEFS);
        write_file(
            &app.base_content_dir.join("b.xml"),
            r#"<Defs><RuleDef><entity>bucket</entity><verb>Look at</verb><line>Again.</line></RuleDef></Defs>"#,
        );

        let err = compile_scenario(&app, &ContentPlanRequest::default()).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateDefInMod);
        assert!(err.file_path.ends_with("b.xml"));
    }

    #[test]
    fn cross_mod_duplicate_is_last_mod_wins() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(&app.base_content_dir.join("scene.xml"), BUCKET_DEFS);
        write_file(
            &app.mods_dir.join("moda").join("override.xml"),
            r#"<Defs>
                <RuleDef><entity>bucket</entity><verb>Look at</verb><line>A fine bucket.</line></RuleDef>
                <RemarkDef><item>bucket</item><line>Still a bucket.</line></RemarkDef>
            </Defs>"#,
        );

        let scenario = compile_scenario(&app, &with_mods(&["moda"])).expect("compile");
        let registry = scenario.registry();
        assert_eq!(
            scenario.rule_table().resolve(&registry, "Look at", "bucket"),
            Outcome::say("A fine bucket.")
        );
        assert_eq!(
            scenario.remark_table().remark("bucket"),
            Some("Still a bucket.")
        );
        assert_eq!(scenario.rules().len(), 2);
    }

    #[test]
    fn mod_may_target_base_entities_and_add_new_ones() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(&app.base_content_dir.join("scene.xml"), BUCKET_DEFS);
        write_file(
            &app.mods_dir.join("parrot").join("defs.xml"),
            r#"<Defs>
                <EntityDef><name>parrot</name><kind>Prop</kind></EntityDef>
                <RuleDef><entity>parrot</entity><verb>Talk to</verb><line>Squawk!</line></RuleDef>
            </Defs>"#,
        );

        let scenario = compile_scenario(&app, &with_mods(&["parrot"])).expect("compile");
        let names: Vec<&str> = scenario
            .entities()
            .iter()
            .map(|entity| entity.name.as_str())
            .collect();
        assert_eq!(names, vec!["bucket", "Pirate", "parrot"]);
    }

    #[test]
    fn files_in_subdirectories_are_read_in_path_order() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("b").join("rules.xml"),
            r#"<Defs><RuleDef><entity>bucket</entity><verb>Look at</verb><line>I want it!</line></RuleDef></Defs>"#,
        );
        write_file(
            &app.base_content_dir.join("a").join("entities.xml"),
            r#"<Defs><EntityDef><name>bucket</name><kind>Prop</kind></EntityDef></Defs>"#,
        );

        let scenario = compile_scenario(&app, &ContentPlanRequest::default()).expect("compile");
        assert_eq!(scenario.entities().len(), 1);
        assert_eq!(scenario.rules().len(), 1);
    }

    #[test]
    fn missing_mod_maps_to_discovery_error() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());

        let err = compile_scenario(&app, &with_mods(&["ghost"])).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::Discovery);
        assert_eq!(err.mod_id, "ghost");
    }
}
