use std::collections::HashMap;

use adventure_engine::Verb;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCommand {
    SelectVerb { verb: String },
    HoverEnter { entity: String },
    HoverLeave { entity: String },
    Click { entity: String },
    InventoryClick { item: String },
    DumpState,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LocalAction {
    Help,
    ListVerbs,
    Echo { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedCommand {
    Local(LocalAction),
    Host(HostCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

type ParseFn = dyn Fn(&[String]) -> Result<ParsedCommand, CommandParseError> + Send + Sync;

pub(crate) struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

pub(crate) struct ConsoleCommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl ConsoleCommandRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_host_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, &str, &str, fn(&[String]) -> _); 10] = [
            ("help", "List commands", "", parse_help_command),
            ("verbs", "List the verb grid", "", parse_verbs_command),
            ("echo", "Print text", "<text...>", parse_echo_command),
            (
                "verb",
                "Select the active verb (no label clears it)",
                "[label...]",
                parse_verb_command,
            ),
            ("hover", "Pointer enters an entity", "<name...>", parse_hover_command),
            ("leave", "Pointer leaves an entity", "<name...>", parse_leave_command),
            ("click", "Click an entity in the scene", "<name...>", parse_click_command),
            ("inv", "Click an inventory item", "<item...>", parse_inventory_command),
            ("state", "Print the session state as JSON", "", parse_state_command),
            ("quit", "Quit", "", parse_quit_command),
        ];
        for (name, help, arg_schema, parse) in builtins {
            registry
                .register(name, help, arg_schema, parse)
                .expect("built-in command registration should not fail");
        }
        registry
    }

    pub(crate) fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), String>
    where
        F: Fn(&[String]) -> Result<ParsedCommand, CommandParseError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("command name cannot be empty".to_string());
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(format!("duplicate command registration: {name}"));
        }

        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
        self.lookup_by_lower_name
            .insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub(crate) fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let lower = input_name.to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    pub(crate) fn iter_specs_in_order(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.specs.iter().map(|spec| {
            (
                spec.name.as_str(),
                spec.help.as_str(),
                spec.arg_schema.as_str(),
            )
        })
    }

    pub(crate) fn help_lines(&self) -> Vec<String> {
        self.iter_specs_in_order()
            .map(|(name, help, arg_schema)| {
                if arg_schema.is_empty() {
                    format!("{name} - {help}")
                } else {
                    format!("{name} {arg_schema} - {help}")
                }
            })
            .collect()
    }

    /// `Ok(None)` for blank input. Errors are ready-to-print messages.
    pub(crate) fn parse_line(&self, raw_line: &str) -> Result<Option<ParsedCommand>, String> {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let tokens = tokenize_line(trimmed).map_err(|reason| format!("{reason}. usage: help"))?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let Some(spec) = self.lookup(command_name) else {
            return Err(format!("unknown command '{command_name}'. try: help"));
        };

        (spec.parse)(args)
            .map(Some)
            .map_err(|error| format!("{}. usage: {}", error.reason, error.usage))
    }
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut seen_token_content = false;
    let mut just_closed_quote = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                seen_token_content = true;
                if !in_quotes {
                    just_closed_quote = true;
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if seen_token_content || just_closed_quote || !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                    seen_token_content = false;
                    just_closed_quote = false;
                }
            }
            _ => {
                current.push(ch);
                seen_token_content = true;
                just_closed_quote = false;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }

    if seen_token_content || just_closed_quote || !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

fn parse_help_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "help")?;
    Ok(ParsedCommand::Local(LocalAction::Help))
}

fn parse_verbs_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "verbs")?;
    Ok(ParsedCommand::Local(LocalAction::ListVerbs))
}

fn parse_echo_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let text = require_joined_args(args, "<text...>", "echo <text...>")?;
    Ok(ParsedCommand::Local(LocalAction::Echo { text }))
}

fn parse_verb_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let raw = args.join(" ");
    // Grid labels match case-insensitively; anything else is passed through as typed.
    let verb = Verb::ALL
        .into_iter()
        .find(|verb| verb.label().eq_ignore_ascii_case(&raw))
        .map(|verb| verb.label().to_string())
        .unwrap_or(raw);
    Ok(ParsedCommand::Host(HostCommand::SelectVerb { verb }))
}

fn parse_hover_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let entity = require_joined_args(args, "<name...>", "hover <name...>")?;
    Ok(ParsedCommand::Host(HostCommand::HoverEnter { entity }))
}

fn parse_leave_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let entity = require_joined_args(args, "<name...>", "leave <name...>")?;
    Ok(ParsedCommand::Host(HostCommand::HoverLeave { entity }))
}

fn parse_click_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let entity = require_joined_args(args, "<name...>", "click <name...>")?;
    Ok(ParsedCommand::Host(HostCommand::Click { entity }))
}

fn parse_inventory_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let item = require_joined_args(args, "<item...>", "inv <item...>")?;
    Ok(ParsedCommand::Host(HostCommand::InventoryClick { item }))
}

fn parse_state_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "state")?;
    Ok(ParsedCommand::Host(HostCommand::DumpState))
}

fn parse_quit_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "quit")?;
    Ok(ParsedCommand::Host(HostCommand::Quit))
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError {
            reason: "this command takes no arguments".to_string(),
            usage: usage.to_string(),
        })
    }
}

fn require_joined_args(
    args: &[String],
    arg_schema: &str,
    usage: &str,
) -> Result<String, CommandParseError> {
    if args.is_empty() {
        return Err(CommandParseError {
            reason: format!("missing required argument {arg_schema}"),
            usage: usage.to_string(),
        });
    }
    Ok(args.join(" "))
}
