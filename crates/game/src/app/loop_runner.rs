use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use adventure_engine::{
    InputEvents, MetricsAccumulator, Session, TickClock, Verb, DEFAULT_MAX_CATCH_UP_TICKS,
    VERB_GRID_COLUMNS,
};
use tracing::{debug, error, info, warn};

use super::bootstrap::{AppWiring, HostConfig, HostError};
use super::console_commands::{ConsoleCommandRegistry, HostCommand, LocalAction, ParsedCommand};
use super::line_pump::{spawn_line_pump, PumpEvent};
use super::text_host::TextHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopFlow {
    Continue,
    Quit,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { config, scenario } = app;
    let session = scenario.into_session(TextHost::new(io::stdout()));

    let result = spawn_line_pump(config.script_path.as_deref())
        .and_then(|lines| run_session(&config, session, &lines));
    if let Err(err) = result {
        error!(error = %err, "host_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_session<W: Write>(
    config: &HostConfig,
    mut session: Session<TextHost<W>>,
    lines: &Receiver<PumpEvent>,
) -> Result<(), HostError> {
    let registry = ConsoleCommandRegistry::with_host_builtins();
    let start = Instant::now();
    let mut clock = TickClock::new(config.tick_interval, DEFAULT_MAX_CATCH_UP_TICKS, start);
    let mut metrics = MetricsAccumulator::new(config.metrics_log_interval, start);
    let mut tick_count = 0u64;

    let opening_line = format!("info: {}", session.state().info_line());
    session.host_mut().print_line(&opening_line);

    loop {
        let wait = clock.until_next_tick(Instant::now());
        let flow = match lines.recv_timeout(wait) {
            Ok(PumpEvent::Line(line)) => {
                metrics.record_event();
                dispatch_line(&registry, &mut session, &line)
            }
            Ok(PumpEvent::Failed(err)) => return Err(HostError::Input(err)),
            Err(RecvTimeoutError::Timeout) => LoopFlow::Continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!(reason = "end_of_input", "shutdown_requested");
                LoopFlow::Quit
            }
        };

        let now = Instant::now();
        let plan = clock.advance(now);
        for _ in 0..plan.ticks_to_run {
            session.update_model(clock.interval());
            session.host_mut().refresh_cursor();
            metrics.record_tick();
            tick_count += 1;
            if config.echo_ticks {
                info!(tick = tick_count, "tick");
            }
        }
        if !plan.dropped_backlog.is_zero() {
            let dropped = dropped_tick_count(plan.dropped_backlog, clock.interval());
            metrics.record_dropped_ticks(dropped);
            warn!(
                dropped_ticks = dropped,
                backlog_ms = plan.dropped_backlog.as_millis() as u64,
                "tick_backlog_dropped"
            );
        }
        if let Some(snapshot) = metrics.maybe_snapshot(now) {
            info!(
                tps = snapshot.tps,
                events_per_second = snapshot.events_per_second,
                dropped_ticks = snapshot.dropped_ticks,
                "tick_metrics"
            );
        }

        if flow == LoopFlow::Quit {
            break;
        }
    }

    info!(ticks = tick_count, "shutdown");
    Ok(())
}

fn dropped_tick_count(backlog: Duration, interval: Duration) -> u32 {
    let ticks = backlog.as_nanos() / interval.as_nanos().max(1);
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

fn dispatch_line<W: Write>(
    registry: &ConsoleCommandRegistry,
    session: &mut Session<TextHost<W>>,
    line: &str,
) -> LoopFlow {
    debug!(line, "command_received");
    match registry.parse_line(line) {
        Ok(None) => LoopFlow::Continue,
        Ok(Some(ParsedCommand::Local(action))) => {
            run_local_action(registry, session.host_mut(), action);
            LoopFlow::Continue
        }
        Ok(Some(ParsedCommand::Host(command))) => apply_host_command(session, command),
        Err(message) => {
            session.host_mut().print_line(&format!("error: {message}"));
            LoopFlow::Continue
        }
    }
}

fn run_local_action<W: Write>(
    registry: &ConsoleCommandRegistry,
    host: &mut TextHost<W>,
    action: LocalAction,
) {
    match action {
        LocalAction::Help => {
            for line in registry.help_lines() {
                host.print_line(&line);
            }
        }
        LocalAction::ListVerbs => {
            for row in Verb::ALL.chunks(VERB_GRID_COLUMNS) {
                let labels: Vec<&str> = row.iter().map(|verb| verb.label()).collect();
                host.print_line(&format!("verbs: {}", labels.join(" | ")));
            }
        }
        LocalAction::Echo { text } => host.print_line(&text),
    }
}

fn apply_host_command<W: Write>(
    session: &mut Session<TextHost<W>>,
    command: HostCommand,
) -> LoopFlow {
    match command {
        HostCommand::SelectVerb { verb } => session.on_verb_selected(&verb),
        HostCommand::HoverEnter { entity } => {
            session.host_mut().pointer_entered(&entity);
            session.on_entity_hover_enter(&entity);
        }
        HostCommand::HoverLeave { entity } => {
            session.host_mut().pointer_left(&entity);
            session.on_entity_hover_leave(&entity);
        }
        HostCommand::Click { entity } => session.on_entity_clicked(&entity),
        HostCommand::InventoryClick { item } => session.on_inventory_item_clicked(&item),
        HostCommand::DumpState => {
            let line = match serde_json::to_string(&session.snapshot()) {
                Ok(json) => format!("state: {json}"),
                Err(err) => format!("error: failed to serialize state: {err}"),
            };
            session.host_mut().print_line(&line);
        }
        HostCommand::Quit => {
            info!(reason = "quit_command", "shutdown_requested");
            return LoopFlow::Quit;
        }
    }
    LoopFlow::Continue
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use adventure_engine::{parse_scenario_str, Scenario};

    use super::super::text_host::CursorShape;
    use super::*;

    const DOCK_XML: &str = r#"
<Defs>
  <EntityDef><name>bucket</name><kind>Prop</kind></EntityDef>
  <EntityDef><name>Pirate</name><kind>Hotspot</kind></EntityDef>
  <RuleDef>
    <entity>bucket</entity><verb>Pick up</verb><line>Yeah! A bucket!</line>
    <addToInventory>bucket</addToInventory><setFlag>got_bucket</setFlag>
  </RuleDef>
  <RuleDef><entity>bucket</entity><verb>Look at</verb><line>I want it!</line></RuleDef>
  <RuleDef>
    <entity>Pirate</entity><verb>Talk to</verb>
    <line>I'm Guybrush Threepwood, mighty pirate!</line>
  </RuleDef>
  <RemarkDef><item>bucket</item><line>It's a nice bucket.</line></RemarkDef>
</Defs>
"#;

    fn dock_scenario() -> Scenario {
        parse_scenario_str(DOCK_XML).expect("dock scenario parses")
    }

    fn run_commands(commands: &[&str]) -> (LoopFlow, Session<TextHost<Vec<u8>>>) {
        let registry = ConsoleCommandRegistry::with_host_builtins();
        let mut session = dock_scenario().into_session(TextHost::new(Vec::new()));
        let mut flow = LoopFlow::Continue;
        for command in commands {
            flow = dispatch_line(&registry, &mut session, command);
            if flow == LoopFlow::Quit {
                break;
            }
        }
        (flow, session)
    }

    fn output_lines(session: &Session<TextHost<Vec<u8>>>) -> Vec<String> {
        String::from_utf8(session.host().output().clone())
            .expect("utf8 output")
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn pick_up_walkthrough_prints_notifications_in_order() {
        let (_, session) = run_commands(&["verb pick up", "hover bucket", "click bucket"]);

        assert_eq!(
            output_lines(&session),
            vec![
                "info: Pick up",
                "info: Pick up bucket",
                "say: Yeah! A bucket!",
                "inventory: [bucket]",
                "removed: bucket",
                "info: ",
            ]
        );
        assert!(session.state().has_flag("got_bucket"));
    }

    #[test]
    fn inventory_click_prints_remark() {
        let (_, session) = run_commands(&["verb Pick up", "click bucket", "inv bucket"]);
        let lines = output_lines(&session);
        assert_eq!(
            lines.last().map(String::as_str),
            Some("say: It's a nice bucket.")
        );
    }

    #[test]
    fn parse_errors_are_printed_and_loop_continues() {
        let (flow, session) = run_commands(&["dance", "click"]);
        assert_eq!(flow, LoopFlow::Continue);
        assert_eq!(
            output_lines(&session),
            vec![
                "error: unknown command 'dance'. try: help",
                "error: missing required argument <name...>. usage: click <name...>",
            ]
        );
    }

    #[test]
    fn dropped_ticks_saturate_instead_of_wrapping() {
        assert_eq!(
            dropped_tick_count(Duration::from_millis(350), Duration::from_millis(100)),
            3
        );
        assert_eq!(
            dropped_tick_count(Duration::from_secs(u64::MAX), Duration::from_nanos(1)),
            u32::MAX
        );
    }

    #[test]
    fn quit_stops_dispatch() {
        let (flow, session) = run_commands(&["quit", "click bucket"]);
        assert_eq!(flow, LoopFlow::Quit);
        assert!(output_lines(&session).is_empty());
        assert!(session.registry().exists("bucket"));
    }

    #[test]
    fn state_prints_json_snapshot() {
        let (_, session) = run_commands(&["verb Talk to", "click Pirate", "state"]);
        let lines = output_lines(&session);
        let json = lines
            .last()
            .and_then(|line| line.strip_prefix("state: "))
            .expect("state line");
        let value: serde_json::Value = serde_json::from_str(json).expect("valid json");
        assert_eq!(value["active_verb"], "");
        assert_eq!(value["inventory"], serde_json::json!([]));
        assert_eq!(value["entities"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn verbs_lists_grid_rows() {
        let (_, session) = run_commands(&["verbs"]);
        assert_eq!(
            output_lines(&session),
            vec![
                "verbs: Give | Pick up | Use",
                "verbs: Open | Look at | Push",
                "verbs: Close | Talk to | Pull",
            ]
        );
    }

    #[test]
    fn hover_updates_cursor_only_on_tick() {
        let registry = ConsoleCommandRegistry::with_host_builtins();
        let mut session = dock_scenario().into_session(TextHost::new(Vec::new()));

        dispatch_line(&registry, &mut session, "hover Pirate");
        assert_eq!(session.host().cursor(), CursorShape::Arrow);
        session.host_mut().refresh_cursor();
        assert_eq!(session.host().cursor(), CursorShape::Crosshair);

        dispatch_line(&registry, &mut session, "leave Pirate");
        session.host_mut().refresh_cursor();
        assert_eq!(session.host().cursor(), CursorShape::Arrow);
    }

    #[test]
    fn session_loop_ends_when_input_disconnects() {
        let (tx, rx) = mpsc::channel();
        tx.send(PumpEvent::Line("verb Look at".to_string()))
            .expect("send");
        tx.send(PumpEvent::Line("click bucket".to_string()))
            .expect("send");
        drop(tx);

        let config = HostConfig {
            tick_interval: Duration::from_millis(5),
            ..HostConfig::default()
        };
        let session = dock_scenario().into_session(TextHost::new(Vec::new()));
        run_session(&config, session, &rx).expect("loop ends cleanly");
    }

    #[test]
    fn session_loop_surfaces_read_failures() {
        let (tx, rx) = mpsc::channel();
        tx.send(PumpEvent::Failed(io::Error::new(
            io::ErrorKind::InvalidData,
            "not utf-8",
        )))
        .expect("send");

        let session = dock_scenario().into_session(TextHost::new(Vec::new()));
        let err = run_session(&HostConfig::default(), session, &rx).expect_err("read failure");
        assert!(matches!(err, HostError::Input(_)));
    }
}
