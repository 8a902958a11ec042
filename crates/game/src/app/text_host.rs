use std::io::Write;

use adventure_engine::UiHost;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorShape {
    Arrow,
    Crosshair,
}

/// Line-oriented presentation host. Every notification becomes one prefixed
/// output line.
pub(crate) struct TextHost<W: Write> {
    out: W,
    pointer_target: Option<String>,
    cursor: CursorShape,
    output_failed: bool,
}

impl<W: Write> TextHost<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            pointer_target: None,
            cursor: CursorShape::Arrow,
            output_failed: false,
        }
    }

    pub(crate) fn cursor(&self) -> CursorShape {
        self.cursor
    }

    pub(crate) fn pointer_entered(&mut self, entity_name: &str) {
        self.pointer_target = Some(entity_name.to_string());
    }

    pub(crate) fn pointer_left(&mut self, entity_name: &str) {
        if self.pointer_target.as_deref() == Some(entity_name) {
            self.pointer_target = None;
        }
    }

    /// Applies the cursor implied by the pointer target. Returns true when it changed.
    pub(crate) fn refresh_cursor(&mut self) -> bool {
        let wanted = if self.pointer_target.is_some() {
            CursorShape::Crosshair
        } else {
            CursorShape::Arrow
        };
        if wanted == self.cursor {
            return false;
        }
        debug!(from = ?self.cursor, to = ?wanted, "cursor_changed");
        self.cursor = wanted;
        true
    }

    pub(crate) fn print_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            if !self.output_failed {
                warn!(error = %err, "host_output_failed");
                self.output_failed = true;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> UiHost for TextHost<W> {
    fn notify_info_line_changed(&mut self, text: &str) {
        self.print_line(&format!("info: {text}"));
    }

    fn notify_dialogue(&mut self, text: &str) {
        self.print_line(&format!("say: {text}"));
    }

    fn notify_inventory_changed(&mut self, items: &[String]) {
        self.print_line(&format!("inventory: [{}]", items.join(", ")));
    }

    fn notify_entity_removed(&mut self, entity_name: &str) {
        // The clicked entity was also the pointer target; it can no longer be hovered.
        self.pointer_left(entity_name);
        self.print_line(&format!("removed: {entity_name}"));
    }
}
