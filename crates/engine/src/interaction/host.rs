/// Outward notifications the session pushes to the UI host.
///
/// Fire-and-forget; the host only ever sees projections of session state.
pub trait UiHost {
    fn notify_info_line_changed(&mut self, text: &str);
    fn notify_dialogue(&mut self, text: &str);
    fn notify_inventory_changed(&mut self, items: &[String]);
    fn notify_entity_removed(&mut self, entity_name: &str);
}

/// Inward events the UI host reports to the session.
pub trait InputEvents {
    fn on_verb_selected(&mut self, verb: &str);
    fn on_entity_hover_enter(&mut self, entity_name: &str);
    fn on_entity_hover_leave(&mut self, entity_name: &str);
    fn on_entity_clicked(&mut self, entity_name: &str);
    fn on_inventory_item_clicked(&mut self, item_name: &str);
}

impl<T: UiHost + ?Sized> UiHost for Box<T> {
    fn notify_info_line_changed(&mut self, text: &str) {
        (**self).notify_info_line_changed(text);
    }

    fn notify_dialogue(&mut self, text: &str) {
        (**self).notify_dialogue(text);
    }

    fn notify_inventory_changed(&mut self, items: &[String]) {
        (**self).notify_inventory_changed(items);
    }

    fn notify_entity_removed(&mut self, entity_name: &str) {
        (**self).notify_entity_removed(entity_name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    InfoLine(String),
    Dialogue(String),
    Inventory(Vec<String>),
    EntityRemoved(String),
}

/// Headless host that keeps every notification in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    notifications: Vec<HostNotification>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[HostNotification] {
        &self.notifications
    }

    pub fn take(&mut self) -> Vec<HostNotification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn dialogue_lines(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .filter_map(|notification| match notification {
                HostNotification::Dialogue(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_info_line(&self) -> Option<&str> {
        self.notifications
            .iter()
            .rev()
            .find_map(|notification| match notification {
                HostNotification::InfoLine(line) => Some(line.as_str()),
                _ => None,
            })
    }
}

impl UiHost for RecordingHost {
    fn notify_info_line_changed(&mut self, text: &str) {
        self.notifications
            .push(HostNotification::InfoLine(text.to_string()));
    }

    fn notify_dialogue(&mut self, text: &str) {
        self.notifications
            .push(HostNotification::Dialogue(text.to_string()));
    }

    fn notify_inventory_changed(&mut self, items: &[String]) {
        self.notifications
            .push(HostNotification::Inventory(items.to_vec()));
    }

    fn notify_entity_removed(&mut self, entity_name: &str) {
        self.notifications
            .push(HostNotification::EntityRemoved(entity_name.to_string()));
    }
}
