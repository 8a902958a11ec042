mod host;
mod info_line;
mod registry;
mod resolver;
mod session;
mod verbs;

pub use host::{HostNotification, InputEvents, RecordingHost, UiHost};
pub use info_line::compose_info_line;
pub use registry::{Entity, EntityKind, EntityRegistry};
pub use resolver::{
    InteractionRule, Outcome, RemarkTable, Resolution, ResolveMiss, RuleTable, StateEffect,
    DEFAULT_FALLBACK_LINE,
};
pub use session::{Session, SessionSnapshot, SessionState};
pub use verbs::{Verb, VERB_GRID_COLUMNS};
