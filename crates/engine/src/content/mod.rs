mod compiler;
mod discovery;
mod scenario;
mod types;

pub use compiler::{
    compile_scenario, parse_scenario_str, ContentCompileError, ContentErrorCode, SourceLocation,
};
pub use scenario::{InventoryRemark, Scenario};
pub use types::{ContentPlanError, ContentPlanRequest};
