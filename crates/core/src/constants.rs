//! Constants used throughout the apply core crate.

/// Default directory holding ActivityDefinition documents when no override is configured.
pub const DEFAULT_TEMPLATE_DIR: &str = "activity-definitions";

/// Environment variable naming the template directory.
pub const TEMPLATE_DIR_ENV: &str = "APPLY_TEMPLATE_DIR";

/// Environment variable naming the REST listen address.
pub const REST_ADDR_ENV: &str = "APPLY_REST_ADDR";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// File extensions a template document may use, in lookup order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Resource type prefix accepted on template ids (`ActivityDefinition/<id>`).
pub const TEMPLATE_REFERENCE_PREFIX: &str = "ActivityDefinition/";

/// Template id prefix rewritten when deriving a Task id.
pub const TEMPLATE_ID_PREFIX: &str = "activitydefinition-";

/// Replacement prefix for derived Task ids.
pub const TASK_ID_PREFIX: &str = "task-";

/// Maximum accepted length of a template id (FHIR `id` datatype).
pub const MAX_TEMPLATE_ID_LEN: usize = 64;
