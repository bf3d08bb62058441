mod best_effort_path_ext;

pub use best_effort_path_ext::{BestEffortPathExt, is_single_component, normalize_node_path};
