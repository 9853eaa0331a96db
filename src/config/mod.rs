//! Hierarchical configuration resolution
//!
//! A declarative schema of typed, nested options is applied to the value
//! trees loaded from the main config file and its override files. Resolution
//! runs in five phases:
//! 1. Verify every present value against the schema
//! 2. Apply override files onto their target tables
//! 3. Inherit missing keys between profiles (OS blocks, cross block)
//! 4. Fill remaining options from declared defaults
//! 5. Finalize: resolve paths, collapse list operations, cross-validate

mod defaults;
mod error;
mod finalize;
mod inherit;
mod listops;
mod load;
mod merge;
mod metadata;
mod node;
mod options;
mod overrides;
mod path;
mod schema;
mod verify;

pub use defaults::update_defaults;
pub use error::ConfigError;
pub use finalize::{finalize, ResolveContext};
pub use inherit::inherit_all;
pub use listops::ListOps;
pub use load::{
    load_component_config, load_config, process_component_config, process_config, CMakeConfig,
    ComponentConfig, ComponentSettings, Config, ConfigSource, CrossConfig, EditableConfig,
    ModuleConfig, OverrideFiles, SdistConfig, SourceOrigin, StubgenConfig,
};
pub use merge::merge_option_value;
pub use metadata::{
    normalize_dist_name, normalize_import_name, normalize_wheel_name, ProjectMetadata,
};
pub use node::{ConfigNode, Scalar};
pub use options::{
    cross_path, get_component_options, get_options, pyproject_path, tool_path,
    with_cross_inheritance, CROSS_OVERRIDE_FILE, LOCAL_OVERRIDE_FILE, PYPROJECT_FILE, TOOL_NAME,
};
pub use overrides::apply_overrides;
pub use path::{ConfPath, Step};
pub use schema::{
    ConfigOption, DefaultPolicy, ListSpec, OptionKind, PathBase, PathSpec, Schema,
};
pub use verify::verify_sources;
