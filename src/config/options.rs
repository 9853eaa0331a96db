//! The backend's option tree
//!
//! Declares every option the `[tool.cmake-wheel]` table recognizes, the
//! well-known override files, and the inheritance wiring between the
//! top-level blocks, the OS-specific profiles and the cross-compilation
//! profile.

use super::node::ConfigNode;
use super::path::ConfPath;
use super::schema::{
    ConfigOption, DefaultPolicy, ListSpec, OptionKind, PathBase, PathSpec, Schema,
};

pub const TOOL_NAME: &str = "cmake-wheel";
pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const LOCAL_OVERRIDE_FILE: &str = "cmake-wheel.local.toml";
pub const CROSS_OVERRIDE_FILE: &str = "cmake-wheel.cross.toml";

/// OS profiles a cross config may inherit from
pub const OS_KEYS: &[&str] = &["linux", "windows", "mac"];
/// Per-OS blocks of the flattened output, in order
pub const CONFIG_KEYS: &[&str] = &["linux", "windows", "mac", "cross"];
/// Blocks shared between OS profiles and the cross profile
pub const PROFILE_BLOCKS: &[&str] = &["cmake", "sdist", "editable"];

const TOOL_PATH: &str = "pyproject.toml/tool/cmake-wheel";
const DEFAULT_BUILD_DIR: &str = ".cmake-wheel-cache/{build_config}";

pub fn pyproject_path() -> ConfPath {
    ConfPath::from_names([PYPROJECT_FILE])
}

pub fn tool_path() -> ConfPath {
    ConfPath::parse(TOOL_PATH)
}

pub fn cross_path() -> ConfPath {
    tool_path().join_name("cross")
}

/// The full option schema for a regular build.
pub fn get_options() -> Schema {
    let tool = ConfigOption::new("tool", OptionKind::Section { strict: false })
        .describe("Tool-specific tables; only ours is inspected")
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_sub(backend_options());
    let pyproject = pyproject_file(tool);
    Schema::new(ConfigOption::section("").with_sub(pyproject))
        .with_override_file(LOCAL_OVERRIDE_FILE, tool_path())
        .with_override_file(CROSS_OVERRIDE_FILE, cross_path())
}

/// The option schema for a component build: module location plus the
/// settings of the main project to build against.
pub fn get_component_options() -> Schema {
    let component = ConfigOption::section("component")
        .describe("Install-only component of a main project")
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_subs([
            ConfigOption::new(
                "main_project",
                OptionKind::Path(PathSpec {
                    expected_contents: vec![PYPROJECT_FILE.to_string()],
                    ..PathSpec::default()
                }),
            )
            .describe("Directory of the main project this component belongs to")
            .with_default(DefaultPolicy::Value(ConfigNode::str(".."))),
            bool_option("install_only", "Skip the build steps and only install", true),
            merge_list_option("build_args", "Extra arguments for the build step"),
            merge_list_option("build_tool_args", "Extra arguments for the native build tool"),
            merge_list_option("install_args", "Extra arguments for the install step"),
            ConfigOption::new("install_components", OptionKind::List(ListSpec::default()))
                .describe("Components to install")
                .with_default(DefaultPolicy::Value(ConfigNode::str_list([""]))),
        ]);
    let backend = ConfigOption::section(TOOL_NAME)
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_sub(module_options())
        .with_sub(component);
    let tool = ConfigOption::new("tool", OptionKind::Section { strict: false })
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_sub(backend);
    Schema::new(ConfigOption::section("").with_sub(pyproject_file(tool)))
}

/// Rewire the cross profile to inherit from the OS profile selected through
/// `cross.os`, producing an augmented schema. Without a `cross.os` value
/// the cross blocks keep inheriting the top-level blocks.
pub fn with_cross_inheritance(schema: Schema, values: &ConfigNode) -> Schema {
    let os = values
        .get(&cross_path().join_name("os"))
        .and_then(ConfigNode::as_str)
        .map(str::to_string);
    let Some(os) = os else {
        return schema;
    };
    let mut schema = schema;
    for block in PROFILE_BLOCKS {
        let target = cross_path().join_name(block);
        let source = tool_path().join_name(&os).join_name(block);
        schema = schema.with_inherit_redirect(&target, source);
    }
    schema
}

fn pyproject_file(tool: ConfigOption) -> ConfigOption {
    ConfigOption::section(PYPROJECT_FILE).with_subs([
        ConfigOption::new("build-system", OptionKind::Unchecked),
        ConfigOption::new("project", OptionKind::Unchecked)
            .describe("Standard project metadata table")
            .with_default(DefaultPolicy::Required),
        ConfigOption::new("dependency-groups", OptionKind::Unchecked),
        tool,
    ])
}

fn backend_options() -> ConfigOption {
    ConfigOption::section(TOOL_NAME)
        .describe("Backend options for building with CMake")
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_subs([
            module_options(),
            editable_options(),
            sdist_options(),
            cmake_options(),
            stubgen_options(),
            os_options("linux"),
            os_options("windows"),
            os_options("mac"),
            cross_options(),
        ])
}

fn module_options() -> ConfigOption {
    ConfigOption::section("module")
        .describe("Name and location of the module to package")
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_subs([
            ConfigOption::new("name", OptionKind::Str)
                .describe("Import name of the module; defaults to the project name")
                .with_default(DefaultPolicy::absolute_ref("project/name")),
            ConfigOption::new("directory", OptionKind::Path(PathSpec::default()))
                .describe("Directory containing the module")
                .with_default(DefaultPolicy::Value(ConfigNode::str("."))),
            bool_option("namespace", "Package without __init__ file", false),
        ])
}

fn editable_options() -> ConfigOption {
    ConfigOption::section("editable")
        .describe("Editable install behavior")
        .with_subs([
            ConfigOption::new("mode", OptionKind::Str)
                .describe("Editable mode: wrapper, hook or symlink")
                .with_default(DefaultPolicy::Value(ConfigNode::str("symlink"))),
            bool_option("build_hook", "Rebuild on import", false),
        ])
}

fn sdist_options() -> ConfigOption {
    ConfigOption::section("sdist")
        .describe("Source distribution contents")
        .with_subs([
            merge_list_option("include", "Glob patterns of extra files to include"),
            merge_list_option("exclude", "Glob patterns of files to exclude"),
        ])
}

fn cmake_options() -> ConfigOption {
    ConfigOption::section("cmake")
        .describe("CMake configure, build and install settings")
        .with_subs([
            ConfigOption::new("minimum_version", OptionKind::Str)
                .describe("Minimum required CMake version")
                .with_default(DefaultPolicy::Value(ConfigNode::str("3.15"))),
            ConfigOption::new("build_type", OptionKind::Str)
                .describe("Build type passed to the configure step"),
            ConfigOption::new(
                "config",
                OptionKind::List(ListSpec {
                    convert_str_to_singleton: true,
                    ..ListSpec::default()
                }),
            )
            .describe("Configurations to build; defaults to the build type")
            .with_default(DefaultPolicy::relative_ref("build_type")),
            ConfigOption::new("generator", OptionKind::Str)
                .describe("CMake generator to use"),
            ConfigOption::new("source_path", OptionKind::Path(PathSpec::default()))
                .describe("Directory containing the CMakeLists.txt")
                .with_default(DefaultPolicy::Value(ConfigNode::str("."))),
            ConfigOption::new(
                "build_path",
                OptionKind::Path(PathSpec {
                    allow_absolute: true,
                    must_exist: false,
                    ..PathSpec::default()
                }),
            )
            .describe("CMake build directory")
            .with_default(DefaultPolicy::Value(ConfigNode::str(DEFAULT_BUILD_DIR))),
            ConfigOption::new("options", OptionKind::Dict)
                .describe("Cache variables passed as -D flags")
                .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping())),
            merge_list_option("args", "Extra arguments for the configure step"),
            bool_option("find_python", "Export hints for FindPython", false),
            bool_option("find_python3", "Export hints for FindPython3", true),
            merge_list_option("build_args", "Extra arguments for the build step"),
            merge_list_option("build_tool_args", "Arguments passed to the native tool"),
            merge_list_option("install_args", "Extra arguments for the install step"),
            ConfigOption::new("install_components", OptionKind::List(ListSpec::default()))
                .describe("Components to install; an empty name means the default one")
                .with_default(DefaultPolicy::Value(ConfigNode::str_list([""]))),
            ConfigOption::new("env", OptionKind::Dict)
                .describe("Environment variables for the CMake subprocesses")
                .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping())),
            bool_option("pure_python", "Package without platform-specific tags", false),
            ConfigOption::new("python_abi", OptionKind::Str)
                .describe("ABI tag policy: auto, none or abi3")
                .with_default(DefaultPolicy::Value(ConfigNode::str("auto"))),
            ConfigOption::new("abi3_minimum_cpython_version", OptionKind::Int)
                .describe("Oldest CPython minor version the abi3 wheel supports")
                .with_default(DefaultPolicy::Value(ConfigNode::int(32))),
        ])
}

fn stubgen_options() -> ConfigOption {
    ConfigOption::section("stubgen")
        .describe("Stub generation settings")
        .with_subs([
            ConfigOption::new("packages", OptionKind::List(ListSpec::default()))
                .describe("Packages to generate stubs for"),
            ConfigOption::new("modules", OptionKind::List(ListSpec::default()))
                .describe("Modules to generate stubs for"),
            ConfigOption::new("files", OptionKind::List(ListSpec::default()))
                .describe("Files to generate stubs for"),
            merge_list_option("args", "Extra arguments for the stub generator"),
        ])
}

/// One OS-specific profile. Its blocks inherit the top-level blocks; the
/// cmake block only materializes when a top-level cmake table exists.
fn os_options(os: &str) -> ConfigOption {
    ConfigOption::section(os)
        .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping()))
        .with_subs([
            editable_options()
                .with_inherits(&format!("{TOOL_PATH}/editable"), true)
                .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping())),
            sdist_options()
                .with_inherits(&format!("{TOOL_PATH}/sdist"), true)
                .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping())),
            cmake_options().with_inherits(&format!("{TOOL_PATH}/cmake"), true),
        ])
}

fn cross_options() -> ConfigOption {
    ConfigOption::section("cross")
        .describe("Cross-compilation settings")
        .with_subs([
            ConfigOption::new("os", OptionKind::Str)
                .describe("OS profile the cross build inherits: linux, windows or mac"),
            ConfigOption::new("implementation", OptionKind::Str)
                .describe("Python implementation of the target"),
            ConfigOption::new("version", OptionKind::Str)
                .describe("Python version of the target"),
            ConfigOption::new("abi", OptionKind::Str).describe("ABI tag of the target"),
            ConfigOption::new("arch", OptionKind::Str)
                .describe("Platform/architecture tag of the target"),
            ConfigOption::new(
                "toolchain_file",
                OptionKind::Path(PathSpec {
                    base: PathBase::ConfigFile,
                    allow_absolute: true,
                    is_folder: false,
                    ..PathSpec::default()
                }),
            )
            .describe("CMake toolchain file for the target"),
            editable_options()
                .with_inherits(&format!("{TOOL_PATH}/editable"), true)
                .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping())),
            sdist_options()
                .with_inherits(&format!("{TOOL_PATH}/sdist"), true)
                .with_default(DefaultPolicy::Value(ConfigNode::empty_mapping())),
            cmake_options().with_inherits(&format!("{TOOL_PATH}/cmake"), true),
        ])
}

fn bool_option(name: &str, description: &str, default: bool) -> ConfigOption {
    ConfigOption::new(name, OptionKind::Bool)
        .describe(description)
        .with_default(DefaultPolicy::Value(ConfigNode::bool(default)))
}

fn merge_list_option(name: &str, description: &str) -> ConfigOption {
    ConfigOption::new(
        name,
        OptionKind::List(ListSpec {
            merge_by_default: true,
            ..ListSpec::default()
        }),
    )
    .describe(description)
    .with_default(DefaultPolicy::Value(ConfigNode::List(Vec::new())))
}
