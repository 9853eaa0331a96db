//! Configuration loading and resolution
//!
//! Reads the main config file and its override files, runs the five phases
//! (verify, override, inherit, default, finalize) and flattens the result
//! into the immutable `Config` handed to the build orchestration layer.
//! Every loaded file is recorded with a content digest so a build can be
//! traced back to the exact configuration that produced it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use globset::Glob;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::defaults::update_defaults;
use super::error::ConfigError;
use super::finalize::{finalize, ResolveContext};
use super::inherit::inherit_all;
use super::metadata::{
    normalize_import_name, normalize_wheel_name, parse_project_metadata, ProjectMetadata,
};
use super::node::ConfigNode;
use super::options::{
    cross_path, get_component_options, get_options, pyproject_path, tool_path,
    with_cross_inheritance, CONFIG_KEYS, CROSS_OVERRIDE_FILE, LOCAL_OVERRIDE_FILE, OS_KEYS,
    PYPROJECT_FILE,
};
use super::overrides::apply_overrides;
use super::path::ConfPath;
use super::schema::Schema;
use super::verify::verify_sources;

/// Where a configuration source came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Main,
    Local,
    Cross,
    Cli,
}

/// A contributing config file with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: SourceOrigin,
    pub path: PathBuf,
    /// SHA-256 digest of the raw file bytes
    pub digest: String,
}

/// Override files supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct OverrideFiles {
    /// Files merged onto the backend's root option table
    pub local: Vec<PathBuf>,
    /// Files merged onto the cross-compilation table
    pub cross: Vec<PathBuf>,
}

/// Module name and location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub directory: PathBuf,
    pub namespace: bool,
}

/// Editable install settings for one OS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableConfig {
    pub mode: String,
    pub build_hook: bool,
}

/// Source distribution contents for one OS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdistConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

/// Resolved CMake settings for one OS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CMakeConfig {
    pub minimum_version: String,
    pub build_type: Option<String>,
    pub config: Vec<String>,
    pub generator: Option<String>,
    pub source_path: PathBuf,
    pub build_path: PathBuf,
    pub options: BTreeMap<String, String>,
    pub args: Vec<String>,
    pub find_python: bool,
    pub find_python3: bool,
    pub build_args: Vec<String>,
    pub build_tool_args: Vec<String>,
    pub install_args: Vec<String>,
    pub install_components: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub pure_python: bool,
    pub python_abi: String,
    pub abi3_minimum_cpython_version: i64,
}

/// Stub generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubgenConfig {
    pub packages: Option<Vec<String>>,
    pub modules: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
    pub args: Vec<String>,
}

/// Cross-compilation target description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossConfig {
    pub os: Option<String>,
    pub implementation: Option<String>,
    pub version: Option<String>,
    pub abi: Option<String>,
    pub arch: Option<String>,
    pub toolchain_file: Option<PathBuf>,
}

/// The fully resolved configuration consumed by the orchestration layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub metadata: ProjectMetadata,
    /// Wheel-escaped distribution name
    pub package_name: String,
    pub module: ModuleConfig,
    /// Editable settings per OS key (and `cross` when cross-compiling)
    pub editable: BTreeMap<String, EditableConfig>,
    /// Sdist settings per OS key
    pub sdist: BTreeMap<String, SdistConfig>,
    /// CMake settings per OS key; absent when no cmake table was given
    pub cmake: Option<BTreeMap<String, CMakeConfig>>,
    pub stubgen: Option<StubgenConfig>,
    pub cross: Option<CrossConfig>,
    /// Contributing files in precedence order
    pub sources: Vec<ConfigSource>,
    pub created_at: DateTime<Utc>,
}

impl Config {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Component settings for install-only component packages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSettings {
    pub main_project: PathBuf,
    pub install_only: bool,
    pub build_args: Vec<String>,
    pub build_tool_args: Vec<String>,
    pub install_args: Vec<String>,
    pub install_components: Vec<String>,
}

/// The resolved configuration of a component package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub metadata: ProjectMetadata,
    pub package_name: String,
    pub module: ModuleConfig,
    pub component: ComponentSettings,
    pub sources: Vec<ConfigSource>,
    pub created_at: DateTime<Utc>,
}

impl ComponentConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Read the main config file and its overrides, resolve everything.
pub fn load_config(pyproject: &Path, flags: &OverrideFiles) -> Result<Config, ConfigError> {
    let project_dir = parent_dir(pyproject);
    let (schema, values, sources) = load_sources(get_options(), pyproject, flags)?;
    let ctx = ResolveContext::new(project_dir);
    let mut config = process_config(schema, values, &ctx)?;
    config.sources = sources;
    Ok(config)
}

/// Read the main config file of a component package, resolve everything.
pub fn load_component_config(pyproject: &Path) -> Result<ComponentConfig, ConfigError> {
    let project_dir = parent_dir(pyproject);
    let (schema, values, sources) =
        load_sources(get_component_options(), pyproject, &OverrideFiles::default())?;
    let ctx = ResolveContext::new(project_dir);
    let mut config = process_component_config(schema, values, &ctx)?;
    config.sources = sources;
    Ok(config)
}

/// Resolve a fully loaded source tree into a `Config`. Pure apart from the
/// optional path-existence checks, which makes it the entry point for
/// in-memory tests.
pub fn process_config(
    schema: Schema,
    mut values: ConfigNode,
    ctx: &ResolveContext,
) -> Result<Config, ConfigError> {
    let pyproject = pyproject_path();
    let metadata = extract_metadata(&mut values, &pyproject)?;

    verify_sources(&schema, &mut values)?;
    apply_overrides(&schema, &mut values)?;
    check_cross_os(&values)?;
    let schema = with_cross_inheritance(schema, &values);
    inherit_all(&schema, &mut values)?;
    update_defaults(&schema, &mut values, &pyproject)?;
    finalize(&schema, &mut values, &pyproject, ctx)?;
    check_config(&values)?;

    flatten_config(&values, metadata)
}

/// Component counterpart of `process_config`.
pub fn process_component_config(
    schema: Schema,
    mut values: ConfigNode,
    ctx: &ResolveContext,
) -> Result<ComponentConfig, ConfigError> {
    let pyproject = pyproject_path();
    let metadata = extract_metadata(&mut values, &pyproject)?;

    verify_sources(&schema, &mut values)?;
    apply_overrides(&schema, &mut values)?;
    inherit_all(&schema, &mut values)?;
    update_defaults(&schema, &mut values, &pyproject)?;
    finalize(&schema, &mut values, &pyproject, ctx)?;

    flatten_component_config(&values, metadata)
}

// -- source loading ---------------------------------------------------------

fn parent_dir(pyproject: &Path) -> PathBuf {
    match pyproject.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_sources(
    schema: Schema,
    pyproject: &Path,
    flags: &OverrideFiles,
) -> Result<(Schema, ConfigNode, Vec<ConfigSource>), ConfigError> {
    let project_dir = parent_dir(pyproject);
    let (table, digest) = read_toml(pyproject)?;
    let mut values = ConfigNode::empty_mapping();
    values.set_child(PYPROJECT_FILE, ConfigNode::from_toml_table(table));
    let mut sources = vec![ConfigSource {
        origin: SourceOrigin::Main,
        path: pyproject.to_path_buf(),
        digest,
    }];

    // Well-known override files next to the main one, when the schema
    // declares them (component schemas do not). An empty file counts as no
    // override.
    for (file_name, origin) in [
        (LOCAL_OVERRIDE_FILE, SourceOrigin::Local),
        (CROSS_OVERRIDE_FILE, SourceOrigin::Cross),
    ] {
        if schema.find(&ConfPath::from_names([file_name])).is_none() {
            continue;
        }
        let path = project_dir.join(file_name);
        if !path.exists() {
            continue;
        }
        let (table, digest) = read_toml(&path)?;
        if table.is_empty() {
            continue;
        }
        values.set_child(file_name, ConfigNode::from_toml_table(table));
        sources.push(ConfigSource {
            origin,
            path,
            digest,
        });
    }

    // Command-line override files, bound to their target through an
    // augmented schema, in arrival order.
    let mut schema = schema;
    for (paths, target) in [(&flags.local, tool_path()), (&flags.cross, cross_path())] {
        for path in paths {
            let absolute = absolute_from_cwd(path);
            let (table, digest) = read_toml(&absolute)?;
            let source_id = absolute.to_string_lossy().into_owned();
            schema = schema.with_override_file(&source_id, target.clone());
            values.set_child(&source_id, ConfigNode::from_toml_table(table));
            sources.push(ConfigSource {
                origin: SourceOrigin::Cli,
                path: absolute,
                digest,
            });
        }
    }

    Ok((schema, values, sources))
}

fn absolute_from_cwd(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

fn read_toml(path: &Path) -> Result<(toml::Table, String), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let text = String::from_utf8(bytes).map_err(|err| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, err),
    })?;
    let table: toml::Table = toml::from_str(&text).map_err(|source| ConfigError::FileParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((table, digest))
}

// -- pipeline helpers -------------------------------------------------------

/// Pull out the `[project]` metadata and write the normalized name back so
/// reference defaults see it.
fn extract_metadata(
    values: &mut ConfigNode,
    pyproject: &ConfPath,
) -> Result<ProjectMetadata, ConfigError> {
    let project_path = pyproject.join_name("project");
    let Some(project) = values.get(&project_path) else {
        return Err(ConfigError::invalid_value(
            PYPROJECT_FILE,
            "missing [project] table",
        ));
    };
    let metadata = parse_project_metadata(project, &project_path)?;
    values.set(
        &project_path.join_name("name"),
        ConfigNode::str(metadata.name.clone()),
    );
    Ok(metadata)
}

fn check_cross_os(values: &ConfigNode) -> Result<(), ConfigError> {
    let os_path = cross_path().join_name("os");
    let Some(node) = values.get(&os_path) else {
        return Ok(());
    };
    let os = node.as_str().ok_or_else(|| {
        ConfigError::wrong_type(os_path.to_string(), "string", node.type_name())
    })?;
    if !OS_KEYS.contains(&os) {
        return Err(ConfigError::invalid_value(
            os_path.to_string(),
            format!(
                "\"{}\" is not a supported target OS (expected one of: {})",
                os,
                OS_KEYS.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Backend-specific cross-field validation, after all values are resolved.
fn check_config(values: &ConfigNode) -> Result<(), ConfigError> {
    let tool = tool_path();
    let namespace = values
        .get(&tool.join_name("module").join_name("namespace"))
        .and_then(ConfigNode::as_bool)
        .unwrap_or(false);

    for os in CONFIG_KEYS {
        let block = tool.join_name(os);
        let mode_path = block.join_name("editable").join_name("mode");
        if let Some(mode) = values.get(&mode_path).and_then(ConfigNode::as_str) {
            if !["wrapper", "hook", "symlink"].contains(&mode) {
                return Err(ConfigError::invalid_value(
                    mode_path.to_string(),
                    format!(
                        "\"{}\" is not a valid editable mode (expected wrapper, hook or symlink)",
                        mode
                    ),
                ));
            }
            if namespace && mode == "wrapper" {
                return Err(ConfigError::invalid_value(
                    mode_path.to_string(),
                    "namespace packages cannot use editable mode 'wrapper'",
                ));
            }
        }
        for clude in ["include", "exclude"] {
            let patterns_path = block.join_name("sdist").join_name(clude);
            let Some(patterns) = values.get(&patterns_path).and_then(ConfigNode::as_str_list)
            else {
                continue;
            };
            for pattern in &patterns {
                Glob::new(pattern).map_err(|err| {
                    ConfigError::invalid_value(
                        patterns_path.to_string(),
                        format!("invalid glob pattern \"{}\": {}", pattern, err),
                    )
                })?;
            }
        }
    }

    if let Some(cross) = values.get(&cross_path()) {
        if cross.child("toolchain_file").is_none() {
            return Err(ConfigError::invalid_value(
                cross_path().to_string(),
                "cross-compilation requires a toolchain_file",
            ));
        }
    }
    Ok(())
}

// -- flattening -------------------------------------------------------------

fn expect_str(values: &ConfigNode, path: &ConfPath) -> Result<String, ConfigError> {
    let node = values.try_get(path)?;
    node.as_str().map(str::to_string).ok_or_else(|| {
        ConfigError::wrong_type(path.to_string(), "string", node.type_name())
    })
}

fn expect_bool(values: &ConfigNode, path: &ConfPath) -> Result<bool, ConfigError> {
    let node = values.try_get(path)?;
    node.as_bool()
        .ok_or_else(|| ConfigError::wrong_type(path.to_string(), "bool", node.type_name()))
}

fn expect_int(values: &ConfigNode, path: &ConfPath) -> Result<i64, ConfigError> {
    let node = values.try_get(path)?;
    node.as_int()
        .ok_or_else(|| ConfigError::wrong_type(path.to_string(), "int", node.type_name()))
}

fn expect_str_list(values: &ConfigNode, path: &ConfPath) -> Result<Vec<String>, ConfigError> {
    let node = values.try_get(path)?;
    node.as_str_list()
        .ok_or_else(|| ConfigError::wrong_type(path.to_string(), "list", node.type_name()))
}

fn expect_str_map(
    values: &ConfigNode,
    path: &ConfPath,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let node = values.try_get(path)?;
    if !node.is_mapping() {
        return Err(ConfigError::wrong_type(
            path.to_string(),
            "dict",
            node.type_name(),
        ));
    }
    let mut map = BTreeMap::new();
    for (name, value) in node.children() {
        let value = value.as_str().ok_or_else(|| {
            ConfigError::wrong_type(
                path.join_name(name).to_string(),
                "string",
                value.type_name(),
            )
        })?;
        map.insert(name.to_string(), value.to_string());
    }
    Ok(map)
}

fn opt_str(values: &ConfigNode, path: &ConfPath) -> Result<Option<String>, ConfigError> {
    match values.get(path) {
        Some(_) => expect_str(values, path).map(Some),
        None => Ok(None),
    }
}

fn opt_str_list(
    values: &ConfigNode,
    path: &ConfPath,
) -> Result<Option<Vec<String>>, ConfigError> {
    match values.get(path) {
        Some(_) => expect_str_list(values, path).map(Some),
        None => Ok(None),
    }
}

fn flatten_config(values: &ConfigNode, metadata: ProjectMetadata) -> Result<Config, ConfigError> {
    let tool = tool_path();
    let module_path = tool.join_name("module");
    let module = ModuleConfig {
        name: normalize_import_name(&expect_str(values, &module_path.join_name("name"))?),
        directory: PathBuf::from(expect_str(values, &module_path.join_name("directory"))?),
        namespace: expect_bool(values, &module_path.join_name("namespace"))?,
    };

    let mut editable = BTreeMap::new();
    let mut sdist = BTreeMap::new();
    let mut cmake = BTreeMap::new();
    for os in CONFIG_KEYS {
        let block = tool.join_name(os);
        if values.is_set(&block.join_name("editable")) {
            editable.insert(os.to_string(), flatten_editable(values, &block)?);
        }
        if values.is_set(&block.join_name("sdist")) {
            sdist.insert(os.to_string(), flatten_sdist(values, &block)?);
        }
        if values.is_set(&block.join_name("cmake")) {
            cmake.insert(os.to_string(), flatten_cmake(values, &block)?);
        }
    }

    let stubgen_path = tool.join_name("stubgen");
    let stubgen = if values.is_set(&stubgen_path) {
        Some(StubgenConfig {
            packages: opt_str_list(values, &stubgen_path.join_name("packages"))?,
            modules: opt_str_list(values, &stubgen_path.join_name("modules"))?,
            files: opt_str_list(values, &stubgen_path.join_name("files"))?,
            args: opt_str_list(values, &stubgen_path.join_name("args"))?.unwrap_or_default(),
        })
    } else {
        None
    };

    let cross = if values.is_set(&cross_path()) {
        let cross = cross_path();
        Some(CrossConfig {
            os: opt_str(values, &cross.join_name("os"))?,
            implementation: opt_str(values, &cross.join_name("implementation"))?,
            version: opt_str(values, &cross.join_name("version"))?,
            abi: opt_str(values, &cross.join_name("abi"))?,
            arch: opt_str(values, &cross.join_name("arch"))?,
            toolchain_file: opt_str(values, &cross.join_name("toolchain_file"))?
                .map(PathBuf::from),
        })
    } else {
        None
    };

    Ok(Config {
        package_name: normalize_wheel_name(&metadata.name),
        metadata,
        module,
        editable,
        sdist,
        cmake: if cmake.is_empty() { None } else { Some(cmake) },
        stubgen,
        cross,
        sources: Vec::new(),
        created_at: Utc::now(),
    })
}

fn flatten_editable(values: &ConfigNode, block: &ConfPath) -> Result<EditableConfig, ConfigError> {
    let editable = block.join_name("editable");
    Ok(EditableConfig {
        mode: expect_str(values, &editable.join_name("mode"))?,
        build_hook: expect_bool(values, &editable.join_name("build_hook"))?,
    })
}

fn flatten_sdist(values: &ConfigNode, block: &ConfPath) -> Result<SdistConfig, ConfigError> {
    let sdist = block.join_name("sdist");
    Ok(SdistConfig {
        include_patterns: expect_str_list(values, &sdist.join_name("include"))?,
        exclude_patterns: expect_str_list(values, &sdist.join_name("exclude"))?,
    })
}

fn flatten_cmake(values: &ConfigNode, block: &ConfPath) -> Result<CMakeConfig, ConfigError> {
    let cmake = block.join_name("cmake");
    let at = |name: &str| cmake.join_name(name);
    Ok(CMakeConfig {
        minimum_version: expect_str(values, &at("minimum_version"))?,
        build_type: opt_str(values, &at("build_type"))?,
        config: opt_str_list(values, &at("config"))?.unwrap_or_default(),
        generator: opt_str(values, &at("generator"))?,
        source_path: PathBuf::from(expect_str(values, &at("source_path"))?),
        build_path: PathBuf::from(expect_str(values, &at("build_path"))?),
        options: expect_str_map(values, &at("options"))?,
        args: expect_str_list(values, &at("args"))?,
        find_python: expect_bool(values, &at("find_python"))?,
        find_python3: expect_bool(values, &at("find_python3"))?,
        build_args: expect_str_list(values, &at("build_args"))?,
        build_tool_args: expect_str_list(values, &at("build_tool_args"))?,
        install_args: expect_str_list(values, &at("install_args"))?,
        install_components: expect_str_list(values, &at("install_components"))?,
        env: expect_str_map(values, &at("env"))?,
        pure_python: expect_bool(values, &at("pure_python"))?,
        python_abi: expect_str(values, &at("python_abi"))?,
        abi3_minimum_cpython_version: expect_int(values, &at("abi3_minimum_cpython_version"))?,
    })
}

fn flatten_component_config(
    values: &ConfigNode,
    metadata: ProjectMetadata,
) -> Result<ComponentConfig, ConfigError> {
    let tool = tool_path();
    let module_path = tool.join_name("module");
    let module = ModuleConfig {
        name: normalize_import_name(&expect_str(values, &module_path.join_name("name"))?),
        directory: PathBuf::from(expect_str(values, &module_path.join_name("directory"))?),
        namespace: expect_bool(values, &module_path.join_name("namespace"))?,
    };
    let component_path = tool.join_name("component");
    let at = |name: &str| component_path.join_name(name);
    let component = ComponentSettings {
        main_project: PathBuf::from(expect_str(values, &at("main_project"))?),
        install_only: expect_bool(values, &at("install_only"))?,
        build_args: expect_str_list(values, &at("build_args"))?,
        build_tool_args: expect_str_list(values, &at("build_tool_args"))?,
        install_args: expect_str_list(values, &at("install_args"))?,
        install_components: expect_str_list(values, &at("install_components"))?,
    };
    Ok(ComponentConfig {
        package_name: normalize_wheel_name(&metadata.name),
        metadata,
        module,
        component,
        sources: Vec::new(),
        created_at: Utc::now(),
    })
}
