//! End-to-end configuration resolution tests on in-memory sources.

use cmake_wheel_config::config::{
    get_options, process_config, ConfigNode, ResolveContext, LOCAL_OVERRIDE_FILE,
};
use serde_json::json;

fn resolve(sources: serde_json::Value) -> Result<cmake_wheel_config::Config, cmake_wheel_config::ConfigError> {
    let values = ConfigNode::from_json(sources);
    let ctx = ResolveContext::new("/project").without_path_checks();
    process_config(get_options(), values, &ctx)
}

#[test]
fn test_minimal_config() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foo-bar", "version": "0.0.1" },
            "tool": { "some-other-tool": {} },
        },
    }))
    .unwrap();

    assert_eq!(config.metadata.name, "foo-bar");
    assert_eq!(config.package_name, "foo_bar");
    // Import name is the normalized project name
    assert_eq!(config.module.name, "foo_bar");
    assert_eq!(config.module.directory.to_str(), Some("/project"));
    assert!(!config.module.namespace);

    // Optional blocks stay absent
    assert!(config.cmake.is_none());
    assert!(config.cross.is_none());
    assert!(config.stubgen.is_none());

    // OS profiles materialize with defaults
    for os in ["linux", "windows", "mac"] {
        let editable = &config.editable[os];
        assert_eq!(editable.mode, "symlink");
        assert!(!editable.build_hook);
        let sdist = &config.sdist[os];
        assert!(sdist.include_patterns.is_empty());
        assert!(sdist.exclude_patterns.is_empty());
    }
    assert!(!config.editable.contains_key("cross"));
}

#[test]
fn test_explicit_module_name_is_normalized() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "0.0.1" },
            "tool": { "cmake-wheel": { "module": { "name": "my-module" } } },
        },
    }))
    .unwrap();
    assert_eq!(config.module.name, "my_module");
}

#[test]
fn test_os_blocks_inherit_top_level_cmake() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.2.3", "description": "descr" },
            "tool": {
                "some-other-tool": {},
                "cmake-wheel": {
                    "cmake": {
                        "build_type": "Release",
                        "generator": "Ninja",
                        "source_path": "src",
                        "env": { "foo": "bar" },
                        "args": ["arg1", "arg2"],
                        "find_python": false,
                        "find_python3": true,
                        "install_components": ["all_install"],
                    },
                    "cross": {
                        "implementation": "cp",
                        "version": "310",
                        "abi": "cp310",
                        "arch": "linux_aarch64",
                        "toolchain_file": "aarch64-linux-gnu.cmake",
                        "cmake": {
                            "generator": "Unix Makefiles",
                            "build_type": "RelWithDebInfo",
                            "env": { "crosscompiling": "true" },
                            "args": ["arg3", "arg4"],
                        },
                    },
                    "linux": {
                        "cmake": {
                            "args": ["linux_arg"],
                            "install_components": ["linux_install"],
                        },
                    },
                    "windows": {
                        "cmake": {
                            "args": { "-": ["arg1"], "prepend": ["win_arg"], "+": ["arg1"] },
                            "install_components": { "+": ["win_install"] },
                        },
                    },
                },
            },
        },
    }))
    .unwrap();

    assert_eq!(config.metadata.name, "foobar");
    assert_eq!(config.metadata.version.as_deref(), Some("1.2.3"));
    assert_eq!(config.metadata.description.as_deref(), Some("descr"));

    // All four profiles get editable and sdist defaults
    for os in ["linux", "windows", "mac", "cross"] {
        assert_eq!(config.editable[os].mode, "symlink");
        assert!(config.sdist[os].include_patterns.is_empty());
    }

    let cmake = config.cmake.as_ref().unwrap();

    let linux = &cmake["linux"];
    assert_eq!(linux.build_type.as_deref(), Some("Release"));
    assert_eq!(linux.config, vec!["Release"]);
    assert_eq!(linux.generator.as_deref(), Some("Ninja"));
    assert_eq!(linux.source_path.to_str(), Some("/project/src"));
    assert_eq!(
        linux.build_path.to_str(),
        Some("/project/.cmake-wheel-cache/{build_config}")
    );
    assert_eq!(linux.args, vec!["arg1", "arg2", "linux_arg"]);
    assert_eq!(linux.install_components, vec!["linux_install"]);
    assert_eq!(linux.env.get("foo").map(String::as_str), Some("bar"));
    assert_eq!(linux.minimum_version, "3.15");
    assert!(!linux.find_python);
    assert!(linux.find_python3);
    assert_eq!(linux.python_abi, "auto");
    assert_eq!(linux.abi3_minimum_cpython_version, 32);

    let windows = &cmake["windows"];
    assert_eq!(windows.args, vec!["win_arg", "arg2", "arg1"]);
    assert_eq!(windows.install_components, vec!["all_install", "win_install"]);

    let mac = &cmake["mac"];
    assert_eq!(mac.args, vec!["arg1", "arg2"]);
    assert_eq!(mac.install_components, vec!["all_install"]);

    // Without cross.os, the cross block inherits the top-level cmake table
    let cross = &cmake["cross"];
    assert_eq!(cross.build_type.as_deref(), Some("RelWithDebInfo"));
    assert_eq!(cross.config, vec!["RelWithDebInfo"]);
    assert_eq!(cross.generator.as_deref(), Some("Unix Makefiles"));
    assert_eq!(cross.args, vec!["arg1", "arg2", "arg3", "arg4"]);
    assert_eq!(cross.install_components, vec!["all_install"]);
    assert_eq!(cross.env.get("foo").map(String::as_str), Some("bar"));
    assert_eq!(
        cross.env.get("crosscompiling").map(String::as_str),
        Some("true")
    );

    let cross_info = config.cross.as_ref().unwrap();
    assert_eq!(cross_info.implementation.as_deref(), Some("cp"));
    assert_eq!(cross_info.version.as_deref(), Some("310"));
    assert_eq!(cross_info.abi.as_deref(), Some("cp310"));
    assert_eq!(cross_info.arch.as_deref(), Some("linux_aarch64"));
    assert_eq!(
        cross_info.toolchain_file.as_ref().and_then(|p| p.to_str()),
        Some("/project/aarch64-linux-gnu.cmake")
    );
}

#[test]
fn test_cross_inherits_from_selected_os() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": {
                "cmake-wheel": {
                    "linux": {
                        "cmake": {
                            "build_type": "Release",
                            "generator": "Ninja",
                            "env": { "common": "os", "shared": "os" },
                            "args": ["os_arg1", "os_arg2"],
                        },
                    },
                    "cross": {
                        "os": "linux",
                        "arch": "linux_aarch64",
                        "toolchain_file": "toolchain.cmake",
                        "cmake": {
                            "generator": "Unix Makefiles",
                            "env": { "shared": "cross" },
                            "args": ["cross_arg"],
                        },
                    },
                },
            },
        },
    }))
    .unwrap();

    let cmake = config.cmake.as_ref().unwrap();
    let cross = &cmake["cross"];
    // OS build type fills the gap, own generator wins
    assert_eq!(cross.build_type.as_deref(), Some("Release"));
    assert_eq!(cross.generator.as_deref(), Some("Unix Makefiles"));
    // Env merges key-level: own keys win, OS keys fill gaps
    assert_eq!(cross.env.get("common").map(String::as_str), Some("os"));
    assert_eq!(cross.env.get("shared").map(String::as_str), Some("cross"));
    // Argument lists extend: OS args first, own args after
    assert_eq!(cross.args, vec!["os_arg1", "os_arg2", "cross_arg"]);
}

#[test]
fn test_local_override_file_applies_to_all_profiles() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.2.3" },
            "tool": { "cmake-wheel": {} },
        },
        (LOCAL_OVERRIDE_FILE): {
            "sdist": { "include": ["somefile*"] },
        },
    }))
    .unwrap();

    for os in ["linux", "windows", "mac"] {
        assert_eq!(config.sdist[os].include_patterns, vec!["somefile*"]);
        assert!(config.sdist[os].exclude_patterns.is_empty());
    }
    assert!(config.cmake.is_none());
    assert!(config.cross.is_none());
}

#[test]
fn test_local_override_targeting_one_os() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.2.3" },
            "tool": { "cmake-wheel": {} },
        },
        (LOCAL_OVERRIDE_FILE): {
            "windows": {
                "editable": { "mode": "hook" },
                "sdist": { "include": ["somefile*"] },
            },
        },
    }))
    .unwrap();

    assert_eq!(config.editable["windows"].mode, "hook");
    assert_eq!(config.editable["linux"].mode, "symlink");
    assert_eq!(config.sdist["windows"].include_patterns, vec!["somefile*"]);
    assert!(config.sdist["linux"].include_patterns.is_empty());
}

#[test]
fn test_override_runs_before_inherit() {
    // An inherited value must never clobber an explicit override: the
    // override lands on the top-level cmake table first, and the OS blocks
    // then inherit the overridden value.
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": { "cmake-wheel": { "cmake": { "generator": "Unix Makefiles" } } },
        },
        (LOCAL_OVERRIDE_FILE): {
            "cmake": { "generator": "Ninja" },
        },
    }))
    .unwrap();

    let cmake = config.cmake.as_ref().unwrap();
    for os in ["linux", "windows", "mac"] {
        assert_eq!(cmake[os].generator.as_deref(), Some("Ninja"));
    }
}

#[test]
fn test_unknown_option_is_rejected() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": { "cmake-wheel": { "cmake": { "generat0r": "Ninja" } } },
        },
    }))
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Unknown options"));
    assert!(message.contains("pyproject.toml/tool/cmake-wheel/cmake"));
    assert!(message.contains("generat0r"));
}

#[test]
fn test_wrong_type_is_rejected() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": { "cmake-wheel": { "cmake": { "generator": 42 } } },
        },
    }))
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Type of pyproject.toml/tool/cmake-wheel/cmake/generator should be string, not int"
    );
}

#[test]
fn test_cross_requires_toolchain_file() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": { "cmake-wheel": { "cross": { "arch": "linux_aarch64" } } },
        },
    }))
    .unwrap_err();
    assert!(err.to_string().contains("toolchain_file"));
}

#[test]
fn test_cross_os_must_be_recognized() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": {
                "cmake-wheel": {
                    "cross": { "os": "beos", "toolchain_file": "toolchain.cmake" },
                },
            },
        },
    }))
    .unwrap_err();
    assert!(err.to_string().contains("beos"));
}

#[test]
fn test_namespace_package_rejects_wrapper_mode() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "0.0.1" },
            "tool": {
                "cmake-wheel": {
                    "module": { "namespace": true },
                    "editable": { "build_hook": false, "mode": "wrapper" },
                },
            },
        },
    }))
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("namespace packages cannot use editable mode 'wrapper'"));
}

#[test]
fn test_invalid_editable_mode() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "0.0.1" },
            "tool": { "cmake-wheel": { "editable": { "mode": "hardlink" } } },
        },
    }))
    .unwrap_err();
    assert!(err.to_string().contains("not a valid editable mode"));
}

#[test]
fn test_invalid_sdist_glob_pattern() {
    let err = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "0.0.1" },
            "tool": { "cmake-wheel": { "sdist": { "include": ["a[b"] } } },
        },
    }))
    .unwrap_err();
    assert!(err.to_string().contains("invalid glob pattern"));
}

#[test]
fn test_missing_project_table() {
    let err = resolve(json!({
        "pyproject.toml": { "tool": { "cmake-wheel": {} } },
    }))
    .unwrap_err();
    assert!(err.to_string().contains("missing [project] table"));
}

#[test]
fn test_stubgen_block_survives() {
    let config = resolve(json!({
        "pyproject.toml": {
            "project": { "name": "foobar", "version": "1.0" },
            "tool": {
                "cmake-wheel": {
                    "stubgen": { "packages": ["foobar"], "args": ["--quiet"] },
                },
            },
        },
    }))
    .unwrap();
    let stubgen = config.stubgen.as_ref().unwrap();
    assert_eq!(stubgen.packages.as_deref(), Some(["foobar".to_string()].as_slice()));
    assert_eq!(stubgen.modules, None);
    assert_eq!(stubgen.args, vec!["--quiet"]);
}
