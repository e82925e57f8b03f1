//! Builds the worker executables before anything is measured.
//!
//! A build only counts as successful when the compiler exits cleanly *and* the expected
//! binary is on disk afterwards; an exit status alone is never trusted.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{BenchmarkConfig, MULTI_WRITER, SINGLE_WRITER};
use crate::error::CompilationFailure;

/// One executable to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    /// Binary target name inside the package.
    pub name: String,
    /// Manifest of the package that owns the binary.
    pub source: PathBuf,
    /// Where the finished executable must end up.
    pub output: PathBuf,
}

impl BuildUnit {
    /// The two worker executables of this package, installed into the binaries directory.
    pub fn workers(config: &BenchmarkConfig) -> [BuildUnit; 2] {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        [
            BuildUnit {
                name: SINGLE_WRITER.to_string(),
                source: manifest.clone(),
                output: config.single_writer(),
            },
            BuildUnit {
                name: MULTI_WRITER.to_string(),
                source: manifest,
                output: config.multi_writer(),
            },
        ]
    }
}

/// Produces worker executables.
pub trait Toolchain {
    /// Builds `unit` and verifies that `unit.output` exists afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails or leaves no binary behind.
    fn compile(&self, unit: &BuildUnit) -> Result<(), CompilationFailure>;
}

/// Compiles every unit in order, stopping at the first failure.
pub fn build_all(toolchain: &dyn Toolchain, units: &[BuildUnit]) -> Result<(), CompilationFailure> {
    for unit in units {
        log::info!("building {}", unit.name);
        toolchain.compile(unit).inspect_err(|e| {
            log::error!("build of {} failed: {e}", unit.name);
        })?;
    }
    Ok(())
}

fn verify_artifact(unit: &BuildUnit, path: &Path) -> Result<(), CompilationFailure> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CompilationFailure::MissingArtifact {
            unit: unit.name.clone(),
            path: path.to_path_buf(),
        })
    }
}

/// Optimisation settings passed to every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFlags {
    /// `opt-level` of the release profile.
    pub opt_level: u8,
    /// Link-time optimisation.
    pub lto: bool,
    /// Tune code generation for the host CPU.
    pub native_cpu: bool,
}

impl Default for CompileFlags {
    fn default() -> Self {
        Self {
            opt_level: 3,
            lto: true,
            native_cpu: true,
        }
    }
}

/// Builds workers with `cargo build --release` and installs them into the binaries directory.
#[derive(Debug, Clone)]
pub struct CargoToolchain {
    program: OsString,
    target_dir: PathBuf,
    flags: CompileFlags,
}

impl CargoToolchain {
    /// Uses `$CARGO` when set (as it is under `cargo run`), otherwise `cargo` from `PATH`.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        let program = std::env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo"));
        Self::with_program(program, target_dir)
    }

    pub fn with_program(program: impl Into<OsString>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            target_dir: target_dir.into(),
            flags: CompileFlags::default(),
        }
    }

    #[must_use]
    pub fn flags(mut self, flags: CompileFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Where cargo leaves the binary before it is installed.
    pub fn artifact_path(&self, unit: &BuildUnit) -> PathBuf {
        let file_name = match unit.output.file_name() {
            Some(name) => PathBuf::from(name),
            None => PathBuf::from(&unit.name),
        };
        self.target_dir.join("release").join(file_name)
    }

    fn command(&self, unit: &BuildUnit) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("build")
            .arg("--release")
            .arg("--manifest-path")
            .arg(&unit.source)
            .arg("--bin")
            .arg(&unit.name)
            .arg("--target-dir")
            .arg(&self.target_dir)
            .arg("--config")
            .arg(format!("profile.release.opt-level={}", self.flags.opt_level))
            .arg("--config")
            .arg(format!("profile.release.lto={}", self.flags.lto));
        if self.flags.native_cpu {
            let existing = std::env::var_os("RUSTFLAGS");
            cmd.env("RUSTFLAGS", with_native_cpu(existing.as_deref()));
        }
        cmd
    }
}

/// Appends `-C target-cpu=native` to whatever `RUSTFLAGS` the caller already set.
fn with_native_cpu(existing: Option<&OsStr>) -> OsString {
    let mut flags = OsString::new();
    if let Some(existing) = existing.filter(|flags| !flags.is_empty()) {
        flags.push(existing);
        flags.push(" ");
    }
    flags.push("-C target-cpu=native");
    flags
}

impl Toolchain for CargoToolchain {
    fn compile(&self, unit: &BuildUnit) -> Result<(), CompilationFailure> {
        let mut cmd = self.command(unit);
        log::debug!("running {cmd:?}");

        let status = cmd.status().map_err(|source| CompilationFailure::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;
        if !status.success() {
            return Err(CompilationFailure::ExitStatus {
                unit: unit.name.clone(),
                status,
            });
        }

        let artifact = self.artifact_path(unit);
        verify_artifact(unit, &artifact)?;

        if artifact != unit.output {
            let install_failure = |source| CompilationFailure::Install {
                unit: unit.name.clone(),
                path: unit.output.clone(),
                source,
            };
            if let Some(parent) = unit.output.parent() {
                fs::create_dir_all(parent).map_err(install_failure)?;
            }
            fs::copy(&artifact, &unit.output).map_err(install_failure)?;
        }
        verify_artifact(unit, &unit.output)
    }
}

/// Skips compilation and only checks that the executables are already in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrebuiltToolchain;

impl Toolchain for PrebuiltToolchain {
    fn compile(&self, unit: &BuildUnit) -> Result<(), CompilationFailure> {
        verify_artifact(unit, &unit.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit_in(dir: &Path) -> BuildUnit {
        BuildUnit {
            name: "single_writer".to_string(),
            source: PathBuf::from("Cargo.toml"),
            output: dir.join("single_writer"),
        }
    }

    #[test]
    fn test_workers_land_in_bin_dir() {
        let config = BenchmarkConfig::builder().bin_dir("out").build().unwrap();
        let [single, multi] = BuildUnit::workers(&config);
        assert_eq!(single.name, SINGLE_WRITER);
        assert_eq!(multi.name, MULTI_WRITER);
        assert!(single.output.starts_with("out"));
        assert!(multi.output.starts_with("out"));
        assert!(single.source.ends_with("Cargo.toml"));
    }

    #[test]
    fn test_prebuilt_requires_binary() {
        let tmpdir = TempDir::new().unwrap();
        let unit = unit_in(tmpdir.path());

        match PrebuiltToolchain.compile(&unit) {
            Err(CompilationFailure::MissingArtifact { path, .. }) => assert_eq!(path, unit.output),
            other => panic!("expected MissingArtifact, got {other:?}"),
        }

        fs::write(&unit.output, b"#!/bin/sh\n").unwrap();
        PrebuiltToolchain.compile(&unit).unwrap();
    }

    #[test]
    fn test_artifact_path_uses_release_dir() {
        let toolchain = CargoToolchain::with_program("cargo", "target-bench");
        let unit = unit_in(Path::new("bin"));
        assert_eq!(
            toolchain.artifact_path(&unit),
            PathBuf::from("target-bench/release/single_writer")
        );
    }

    #[test]
    fn test_native_cpu_keeps_existing_rustflags() {
        assert_eq!(with_native_cpu(None), OsString::from("-C target-cpu=native"));
        assert_eq!(
            with_native_cpu(Some(OsStr::new(""))),
            OsString::from("-C target-cpu=native")
        );
        assert_eq!(
            with_native_cpu(Some(OsStr::new("-D warnings"))),
            OsString::from("-D warnings -C target-cpu=native")
        );
    }

    #[test]
    fn test_native_cpu_flag_reaches_command() {
        let toolchain = CargoToolchain::with_program("cargo", "target-bench");
        let cmd = toolchain.command(&unit_in(Path::new("bin")));
        let rustflags = cmd
            .get_envs()
            .find(|(key, _)| *key == OsStr::new("RUSTFLAGS"))
            .and_then(|(_, value)| value)
            .unwrap();
        assert!(rustflags.to_string_lossy().ends_with("-C target-cpu=native"));

        let plain = CargoToolchain::with_program("cargo", "target-bench").flags(CompileFlags {
            native_cpu: false,
            ..CompileFlags::default()
        });
        let cmd = plain.command(&unit_in(Path::new("bin")));
        assert!(cmd.get_envs().all(|(key, _)| key != OsStr::new("RUSTFLAGS")));
    }

    #[test]
    fn test_missing_compiler_is_spawn_failure() {
        let tmpdir = TempDir::new().unwrap();
        let toolchain =
            CargoToolchain::with_program("/nonexistent/compiler", tmpdir.path().join("target"));
        let unit = unit_in(tmpdir.path());
        assert!(matches!(
            toolchain.compile(&unit),
            Err(CompilationFailure::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let tmpdir = TempDir::new().unwrap();
        let toolchain = CargoToolchain::with_program("false", tmpdir.path().join("target"));
        let unit = unit_in(tmpdir.path());
        match toolchain.compile(&unit) {
            Err(CompilationFailure::ExitStatus { status, .. }) => assert!(!status.success()),
            other => panic!("expected ExitStatus, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_without_binary_is_failure() {
        let tmpdir = TempDir::new().unwrap();
        let toolchain = CargoToolchain::with_program("true", tmpdir.path().join("target"));
        let unit = unit_in(tmpdir.path());
        assert!(matches!(
            toolchain.compile(&unit),
            Err(CompilationFailure::MissingArtifact { .. })
        ));
        assert!(!unit.output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_build_all_stops_at_first_failure() {
        let tmpdir = TempDir::new().unwrap();
        let toolchain = CargoToolchain::with_program("false", tmpdir.path().join("target"));
        let config = BenchmarkConfig::builder()
            .bin_dir(tmpdir.path())
            .build()
            .unwrap();
        let units = BuildUnit::workers(&config);

        let err = build_all(&toolchain, &units).unwrap_err();
        match err {
            CompilationFailure::ExitStatus { unit, .. } => assert_eq!(unit, SINGLE_WRITER),
            other => panic!("expected ExitStatus, got {other:?}"),
        }
    }
}
