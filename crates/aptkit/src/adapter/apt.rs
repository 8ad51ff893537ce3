//! Real APT backend using `apt-get` and `dpkg-query`.

use crate::adapter::Adapter;
use crate::error::{Error, Result};
use crate::sources;
use crate::types::{AptOptions, PackageState, SourceEntry};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Adapter that executes real apt-get / dpkg-query commands.
pub struct AptAdapter {
    options: AptOptions,
    apt_get: String,
    dpkg_query: String,
}

impl AptAdapter {
    /// Create a new AptAdapter.
    ///
    /// Returns an error if apt-get or dpkg-query is not installed.
    pub fn new(options: AptOptions) -> Result<Self> {
        let apt_get = find_tool("apt-get")?;
        let dpkg_query = find_tool("dpkg-query")?;
        Ok(Self {
            options,
            apt_get,
            dpkg_query,
        })
    }

    /// Adapter-wide options in effect.
    pub fn options(&self) -> &AptOptions {
        &self.options
    }

    /// Build a command, going through sudo when configured.
    fn command(&self, program: &str, privileged: bool) -> Command {
        if privileged && self.options.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.args(["env", "DEBIAN_FRONTEND=noninteractive", program]);
            cmd
        } else {
            let mut cmd = Command::new(program);
            cmd.env("DEBIAN_FRONTEND", "noninteractive");
            cmd
        }
    }

    fn run(&self, program: &str, args: &[String], privileged: bool) -> Result<Output> {
        log::debug!("running: {} {}", program, args.join(" "));
        self.command(program, privileged)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute {program}: {e}"),
                stderr: String::new(),
            })
    }

    /// Run an apt-get command and check for success.
    fn run_apt_checked(&self, args: &[String], package_name: Option<&str>) -> Result<Output> {
        let output = self.run(&self.apt_get, args, true)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_apt_output(&stderr, package_name));
        }

        Ok(output)
    }

    fn write_source_file(&self, path: &Path, content: &str) -> Result<()> {
        let to_err = |source: std::io::Error| Error::SourcesWrite {
            path: path.to_path_buf(),
            source,
        };

        if !self.options.use_sudo {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(to_err)?;
            }
            return std::fs::write(path, content).map_err(to_err);
        }

        let mut child = Command::new("sudo")
            .arg("tee")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(to_err)?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(content.as_bytes()).map_err(to_err)?;
        }

        let output = child.wait_with_output().map_err(to_err)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_apt_output(&stderr, None));
        }
        Ok(())
    }

    /// Best-effort removal so a source whose index refresh failed is not
    /// reported as present on the next run.
    fn remove_source_file(&self, path: &Path) {
        let removed = if self.options.use_sudo {
            Command::new("sudo")
                .arg("rm")
                .arg("-f")
                .arg(path)
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        } else {
            std::fs::remove_file(path).is_ok()
        };

        if !removed {
            log::warn!("could not remove {}", path.display());
        }
    }

    fn update_index(&self, source: &SourceEntry<'_>) -> Result<()> {
        let output = self.run_apt_checked(&["update".to_string(), "-q".to_string()], None)?;

        // Older apt exits 0 even when a single source fails to fetch.
        let stderr = String::from_utf8_lossy(&output.stderr);
        match update_failure_for(&stderr, source.uri) {
            Some(line) => Err(Error::from_apt_output(line, None)),
            None => Ok(()),
        }
    }
}

impl Adapter for AptAdapter {
    fn query_package(&self, name: &str) -> Result<PackageState> {
        let args = [
            "-W".to_string(),
            "-f=${Status}\t${Version}".to_string(),
            name.to_string(),
        ];
        let output = self.run(&self.dpkg_query, &args, false)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.to_lowercase().contains("no packages found matching") {
                return Ok(PackageState::Absent);
            }
            return Err(Error::from_apt_output(&stderr, Some(name)));
        }

        Ok(parse_dpkg_status(&String::from_utf8_lossy(&output.stdout)))
    }

    fn install_package(
        &self,
        name: &str,
        version: Option<&str>,
        options: &[String],
    ) -> Result<()> {
        let args = install_args(name, version, options, self.options.force_yes);
        self.run_apt_checked(&args, Some(name))?;
        Ok(())
    }

    fn query_repository(&self, id: &str) -> Result<bool> {
        let path = sources::list_path(&self.options.sources_dir, id);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(sources::parse(&content)
                .iter()
                .any(|line| line.kind == sources::SourceKind::Binary)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn add_repository(&self, source: &SourceEntry<'_>) -> Result<()> {
        let path = sources::list_path(&self.options.sources_dir, source.id);
        self.write_source_file(&path, &sources::render(source))?;
        log::info!("wrote {}", path.display());

        if self.options.update_after_add
            && let Err(e) = self.update_index(source)
        {
            self.remove_source_file(&path);
            return Err(e);
        }

        Ok(())
    }
}

/// Find an executable on PATH.
fn find_tool(name: &str) -> Result<String> {
    let Some(path_var) = std::env::var_os("PATH") else {
        return Err(Error::AptNotFound(name.to_string()));
    };

    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .map(|p| p.to_string_lossy().into_owned())
        .ok_or_else(|| Error::AptNotFound(name.to_string()))
}

/// Parse `dpkg-query -f '${Status}\t${Version}'` output.
///
/// Only the `installed` state counts; `config-files`, `half-installed` and
/// friends are treated as absent so they get (re)installed.
fn parse_dpkg_status(stdout: &str) -> PackageState {
    let line = stdout.lines().next().unwrap_or("");
    let (status, version) = line.split_once('\t').unwrap_or((line, ""));
    let state = status.split_whitespace().last().unwrap_or("");
    let version = version.trim();

    if state == "installed" && !version.is_empty() {
        PackageState::Installed {
            version: version.to_string(),
        }
    } else {
        PackageState::Absent
    }
}

/// Build `apt-get install` arguments.
fn install_args(
    name: &str,
    version: Option<&str>,
    options: &[String],
    force_yes: bool,
) -> Vec<String> {
    let mut args = vec!["install".to_string(), "-y".to_string(), "-q".to_string()];
    args.extend(options.iter().cloned());
    if force_yes && !options.iter().any(|o| o == "--force-yes") {
        args.push("--force-yes".to_string());
    }
    args.push(match version {
        Some(v) => format!("{name}={v}"),
        None => name.to_string(),
    });
    args
}

/// Find an `apt-get update` error line that concerns the given source.
fn update_failure_for<'a>(stderr: &'a str, uri: &str) -> Option<&'a str> {
    let uri = uri.trim_end_matches('/');
    stderr.lines().find(|line| {
        let line = line.trim_start();
        (line.starts_with("E:") || line.starts_with("W: Failed to fetch")) && line.contains(uri)
    })
}
