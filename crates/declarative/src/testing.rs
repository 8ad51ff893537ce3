//! Recording in-memory adapter for engine tests

use aptkit::{Adapter, Error, PackageState, RetryConfig, SourceEntry};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    QueryPackage(String),
    InstallPackage(String, Option<String>),
    QueryRepository(String),
    AddRepository(String),
}

impl Call {
    pub(crate) fn is_mutating(&self) -> bool {
        matches!(self, Self::InstallPackage(..) | Self::AddRepository(_))
    }
}

#[derive(Default)]
struct State {
    installed: HashMap<String, String>,
    repositories: HashSet<String>,
    calls: Vec<Call>,
    // keyed by "install:<name>" / "add:<id>" / "query:<name>"
    failures: HashMap<String, VecDeque<Error>>,
}

#[derive(Default)]
pub(crate) struct FakeAdapter {
    state: Mutex<State>,
}

impl FakeAdapter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_package(self, name: &str, version: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .installed
            .insert(name.to_string(), version.to_string());
        self
    }

    pub(crate) fn fail_next(self, key: &str, error: Error) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(key.to_string())
            .or_default()
            .push_back(error);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub(crate) fn installed_version(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().installed.get(name).cloned()
    }

    fn record(&self, call: Call, key: String) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Adapter for FakeAdapter {
    fn query_package(&self, name: &str) -> aptkit::Result<PackageState> {
        self.record(Call::QueryPackage(name.to_string()), format!("query:{name}"))?;
        Ok(match self.state.lock().unwrap().installed.get(name) {
            Some(version) => PackageState::Installed {
                version: version.clone(),
            },
            None => PackageState::Absent,
        })
    }

    fn install_package(
        &self,
        name: &str,
        version: Option<&str>,
        _options: &[String],
    ) -> aptkit::Result<()> {
        self.record(
            Call::InstallPackage(name.to_string(), version.map(str::to_string)),
            format!("install:{name}"),
        )?;
        self.state.lock().unwrap().installed.insert(
            name.to_string(),
            version.unwrap_or("1.0-1").to_string(),
        );
        Ok(())
    }

    fn query_repository(&self, id: &str) -> aptkit::Result<bool> {
        self.record(Call::QueryRepository(id.to_string()), format!("query:{id}"))?;
        Ok(self.state.lock().unwrap().repositories.contains(id))
    }

    fn add_repository(&self, source: &SourceEntry<'_>) -> aptkit::Result<()> {
        self.record(
            Call::AddRepository(source.id.to_string()),
            format!("add:{}", source.id),
        )?;
        self.state
            .lock()
            .unwrap()
            .repositories
            .insert(source.id.to_string());
        Ok(())
    }
}

pub(crate) fn network_error() -> Error {
    Error::Network {
        message: "Could not resolve 'ppa.launchpad.net'".to_string(),
    }
}

pub(crate) fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay: Duration::ZERO,
        backoff_factor: 1.0,
        max_delay: Duration::ZERO,
    }
}

/// The OCaml toolchain descriptor: the PPA followed by five packages.
pub(crate) const OCAML_PPA: &str = r#"
[[resource]]
type = "repository"
id = "avsm-ppa-precise"
uri = "http://ppa.launchpad.net/avsm/ppa/ubuntu"
distribution = "precise"
components = ["main"]
include_source = true

[[resource]]
type = "package"
name = "ocaml"
version = "4.01.0-1ppa4~precise"

[[resource]]
type = "package"
name = "opam"

[[resource]]
type = "package"
name = "ocaml-native-compilers"

[[resource]]
type = "package"
name = "camlp4-extra"

[[resource]]
type = "package"
name = "m4"
"#;
