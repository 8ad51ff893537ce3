//! Resource behavior: identity, validation, state query and convergence

use crate::error::ValidationError;
use crate::types::{PackageResource, RepositoryResource, Resource, ResourceState};
use aptkit::{Adapter, PackageState, SourceEntry};
use regex::Regex;
use std::sync::LazyLock;

/// Debian package name: lowercase alphanumerics plus `+ . -`, at least two chars.
static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9+.\-]+$").expect("valid regex"));

static VERSION_EPOCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

static VERSION_UPSTREAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9][A-Za-z0-9.+~:\-]*$").expect("valid regex"));

static VERSION_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.+~]+$").expect("valid regex"));

/// Repository id: the characters APT accepts in a `sources.list.d` file name.
static REPOSITORY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("valid regex"));

static REPOSITORY_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:https?|ftp|file|mirror)://[^\s]+$").expect("valid regex")
});

/// Check a version string against `[epoch:]upstream[-revision]`.
///
/// The epoch ends at the first colon and the revision starts after the
/// last hyphen, so upstream may only contain `:` when an epoch is given
/// and `-` when a revision is given.
pub fn is_valid_version(version: &str) -> bool {
    let (epoch, rest) = match version.split_once(':') {
        Some((epoch, rest)) => (Some(epoch), rest),
        None => (None, version),
    };
    if epoch.is_some_and(|e| !VERSION_EPOCH.is_match(e)) {
        return false;
    }

    let (upstream, revision) = match rest.rsplit_once('-') {
        Some((upstream, revision)) => (upstream, Some(revision)),
        None => (rest, None),
    };
    if revision.is_some_and(|r| !VERSION_REVISION.is_match(r)) {
        return false;
    }

    VERSION_UPSTREAM.is_match(upstream)
}

impl PackageResource {
    /// Check the package invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !PACKAGE_NAME.is_match(&self.name) {
            return Err(ValidationError::InvalidName(self.name.clone()));
        }
        if let Some(version) = &self.version
            && !is_valid_version(version)
        {
            return Err(ValidationError::MalformedVersion(version.clone()));
        }
        Ok(())
    }
}

impl RepositoryResource {
    /// Check the repository invariants that need no other resource.
    ///
    /// Id uniqueness is checked by the descriptor.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !REPOSITORY_ID.is_match(&self.id) {
            return Err(ValidationError::InvalidId(self.id.clone()));
        }
        if self.uri.is_empty() {
            return Err(ValidationError::EmptyUri);
        }
        if !REPOSITORY_URI.is_match(&self.uri) {
            return Err(ValidationError::InvalidUri(self.uri.clone()));
        }
        if self.distribution.trim().is_empty() {
            return Err(ValidationError::EmptyDistribution);
        }
        if self.components.iter().all(|c| c.trim().is_empty()) {
            return Err(ValidationError::NoComponents);
        }
        Ok(())
    }

    /// View as an adapter source entry.
    pub fn source_entry(&self) -> SourceEntry<'_> {
        SourceEntry {
            id: &self.id,
            uri: &self.uri,
            distribution: &self.distribution,
            components: &self.components,
            include_source: self.include_source,
        }
    }
}

impl Resource {
    /// Unique identifier: the repository id or the package name.
    pub fn id(&self) -> &str {
        match self {
            Self::Repository(r) => &r.id,
            Self::Package(p) => &p.name,
        }
    }

    /// Type name used in display ids and target filters.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Repository(_) => "repository",
            Self::Package(_) => "package",
        }
    }

    /// `type:id`, as shown in reports and errors.
    pub fn display_id(&self) -> String {
        format!("{}:{}", self.resource_type(), self.id())
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::Repository(r) => format!(
                "{} {} {}",
                r.uri,
                r.distribution,
                r.components.join(" ")
            ),
            Self::Package(p) => match &p.version {
                Some(v) => format!("{}={v}", p.name),
                None => p.name.clone(),
            },
        }
    }

    /// Ids that must be applied before this resource.
    pub fn depends_on(&self) -> &[String] {
        match self {
            Self::Repository(r) => &r.depends_on,
            Self::Package(p) => &p.depends_on,
        }
    }

    /// Check the invariants of this resource on its own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Repository(r) => r.validate(),
            Self::Package(p) => p.validate(),
        }
    }

    /// Drop duplicate components and dependencies, keeping first occurrence.
    pub(crate) fn normalize(&mut self) {
        match self {
            Self::Repository(r) => {
                r.components.retain(|c| !c.trim().is_empty());
                dedup_in_order(&mut r.components);
                dedup_in_order(&mut r.depends_on);
            }
            Self::Package(p) => dedup_in_order(&mut p.depends_on),
        }
    }

    /// State this resource declares.
    pub fn desired_state(&self) -> ResourceState {
        match self {
            Self::Repository(_) => ResourceState::Present { details: None },
            Self::Package(p) => ResourceState::Present {
                details: p.version.clone(),
            },
        }
    }

    /// Ask the adapter for the current state.
    pub fn current_state<A: Adapter + ?Sized>(&self, adapter: &A) -> aptkit::Result<ResourceState> {
        match self {
            Self::Repository(r) => Ok(if adapter.query_repository(&r.id)? {
                ResourceState::Present { details: None }
            } else {
                ResourceState::Absent
            }),
            Self::Package(p) => Ok(match adapter.query_package(&p.name)? {
                PackageState::Installed { version } => ResourceState::Present {
                    details: Some(version),
                },
                PackageState::Absent => ResourceState::Absent,
            }),
        }
    }

    /// Make the one mutating adapter call that realizes this resource.
    pub fn converge<A: Adapter + ?Sized>(&self, adapter: &A) -> aptkit::Result<()> {
        match self {
            Self::Repository(r) => adapter.add_repository(&r.source_entry()),
            Self::Package(p) => {
                adapter.install_package(&p.name, p.version.as_deref(), &p.install_options)
            }
        }
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, version: Option<&str>) -> PackageResource {
        PackageResource {
            name: name.to_string(),
            version: version.map(str::to_string),
            install_options: vec![],
            depends_on: vec![],
        }
    }

    fn ppa() -> RepositoryResource {
        RepositoryResource {
            id: "avsm-ppa-precise".to_string(),
            uri: "http://ppa.launchpad.net/avsm/ppa/ubuntu".to_string(),
            distribution: "precise".to_string(),
            components: vec!["main".to_string()],
            include_source: true,
            depends_on: vec![],
        }
    }

    #[test]
    fn test_version_grammar() {
        for ok in ["4.01.0-1ppa4~precise", "1:2.3", "2.0", "1:1.2-3-4", "0.9+dfsg-1"] {
            assert!(is_valid_version(ok), "{ok} should be valid");
        }
        for bad in ["abc", "1.0-", "", "a:1.0", "1.0 beta", "-1", "1:"] {
            assert!(!is_valid_version(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_package_validate() {
        assert!(package("ocaml-native-compilers", None).validate().is_ok());
        assert!(package("m4", None).validate().is_ok());
        assert_eq!(package("", None).validate(), Err(ValidationError::EmptyName));
        assert_eq!(
            package("OCaml", None).validate(),
            Err(ValidationError::InvalidName("OCaml".to_string()))
        );
        assert_eq!(
            package("ocaml", Some("latest")).validate(),
            Err(ValidationError::MalformedVersion("latest".to_string()))
        );
    }

    #[test]
    fn test_repository_validate() {
        assert!(ppa().validate().is_ok());

        let mut r = ppa();
        r.uri = String::new();
        assert_eq!(r.validate(), Err(ValidationError::EmptyUri));

        let mut r = ppa();
        r.uri = "ppa:avsm/ppa".to_string();
        assert_eq!(
            r.validate(),
            Err(ValidationError::InvalidUri("ppa:avsm/ppa".to_string()))
        );

        let mut r = ppa();
        r.components.clear();
        assert_eq!(r.validate(), Err(ValidationError::NoComponents));

        let mut r = ppa();
        r.distribution = " ".to_string();
        assert_eq!(r.validate(), Err(ValidationError::EmptyDistribution));
    }

    #[test]
    fn test_repository_id_must_be_a_file_name() {
        // `vendor:stable` would share `vendor_stable.list` with `vendor_stable`
        for id in ["vendor:stable", "avsm/ppa", "ppa precise", ".hidden"] {
            let mut r = ppa();
            r.id = id.to_string();
            assert_eq!(r.validate(), Err(ValidationError::InvalidId(id.to_string())));
        }

        let mut r = ppa();
        r.id = "vendor_stable.v2-x".to_string();
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_identity() {
        let repo = Resource::Repository(ppa());
        assert_eq!(repo.id(), "avsm-ppa-precise");
        assert_eq!(repo.display_id(), "repository:avsm-ppa-precise");
        assert_eq!(
            repo.description(),
            "http://ppa.launchpad.net/avsm/ppa/ubuntu precise main"
        );

        let pkg = Resource::Package(package("ocaml", Some("4.01.0-1ppa4~precise")));
        assert_eq!(pkg.display_id(), "package:ocaml");
        assert_eq!(pkg.description(), "ocaml=4.01.0-1ppa4~precise");
    }

    #[test]
    fn test_normalize_dedups_in_order() {
        let mut r = ppa();
        r.components = vec![
            "main".to_string(),
            "universe".to_string(),
            "main".to_string(),
        ];
        let mut resource = Resource::Repository(r);
        resource.normalize();
        let Resource::Repository(r) = resource else {
            unreachable!()
        };
        assert_eq!(r.components, vec!["main", "universe"]);
    }

    #[test]
    fn test_desired_state_carries_pin() {
        let pkg = Resource::Package(package("ocaml", Some("4.01.0-1ppa4~precise")));
        assert_eq!(
            pkg.desired_state(),
            ResourceState::Present {
                details: Some("4.01.0-1ppa4~precise".to_string())
            }
        );
        assert_eq!(
            Resource::Package(package("m4", None)).desired_state(),
            ResourceState::Present { details: None }
        );
    }
}
