//! Execution planner - orders resources and builds execution plans

use crate::descriptor::Descriptor;
use crate::error::{DescriptorError, ValidationError};
use crate::types::Resource;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Compute the apply order of resources.
///
/// Stable topological sort over `depends_on`: among resources whose
/// dependencies are satisfied, the lowest declaration index goes first, so
/// without explicit dependencies the order is the declaration order.
///
/// Ids must already be unique. On failure returns the index of the
/// offending resource together with the error.
pub(crate) fn apply_order(resources: &[Resource]) -> Result<Vec<usize>, (usize, ValidationError)> {
    let index_of: HashMap<&str, usize> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id(), i))
        .collect();

    let mut indegree = vec![0usize; resources.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];

    for (i, resource) in resources.iter().enumerate() {
        for dep in resource.depends_on() {
            let Some(&j) = index_of.get(dep.as_str()) else {
                return Err((i, ValidationError::UnknownDependency(dep.clone())));
            };
            indegree[i] += 1;
            dependents[j].push(i);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(resources.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &k in &dependents[i] {
            indegree[k] -= 1;
            if indegree[k] == 0 {
                ready.push(Reverse(k));
            }
        }
    }

    if order.len() < resources.len() {
        let stuck: Vec<usize> = (0..resources.len()).filter(|&i| indegree[i] > 0).collect();
        let ids = stuck.iter().map(|&i| resources[i].id().to_string()).collect();
        return Err((stuck[0], ValidationError::DependencyCycle(ids)));
    }

    Ok(order)
}

/// One resource scheduled for apply.
#[derive(Debug, Clone, Copy)]
pub struct PlannedStep<'a> {
    /// Declaration index (0-based)
    pub index: usize,
    /// The resource
    pub resource: &'a Resource,
}

/// Resources of a descriptor in apply order
#[derive(Debug, Clone)]
pub struct ExecutionPlan<'a> {
    steps: Vec<PlannedStep<'a>>,
}

impl<'a> ExecutionPlan<'a> {
    /// Plan every resource of a validated descriptor.
    pub fn from_descriptor(descriptor: &'a Descriptor) -> Self {
        let resources = descriptor.resources();
        Self {
            steps: descriptor
                .order()
                .iter()
                .map(|&index| PlannedStep {
                    index,
                    resource: &resources[index],
                })
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Resource) -> bool,
    {
        Self {
            steps: self
                .steps
                .into_iter()
                .filter(|s| predicate(s.resource))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type", "type.id" or a bare id
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let target = Target::parse(t);
                self.filter(|r| target.matches(r))
            }
        }
    }

    /// Plan for a descriptor, narrowed to `target` when one is given.
    ///
    /// A target that selects nothing is an error rather than an empty plan.
    pub fn for_target(
        descriptor: &'a Descriptor,
        target: Option<&str>,
    ) -> Result<Self, DescriptorError> {
        let plan = Self::from_descriptor(descriptor).filter_by_target(target);
        match target {
            Some(t) if plan.is_empty() => Err(DescriptorError::UnmatchedTarget(t.to_string())),
            _ => Ok(plan),
        }
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in apply order
    pub fn iter(&self) -> impl Iterator<Item = &PlannedStep<'a>> {
        self.steps.iter()
    }
}

/// Canonical type name for a target type or one of its aliases
fn resource_type_alias(name: &str) -> Option<&'static str> {
    match name {
        "package" | "packages" | "pkg" => Some("package"),
        "repository" | "repositories" | "repo" | "repos" => Some("repository"),
        _ => None,
    }
}

/// A parsed `--only` target
#[derive(Debug, PartialEq, Eq)]
enum Target<'t> {
    /// Every resource of a type
    Type(&'static str),
    /// One resource of a type
    Typed(&'static str, &'t str),
    /// One resource of any type
    Id(&'t str),
}

impl<'t> Target<'t> {
    /// Only the first dot separates, and only after a known type;
    /// anything else is a bare id, so `libc6.1` stays whole.
    fn parse(target: &'t str) -> Self {
        if let Some(kind) = resource_type_alias(target) {
            return Self::Type(kind);
        }
        match target.split_once('.') {
            Some((t, id)) => match resource_type_alias(t) {
                Some(kind) => Self::Typed(kind, id),
                None => Self::Id(target),
            },
            None => Self::Id(target),
        }
    }

    fn matches(&self, resource: &Resource) -> bool {
        match *self {
            Self::Type(kind) => resource.resource_type() == kind,
            Self::Typed(kind, id) => resource.resource_type() == kind && resource.id() == id,
            Self::Id(id) => resource.id() == id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackageResource, RepositoryResource};

    fn package(name: &str, depends_on: &[&str]) -> Resource {
        Resource::Package(PackageResource {
            name: name.to_string(),
            version: None,
            install_options: vec![],
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn repository(id: &str) -> Resource {
        Resource::Repository(RepositoryResource {
            id: id.to_string(),
            uri: "http://ppa.launchpad.net/avsm/ppa/ubuntu".to_string(),
            distribution: "precise".to_string(),
            components: vec!["main".to_string()],
            include_source: false,
            depends_on: vec![],
        })
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(Target::parse("package"), Target::Type("package"));
        assert_eq!(Target::parse("repos"), Target::Type("repository"));
        assert_eq!(Target::parse("package.ocaml"), Target::Typed("package", "ocaml"));
        assert_eq!(
            Target::parse("pkg.libc6.1"),
            Target::Typed("package", "libc6.1")
        );
        assert_eq!(Target::parse("ocaml"), Target::Id("ocaml"));
        assert_eq!(Target::parse("libc6.1"), Target::Id("libc6.1"));
    }

    #[test]
    fn test_order_is_declaration_order_without_dependencies() {
        let resources = vec![package("a", &[]), repository("r"), package("b", &[])];
        assert_eq!(apply_order(&resources).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dependency_moves_resource_later() {
        let resources = vec![
            package("ocaml", &["ppa"]),
            package("m4", &[]),
            repository("ppa"),
            package("opam", &[]),
        ];
        // ocaml waits for ppa; independent resources keep their order.
        assert_eq!(apply_order(&resources).unwrap(), vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_unknown_dependency() {
        let resources = vec![package("a", &[]), package("b", &["missing"])];
        assert_eq!(
            apply_order(&resources),
            Err((1, ValidationError::UnknownDependency("missing".to_string())))
        );
    }

    #[test]
    fn test_cycle_and_self_reference() {
        let resources = vec![package("a", &["b"]), package("b", &["a"])];
        assert_eq!(
            apply_order(&resources),
            Err((
                0,
                ValidationError::DependencyCycle(vec!["a".to_string(), "b".to_string()])
            ))
        );

        let resources = vec![package("a", &[]), package("b", &["b"])];
        assert!(matches!(
            apply_order(&resources),
            Err((1, ValidationError::DependencyCycle(_)))
        ));
    }

    #[test]
    fn test_matches_filter() {
        let pkg = package("ocaml", &[]);
        let repo = repository("ppa");
        assert!(Target::parse("package").matches(&pkg));
        assert!(Target::parse("packages.ocaml").matches(&pkg));
        assert!(!Target::parse("package.ocam").matches(&pkg));
        assert!(!Target::parse("repository").matches(&pkg));
        assert!(Target::parse("repositories.ppa").matches(&repo));
        assert!(!Target::parse("package.ppa").matches(&repo));
        assert!(Target::parse("ppa").matches(&repo));
        assert!(!Target::parse("bogus").matches(&repo));
    }

    #[test]
    fn test_bare_id_selects_resource() {
        let descriptor = Descriptor::new(vec![
            repository("ppa"),
            package("ocaml", &["ppa"]),
            package("m4", &[]),
        ])
        .unwrap();

        let plan = ExecutionPlan::for_target(&descriptor, Some("ocaml")).unwrap();
        let ids: Vec<&str> = plan.iter().map(|s| s.resource.id()).collect();
        assert_eq!(ids, vec!["ocaml"]);
    }

    #[test]
    fn test_unmatched_target_is_error() {
        let descriptor = Descriptor::new(vec![repository("ppa"), package("m4", &[])]).unwrap();

        let err = ExecutionPlan::for_target(&descriptor, Some("ocaml")).unwrap_err();
        assert!(matches!(err, DescriptorError::UnmatchedTarget(ref t) if t == "ocaml"));

        assert_eq!(ExecutionPlan::for_target(&descriptor, None).unwrap().len(), 2);
        assert_eq!(
            ExecutionPlan::for_target(&descriptor, Some("repo")).unwrap().len(),
            1
        );
    }
}
