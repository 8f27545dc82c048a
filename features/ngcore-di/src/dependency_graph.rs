use std::collections::HashSet;

use thiserror::Error;

use crate::{
    injector::{InjectorId, InjectorTree, Located},
    key::Key,
    provider::ResolvedProvider,
    token::Token,
};

/// Static view of every provider visible from one injector.
///
/// Used to report all missing dependencies and cycles at once, before anything is instantiated.
pub struct DependencyGraph<'a> {
    tree: &'a InjectorTree,
    root: InjectorId,
}
impl<'a> DependencyGraph<'a> {
    pub fn new(tree: &'a InjectorTree, root: InjectorId) -> Self {
        Self { tree, root }
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();

        let mut current = Some(self.root);
        while let Some(id) = current {
            let mut providers = self.tree.providers(id).collect::<Vec<_>>();
            // HashMap order would make the report order random
            providers.sort_by_key(|provider| provider.key.id());

            for provider in providers {
                let mut dependency_chain = Vec::new();
                check_recurse(
                    self,
                    &mut checked,
                    &mut errors,
                    &mut dependency_chain,
                    id,
                    provider,
                );
            }
            current = self.tree.parent(id);
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph<'_>,
            checked: &mut HashSet<(InjectorId, Key)>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<(InjectorId, Key)>,
            owner: InjectorId,
            provider: &ResolvedProvider,
        ) {
            let entry = (owner, provider.key.clone());

            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|link| *link == entry) {
                let mut chain = dependency_chain[start..]
                    .iter()
                    .map(|(_, key)| key.token().clone())
                    .collect::<Vec<_>>();
                chain.push(provider.token().clone()); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency { chain });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(entry.clone()) {
                return;
            };

            dependency_chain.push(entry);

            for dependency in &provider.dependencies {
                match graph.tree.locate(owner, dependency) {
                    Some(Located::Provider(next_owner)) => {
                        if let Some(next) = graph.tree.provider(next_owner, &dependency.key) {
                            check_recurse(graph, checked, errors, dependency_chain, next_owner, next);
                        }
                    }
                    // Already instantiated, nothing left to build
                    Some(Located::Cached(_)) => {}
                    None if dependency.optional => {}
                    None => errors.push(DependencyGraphError::MissingDependency {
                        dependency: dependency.token().clone(),
                        required_by: provider.requester(),
                    }),
                }
            }

            dependency_chain.pop();
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("{required_by} needs {dependency} but it is missing")]
    MissingDependency {
        dependency: Token,
        required_by: Token,
    },
    #[error("A Circular Dependency exists through {chain:?}")]
    CircularDependency { chain: Vec<Token> },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
