use std::{any::type_name, collections::HashMap, fmt::Debug, fmt::Display, sync::Arc};

use crate::{
    dependency_graph::DependencyGraph,
    errors::InjectError,
    factories::Args,
    key::Key,
    provider::{
        resolve_providers, Dependency, ProviderDecl, ResolvedProvider, Strategy, Visibility,
    },
    token::Token,
    types::{Injectable, Instance},
};

/// Index of an injector inside its [`InjectorTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InjectorId(usize);
impl Display for InjectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct InjectorNode {
    parent: Option<InjectorId>,
    host_boundary: bool,
    /// Fixed once the node is created
    providers: HashMap<Key, ResolvedProvider>,
    /// Singletons created by this node's providers
    instances: HashMap<Key, Instance>,
}

/// Arena of injectors.
///
/// Each injector owns its providers and the instances they produced, and may
/// have a parent. Lookups walk towards the root unless a dependency's
/// [`Visibility`] stops them earlier.
#[derive(Default)]
pub struct InjectorTree {
    nodes: Vec<InjectorNode>,
}
impl Debug for InjectorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for node in &self.nodes {
            let mut tokens = node
                .providers
                .keys()
                .map(|key| key.token().to_string())
                .collect::<Vec<_>>();
            tokens.sort();
            list.entry(&format_args!(
                "{{ parent: {:?}, host: {}, providers: {:?}, instantiated: {} }}",
                node.parent.map(|p| p.0),
                node.host_boundary,
                tokens,
                node.instances.len()
            ));
        }
        list.finish()
    }
}

/// Where in the walk a dependency was found
pub(crate) enum Located {
    Cached(Instance),
    Provider(InjectorId),
}

impl InjectorTree {
    pub fn new() -> Self {
        InjectorTree { nodes: Vec::new() }
    }

    /// Resolves `decls` and adds an injector below `parent`
    pub fn create(
        &mut self,
        parent: Option<InjectorId>,
        decls: impl IntoIterator<Item = ProviderDecl>,
    ) -> Result<InjectorId, InjectError> {
        let providers = resolve_providers(decls)?;
        self.create_resolved(parent, providers, false)
    }

    /// Like [`InjectorTree::create`], but `Host` lookups stop at the new injector
    pub fn create_host(
        &mut self,
        parent: Option<InjectorId>,
        decls: impl IntoIterator<Item = ProviderDecl>,
    ) -> Result<InjectorId, InjectError> {
        let providers = resolve_providers(decls)?;
        self.create_resolved(parent, providers, true)
    }

    pub fn create_resolved(
        &mut self,
        parent: Option<InjectorId>,
        providers: Vec<ResolvedProvider>,
        host_boundary: bool,
    ) -> Result<InjectorId, InjectError> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }

        let id = InjectorId(self.nodes.len());
        tracing::debug!(
            "Creating injector {id} with {} providers{}",
            providers.len(),
            if host_boundary { " as host" } else { "" }
        );

        let mut by_key = HashMap::with_capacity(providers.len());
        for provider in providers {
            if let Some(replaced) = by_key.insert(provider.key.clone(), provider) {
                tracing::debug!("Provider for {} overrides an earlier declaration", replaced.key);
            }
        }

        self.nodes.push(InjectorNode {
            parent,
            host_boundary,
            providers: by_key,
            instances: HashMap::new(),
        });
        Ok(id)
    }

    /// Gets the value for `token`, instantiating it and its dependencies on first use
    pub fn get(&mut self, id: InjectorId, token: impl Into<Token>) -> Result<Instance, InjectError> {
        let dependency = Dependency::required(token);
        self.resolve_dependency(id, &dependency, None, &mut Vec::new())?
            .ok_or_else(|| InjectError::NoProvider {
                token: dependency.token().clone(),
                requested_by: None,
            })
    }

    /// Like [`InjectorTree::get`], but a token nobody provides yields `None`
    pub fn get_optional(
        &mut self,
        id: InjectorId,
        token: impl Into<Token>,
    ) -> Result<Option<Instance>, InjectError> {
        let dependency = Dependency {
            optional: true,
            ..Dependency::required(token)
        };
        self.resolve_dependency(id, &dependency, None, &mut Vec::new())
    }

    /// Gets the value for `token` as `T`
    pub fn resolve<T: Injectable>(
        &mut self,
        id: InjectorId,
        token: impl Into<Token>,
    ) -> Result<Arc<T>, InjectError> {
        self.get(id, token)?
            .downcast()
            .map_err(|actual_type| InjectError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Gets the value provided for the class `T`
    pub fn require<T: Injectable>(&mut self, id: InjectorId) -> Result<Arc<T>, InjectError> {
        self.resolve::<T>(id, Token::of::<T>())
    }

    /// Whether the injector itself has a provider for `key`
    pub fn defines(&self, id: InjectorId, key: &Key) -> bool {
        self.nodes
            .get(id.0)
            .is_some_and(|node| node.providers.contains_key(key))
    }

    pub fn parent(&self, id: InjectorId) -> Option<InjectorId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn is_host(&self, id: InjectorId) -> bool {
        self.nodes.get(id.0).is_some_and(|node| node.host_boundary)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks everything visible from `id` for missing providers and cycles without instantiating
    pub fn check(&self, id: InjectorId) -> Result<(), InjectError> {
        self.node(id)?;
        DependencyGraph::new(self, id).check()?;
        Ok(())
    }

    pub(crate) fn providers(&self, id: InjectorId) -> impl Iterator<Item = &ResolvedProvider> {
        self.nodes
            .get(id.0)
            .into_iter()
            .flat_map(|node| node.providers.values())
    }

    pub(crate) fn provider(&self, id: InjectorId, key: &Key) -> Option<&ResolvedProvider> {
        self.nodes.get(id.0).and_then(|node| node.providers.get(key))
    }

    fn node(&self, id: InjectorId) -> Result<&InjectorNode, InjectError> {
        self.nodes.get(id.0).ok_or(InjectError::UnknownInjector(id.0))
    }

    /// Walks from `from` towards the root as far as `dependency` allows
    pub(crate) fn locate(&self, from: InjectorId, dependency: &Dependency) -> Option<Located> {
        let visibility = dependency.visibility;
        let mut current = match visibility.skips_self() {
            true => self.parent(from),
            false => Some(from),
        };

        while let Some(id) = current {
            let node = self.nodes.get(id.0)?;
            tracing::trace!("Looking up {} in injector {id}", dependency.key);

            if let Some(instance) = node.instances.get(&dependency.key) {
                return Some(Located::Cached(instance.clone()));
            }
            if node.providers.contains_key(&dependency.key) {
                return Some(Located::Provider(id));
            }

            if visibility == Visibility::SelfOnly
                || (visibility.stops_at_host() && node.host_boundary)
            {
                break;
            }
            current = node.parent;
        }

        None
    }

    fn resolve_dependency(
        &mut self,
        from: InjectorId,
        dependency: &Dependency,
        requested_by: Option<&Token>,
        path: &mut Vec<(InjectorId, Key)>,
    ) -> Result<Option<Instance>, InjectError> {
        self.node(from)?;

        match self.locate(from, dependency) {
            Some(Located::Cached(instance)) => Ok(Some(instance)),
            Some(Located::Provider(owner)) => self.instantiate(owner, &dependency.key, path).map(Some),
            None if dependency.optional => Ok(None),
            None => Err(InjectError::NoProvider {
                token: dependency.token().clone(),
                requested_by: requested_by.cloned(),
            }),
        }
    }

    /// Runs the provider for `key` at `owner` and caches the result there
    fn instantiate(
        &mut self,
        owner: InjectorId,
        key: &Key,
        path: &mut Vec<(InjectorId, Key)>,
    ) -> Result<Instance, InjectError> {
        let entry = (owner, key.clone());
        if let Some(start) = path.iter().position(|resolving| *resolving == entry) {
            let mut chain = path[start..]
                .iter()
                .map(|(_, key)| key.token().clone())
                .collect::<Vec<_>>();
            chain.push(key.token().clone());
            return Err(InjectError::CyclicDependency { chain });
        }

        let provider = self
            .provider(owner, key)
            .cloned()
            .ok_or_else(|| InjectError::NoProvider {
                token: key.token().clone(),
                requested_by: None,
            })?;

        path.push(entry);
        let result = self.run_provider(owner, &provider, path);
        path.pop();

        let instance = result?;
        tracing::debug!("Instantiated {} in injector {owner}", provider.key);
        if let Some(node) = self.nodes.get_mut(owner.0) {
            node.instances.insert(key.clone(), instance.clone());
        }
        Ok(instance)
    }

    fn run_provider(
        &mut self,
        owner: InjectorId,
        provider: &ResolvedProvider,
        path: &mut Vec<(InjectorId, Key)>,
    ) -> Result<Instance, InjectError> {
        let construct = match &provider.strategy {
            Strategy::Value(value) => return Ok(value.clone()),
            Strategy::Class { construct, .. } | Strategy::Factory(construct) => construct,
            Strategy::Existing(target) => {
                let alias = Dependency::required(target.token().clone());
                return self
                    .resolve_dependency(owner, &alias, Some(provider.token()), path)?
                    .ok_or_else(|| InjectError::NoProvider {
                        token: alias.token().clone(),
                        requested_by: Some(provider.token().clone()),
                    });
            }
        };

        let requester = provider.requester();
        let mut values = Vec::with_capacity(provider.dependencies.len());
        for dependency in &provider.dependencies {
            values.push(self.resolve_dependency(owner, dependency, Some(&requester), path)?);
        }

        construct(&Args::new(values)).map_err(|error| InjectError::ConstructionFailed {
            token: provider.token().clone(),
            error: Arc::new(error),
        })
    }
}
