use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    errors::ProviderError,
    factories::{class_constructor, Args, Class, Construct},
    key::Key,
    metadata::Metadata,
    reflector::{reflector, Reflector},
    token::{OpaqueToken, Token},
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// Where a dependency may be looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// The injector itself and all its ancestors
    #[default]
    None,
    /// Only the injector itself
    SelfOnly,
    /// All ancestors, but not the injector itself
    SkipSelf,
    /// The injector and its ancestors up to and including the nearest host boundary
    Host,
    /// Like `Host`, starting at the parent
    HostSkipSelf,
}

impl Visibility {
    /// Lookup starts at the parent
    pub fn skips_self(self) -> bool {
        matches!(self, Visibility::SkipSelf | Visibility::HostSkipSelf)
    }

    /// Lookup stops at the nearest host boundary
    pub fn stops_at_host(self) -> bool {
        matches!(self, Visibility::Host | Visibility::HostSkipSelf)
    }
}

/// One resolved dependency of a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub key: Key,
    pub optional: bool,
    pub visibility: Visibility,
}

impl Dependency {
    /// Plain required dependency looked up through all ancestors
    pub fn required(token: impl Into<Token>) -> Self {
        Dependency {
            key: Key::get(token),
            optional: false,
            visibility: Visibility::None,
        }
    }

    /// Combines `token` with the metadata attached next to it.
    ///
    /// An `Inject` in `metadata` overrides `token`.
    pub fn from_metadata(
        owner: &Token,
        token: Token,
        metadata: &[Metadata],
    ) -> Result<Self, ProviderError> {
        let token = metadata
            .iter()
            .find_map(Metadata::token)
            .cloned()
            .unwrap_or(token);

        let has = |kind: &Metadata| metadata.contains(kind);
        let visibility = match (has(&Metadata::SelfOnly), has(&Metadata::SkipSelf), has(&Metadata::Host)) {
            (false, false, false) => Visibility::None,
            (true, false, false) => Visibility::SelfOnly,
            (false, true, false) => Visibility::SkipSelf,
            (false, false, true) => Visibility::Host,
            (false, true, true) => Visibility::HostSkipSelf,
            (true, _, _) => {
                return Err(ProviderError::InvalidProvider {
                    token: owner.clone(),
                    reason: format!("dependency {token} combines @Self() with @SkipSelf() or @Host()"),
                })
            }
        };

        Ok(Dependency {
            key: Key::get(token),
            optional: has(&Metadata::Optional),
            visibility,
        })
    }

    pub fn token(&self) -> &Token {
        self.key.token()
    }
}

/// A factory dependency: a token plus the metadata a parameter would carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepDecl {
    pub token: Token,
    pub metadata: Vec<Metadata>,
}

impl DepDecl {
    pub fn new(token: impl Into<Token>) -> Self {
        DepDecl {
            token: token.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    pub fn optional(self) -> Self {
        self.with(Metadata::Optional)
    }
}

impl From<Token> for DepDecl {
    fn from(token: Token) -> Self {
        DepDecl::new(token)
    }
}
impl From<&'static str> for DepDecl {
    fn from(token: &'static str) -> Self {
        DepDecl::new(token)
    }
}
impl From<String> for DepDecl {
    fn from(token: String) -> Self {
        DepDecl::new(token)
    }
}
impl From<OpaqueToken> for DepDecl {
    fn from(token: OpaqueToken) -> Self {
        DepDecl::new(token)
    }
}
impl From<TypeInfo> for DepDecl {
    fn from(class: TypeInfo) -> Self {
        DepDecl::new(class)
    }
}

#[derive(Clone)]
struct ClassBinding {
    class: TypeInfo,
    construct: Construct,
}

#[derive(Clone)]
struct FactoryBinding {
    construct: Construct,
    deps: Vec<DepDecl>,
}

/// A provider as the application declares it.
///
/// Either a bare class, or a `provide(token)` record using exactly one of
/// `use_class`, `use_value`, `use_factory` or `use_existing`. Records are only
/// validated by [`resolve_providers`].
#[derive(Clone)]
pub struct ProviderDecl {
    token: Token,
    use_class: Option<ClassBinding>,
    use_value: Option<Instance>,
    use_factory: Option<FactoryBinding>,
    use_existing: Option<Token>,
}
impl Debug for ProviderDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut decl = f.debug_struct("ProviderDecl");
        decl.field("provide", &self.token);
        if let Some(binding) = &self.use_class {
            decl.field("use_class", &binding.class);
        }
        if let Some(value) = &self.use_value {
            decl.field("use_value", value);
        }
        if let Some(binding) = &self.use_factory {
            decl.field("use_factory", &binding.deps);
        }
        if let Some(existing) = &self.use_existing {
            decl.field("use_existing", existing);
        }
        decl.finish()
    }
}

/// Starts a provider record for `token`
pub fn provide(token: impl Into<Token>) -> ProviderDecl {
    ProviderDecl {
        token: token.into(),
        use_class: None,
        use_value: None,
        use_factory: None,
        use_existing: None,
    }
}

impl ProviderDecl {
    /// Shorthand for `provide(Token::of::<T>()).use_class::<T>()`
    pub fn class<T: Class>() -> Self {
        provide(Token::of::<T>()).use_class::<T>()
    }

    pub fn use_class<T: Class>(mut self) -> Self {
        self.use_class = Some(ClassBinding {
            class: TypeInfo::of::<T>(),
            construct: class_constructor::<T>(),
        });
        self
    }

    pub fn use_value<T: Injectable>(mut self, value: T) -> Self {
        self.use_value = Some(Instance::new(value));
        self
    }

    pub fn use_factory<T, F, D>(mut self, factory: F, deps: impl IntoIterator<Item = D>) -> Self
    where
        T: Injectable,
        F: Fn(&Args) -> Result<T, DynError> + Send + Sync + 'static,
        D: Into<DepDecl>,
    {
        self.use_factory = Some(FactoryBinding {
            construct: Arc::new(move |args| factory(args).map(Instance::new)),
            deps: deps.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn use_existing(mut self, token: impl Into<Token>) -> Self {
        self.use_existing = Some(token.into());
        self
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

/// How a resolved provider produces its value
#[derive(Clone)]
pub enum Strategy {
    /// Instantiate a class with the dependencies in parameter order
    Class { class: TypeInfo, construct: Construct },
    Value(Instance),
    Factory(Construct),
    /// Alias of the key which is the single dependency
    Existing(Key),
}
impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Class { .. } => StrategyKind::Class,
            Strategy::Value(_) => StrategyKind::Value,
            Strategy::Factory(_) => StrategyKind::Factory,
            Strategy::Existing(_) => StrategyKind::Existing,
        }
    }
}
impl Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Class { class, .. } => f.debug_tuple("Class").field(class).finish(),
            Strategy::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Strategy::Factory(_) => f.write_str("Factory"),
            Strategy::Existing(key) => f.debug_tuple("Existing").field(key).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Class,
    Value,
    Factory,
    Existing,
}

/// A validated provider bound to its key
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub key: Key,
    pub strategy: Strategy,
    pub dependencies: Vec<Dependency>,
}

impl ResolvedProvider {
    pub fn token(&self) -> &Token {
        self.key.token()
    }

    /// Who asks for the dependencies: the class for class providers, the token otherwise
    pub fn requester(&self) -> Token {
        match &self.strategy {
            Strategy::Class { class, .. } => Token::Class(*class),
            _ => self.token().clone(),
        }
    }
}

/// Validates declarations against the process wide reflector, see [`resolve_providers_with`]
pub fn resolve_providers(
    decls: impl IntoIterator<Item = ProviderDecl>,
) -> Result<Vec<ResolvedProvider>, ProviderError> {
    resolve_providers_with(reflector(), decls)
}

/// Turns declarations into keyed providers.
///
/// When several declarations share a key the last one wins; it takes the
/// position of the first.
pub fn resolve_providers_with(
    reflector: &Reflector,
    decls: impl IntoIterator<Item = ProviderDecl>,
) -> Result<Vec<ResolvedProvider>, ProviderError> {
    let mut resolved: Vec<ResolvedProvider> = Vec::new();
    let mut positions: HashMap<Key, usize> = HashMap::new();

    for decl in decls {
        let provider = resolve_provider(reflector, decl)?;
        match positions.get(&provider.key) {
            Some(&position) => {
                tracing::debug!("Provider for {} overrides an earlier declaration", provider.key);
                resolved[position] = provider;
            }
            None => {
                positions.insert(provider.key.clone(), resolved.len());
                resolved.push(provider);
            }
        }
    }

    Ok(resolved)
}

fn resolve_provider(
    reflector: &Reflector,
    decl: ProviderDecl,
) -> Result<ResolvedProvider, ProviderError> {
    let ProviderDecl {
        token,
        use_class,
        use_value,
        use_factory,
        use_existing,
    } = decl;

    let invalid = |reason: &str| ProviderError::InvalidProvider {
        token: token.clone(),
        reason: reason.to_string(),
    };

    let (strategy, dependencies) = match (use_class, use_value, use_factory, use_existing) {
        (Some(ClassBinding { class, construct }), None, None, None) => {
            let dependencies = class_dependencies(reflector, &token, class)?;
            (Strategy::Class { class, construct }, dependencies)
        }
        (None, Some(value), None, None) => (Strategy::Value(value), Vec::new()),
        (None, None, Some(FactoryBinding { construct, deps }), None) => {
            let dependencies = deps
                .into_iter()
                .map(|dep| Dependency::from_metadata(&token, dep.token, &dep.metadata))
                .collect::<Result<Vec<_>, _>>()?;
            (Strategy::Factory(construct), dependencies)
        }
        (None, None, None, Some(existing)) => {
            let target = Key::get(existing);
            let alias = Dependency {
                key: target.clone(),
                optional: false,
                visibility: Visibility::None,
            };
            (Strategy::Existing(target), vec![alias])
        }
        (None, None, None, None) => {
            return Err(invalid(
                "expected one of use_class, use_value, use_factory or use_existing",
            ))
        }
        _ => {
            return Err(invalid(
                "only one of use_class, use_value, use_factory or use_existing may be set",
            ))
        }
    };

    Ok(ResolvedProvider {
        key: Key::get(token),
        strategy,
        dependencies,
    })
}

/// Dependencies of `class` from its reflected constructor parameters
fn class_dependencies(
    reflector: &Reflector,
    owner: &Token,
    class: TypeInfo,
) -> Result<Vec<Dependency>, ProviderError> {
    reflector
        .parameters(class)
        .into_iter()
        .enumerate()
        .map(|(index, param)| {
            let token = param
                .metadata
                .iter()
                .find_map(Metadata::token)
                .or(param.type_token.as_ref())
                .cloned()
                .ok_or(ProviderError::NoAnnotation {
                    class: Token::Class(class),
                    index,
                })?;
            Dependency::from_metadata(owner, token, &param.metadata)
        })
        .collect()
}
