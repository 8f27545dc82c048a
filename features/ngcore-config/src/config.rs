use std::{fmt::Debug, ops::Deref, sync::Arc};

use ngcore_di::{Injectable, Token};

/// A wrapper type to allow for config injections
///
/// Every config registered on a [`ConfigProvider`](crate::provider::ConfigProvider) is provided
/// under the class token of `Config<T>`, so a class only has to declare the parameter type.
///
/// # Example
/// ```rust
/// use ngcore_config::{config::Config, provider::ConfigProvider};
/// use ngcore_di::{decorators::ClassDecl, Args, Class, DynError, InjectorTree, ProviderDecl};
///
/// pub struct ServerConfig {
///     port: u16,
/// }
///
/// struct Server {
///     config: Config<ServerConfig>,
/// }
/// impl Class for Server {
///     fn construct(args: &Args) -> Result<Self, DynError> {
///         Ok(Server { config: args.value(0)? })
///     }
/// }
///
/// ClassDecl::<Server>::new()
///     .param_type::<Config<ServerConfig>>(0)
///     .register();
///
/// let mut configs = ConfigProvider::new();
/// configs.add_config(ServerConfig { port: 8080 }).unwrap();
///
/// let mut tree = InjectorTree::new();
/// let root = tree
///     .create(None, configs.providers().into_iter().chain([ProviderDecl::class::<Server>()]))
///     .unwrap();
///
/// assert_eq!(tree.require::<Server>(root).unwrap().config.port, 8080);
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
impl<T: Debug> Debug for Config<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Config").field(&self.inner).finish()
    }
}
impl<T> Config<T> {
    pub fn new(config: T) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }

    pub fn from_shared(inner: Arc<T>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}
impl<T: Injectable> Config<T> {
    /// Token the config is provided under
    pub fn token() -> Token {
        Token::of::<Config<T>>()
    }
}
