use std::{
    any::Any,
    collections::BTreeMap,
    sync::Arc,
};

use ngcore_di::{provide, Injectable, ProviderDecl, TypeInfo};

use crate::{config::Config, errors::ConfigError};

struct ConfigEntry {
    value: Arc<dyn Any + Send + Sync + 'static>,
    provider: ProviderDecl,
}

/// A registry of typed configs.
///
/// Each config type can be registered once. [`ConfigProvider::providers`] turns the registry
/// into value providers for an injector.
#[derive(Default)]
pub struct ConfigProvider {
    configs: BTreeMap<TypeInfo, ConfigEntry>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the config of type `T`, if registered
    pub fn get_config<T: Injectable>(&self) -> Option<Config<T>> {
        self.configs
            .get(&TypeInfo::of::<T>())
            .and_then(|entry| Arc::downcast::<T>(entry.value.clone()).ok())
            .map(Config::from_shared)
    }

    /// Like [`ConfigProvider::get_config`], but a missing config is an error
    pub fn require_config<T: Injectable>(&self) -> Result<Config<T>, ConfigError> {
        self.get_config::<T>()
            .ok_or_else(|| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Add a config to the registry.
    ///
    /// Fails with [`ConfigError::AlreadyRegistered`] if a config of the same type exists.
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();
        if self.configs.contains_key(&info) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        let shared = Arc::new(config);
        let provider = provide(Config::<T>::token()).use_value(Config::from_shared(shared.clone()));
        tracing::debug!("Registered config {}", info.type_name);

        self.configs.insert(
            info,
            ConfigEntry {
                value: shared,
                provider,
            },
        );
        Ok(self)
    }

    /// Adds the config if it is `Some`, does nothing otherwise
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    /// One value provider per registered config, provided as `Config<T>`
    pub fn providers(&self) -> Vec<ProviderDecl> {
        self.configs
            .values()
            .map(|entry| entry.provider.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
