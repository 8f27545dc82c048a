use ngcore_di::TypeInfo;

/// Errors when registering or looking up a config
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A config of this type is already registered
    #[error("Config '{}' is already registered", .0.type_name)]
    AlreadyRegistered(TypeInfo),
    #[error("Config '{}' is not registered", .0.type_name)]
    Missing(TypeInfo),
}
