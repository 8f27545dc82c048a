use std::sync::Arc;

use thiserror::Error;

use crate::{dependency_graph::DependencyGraphErrors, token::Token, types::DynError};

/// Errors while getting a value out of an injector
#[derive(Error, Debug, Clone)]
pub enum InjectError {
    /// Nothing in the reachable injectors provides the token
    #[error("No provider for {token}{}", requested_by.as_ref().map(|by| format!(" (required by {by})")).unwrap_or_default())]
    NoProvider {
        token: Token,
        requested_by: Option<Token>,
    },
    /// The token is already being resolved further up the current path
    #[error("Cannot instantiate cyclic dependency: {}", format_chain(chain))]
    CyclicDependency { chain: Vec<Token> },
    /// A constructor or factory returned an error
    #[error("Constructing {token} failed - error: {error}")]
    ConstructionFailed { token: Token, error: Arc<DynError> },
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// The injector id does not belong to this tree
    #[error("Unknown injector #{0}")]
    UnknownInjector(usize),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    DependencyGraph(#[from] DependencyGraphErrors),
}

/// Structurally invalid provider declarations, reported before an injector exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Invalid provider for {token}: {reason}")]
    InvalidProvider { token: Token, reason: String },
    /// A constructor parameter has neither an `Inject` token nor a declared type
    #[error("Cannot resolve parameter {index} of {class}, declare its type or add @Inject()")]
    NoAnnotation { class: Token, index: usize },
}

/// Errors when reading constructor arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("Constructor argument {index} does not exist, {len} were resolved")]
    OutOfRange { index: usize, len: usize },
    /// The optional dependency at this position was not found
    #[error("Constructor argument {index} has no value")]
    Missing { index: usize },
    #[error("Constructor argument {index} is '{actual_type}', not '{required_type}'")]
    WrongType {
        index: usize,
        required_type: &'static str,
        actual_type: &'static str,
    },
}

fn format_chain(chain: &[Token]) -> String {
    chain
        .iter()
        .map(Token::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
