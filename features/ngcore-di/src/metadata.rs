use std::{
    borrow::Cow,
    fmt::{Debug, Display},
};

use crate::token::Token;

/// One applied decorator.
///
/// Two values are equal when they are the same kind with the same fields.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Metadata {
    /// Class can be provided by an injector, `id` is assigned at decoration time
    Injectable { id: String },
    /// Parameter resolves `token` instead of its declared type
    Inject { token: Token },
    /// Missing dependency yields no value instead of failing
    Optional,
    /// Only the injector holding the provider may satisfy the parameter
    SelfOnly,
    /// Lookup starts at the parent injector
    SkipSelf,
    /// Lookup stops at the nearest host boundary
    Host,
    /// Application defined kind, e.g. property bindings of a component layer
    Custom {
        name: Cow<'static, str>,
        args: Vec<String>,
    },
}

impl Metadata {
    pub fn inject(token: impl Into<Token>) -> Self {
        Metadata::Inject {
            token: token.into(),
        }
    }

    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Metadata::Custom {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn custom_with(
        name: impl Into<Cow<'static, str>>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Metadata::Custom {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the decorator without the `@`
    pub fn kind(&self) -> &str {
        match self {
            Metadata::Injectable { .. } => "Injectable",
            Metadata::Inject { .. } => "Inject",
            Metadata::Optional => "Optional",
            Metadata::SelfOnly => "Self",
            Metadata::SkipSelf => "SkipSelf",
            Metadata::Host => "Host",
            Metadata::Custom { name, .. } => name.as_ref(),
        }
    }

    /// The token of an `Inject`
    pub fn token(&self) -> Option<&Token> {
        match self {
            Metadata::Inject { token } => Some(token),
            _ => None,
        }
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metadata::Injectable { id } => write!(f, "@Injectable('{id}')"),
            Metadata::Inject { token } => write!(f, "@Inject({token})"),
            Metadata::Custom { name, args } => write!(f, "@{name}({})", args.join(", ")),
            other => write!(f, "@{}()", other.kind()),
        }
    }
}
impl Debug for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
