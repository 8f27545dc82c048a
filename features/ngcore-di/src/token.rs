use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::types::TypeInfo;

static NEXT_OPAQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Anything which can be used to look up a dependency
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A class, compared by its `TypeId`
    Class(TypeInfo),
    /// A string token, compared by value
    Name(Cow<'static, str>),
    /// An abstract symbol, compared by identity
    Opaque(OpaqueToken),
}

impl Token {
    pub fn of<T: 'static + ?Sized>() -> Token {
        Token::Class(TypeInfo::of::<T>())
    }

    pub fn name(name: impl Into<Cow<'static, str>>) -> Token {
        Token::Name(name.into())
    }

    /// The class behind this token, if it is a class token
    pub fn class(&self) -> Option<TypeInfo> {
        match self {
            Token::Class(info) => Some(*info),
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Class(info) => Display::fmt(info, f),
            Token::Name(name) => write!(f, "'{name}'"),
            Token::Opaque(opaque) => Display::fmt(opaque, f),
        }
    }
}
impl Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Token::Name(Cow::Borrowed(name))
    }
}
impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::Name(Cow::Owned(name))
    }
}
impl From<TypeInfo> for Token {
    fn from(info: TypeInfo) -> Self {
        Token::Class(info)
    }
}
impl From<OpaqueToken> for Token {
    fn from(opaque: OpaqueToken) -> Self {
        Token::Opaque(opaque)
    }
}
impl From<&OpaqueToken> for Token {
    fn from(opaque: &OpaqueToken) -> Self {
        Token::Opaque(opaque.clone())
    }
}

/// A token with no runtime type of its own.
///
/// Every call to [`OpaqueToken::new`] creates a distinct token, even for equal
/// descriptions. Clones of a token are the same token.
#[derive(Clone)]
pub struct OpaqueToken {
    id: u64,
    desc: Cow<'static, str>,
}

impl OpaqueToken {
    pub fn new(desc: impl Into<Cow<'static, str>>) -> Self {
        OpaqueToken {
            id: NEXT_OPAQUE_ID.fetch_add(1, Ordering::Relaxed),
            desc: desc.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl PartialEq for OpaqueToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for OpaqueToken {}
impl Hash for OpaqueToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl Display for OpaqueToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token({})", self.desc)
    }
}
impl Debug for OpaqueToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Http;
    struct Log;

    #[test]
    fn class_tokens_compare_by_type() {
        assert_eq!(Token::of::<Http>(), Token::of::<Http>());
        assert_ne!(Token::of::<Http>(), Token::of::<Log>());
        assert_eq!(Token::of::<Http>().to_string(), "Http");
    }

    #[test]
    fn name_tokens_compare_by_value() {
        assert_eq!(Token::from("$http"), Token::name(String::from("$http")));
        assert_ne!(Token::from("$http"), Token::from("$log"));
        assert_eq!(Token::from("$http").to_string(), "'$http'");
    }

    #[test]
    fn opaque_tokens_compare_by_identity() {
        let first = OpaqueToken::new("config");
        let second = OpaqueToken::new("config");
        assert_ne!(Token::from(&first), Token::from(&second));
        assert_eq!(Token::from(&first), Token::from(first.clone()));
        assert_eq!(first.to_string(), "Token(config)");
        assert_eq!(first.description(), second.description());
    }
}
