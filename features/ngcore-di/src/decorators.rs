//! Attaching metadata to classes, properties and constructor parameters.
//!
//! Rust has no decorators, so every application is an explicit call made while
//! the application registers its classes. Metadata order is application order:
//! stacked decorators `@Host() @Inject('ngModel')` are applied innermost first,
//! which translates to `.param(2, inject("ngModel")).param(2, host())` and reads
//! back as `[@Inject('ngModel'), @Host()]`.

use std::{borrow::Cow, fmt::Debug, marker::PhantomData, sync::Arc};

use crate::{
    key::Key,
    metadata::Metadata,
    reflector::{reflector, ClassRecord, Reflector},
    token::Token,
    types::TypeInfo,
};

type MakeClassMetadata = Arc<dyn Fn(TypeInfo) -> Metadata + Send + Sync>;
type MakeMetadata = Arc<dyn Fn() -> Metadata + Send + Sync>;

/// Decorator for a class
#[derive(Clone)]
pub struct TypeDecorator {
    make: MakeClassMetadata,
}
impl TypeDecorator {
    /// The metadata this decorator attaches to `class`
    pub fn metadata(&self, class: TypeInfo) -> Metadata {
        (self.make)(class)
    }

    /// Appends to the class annotations in the process wide reflector
    pub fn apply(&self, class: TypeInfo) {
        self.apply_to(reflector(), class)
    }

    pub fn apply_to(&self, reflector: &Reflector, class: TypeInfo) {
        let metadata = self.metadata(class);
        reflector.update(class, |record| record.annotations.push(metadata));
    }
}

/// Decorator for a named property
#[derive(Clone)]
pub struct PropDecorator {
    make: MakeMetadata,
}
impl PropDecorator {
    pub fn metadata(&self) -> Metadata {
        (self.make)()
    }

    pub fn apply(&self, class: TypeInfo, prop: &str) {
        self.apply_to(reflector(), class, prop)
    }

    pub fn apply_to(&self, reflector: &Reflector, class: TypeInfo, prop: &str) {
        let metadata = self.metadata();
        reflector.update(class, |record| {
            record
                .props
                .entry(prop.to_string())
                .or_default()
                .push(metadata)
        });
    }
}

/// Decorator for a constructor parameter
#[derive(Clone)]
pub struct ParamDecorator {
    make: MakeMetadata,
}
impl ParamDecorator {
    pub fn metadata(&self) -> Metadata {
        (self.make)()
    }

    pub fn apply(&self, class: TypeInfo, index: usize) {
        self.apply_to(reflector(), class, index)
    }

    pub fn apply_to(&self, reflector: &Reflector, class: TypeInfo, index: usize) {
        let metadata = self.metadata();
        reflector.update(class, |record| record.param_mut(index).metadata.push(metadata));
    }
}

macro_rules! debug_as_metadata {
    ($($decorator:ty),*) => {$(
        impl Debug for $decorator {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(stringify!($decorator))
            }
        }
    )*};
}
debug_as_metadata!(TypeDecorator, PropDecorator, ParamDecorator);

pub fn make_decorator(
    make: impl Fn(TypeInfo) -> Metadata + Send + Sync + 'static,
) -> TypeDecorator {
    TypeDecorator {
        make: Arc::new(make),
    }
}

pub fn make_prop_decorator(make: impl Fn() -> Metadata + Send + Sync + 'static) -> PropDecorator {
    PropDecorator {
        make: Arc::new(make),
    }
}

pub fn make_param_decorator(
    make: impl Fn() -> Metadata + Send + Sync + 'static,
) -> ParamDecorator {
    ParamDecorator {
        make: Arc::new(make),
    }
}

/// `@Injectable()`
///
/// The id is `<class name in lowercase>#<key id of the class>`.
pub fn injectable() -> TypeDecorator {
    make_decorator(|class| {
        let key = Key::get(Token::Class(class));
        Metadata::Injectable {
            id: format!("{}#{}", class.short_name().to_lowercase(), key.id()),
        }
    })
}

/// `@Inject(token)`
pub fn inject(token: impl Into<Token>) -> ParamDecorator {
    let token = token.into();
    make_param_decorator(move || Metadata::inject(token.clone()))
}

/// `@Optional()`
pub fn optional() -> ParamDecorator {
    make_param_decorator(|| Metadata::Optional)
}

/// `@Self()`
pub fn self_only() -> ParamDecorator {
    make_param_decorator(|| Metadata::SelfOnly)
}

/// `@SkipSelf()`
pub fn skip_self() -> ParamDecorator {
    make_param_decorator(|| Metadata::SkipSelf)
}

/// `@Host()`
pub fn host() -> ParamDecorator {
    make_param_decorator(|| Metadata::Host)
}

/// Full declaration of a class, registered in one go.
///
/// [`ClassDecl::register`] replaces whatever was recorded for the class
/// before, so running the same registration twice leaves a single record.
///
/// ```
/// use ngcore_di::{decorators::{host, inject, injectable, ClassDecl}, reflector::reflector, types::TypeInfo};
///
/// struct NgModelController;
///
/// ClassDecl::<NgModelController>::new()
///     .annotate(injectable())
///     .param(0, inject("$http"))
///     .param(1, inject("ngModel"))
///     .param(1, host())
///     .register();
///
/// let params = reflector().raw_parameters(TypeInfo::of::<NgModelController>());
/// assert_eq!(params[1][1].to_string(), "@Host()");
/// ```
pub struct ClassDecl<T: ?Sized + 'static> {
    record: ClassRecord,
    _class: PhantomData<fn() -> Box<T>>,
}
impl<T: ?Sized + 'static> Debug for ClassDecl<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClassDecl").field(&self.record).finish()
    }
}
impl<T: ?Sized + 'static> Default for ClassDecl<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> ClassDecl<T> {
    pub fn new() -> Self {
        ClassDecl {
            record: ClassRecord::new(TypeInfo::of::<T>()),
            _class: PhantomData,
        }
    }

    /// Links the base class whose property metadata and constructor are inherited
    pub fn extends<Base: ?Sized + 'static>(mut self) -> Self {
        self.record.parent = Some(TypeInfo::of::<Base>());
        self
    }

    pub fn annotate(mut self, decorator: TypeDecorator) -> Self {
        let metadata = decorator.metadata(self.record.info);
        self.record.annotations.push(metadata);
        self
    }

    pub fn prop(mut self, name: impl Into<Cow<'static, str>>, decorator: PropDecorator) -> Self {
        self.record
            .props
            .entry(name.into().into_owned())
            .or_default()
            .push(decorator.metadata());
        self
    }

    pub fn param(mut self, index: usize, decorator: ParamDecorator) -> Self {
        self.record
            .param_mut(index)
            .metadata
            .push(decorator.metadata());
        self
    }

    /// Declares the type of parameter `index`, used as its token when nothing is injected explicitly
    pub fn param_type<P: ?Sized + 'static>(mut self, index: usize) -> Self {
        self.record.param_mut(index).type_token = Some(Token::of::<P>());
        self
    }

    /// Declares a constructor with at least `arity` parameters
    pub fn arity(mut self, arity: usize) -> Self {
        self.record.set_arity(arity);
        self
    }

    pub fn register(self) {
        self.register_in(reflector())
    }

    pub fn register_in(self, reflector: &Reflector) {
        reflector.register(self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;
    struct Panel;

    #[test]
    fn low_level_decorators_append_in_application_order() {
        let reflector = Reflector::new();
        let class = TypeInfo::of::<Widget>();
        let foo = make_prop_decorator(|| Metadata::custom("Foo"));
        let bar = make_prop_decorator(|| Metadata::custom("Bar"));

        foo.apply_to(&reflector, class, "title");
        bar.apply_to(&reflector, class, "title");
        inject("$http").apply_to(&reflector, class, 1);
        host().apply_to(&reflector, class, 1);

        assert_eq!(
            reflector.prop_metadata(class)["title"],
            vec![Metadata::custom("Foo"), Metadata::custom("Bar")]
        );
        assert_eq!(
            reflector.raw_parameters(class),
            vec![vec![], vec![Metadata::inject("$http"), Metadata::Host]]
        );
    }

    #[test]
    fn repeated_registration_is_idempotent() {
        let reflector = Reflector::new();
        let declare = || {
            ClassDecl::<Panel>::new()
                .annotate(make_decorator(|_| Metadata::custom("Component")))
                .param(0, inject("$log"))
                .register_in(&reflector)
        };
        declare();
        declare();

        let class = TypeInfo::of::<Panel>();
        assert_eq!(
            reflector.annotations(class),
            vec![Metadata::custom("Component")]
        );
        assert_eq!(
            reflector.raw_parameters(class),
            vec![vec![Metadata::inject("$log")]]
        );
    }

    #[test]
    fn arity_covers_undecorated_parameters() {
        let reflector = Reflector::new();
        ClassDecl::<Widget>::new()
            .arity(3)
            .param(1, optional())
            .param_type::<Panel>(2)
            .register_in(&reflector);

        let params = reflector.parameters(TypeInfo::of::<Widget>());
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], crate::reflector::ParamInfo::default());
        assert_eq!(params[1].metadata, vec![Metadata::Optional]);
        assert_eq!(params[2].type_token, Some(Token::of::<Panel>()));
    }

    #[test]
    fn injectable_id_uses_the_class_key() {
        let _guard = crate::test_support::isolate();
        let metadata = injectable().metadata(TypeInfo::of::<Widget>());
        assert_eq!(
            metadata,
            Metadata::Injectable {
                id: "widget#1".into()
            }
        );
    }
}
