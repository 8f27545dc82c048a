use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ngcore_di::{
    decorators::{host, inject, optional, self_only, skip_self, ClassDecl},
    metadata::Metadata,
    key::reset_global_registry,
    provide, Args, Class, DepDecl, DynError, InjectError, InjectorTree, Token,
};
use parking_lot::{const_mutex, Mutex, MutexGuard};

static GLOBAL_STATE: Mutex<()> = const_mutex(());

fn isolate() -> MutexGuard<'static, ()> {
    let guard = GLOBAL_STATE.lock();
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    reset_global_registry();
    guard
}

struct Engine {
    fuel: Arc<String>,
}
impl Class for Engine {
    fn construct(args: &Args) -> Result<Self, DynError> {
        Ok(Engine { fuel: args.get(0)? })
    }
}

struct Car {
    engine: Arc<Engine>,
}
impl Class for Car {
    fn construct(args: &Args) -> Result<Self, DynError> {
        Ok(Car {
            engine: args.get(0)?,
        })
    }
}

struct Driver {
    car: Arc<Car>,
}
impl Class for Driver {
    fn construct(args: &Args) -> Result<Self, DynError> {
        Ok(Driver { car: args.get(0)? })
    }
}

/// Driver -> Car -> Engine -> 'fuel'
fn declare_chain() {
    ClassDecl::<Engine>::new().param(0, inject("fuel")).register();
    ClassDecl::<Car>::new().param_type::<Engine>(0).register();
    ClassDecl::<Driver>::new().param_type::<Car>(0).register();
}

#[test]
fn resolves_a_dependency_chain_and_caches_it() {
    let _guard = isolate();
    declare_chain();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(
            None,
            [
                ngcore_di::ProviderDecl::class::<Driver>(),
                ngcore_di::ProviderDecl::class::<Car>(),
                ngcore_di::ProviderDecl::class::<Engine>(),
                provide("fuel").use_value(String::from("diesel")),
            ],
        )
        .unwrap();

    let driver = tree.require::<Driver>(root).unwrap();
    assert_eq!(*driver.car.engine.fuel, "diesel");

    let again = tree.require::<Driver>(root).unwrap();
    assert!(Arc::ptr_eq(&driver, &again));
    let car = tree.require::<Car>(root).unwrap();
    assert!(Arc::ptr_eq(&driver.car, &car));
}

struct Chicken;
impl Class for Chicken {
    fn construct(args: &Args) -> Result<Self, DynError> {
        args.get::<Egg>(0)?;
        Ok(Chicken)
    }
}
struct Egg;
impl Class for Egg {
    fn construct(args: &Args) -> Result<Self, DynError> {
        args.get::<Chicken>(0)?;
        Ok(Egg)
    }
}

#[test]
fn cycles_fail_instead_of_recursing() {
    let _guard = isolate();
    ClassDecl::<Chicken>::new().param_type::<Egg>(0).register();
    ClassDecl::<Egg>::new().param_type::<Chicken>(0).register();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(
            None,
            [
                ngcore_di::ProviderDecl::class::<Chicken>(),
                ngcore_di::ProviderDecl::class::<Egg>(),
            ],
        )
        .unwrap();

    let err = tree.require::<Chicken>(root).err().unwrap();
    match err {
        InjectError::CyclicDependency { chain } => assert_eq!(
            chain,
            vec![
                Token::of::<Chicken>(),
                Token::of::<Egg>(),
                Token::of::<Chicken>()
            ]
        ),
        other => panic!("expected a cycle, got {other}"),
    }

    // a failed resolution leaves nothing half resolved behind
    assert!(matches!(
        tree.require::<Egg>(root),
        Err(InjectError::CyclicDependency { .. })
    ));
    assert!(tree.check(root).is_err());
}

struct Form {
    name: Arc<String>,
}
impl Class for Form {
    fn construct(args: &Args) -> Result<Self, DynError> {
        Ok(Form { name: args.get(0)? })
    }
}

#[test]
fn skip_self_resolves_against_the_parent() {
    let _guard = isolate();
    ClassDecl::<Form>::new()
        .param(0, inject("name"))
        .param(0, skip_self())
        .register();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(None, [provide("name").use_value(String::from("parent"))])
        .unwrap();
    let child = tree
        .create(
            Some(root),
            [
                provide("name").use_value(String::from("child")),
                ngcore_di::ProviderDecl::class::<Form>(),
            ],
        )
        .unwrap();

    let form = tree.require::<Form>(child).unwrap();
    assert_eq!(*form.name, "parent");
    assert_eq!(*tree.resolve::<String>(child, "name").unwrap(), "child");
}

#[test]
fn host_lookups_stop_at_the_host_boundary() {
    let _guard = isolate();
    ClassDecl::<Form>::new()
        .param(0, inject("name"))
        .param(0, host())
        .register();

    let mut tree = InjectorTree::new();
    let app = tree
        .create(None, [provide("name").use_value(String::from("app"))])
        .unwrap();
    let component = tree.create_host(Some(app), []).unwrap();
    let directive = tree
        .create(
            Some(component),
            [ngcore_di::ProviderDecl::class::<Form>()],
        )
        .unwrap();

    let err = tree.require::<Form>(directive).err().unwrap();
    assert!(
        matches!(
            &err,
            InjectError::NoProvider { token, requested_by: Some(by) }
                if *token == Token::from("name") && *by == Token::of::<Form>()
        ),
        "{err}"
    );

    // inside the boundary the host itself is searched
    let host_with_name = tree
        .create_host(Some(app), [provide("name").use_value(String::from("host"))])
        .unwrap();
    let directive = tree
        .create(
            Some(host_with_name),
            [ngcore_di::ProviderDecl::class::<Form>()],
        )
        .unwrap();
    assert_eq!(*tree.require::<Form>(directive).unwrap().name, "host");
}

#[test]
fn self_only_ignores_ancestors() {
    let _guard = isolate();
    ClassDecl::<Form>::new()
        .param(0, inject("name"))
        .param(0, self_only())
        .register();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(None, [provide("name").use_value(String::from("root"))])
        .unwrap();
    let child = tree
        .create(Some(root), [ngcore_di::ProviderDecl::class::<Form>()])
        .unwrap();

    assert!(matches!(
        tree.require::<Form>(child),
        Err(InjectError::NoProvider { .. })
    ));
}

struct Logger {
    sink: Option<Arc<String>>,
}
impl Class for Logger {
    fn construct(args: &Args) -> Result<Self, DynError> {
        Ok(Logger {
            sink: args.optional(0)?,
        })
    }
}

#[test]
fn optional_dependencies_resolve_to_nothing() {
    let _guard = isolate();
    ClassDecl::<Logger>::new()
        .param(0, inject("sink"))
        .param(0, optional())
        .register();

    let mut tree = InjectorTree::new();
    let root = tree.create(None, []).unwrap();
    let child = tree
        .create(Some(root), [ngcore_di::ProviderDecl::class::<Logger>()])
        .unwrap();

    assert!(tree.require::<Logger>(child).unwrap().sink.is_none());
}

#[test]
fn dependencies_resolve_from_the_injector_owning_the_provider() {
    let _guard = isolate();
    declare_chain();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(
            None,
            [
                ngcore_di::ProviderDecl::class::<Engine>(),
                provide("fuel").use_value(String::from("diesel")),
            ],
        )
        .unwrap();
    let child = tree
        .create(
            Some(root),
            [provide("fuel").use_value(String::from("petrol"))],
        )
        .unwrap();

    let engine = tree.require::<Engine>(child).unwrap();
    assert_eq!(*engine.fuel, "diesel");
    // cached where it was created
    assert!(Arc::ptr_eq(&engine, &tree.require::<Engine>(root).unwrap()));
}

#[test]
fn factories_receive_their_dependencies_in_order() {
    let _guard = isolate();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(
            None,
            [
                provide("host").use_value(String::from("example.org")),
                provide("url").use_factory(
                    move |args| {
                        counted.fetch_add(1, Ordering::SeqCst);
                        let port = args.optional::<u16>(1)?.map_or(443, |port| *port);
                        Ok(format!("https://{}:{port}", args.get::<String>(0)?))
                    },
                    [DepDecl::new("host"), DepDecl::new("port").optional()],
                ),
            ],
        )
        .unwrap();

    assert_eq!(
        *tree.resolve::<String>(root, "url").unwrap(),
        "https://example.org:443"
    );
    tree.resolve::<String>(root, "url").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn construction_errors_name_the_provider() {
    let _guard = isolate();
    let mut tree = InjectorTree::new();
    let root = tree
        .create(
            None,
            [provide("broken").use_factory(
                |_| Err::<(), DynError>("boom".into()),
                Vec::<DepDecl>::new(),
            )],
        )
        .unwrap();

    let err = tree.get(root, "broken").unwrap_err();
    assert_eq!(err.to_string(), "Constructing 'broken' failed - error: boom");
}

#[test]
fn invalid_declarations_fail_before_the_injector_exists() {
    let _guard = isolate();
    let mut tree = InjectorTree::new();

    let err = tree.create(None, [provide("$http")]).unwrap_err();
    assert!(matches!(err, InjectError::Provider(_)));
    assert!(tree.is_empty());
}

#[test]
fn later_declarations_override_earlier_ones() {
    let _guard = isolate();
    let mut tree = InjectorTree::new();
    let root = tree
        .create(
            None,
            [
                provide("mode").use_value(String::from("dev")),
                provide("mode").use_value(String::from("prod")),
            ],
        )
        .unwrap();

    assert_eq!(*tree.resolve::<String>(root, "mode").unwrap(), "prod");
}

#[test]
fn wrong_type_is_reported() {
    let _guard = isolate();
    let mut tree = InjectorTree::new();
    let root = tree.create(None, [provide("port").use_value(80_u16)]).unwrap();

    assert!(matches!(
        tree.resolve::<String>(root, "port"),
        Err(InjectError::DowncastFailed { actual_type: "u16", .. })
    ));
}

#[test]
fn host_with_skip_self_starts_at_the_parent_and_stops_at_the_host() {
    let _guard = isolate();
    let lookup = || {
        provide("lookup").use_factory(
            |args| Ok(args.value::<String>(0)?),
            [DepDecl::new("name")
                .with(Metadata::Host)
                .with(Metadata::SkipSelf)],
        )
    };

    let mut tree = InjectorTree::new();
    let app = tree
        .create(None, [provide("name").use_value(String::from("app"))])
        .unwrap();
    let host = tree
        .create_host(Some(app), [provide("name").use_value(String::from("host"))])
        .unwrap();
    let child = tree
        .create(
            Some(host),
            [provide("name").use_value(String::from("child")), lookup()],
        )
        .unwrap();

    assert_eq!(*tree.resolve::<String>(child, "lookup").unwrap(), "host");

    // only provided above the host
    let empty_host = tree.create_host(Some(app), []).unwrap();
    let child = tree
        .create(
            Some(empty_host),
            [provide("name").use_value(String::from("child")), lookup()],
        )
        .unwrap();

    let err = tree.get(child, "lookup").unwrap_err();
    assert!(
        matches!(
            &err,
            InjectError::NoProvider { token, requested_by: Some(by) }
                if *token == Token::from("name") && *by == Token::from("lookup")
        ),
        "{err}"
    );
}

#[test]
fn missing_dependencies_name_the_requesting_class() {
    let _guard = isolate();
    ClassDecl::<Form>::new().param(0, inject("name")).register();

    let mut tree = InjectorTree::new();
    let root = tree
        .create(None, [provide("form").use_class::<Form>()])
        .unwrap();

    let err = tree.get(root, "form").unwrap_err();
    assert!(
        matches!(
            &err,
            InjectError::NoProvider { token, requested_by: Some(by) }
                if *token == Token::from("name") && *by == Token::of::<Form>()
        ),
        "{err}"
    );

    let report = tree.check(root).unwrap_err().to_string();
    assert!(report.contains("Form needs 'name'"), "{report}");
}
