use std::sync::Arc;

use ngcore_di::{
    decorators::{host, inject, injectable, make_prop_decorator, optional, ClassDecl},
    provide, reflector, Args, Class, DynError, InjectorTree, Metadata, ProviderDecl, TypeInfo,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let input = make_prop_decorator(|| Metadata::custom("Input"));
    ClassDecl::<Http>::new().annotate(injectable()).register();
    ClassDecl::<NgModel>::new()
        .annotate(injectable())
        .prop("name", input)
        .param_type::<Http>(0)
        .param(1, inject("$log"))
        .param(1, optional())
        .param(2, inject("form"))
        .param(2, host())
        .register();

    let model = TypeInfo::of::<NgModel>();
    println!("annotations: {:?}", reflector().annotations(model));
    println!("properties: {:?}", reflector().prop_metadata(model));
    println!("parameters: {:?}", reflector().raw_parameters(model));

    let mut tree = InjectorTree::new();
    let root = tree.create(None, [ProviderDecl::class::<Http>()])?;
    let form = tree.create_host(Some(root), [provide("form").use_value(String::from("login"))])?;
    let field = tree.create(Some(form), [ProviderDecl::class::<NgModel>()])?;

    tree.check(field)?;
    let model = tree.require::<NgModel>(field)?;
    println!("{tree:?}");
    println!("{model:?}");
    Ok(())
}

#[derive(Debug)]
struct Http;
impl Class for Http {
    fn construct(_: &Args) -> Result<Self, DynError> {
        Ok(Http)
    }
}

#[derive(Debug)]
#[allow(dead_code)]
struct NgModel {
    http: Arc<Http>,
    log: Option<Arc<String>>,
    form: Arc<String>,
}
impl Class for NgModel {
    fn construct(args: &Args) -> Result<Self, DynError> {
        Ok(NgModel {
            http: args.get(0)?,
            log: args.optional(1)?,
            form: args.get(2)?,
        })
    }
}
