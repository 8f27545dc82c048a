use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap, HashSet},
    sync::LazyLock,
};

use parking_lot::RwLock;

use crate::{metadata::Metadata, token::Token, types::TypeInfo};

static GLOBAL_REFLECTOR: LazyLock<Reflector> = LazyLock::new(Reflector::new);

/// The process wide reflector all decorators write into
pub fn reflector() -> &'static Reflector {
    &GLOBAL_REFLECTOR
}

/// Property name to the metadata attached to it, in attachment order
pub type PropMetadata = BTreeMap<String, Vec<Metadata>>;

/// One constructor parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamInfo {
    /// Declared parameter type, used when no `Inject` names a token
    pub type_token: Option<Token>,
    pub metadata: Vec<Metadata>,
}

/// Everything recorded for a single class
#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub info: TypeInfo,
    pub parent: Option<TypeInfo>,
    pub annotations: Vec<Metadata>,
    pub props: PropMetadata,
    /// `None` until a constructor is declared, classes without one use their parent's
    pub params: Option<Vec<ParamInfo>>,
}

impl ClassRecord {
    pub fn new(info: TypeInfo) -> Self {
        ClassRecord {
            info,
            parent: None,
            annotations: Vec::new(),
            props: PropMetadata::new(),
            params: None,
        }
    }

    /// Makes sure parameter `index` exists, growing the constructor as needed
    pub(crate) fn param_mut(&mut self, index: usize) -> &mut ParamInfo {
        let params = self.params.get_or_insert_with(Vec::new);
        if params.len() <= index {
            params.resize_with(index + 1, ParamInfo::default);
        }
        &mut params[index]
    }

    pub(crate) fn set_arity(&mut self, arity: usize) {
        let params = self.params.get_or_insert_with(Vec::new);
        if params.len() < arity {
            params.resize_with(arity, ParamInfo::default);
        }
    }
}

/// Reads decorator metadata back off classes.
///
/// Reads never fail: a class nothing was recorded for has no annotations,
/// no property metadata and no constructor parameters.
#[derive(Debug, Default)]
pub struct Reflector {
    records: RwLock<HashMap<TypeId, ClassRecord>>,
}

impl Reflector {
    pub fn new() -> Self {
        Reflector {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Class level annotations in attachment order
    pub fn annotations(&self, class: TypeInfo) -> Vec<Metadata> {
        self.records
            .read()
            .get(&class.type_id)
            .map(|record| record.annotations.clone())
            .unwrap_or_default()
    }

    /// Property metadata of `class` merged with that of all its ancestors.
    ///
    /// For a property present on several classes of the chain, ancestor
    /// metadata comes first.
    pub fn prop_metadata(&self, class: TypeInfo) -> PropMetadata {
        let records = self.records.read();
        let mut merged = PropMetadata::new();

        for ancestor in lineage(&records, class).iter().rev() {
            let Some(record) = records.get(&ancestor.type_id) else {
                continue;
            };
            for (name, metadata) in &record.props {
                merged
                    .entry(name.clone())
                    .or_default()
                    .extend(metadata.iter().cloned());
            }
        }

        merged
    }

    /// Metadata of every constructor parameter, in parameter order.
    ///
    /// Undecorated parameters yield an empty list.
    pub fn raw_parameters(&self, class: TypeInfo) -> Vec<Vec<Metadata>> {
        self.parameters(class)
            .into_iter()
            .map(|param| param.metadata)
            .collect()
    }

    /// Declared type and metadata of every constructor parameter.
    ///
    /// A class which never declared a constructor uses the nearest ancestor's.
    pub fn parameters(&self, class: TypeInfo) -> Vec<ParamInfo> {
        let records = self.records.read();
        lineage(&records, class)
            .iter()
            .find_map(|ancestor| {
                records
                    .get(&ancestor.type_id)
                    .and_then(|record| record.params.clone())
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, class: TypeInfo) -> Option<TypeInfo> {
        self.records
            .read()
            .get(&class.type_id)
            .and_then(|record| record.parent)
    }

    pub fn has_metadata(&self, class: TypeInfo) -> bool {
        self.records.read().contains_key(&class.type_id)
    }

    /// Snapshot of the record for `class`
    pub fn record(&self, class: TypeInfo) -> Option<ClassRecord> {
        self.records.read().get(&class.type_id).cloned()
    }

    /// Replaces everything known about a class
    pub fn register(&self, record: ClassRecord) {
        tracing::debug!("Registered metadata for {}", record.info);
        self.records.write().insert(record.info.type_id, record);
    }

    /// Applies `update` to the record of `class`, creating it first if needed
    pub(crate) fn update(&self, class: TypeInfo, update: impl FnOnce(&mut ClassRecord)) {
        let mut records = self.records.write();
        let record = records
            .entry(class.type_id)
            .or_insert_with(|| ClassRecord::new(class));
        update(record);
    }
}

/// `class` followed by its ancestors, nearest first
fn lineage(records: &HashMap<TypeId, ClassRecord>, class: TypeInfo) -> Vec<TypeInfo> {
    let mut chain = vec![class];
    let mut seen = HashSet::from([class.type_id]);
    let mut current = class;

    while let Some(parent) = records.get(&current.type_id).and_then(|r| r.parent) {
        if !seen.insert(parent.type_id) {
            tracing::warn!("Inheritance cycle through {parent} while reflecting {class}");
            break;
        }
        chain.push(parent);
        current = parent;
    }

    chain
}
