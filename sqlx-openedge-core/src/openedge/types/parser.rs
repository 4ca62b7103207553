use crate::openedge::driver::NativeDriver;
use crate::openedge::types::{parse_array, TypeContext, TypeKey, TypeRegistry};
use crate::openedge::{Oid, OpenEdgeValueData};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Converts the raw text of one value into a typed value.
pub type TypeParser = Arc<dyn Fn(&str, &TypeContext) -> OpenEdgeValueData + Send + Sync>;

#[derive(Default)]
struct Tiers {
    custom: HashMap<Oid, TypeParser>,
    scalar: HashMap<Oid, TypeParser>,
    array: HashMap<Oid, TypeParser>,
}

/// Native code to parser bindings, scoped to one dialect instance.
///
/// Lookup order is application parsers, then scalar, then array, then the
/// native driver's default. Application parsers survive [`clear_parsers`]
/// and [`rebuild`].
///
/// [`clear_parsers`]: ParserRegistry::clear_parsers
/// [`rebuild`]: ParserRegistry::rebuild
pub struct ParserRegistry {
    tiers: RwLock<Tiers>,
    driver: Arc<dyn NativeDriver>,
}

impl ParserRegistry {
    pub fn new(driver: Arc<dyn NativeDriver>) -> Self {
        Self {
            tiers: RwLock::new(Tiers::default()),
            driver,
        }
    }

    /// Drop every scalar and array binding.
    pub fn clear_parsers(&self) {
        let mut tiers = self.tiers.write();
        tiers.scalar.clear();
        tiers.array.clear();
    }

    /// Bind `key`'s parser to each of its codes and an array parser to each
    /// of its array codes.
    pub fn install_parser(&self, registry: &TypeRegistry, key: TypeKey) {
        let mut tiers = self.tiers.write();
        install(&mut tiers, registry, key);
    }

    /// Bind an application parser to `oid`, ahead of every other binding.
    pub fn install_custom(&self, oid: Oid, parser: TypeParser) {
        self.tiers.write().custom.insert(oid, parser);
    }

    /// Drop the application parser bound to `oid`, if any.
    pub fn remove_custom(&self, oid: Oid) -> bool {
        self.tiers.write().custom.remove(&oid).is_some()
    }

    /// Clear and re-install every type that has a dedicated parser, under
    /// one write lock.
    pub fn rebuild(&self, registry: &TypeRegistry) {
        let mut tiers = self.tiers.write();
        tiers.scalar.clear();
        tiers.array.clear();
        for key in registry.keys_with_oids() {
            if key.has_parser() {
                install(&mut tiers, registry, key);
            }
        }
    }

    pub fn lookup_parser(&self, oid: Oid) -> TypeParser {
        let tiers = self.tiers.read();
        if let Some(parser) = tiers.custom.get(&oid) {
            return Arc::clone(parser);
        }
        if let Some(parser) = tiers.scalar.get(&oid) {
            return Arc::clone(parser);
        }
        if let Some(parser) = tiers.array.get(&oid) {
            return Arc::clone(parser);
        }
        drop(tiers);
        self.driver.default_type_parser(oid)
    }

    /// Whether `oid` has a binding of its own.
    pub fn is_bound(&self, oid: Oid) -> bool {
        let tiers = self.tiers.read();
        tiers.custom.contains_key(&oid) || tiers.scalar.contains_key(&oid) || tiers.array.contains_key(&oid)
    }
}

fn install(tiers: &mut Tiers, registry: &TypeRegistry, key: TypeKey) {
    let Some(mapping) = registry.mapping(key) else {
        return;
    };

    for oid in mapping.oids {
        let parser: TypeParser = Arc::new(move |raw: &str, ctx: &TypeContext| key.parse(raw, ctx));
        tiers.scalar.insert(oid, parser);
    }

    for oid in mapping.array_oids {
        let parser: TypeParser = Arc::new(move |raw: &str, ctx: &TypeContext| {
            parse_array(raw, |member| key.parse(member, ctx))
        });
        tiers.array.insert(oid, parser);
    }
}

impl Debug for ParserRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let tiers = self.tiers.read();
        let mut custom: Vec<_> = tiers.custom.keys().copied().collect();
        let mut scalar: Vec<_> = tiers.scalar.keys().copied().collect();
        let mut array: Vec<_> = tiers.array.keys().copied().collect();
        custom.sort();
        scalar.sort();
        array.sort();
        f.debug_struct("ParserRegistry")
            .field("custom", &custom)
            .field("scalar", &scalar)
            .field("array", &array)
            .finish()
    }
}
