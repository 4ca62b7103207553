use crate::openedge::dialect::DialectKind;
use crate::openedge::types::TypeKey;
use crate::openedge::{Oid, OpenEdgeError};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Native names and codes of one abstract type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    /// Native SQL names, preferred first.
    pub names: Vec<String>,
    pub oids: Vec<Oid>,
    pub array_oids: Vec<Oid>,
    /// Codes are discovered at runtime instead of fixed by the engine build.
    pub dynamic: bool,
}

impl TypeMapping {
    fn owns(&self, oid: Oid) -> bool {
        self.oids.contains(&oid) || self.array_oids.contains(&oid)
    }
}

/// Per-dialect table from [`TypeKey`] to native names and codes.
///
/// A native code belongs to at most one key at any time.
#[derive(Debug)]
pub struct TypeRegistry {
    dialect: DialectKind,
    entries: RwLock<BTreeMap<TypeKey, TypeMapping>>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// A registry bootstrapped with the dialect's built-in types.
    pub fn for_dialect(dialect: DialectKind) -> Self {
        match dialect {
            DialectKind::OpenEdge => Self::openedge(),
            DialectKind::Postgres => Self::postgres(),
        }
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    /// Declare the native SQL names `key` serializes to.
    pub fn register_static_type(&self, key: TypeKey, names: &[&str]) {
        let mut entries = self.entries.write();
        let entry = entries.entry(key).or_default();
        entry.names = names.iter().map(|n| (*n).to_owned()).collect();
    }

    /// Declare `key` as a type whose codes are discovered at runtime.
    pub fn register_dynamic_type(&self, key: TypeKey, names: &[&str]) {
        let mut entries = self.entries.write();
        let entry = entries.entry(key).or_default();
        entry.names = names.iter().map(|n| (*n).to_owned()).collect();
        entry.dynamic = true;
    }

    /// Replace the native codes of `key`.
    ///
    /// Fails without changing anything if a code is already owned by another key.
    pub fn set_oids(&self, key: TypeKey, oids: &[Oid], array_oids: &[Oid]) -> Result<(), OpenEdgeError> {
        let mut entries = self.entries.write();

        let conflict = oids.iter().chain(array_oids).find_map(|oid| {
            entries
                .iter()
                .find(|(other, mapping)| **other != key && mapping.owns(*oid))
                .map(|(other, _)| (*oid, *other))
        });
        if let Some((oid, owner)) = conflict {
            return Err(OpenEdgeError::Configuration(format!(
                "native type code {oid} is already mapped to {owner}"
            )));
        }

        let entry = entries.entry(key).or_default();
        entry.oids = oids.to_vec();
        entry.array_oids = array_oids.to_vec();
        Ok(())
    }

    pub fn mapping(&self, key: TypeKey) -> Option<TypeMapping> {
        self.entries.read().get(&key).cloned()
    }

    pub fn native_names(&self, key: TypeKey) -> Vec<String> {
        self.entries
            .read()
            .get(&key)
            .map(|m| m.names.clone())
            .unwrap_or_default()
    }

    pub fn oids(&self, key: TypeKey) -> Vec<Oid> {
        self.entries
            .read()
            .get(&key)
            .map(|m| m.oids.clone())
            .unwrap_or_default()
    }

    pub fn array_oids(&self, key: TypeKey) -> Vec<Oid> {
        self.entries
            .read()
            .get(&key)
            .map(|m| m.array_oids.clone())
            .unwrap_or_default()
    }

    /// The key owning `oid` as a scalar or array code.
    pub fn key_for_oid(&self, oid: Oid) -> Option<TypeKey> {
        self.entries
            .read()
            .iter()
            .find(|(_, m)| m.owns(oid))
            .map(|(key, _)| *key)
    }

    /// Identify an abstract type from a native SQL name.
    ///
    /// Names are compared case-insensitively. When several keys share a name
    /// (`INTEGER` for both INTEGER and BIGINT on OpenEdge) the first key in
    /// [`TypeKey::ALL`] order wins.
    pub fn key_for_native_name(&self, name: &str) -> Option<TypeKey> {
        let name = name.trim();
        self.entries
            .read()
            .iter()
            .find(|(_, m)| m.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
            .map(|(key, _)| *key)
    }

    pub fn dynamic_keys(&self) -> Vec<TypeKey> {
        self.entries
            .read()
            .iter()
            .filter(|(_, m)| m.dynamic)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Whether no dynamic type has been discovered yet.
    pub fn dynamic_oids_empty(&self) -> bool {
        self.entries
            .read()
            .values()
            .filter(|m| m.dynamic)
            .all(|m| m.oids.is_empty() && m.array_oids.is_empty())
    }

    /// Keys that currently own at least one code.
    pub fn keys_with_oids(&self) -> Vec<TypeKey> {
        self.entries
            .read()
            .iter()
            .filter(|(_, m)| !m.oids.is_empty() || !m.array_oids.is_empty())
            .map(|(key, _)| *key)
            .collect()
    }

    /// Swap in a fresh set of discovered codes for every dynamic entry.
    ///
    /// All dynamic entries are cleared first under the same write lock, so
    /// readers never see a mix of old and new codes. Discovered codes that
    /// a static entry already owns are skipped. Returns the dynamic keys.
    pub fn replace_dynamic(&self, discovered: &[(TypeKey, Oid, Option<Oid>)]) -> Vec<TypeKey> {
        let mut entries = self.entries.write();

        for mapping in entries.values_mut().filter(|m| m.dynamic) {
            mapping.oids.clear();
            mapping.array_oids.clear();
        }

        for &(key, oid, array_oid) in discovered {
            let is_dynamic = entries.get(&key).map(|m| m.dynamic).unwrap_or(false);
            if !is_dynamic {
                log::warn!("ignoring discovered code {oid} for non-dynamic type {key}");
                continue;
            }

            let taken = |code: Oid| entries.iter().any(|(k, m)| *k != key && m.owns(code));
            if taken(oid) {
                log::warn!("ignoring discovered code {oid} for {key}: already mapped");
                continue;
            }
            let array_oid = array_oid.filter(|a| a.0 != 0 && !taken(*a));

            if let Some(mapping) = entries.get_mut(&key) {
                if !mapping.oids.contains(&oid) {
                    mapping.oids.push(oid);
                }
                if let Some(array_oid) = array_oid {
                    if !mapping.array_oids.contains(&array_oid) {
                        mapping.array_oids.push(array_oid);
                    }
                }
            }
        }

        entries
            .iter()
            .filter(|(_, m)| m.dynamic)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Built-in OpenEdge types.
    ///
    /// Codes are the ODBC SQL data type codes the driver reports.
    pub fn openedge() -> Self {
        use crate::openedge::type_info::sql_codes as sql;

        let registry = Self::new(DialectKind::OpenEdge);
        let statics: &[(TypeKey, &[&str])] = &[
            (TypeKey::Date, &["TIMESTAMP"]),
            (TypeKey::String, &["CHARACTER"]),
            (TypeKey::Char, &["CHAR"]),
            (TypeKey::Text, &["VARCHAR"]),
            (TypeKey::TinyInt, &["TINYINT"]),
            (TypeKey::SmallInt, &["SMALLINT"]),
            (TypeKey::Integer, &["INTEGER"]),
            (TypeKey::BigInt, &["INTEGER"]),
            (TypeKey::Float, &["FLOAT"]),
            (TypeKey::Time, &["TIME"]),
            (TypeKey::DateOnly, &["DATE"]),
            (TypeKey::Boolean, &["TINYINT"]),
            (TypeKey::Blob, &["BINARY"]),
            (TypeKey::Decimal, &["DECIMAL"]),
            (TypeKey::Uuid, &["CHARACTER"]),
            (TypeKey::Real, &["REAL"]),
            (TypeKey::Double, &["DOUBLE PRECISION"]),
        ];
        for (key, names) in statics {
            registry.register_static_type(*key, names);
        }

        let mut entries = registry.entries.write();
        let mut codes = |key: TypeKey, oids: &[Oid]| {
            entries.entry(key).or_default().oids = oids.to_vec();
        };
        codes(TypeKey::Date, &[sql::TIMESTAMP, sql::TIMESTAMP_LEGACY]);
        codes(TypeKey::DateOnly, &[sql::DATE, sql::DATETIME]);
        codes(TypeKey::Float, &[sql::FLOAT]);
        codes(TypeKey::Real, &[sql::REAL]);
        codes(TypeKey::Double, &[sql::DOUBLE]);
        codes(TypeKey::Decimal, &[sql::DECIMAL, sql::NUMERIC]);
        drop(entries);

        registry
    }

    /// Built-in types of the Postgres-like engine, keyed by `pg_type.oid`.
    pub fn postgres() -> Self {
        let registry = Self::new(DialectKind::Postgres);
        let statics: &[(TypeKey, &[&str], &[i64], &[i64])] = &[
            (TypeKey::Date, &["timestamptz"], &[1184], &[1185]),
            (TypeKey::String, &["varchar"], &[1043], &[1015]),
            (TypeKey::Char, &["char", "bpchar"], &[1042], &[1014]),
            (TypeKey::Text, &["text"], &[25], &[1009]),
            (TypeKey::SmallInt, &["int2"], &[21], &[1005]),
            (TypeKey::Integer, &["int4"], &[23], &[1007]),
            (TypeKey::BigInt, &["int8"], &[20], &[1016]),
            (TypeKey::Real, &["float4"], &[700], &[1021]),
            (TypeKey::Double, &["float8"], &[701], &[1022]),
            (TypeKey::Decimal, &["numeric"], &[1700], &[1231]),
            (TypeKey::Time, &["time"], &[1083], &[1183]),
            (TypeKey::DateOnly, &["date"], &[1082], &[1182]),
            (TypeKey::Boolean, &["bool"], &[16], &[1000]),
            (TypeKey::Blob, &["bytea"], &[17], &[1001]),
            (TypeKey::Uuid, &["uuid"], &[2950], &[2951]),
            (TypeKey::Json, &["json"], &[114], &[199]),
        ];

        let mut entries = registry.entries.write();
        for (key, names, oids, array_oids) in statics {
            entries.insert(
                *key,
                TypeMapping {
                    names: names.iter().map(|n| (*n).to_owned()).collect(),
                    oids: oids.iter().copied().map(Oid).collect(),
                    array_oids: array_oids.iter().copied().map(Oid).collect(),
                    dynamic: false,
                },
            );
        }
        drop(entries);

        registry.register_dynamic_type(TypeKey::Geometry, &["geometry"]);
        registry.register_dynamic_type(TypeKey::HStore, &["hstore"]);
        registry.register_dynamic_type(TypeKey::Geography, &["geography"]);
        registry.register_dynamic_type(TypeKey::Enum, &[]);

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openedge_static_names() {
        let registry = TypeRegistry::openedge();
        assert_eq!(registry.native_names(TypeKey::Date), vec!["TIMESTAMP"]);
        assert_eq!(registry.native_names(TypeKey::Double), vec!["DOUBLE PRECISION"]);
        assert!(registry.native_names(TypeKey::MediumInt).is_empty());
        assert!(registry.native_names(TypeKey::Enum).is_empty());
        assert!(registry.dynamic_keys().is_empty());
    }

    #[test]
    fn identifies_type_by_native_name() {
        let registry = TypeRegistry::openedge();
        assert_eq!(registry.key_for_native_name("timestamp"), Some(TypeKey::Date));
        assert_eq!(registry.key_for_native_name("INTEGER"), Some(TypeKey::Integer));
        assert_eq!(registry.key_for_native_name("CHARACTER"), Some(TypeKey::String));
        assert_eq!(registry.key_for_native_name("GEOMETRY"), None);

        let pg = TypeRegistry::postgres();
        assert_eq!(pg.key_for_native_name("bpchar"), Some(TypeKey::Char));
    }

    #[test]
    fn set_oids_rejects_codes_owned_elsewhere() {
        let registry = TypeRegistry::postgres();
        let err = registry
            .set_oids(TypeKey::Text, &[Oid(1043)], &[])
            .unwrap_err();
        assert!(matches!(err, OpenEdgeError::Configuration(_)));
        assert_eq!(registry.oids(TypeKey::Text), vec![Oid(25)]);

        registry.set_oids(TypeKey::Text, &[Oid(25), Oid(19)], &[Oid(1009)]).unwrap();
        assert_eq!(registry.key_for_oid(Oid(19)), Some(TypeKey::Text));
    }

    #[test]
    fn replace_dynamic_does_not_accumulate() {
        let registry = TypeRegistry::postgres();
        assert!(registry.dynamic_oids_empty());

        registry.replace_dynamic(&[
            (TypeKey::HStore, Oid(16_400), Some(Oid(16_405))),
            (TypeKey::Enum, Oid(16_500), Some(Oid(16_499))),
            (TypeKey::Enum, Oid(16_510), None),
        ]);
        assert_eq!(registry.oids(TypeKey::Enum), vec![Oid(16_500), Oid(16_510)]);
        assert_eq!(registry.array_oids(TypeKey::HStore), vec![Oid(16_405)]);

        registry.replace_dynamic(&[(TypeKey::Enum, Oid(16_600), Some(Oid(16_601)))]);
        assert_eq!(registry.oids(TypeKey::Enum), vec![Oid(16_600)]);
        assert_eq!(registry.array_oids(TypeKey::Enum), vec![Oid(16_601)]);
        assert!(registry.oids(TypeKey::HStore).is_empty());
        assert!(registry.array_oids(TypeKey::HStore).is_empty());
    }

    #[test]
    fn replace_dynamic_leaves_static_entries_alone() {
        let registry = TypeRegistry::postgres();
        let before = registry.mapping(TypeKey::Date);

        registry.replace_dynamic(&[
            (TypeKey::Enum, Oid(1184), None),
            (TypeKey::Date, Oid(99_999), None),
        ]);

        assert_eq!(registry.mapping(TypeKey::Date), before);
        assert!(registry.oids(TypeKey::Enum).is_empty());
    }
}
