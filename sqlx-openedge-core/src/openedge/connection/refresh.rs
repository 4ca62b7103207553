//! Discovery of runtime-defined types (geometry, hstore, geography, enums).

use crate::openedge::dialect::{DatabaseVersion, DialectKind};
use crate::openedge::driver::{NativeConnection, ResultSet};
use crate::openedge::types::{TypeKey, TypeRegistry};
use crate::openedge::{Oid, OpenEdgeError};

pub const DYNAMIC_TYPES_QUERY: &str = "SELECT typname, typtype, oid, typarray FROM pg_type \
     WHERE (typtype = 'b' AND typname IN ('hstore', 'geometry', 'geography')) OR (typtype = 'e')";

/// Query the catalog and replace the codes of every dynamic registry entry.
///
/// Returns the keys that received codes, or `None` when nothing was queried
/// (no catalog, or `version` below the dialect's minimum).
pub(crate) async fn refresh_dynamic_types(
    kind: DialectKind,
    registry: &TypeRegistry,
    native: &mut dyn NativeConnection,
    version: DatabaseVersion,
) -> Result<Option<Vec<TypeKey>>, OpenEdgeError> {
    if kind.type_catalog().is_none() {
        return Ok(None);
    }
    if version < kind.dynamic_types_min_version() {
        log::debug!("skipping dynamic type refresh on {kind} {version}");
        return Ok(None);
    }

    let results = native
        .query(DYNAMIC_TYPES_QUERY, &[])
        .await
        .map_err(OpenEdgeError::Query)?;

    let Some(data) = data_result(&results) else {
        return Ok(Some(registry.replace_dynamic(&[])));
    };

    let discovered = classify_rows(data);
    let keys = registry.replace_dynamic(&discovered);
    log::debug!("loaded {} dynamic type(s): {keys:?}", discovered.len());
    Ok(Some(keys))
}

/// The result holding the catalog rows. A session `SET` issued in the same
/// batch yields a leading result that is skipped.
fn data_result(results: &[ResultSet]) -> Option<&ResultSet> {
    match results {
        [] => None,
        [first, .., last] if first.command.as_deref() == Some("SET") => Some(last),
        [first, ..] => Some(first),
    }
}

fn classify_rows(data: &ResultSet) -> Vec<(TypeKey, Oid, Option<Oid>)> {
    let index_of = |name: &str| data.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name));
    let typname = index_of("typname").unwrap_or(0);
    let typtype = index_of("typtype").unwrap_or(1);
    let oid = index_of("oid").unwrap_or(2);
    let typarray = index_of("typarray").unwrap_or(3);

    data.rows
        .iter()
        .filter_map(|row| {
            let key = match cell(row, typname)? {
                "geometry" => TypeKey::Geometry,
                "hstore" => TypeKey::HStore,
                "geography" => TypeKey::Geography,
                _ if cell(row, typtype) == Some("e") => TypeKey::Enum,
                other => {
                    log::debug!("ignoring catalog type {other:?}");
                    return None;
                }
            };

            let oid = Oid(cell(row, oid)?.trim().parse().ok()?);
            let array = cell(row, typarray)
                .and_then(|v| v.trim().parse().ok())
                .map(Oid);
            Some((key, oid, array))
        })
        .collect()
}

fn cell(row: &[Option<String>], index: usize) -> Option<&str> {
    row.get(index).and_then(|v| v.as_deref())
}
