/// Index capabilities consulted when generating `CREATE INDEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndexSupports {
    pub concurrently: bool,
    /// Where the `USING` clause goes; `2` places it after the table name.
    pub using: u8,
    pub where_clause: bool,
}

/// Feature flags a SQL generator consults to pick dialect behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DialectSupports {
    pub default_values: bool,
    pub exception: bool,
    pub on_duplicate_key: bool,
    pub order_nulls: bool,
    pub returning: bool,
    pub bulk_default: bool,
    pub schemas: bool,
    pub lock: bool,
    pub lock_of: bool,
    pub lock_key: bool,
    pub lock_outer_join_failure: bool,
    pub for_share: Option<&'static str>,
    pub index: IndexSupports,
    pub numeric: bool,
    pub array: bool,
    pub range: bool,
    pub geometry: bool,
    pub geography: bool,
    pub regexp: bool,
    pub json: bool,
    pub jsonb: bool,
    pub hstore: bool,
    pub deferrable_constraints: bool,
    pub search_path: bool,
}

impl DialectSupports {
    pub const OPENEDGE: DialectSupports = DialectSupports {
        default_values: true,
        exception: true,
        on_duplicate_key: false,
        order_nulls: true,
        returning: false,
        bulk_default: false,
        schemas: true,
        lock: true,
        lock_of: true,
        lock_key: true,
        lock_outer_join_failure: true,
        for_share: Some("FOR SHARE"),
        index: IndexSupports {
            concurrently: true,
            using: 2,
            where_clause: true,
        },
        numeric: true,
        array: false,
        range: false,
        geometry: false,
        geography: false,
        regexp: false,
        json: false,
        jsonb: false,
        hstore: false,
        deferrable_constraints: true,
        search_path: false,
    };

    pub const POSTGRES: DialectSupports = DialectSupports {
        returning: true,
        bulk_default: true,
        array: true,
        range: true,
        geometry: true,
        geography: true,
        regexp: true,
        json: true,
        jsonb: true,
        hstore: true,
        search_path: true,
        ..Self::OPENEDGE
    };
}
