//! Dialect descriptors.
//!
//! A [`Dialect`] composes the static [`DialectSupports`] table with the
//! per-instance [`TypeRegistry`] and [`ConnectionManager`]. Two dialects in
//! the same process never share registry state.

mod supports;
mod version;

pub use supports::{DialectSupports, IndexSupports};
pub use version::DatabaseVersion;

use crate::openedge::connection::ConnectionManager;
use crate::openedge::driver::NativeDriver;
use crate::openedge::types::TypeRegistry;
use crate::openedge::{OpenEdgeConnectOptions, OpenEdgeError};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Arc;

/// Identifier quote character shared by both dialects.
pub const TICK_CHAR: char = '"';

/// The engine family a connection talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DialectKind {
    #[default]
    OpenEdge,
    /// A Postgres-like engine reached through the same ODBC bridge.
    Postgres,
}

impl DialectKind {
    pub const fn name(self) -> &'static str {
        match self {
            DialectKind::OpenEdge => "openedge",
            DialectKind::Postgres => "postgres",
        }
    }

    pub const fn default_port(self) -> u16 {
        match self {
            DialectKind::OpenEdge => 20666,
            DialectKind::Postgres => 5432,
        }
    }

    /// Version assumed when the engine version is not configured.
    pub const fn default_version(self) -> DatabaseVersion {
        match self {
            DialectKind::OpenEdge => DatabaseVersion::new(11, 7, 2),
            DialectKind::Postgres => DatabaseVersion::new(9, 4, 0),
        }
    }

    pub const fn supports(self) -> &'static DialectSupports {
        match self {
            DialectKind::OpenEdge => &DialectSupports::OPENEDGE,
            DialectKind::Postgres => &DialectSupports::POSTGRES,
        }
    }

    /// Catalog table listing runtime-defined types, if the engine has one.
    pub const fn type_catalog(self) -> Option<&'static str> {
        match self {
            DialectKind::OpenEdge => None,
            DialectKind::Postgres => Some("pg_type"),
        }
    }

    /// Oldest engine version whose catalog can be queried for dynamic types.
    pub const fn dynamic_types_min_version(self) -> DatabaseVersion {
        DatabaseVersion::new(8, 3, 0)
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote_identifier(self, identifier: &str) -> String {
        let mut out = String::with_capacity(identifier.len() + 2);
        out.push(TICK_CHAR);
        for c in identifier.chars() {
            if c == TICK_CHAR {
                out.push(TICK_CHAR);
            }
            out.push(c);
        }
        out.push(TICK_CHAR);
        out
    }

    /// Statement issued once on every new connection; empty means none.
    pub fn session_init(self, options: &OpenEdgeConnectOptions) -> String {
        let mut query = String::new();

        if self == DialectKind::Postgres {
            let version = options.effective_version();
            if version >= DatabaseVersion::new(8, 2, 0) {
                query.push_str("SET standard_conforming_strings=on;");
            }
            if !options.keep_default_timezone {
                if !query.is_empty() {
                    query.push(' ');
                }
                query.push_str(&format!(
                    "SET client_min_messages TO warning; SET TIME ZONE INTERVAL '{}' HOUR TO MINUTE;",
                    options.timezone
                ));
            }
        }

        if let Some(extra) = options.session_init.as_deref().map(str::trim) {
            if !extra.is_empty() {
                if !query.is_empty() {
                    query.push(' ');
                }
                query.push_str(extra);
            }
        }

        query
    }
}

impl Display for DialectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = OpenEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openedge" | "progress" => Ok(DialectKind::OpenEdge),
            "postgres" | "postgresql" => Ok(DialectKind::Postgres),
            other => Err(OpenEdgeError::Configuration(format!("unknown dialect: {other:?}"))),
        }
    }
}

/// A dialect instance: feature flags plus its own registries and manager.
#[derive(Debug, Clone)]
pub struct Dialect {
    kind: DialectKind,
    registry: Arc<TypeRegistry>,
    manager: Arc<ConnectionManager>,
}

impl Dialect {
    /// Build a dialect around `driver` with a fresh type registry.
    pub fn new(kind: DialectKind, driver: Arc<dyn NativeDriver>) -> Self {
        let registry = Arc::new(TypeRegistry::for_dialect(kind));
        let manager = Arc::new(ConnectionManager::new(kind, Arc::clone(&registry), driver));
        Self {
            kind,
            registry,
            manager,
        }
    }

    /// Build a dialect over the system ODBC driver manager.
    ///
    /// Fails with [`OpenEdgeError::ModuleNotFound`] when no ODBC environment
    /// can be created.
    pub fn odbc(kind: DialectKind) -> Result<Self, OpenEdgeError> {
        let driver = crate::openedge::driver::odbc::OdbcDriver::new()?;
        Ok(Self::new(kind, Arc::new(driver)))
    }

    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn supports(&self) -> &'static DialectSupports {
        self.kind.supports()
    }

    pub fn quote_identifier(&self, identifier: &str) -> String {
        self.kind.quote_identifier(identifier)
    }

    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Connect options for this dialect, with the manager attached.
    pub fn connect_options(&self) -> OpenEdgeConnectOptions {
        OpenEdgeConnectOptions::new()
            .dialect(self.kind)
            .connection_manager(Arc::clone(&self.manager))
    }
}
