use crate::openedge::connection::{refresh, ConnectionState, OpenEdgeConnection};
use crate::openedge::dialect::DialectKind;
use crate::openedge::driver::odbc::OdbcDriver;
use crate::openedge::driver::NativeDriver;
use crate::openedge::types::{ParserRegistry, TypeContext, TypeParser, TypeRegistry};
use crate::openedge::{Oid, OpenEdgeConnectOptions, OpenEdgeError};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Opens, validates and closes native connections for one dialect instance,
/// and owns that instance's parser bindings.
pub struct ConnectionManager {
    kind: DialectKind,
    registry: Arc<TypeRegistry>,
    parsers: ParserRegistry,
    driver: Arc<dyn NativeDriver>,
}

impl ConnectionManager {
    pub fn new(kind: DialectKind, registry: Arc<TypeRegistry>, driver: Arc<dyn NativeDriver>) -> Self {
        let parsers = ParserRegistry::new(Arc::clone(&driver));
        parsers.rebuild(&registry);
        Self {
            kind,
            registry,
            parsers,
            driver,
        }
    }

    /// Manager over the system ODBC driver manager with a fresh type registry.
    pub fn with_odbc(kind: DialectKind) -> Result<Self, OpenEdgeError> {
        let driver = OdbcDriver::new()?;
        Ok(Self::new(kind, Arc::new(TypeRegistry::for_dialect(kind)), Arc::new(driver)))
    }

    /// Like [`with_odbc`](Self::with_odbc), failing with
    /// [`OpenEdgeError::ModuleNotFound`] unless `driver_name` is installed.
    pub fn with_odbc_driver(kind: DialectKind, driver_name: &str) -> Result<Self, OpenEdgeError> {
        let driver = OdbcDriver::with_driver(driver_name)?;
        Ok(Self::new(kind, Arc::new(TypeRegistry::for_dialect(kind)), Arc::new(driver)))
    }

    pub fn dialect(&self) -> DialectKind {
        self.kind
    }

    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn parser_registry(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Open a connection.
    ///
    /// Failures are classified by the driver's code; a failing session-init
    /// statement closes the handle and is classified the same way. When the
    /// dialect has a type catalog and no dynamic type is known yet, the
    /// catalog is queried once; a failure there is only logged.
    pub async fn connect(
        self: &Arc<Self>,
        options: &OpenEdgeConnectOptions,
    ) -> Result<OpenEdgeConnection, OpenEdgeError> {
        let connection_string = options.connection_string()?;

        let mut native = self
            .driver
            .open(&connection_string)
            .await
            .map_err(OpenEdgeError::from_connect_failure)?;

        let state = Arc::new(ConnectionState::default());
        native.on_event(state.listener());

        let init = self.kind.session_init(options);
        if !init.is_empty() {
            if let Err(error) = native.query(&init, &[]).await {
                native.close_sync();
                return Err(OpenEdgeError::from_connect_failure(error));
            }
        }

        let mut conn = OpenEdgeConnection {
            native,
            state,
            manager: Arc::clone(self),
            options: options.clone(),
            context: TypeContext::new(self.kind, options.timezone),
            transaction_depth: 0,
            pending_rollback: None,
        };

        if self.kind.type_catalog().is_some() && self.registry.dynamic_oids_empty() {
            if let Err(error) = self.refresh_type_parser(&mut conn).await {
                log::warn!("failed to load dynamic types from the type catalog: {error}");
            }
        }

        log::debug!(
            "connection acquired ({} via {}, {}:{})",
            self.kind,
            self.driver.name(),
            options.host,
            options.get_port()
        );
        Ok(conn)
    }

    /// Close the handle. Never fails; closing twice does nothing.
    pub fn disconnect(&self, conn: &mut OpenEdgeConnection) {
        if conn.state.mark_closed() {
            conn.native.close_sync();
            log::debug!("connection closed");
        }
    }

    /// Whether the pool may hand out `conn`. No I/O.
    pub fn validate(&self, conn: &OpenEdgeConnection) -> bool {
        !conn.state.is_invalid() && !conn.state.is_closed()
    }

    /// Parser for a native type code; never fails.
    pub fn get_type_parser(&self, oid: Oid) -> TypeParser {
        self.parsers.lookup_parser(oid)
    }

    /// Re-load the dynamic types from the engine's catalog and rebuild the
    /// parser bindings. Returns without a round trip on dialects without a
    /// catalog or on engines older than the dialect's minimum version.
    pub async fn refresh_type_parser(&self, conn: &mut OpenEdgeConnection) -> Result<(), OpenEdgeError> {
        let version = conn.options.effective_version();
        let refreshed =
            refresh::refresh_dynamic_types(self.kind, &self.registry, conn.native.as_mut(), version).await?;

        if refreshed.is_some() {
            self.parsers.rebuild(&self.registry);
        }
        Ok(())
    }
}

impl Debug for ConnectionManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("dialect", &self.kind)
            .field("driver", &self.driver.name())
            .field("parsers", &self.parsers)
            .finish()
    }
}
