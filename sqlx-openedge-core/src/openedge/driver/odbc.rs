//! Native driver over the system ODBC driver manager (`odbc-api`).

use crate::openedge::driver::{
    command_of, BoxFuture, DriverEvent, EventListener, NativeColumn, NativeConnection,
    NativeDriver, ResultSet, StatementDescription,
};
use crate::openedge::error::codes;
use crate::openedge::type_info::sql_codes;
use crate::openedge::types::{parse_decimal, parse_floating, TypeContext, TypeParser};
use crate::openedge::{DriverError, Oid, OpenEdgeError, OpenEdgeTypeInfo, OpenEdgeValueData};
use odbc_api::parameter::VarCharBox;
use odbc_api::{Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

// One environment per process; every connection borrows it for 'static.
static ODBC_ENV: OnceLock<Result<Environment, String>> = OnceLock::new();

fn environment() -> Result<&'static Environment, OpenEdgeError> {
    match ODBC_ENV.get_or_init(|| Environment::new().map_err(|e| e.to_string())) {
        Ok(env) => Ok(env),
        Err(message) => {
            log::error!("failed to create ODBC environment: {message}");
            Err(OpenEdgeError::ModuleNotFound("odbc".to_owned()))
        }
    }
}

/// [`NativeDriver`] backed by the process-wide ODBC environment.
#[derive(Debug, Clone, Copy)]
pub struct OdbcDriver {
    env: &'static Environment,
}

impl OdbcDriver {
    /// Fails with [`OpenEdgeError::ModuleNotFound`] if no ODBC driver manager
    /// is available.
    pub fn new() -> Result<Self, OpenEdgeError> {
        Ok(Self { env: environment()? })
    }

    /// Like [`new`](Self::new), and also checks that the ODBC driver
    /// `driver_name` is installed.
    pub fn with_driver(driver_name: &str) -> Result<Self, OpenEdgeError> {
        let driver = Self::new()?;
        let installed = driver
            .env
            .drivers()
            .map_err(|e| {
                log::error!("failed to list ODBC drivers: {e}");
                OpenEdgeError::ModuleNotFound(driver_name.to_owned())
            })?
            .iter()
            .any(|info| info.description.eq_ignore_ascii_case(driver_name));

        if installed {
            Ok(driver)
        } else {
            Err(OpenEdgeError::ModuleNotFound(driver_name.to_owned()))
        }
    }
}

impl NativeDriver for OdbcDriver {
    fn name(&self) -> &str {
        "odbc"
    }

    fn open<'a>(
        &'a self,
        connection_string: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn NativeConnection>, DriverError>> {
        let env = self.env;
        let connection_string = connection_string.to_owned();

        Box::pin(async move {
            let conn = tokio::task::spawn_blocking(move || {
                env.connect_with_connection_string(&connection_string, ConnectionOptions::default())
                    .map_err(driver_error)
            })
            .await
            .map_err(|e| DriverError::new("ODBC worker crashed").with_source(e))??;

            Ok(Box::new(OdbcNativeConnection {
                inner: Some(Arc::new(Mutex::new(conn))),
                listener: None,
            }) as Box<dyn NativeConnection>)
        })
    }

    fn default_type_parser(&self, oid: Oid) -> TypeParser {
        Arc::new(move |raw: &str, _: &TypeContext| parse_by_sql_code(oid, raw))
    }
}

/// Convert text by the column's ODBC SQL data type code.
pub fn parse_by_sql_code(oid: Oid, raw: &str) -> OpenEdgeValueData {
    let text = || OpenEdgeValueData::Text(raw.to_owned());
    match oid {
        sql_codes::BIT => match raw {
            "1" => OpenEdgeValueData::Bool(true),
            "0" => OpenEdgeValueData::Bool(false),
            _ => text(),
        },
        sql_codes::TINYINT | sql_codes::SMALLINT => {
            raw.trim().parse().map(OpenEdgeValueData::SmallInt).unwrap_or_else(|_| text())
        }
        sql_codes::INTEGER => raw.trim().parse().map(OpenEdgeValueData::Int).unwrap_or_else(|_| text()),
        sql_codes::BIGINT => raw.trim().parse().map(OpenEdgeValueData::BigInt).unwrap_or_else(|_| text()),
        sql_codes::DECIMAL | sql_codes::NUMERIC => parse_decimal(raw),
        sql_codes::FLOAT | sql_codes::REAL | sql_codes::DOUBLE => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => OpenEdgeValueData::Double(v),
            _ => parse_floating(raw),
        },
        sql_codes::BINARY | sql_codes::VARBINARY | sql_codes::LONGVARBINARY => {
            let digits = raw
                .strip_prefix("0x")
                .or_else(|| raw.strip_prefix("0X"))
                .unwrap_or(raw);
            hex::decode(digits)
                .map(OpenEdgeValueData::Binary)
                .unwrap_or_else(|_| text())
        }
        _ => text(),
    }
}

/// An open ODBC connection.
///
/// The handle sits behind a mutex so blocking calls can run on the tokio
/// blocking pool.
pub struct OdbcNativeConnection {
    inner: Option<Arc<Mutex<Connection<'static>>>>,
    listener: Option<EventListener>,
}

impl OdbcNativeConnection {
    fn handle(&self) -> Result<Arc<Mutex<Connection<'static>>>, DriverError> {
        self.inner
            .clone()
            .ok_or_else(|| DriverError::new("connection is closed").with_sqlstate("08003"))
    }

    fn notify(&self, error: &DriverError) {
        if error.is_connection_exception() {
            if let Some(listener) = &self.listener {
                listener(&DriverEvent::Error(DriverError {
                    message: error.message.clone(),
                    code: error.code.clone(),
                    sqlstate: error.sqlstate.clone(),
                    source: None,
                }));
            }
        }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, DriverError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection<'static>) -> Result<T, odbc_api::Error> + Send + 'static,
    {
        let handle = self.handle()?;
        let result = tokio::task::spawn_blocking(move || {
            let conn = handle.lock();
            f(&conn).map_err(driver_error)
        })
        .await
        .map_err(|e| DriverError::new("ODBC worker crashed").with_source(e))?;

        if let Err(error) = &result {
            self.notify(error);
        }
        result
    }
}

impl NativeConnection for OdbcNativeConnection {
    fn on_event(&mut self, listener: EventListener) {
        self.listener = Some(listener);
    }

    fn query<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [Option<String>],
    ) -> BoxFuture<'a, Result<Vec<ResultSet>, DriverError>> {
        let sql = sql.to_owned();
        let params: Vec<VarCharBox> = params
            .iter()
            .map(|p| match p {
                Some(text) => VarCharBox::from_string(text.clone()),
                None => VarCharBox::null(),
            })
            .collect();

        Box::pin(async move { self.blocking(move |conn| run_query(conn, &sql, &params)).await })
    }

    fn describe<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<StatementDescription, DriverError>> {
        let sql = sql.to_owned();
        Box::pin(async move { self.blocking(move |conn| describe_query(conn, &sql)).await })
    }

    fn set_autocommit(&mut self, enabled: bool) -> BoxFuture<'_, Result<(), DriverError>> {
        Box::pin(async move { self.blocking(move |conn| conn.set_autocommit(enabled)).await })
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), DriverError>> {
        Box::pin(async move { self.blocking(|conn| conn.commit()).await })
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), DriverError>> {
        Box::pin(async move { self.blocking(|conn| conn.rollback()).await })
    }

    fn close_sync(&mut self) {
        // Dropping the last reference disconnects.
        if self.inner.take().is_some() {
            if let Some(listener) = &self.listener {
                listener(&DriverEvent::End);
            }
        }
    }
}

impl Drop for OdbcNativeConnection {
    fn drop(&mut self) {
        self.close_sync();
    }
}

fn run_query(
    conn: &Connection<'static>,
    sql: &str,
    params: &[VarCharBox],
) -> Result<Vec<ResultSet>, odbc_api::Error> {
    let mut statement = conn.preallocate()?;
    let mut results = Vec::new();
    let command = command_of(sql);

    if let Some(cursor) = statement.execute(sql, params)? {
        let mut next = Some(cursor);
        while let Some(mut cursor) = next {
            results.push(read_result_set(&mut cursor, command.clone())?);
            next = cursor.more_results()?;
        }
        return Ok(results);
    }

    let rows_affected = statement.row_count()?.unwrap_or(0) as u64;
    results.push(ResultSet {
        command,
        rows_affected,
        ..ResultSet::default()
    });
    Ok(results)
}

fn read_result_set<C: Cursor>(cursor: &mut C, command: Option<String>) -> Result<ResultSet, odbc_api::Error> {
    let num_cols = cursor.num_result_cols()?.max(0) as u16;

    let mut columns = Vec::with_capacity(num_cols as usize);
    for i in 1..=num_cols {
        columns.push(describe_column(cursor, i)?);
    }

    let mut rows = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        let mut values = Vec::with_capacity(num_cols as usize);
        for i in 1..=num_cols {
            buf.clear();
            let has_value = row.get_text(i, &mut buf)?;
            values.push(has_value.then(|| String::from_utf8_lossy(&buf).into_owned()));
        }
        rows.push(values);
    }

    let rows_affected = rows.len() as u64;
    Ok(ResultSet {
        command,
        columns,
        rows,
        rows_affected,
    })
}

fn describe_column<M: ResultSetMetadata>(meta: &mut M, index: u16) -> Result<NativeColumn, odbc_api::Error> {
    let name = meta.col_name(index)?;
    let data_type = meta.col_data_type(index)?;
    let nullable = meta.col_nullability(index)?.could_be_nullable();

    Ok(NativeColumn {
        name,
        oid: sql_code(data_type),
        type_name: data_type_name(data_type).to_owned(),
        nullable: Some(nullable),
    })
}

fn describe_query(conn: &Connection<'static>, sql: &str) -> Result<StatementDescription, odbc_api::Error> {
    let mut prepared = conn.prepare(sql)?;

    let num_cols = prepared.num_result_cols()?.max(0) as u16;
    let mut columns = Vec::with_capacity(num_cols as usize);
    for i in 1..=num_cols {
        columns.push(describe_column(&mut prepared, i)?);
    }

    let num_params = prepared.num_params()?;
    let mut parameters = Vec::with_capacity(num_params as usize);
    for i in 1..=num_params {
        let description = prepared.describe_param(i)?;
        let data_type = description.data_type;
        parameters.push(OpenEdgeTypeInfo::new(sql_code(data_type), data_type_name(data_type)));
    }

    Ok(StatementDescription { columns, parameters })
}

/// Map an `odbc-api` error onto a [`DriverError`] with SQLSTATE and a
/// stable classification code.
pub(crate) fn driver_error(error: odbc_api::Error) -> DriverError {
    let message = error.to_string();
    let mut driver_error = DriverError::new(message.clone());

    if let Some(state) = extract_sqlstate(&message) {
        if let Some(code) = classify_sqlstate(&state) {
            driver_error = driver_error.with_code(code);
        }
        driver_error = driver_error.with_sqlstate(state);
    }

    driver_error.with_source(error)
}

/// Stable code for a connection-phase SQLSTATE.
pub fn classify_sqlstate(state: &str) -> Option<&'static str> {
    match state {
        "08001" => Some(codes::CONNECTION_REFUSED),
        "08S01" => Some(codes::HOST_UNREACHABLE),
        "01S00" | "IM002" => Some(codes::INVALID_PARAMETERS),
        _ => None,
    }
}

/// Pull the SQLSTATE out of an ODBC diagnostic message.
///
/// Accepts both `State: 08001, Native error: ...` and `[08001] ...`.
pub fn extract_sqlstate(message: &str) -> Option<String> {
    let is_state = |s: &str| s.len() == 5 && s.chars().all(|c| c.is_ascii_alphanumeric());

    if let Some(pos) = message.find("State: ") {
        let candidate = message.get(pos + 7..pos + 12)?;
        if is_state(candidate) {
            return Some(candidate.to_owned());
        }
    }

    let mut rest = message;
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        if let Some(end) = after.find(']') {
            let candidate = &after[..end];
            if is_state(candidate) {
                return Some(candidate.to_owned());
            }
            rest = &after[end + 1..];
        } else {
            break;
        }
    }
    None
}

/// ODBC SQL data type code of a column type.
pub fn sql_code(data_type: DataType) -> Oid {
    match data_type {
        DataType::Unknown => sql_codes::UNKNOWN,
        DataType::Char { .. } => sql_codes::CHAR,
        DataType::Numeric { .. } => sql_codes::NUMERIC,
        DataType::Decimal { .. } => sql_codes::DECIMAL,
        DataType::Integer => sql_codes::INTEGER,
        DataType::SmallInt => sql_codes::SMALLINT,
        DataType::Float { .. } => sql_codes::FLOAT,
        DataType::Real => sql_codes::REAL,
        DataType::Double => sql_codes::DOUBLE,
        DataType::Varchar { .. } => sql_codes::VARCHAR,
        DataType::Date => sql_codes::DATE,
        DataType::Time { .. } => sql_codes::TIME,
        DataType::Timestamp { .. } => sql_codes::TIMESTAMP,
        DataType::LongVarchar { .. } => sql_codes::LONGVARCHAR,
        DataType::Binary { .. } => sql_codes::BINARY,
        DataType::Varbinary { .. } => sql_codes::VARBINARY,
        DataType::LongVarbinary { .. } => sql_codes::LONGVARBINARY,
        DataType::BigInt => sql_codes::BIGINT,
        DataType::TinyInt => sql_codes::TINYINT,
        DataType::Bit => sql_codes::BIT,
        DataType::WChar { .. } => sql_codes::WCHAR,
        DataType::WVarchar { .. } => sql_codes::WVARCHAR,
        DataType::WLongVarchar { .. } => sql_codes::WLONGVARCHAR,
        DataType::Other { data_type, .. } => Oid(i64::from(data_type.0)),
    }
}

/// Display name for a DataType
pub fn data_type_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::BigInt => "BIGINT",
        DataType::Binary { .. } => "BINARY",
        DataType::Bit => "BIT",
        DataType::Char { .. } => "CHAR",
        DataType::Date => "DATE",
        DataType::Decimal { .. } => "DECIMAL",
        DataType::Double => "DOUBLE PRECISION",
        DataType::Float { .. } => "FLOAT",
        DataType::Integer => "INTEGER",
        DataType::LongVarbinary { .. } => "LONGVARBINARY",
        DataType::LongVarchar { .. } => "LONGVARCHAR",
        DataType::Numeric { .. } => "NUMERIC",
        DataType::Real => "REAL",
        DataType::SmallInt => "SMALLINT",
        DataType::Time { .. } => "TIME",
        DataType::Timestamp { .. } => "TIMESTAMP",
        DataType::TinyInt => "TINYINT",
        DataType::Varbinary { .. } => "VARBINARY",
        DataType::Varchar { .. } => "VARCHAR",
        DataType::WChar { .. } => "WCHAR",
        DataType::WLongVarchar { .. } => "WLONGVARCHAR",
        DataType::WVarchar { .. } => "WVARCHAR",
        DataType::Unknown => "UNKNOWN",
        DataType::Other { .. } => "OTHER",
    }
}
