//! A scripted native driver for exercising the connection manager without a server.
//!
//! Statements are answered by the first rule whose prefix matches; anything
//! unmatched succeeds with an empty result. Every call is recorded.

#![allow(dead_code)]

use parking_lot::Mutex;
use sqlx_openedge_core::openedge::driver::{
    BoxFuture, DriverEvent, EventListener, NativeColumn, NativeConnection, NativeDriver, ResultSet,
    StatementDescription,
};
use sqlx_openedge_core::openedge::{Dialect, DialectKind, DriverError, Oid};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Reply {
    Rows(Vec<ResultSet>),
    Fail {
        message: String,
        code: Option<String>,
        sqlstate: Option<String>,
    },
}

impl Reply {
    pub fn fail(message: &str, sqlstate: &str) -> Self {
        Reply::Fail {
            message: message.to_owned(),
            code: None,
            sqlstate: Some(sqlstate.to_owned()),
        }
    }

    fn into_result(self) -> Result<Vec<ResultSet>, DriverError> {
        match self {
            Reply::Rows(results) => Ok(results),
            Reply::Fail {
                message,
                code,
                sqlstate,
            } => Err(driver_error(&message, code.as_deref(), sqlstate.as_deref())),
        }
    }
}

struct Rule {
    prefix: String,
    reply: Reply,
    once: bool,
}

/// Everything the mock saw, plus what it will answer.
#[derive(Default)]
pub struct Script {
    /// Statements with their bound parameters, in order.
    pub queries: Vec<(String, Vec<Option<String>>)>,
    /// Non-query calls: `autocommit=false`, `commit`, `rollback`, `close`.
    pub calls: Vec<String>,
    pub connection_strings: Vec<String>,
    pub opened: usize,
    open_error: Option<(String, Option<String>, Option<String>)>,
    rules: Vec<Rule>,
    listener: Option<EventListener>,
}

impl Script {
    pub fn sql(&self) -> Vec<&str> {
        self.queries.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

/// Handle the tests keep to script and inspect a [`MockDriver`].
#[derive(Clone, Default)]
pub struct Mock {
    pub script: Arc<Mutex<Script>>,
}

impl Mock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every statement starting with `prefix`.
    pub fn respond(&self, prefix: &str, reply: Reply) -> &Self {
        self.script.lock().rules.push(Rule {
            prefix: prefix.to_owned(),
            reply,
            once: false,
        });
        self
    }

    /// Answer the next statement starting with `prefix`, ahead of any
    /// standing rule, then fall through.
    pub fn respond_once(&self, prefix: &str, reply: Reply) -> &Self {
        self.script.lock().rules.push(Rule {
            prefix: prefix.to_owned(),
            reply,
            once: true,
        });
        self
    }

    /// Make the next `open` fail with the given stable code.
    pub fn fail_open(&self, message: &str, code: Option<&str>) {
        self.script.lock().open_error = Some((message.to_owned(), code.map(str::to_owned), None));
    }

    /// Deliver an event as the driver would, outside any operation.
    pub fn emit(&self, event: DriverEvent) {
        let listener = self.script.lock().listener.clone();
        if let Some(listener) = listener {
            listener(&event);
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.script.lock().sql().into_iter().map(str::to_owned).collect()
    }

    pub fn params(&self, index: usize) -> Vec<Option<String>> {
        self.script.lock().queries[index].1.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().calls.clone()
    }

    pub fn connection_strings(&self) -> Vec<String> {
        self.script.lock().connection_strings.clone()
    }

    pub fn clear(&self) {
        let mut script = self.script.lock();
        script.queries.clear();
        script.calls.clear();
    }

    pub fn driver(&self) -> Arc<MockDriver> {
        Arc::new(MockDriver { mock: self.clone() })
    }

    /// A dialect over this mock with a fresh registry.
    pub fn dialect(&self, kind: DialectKind) -> Dialect {
        Dialect::new(kind, self.driver())
    }
}

pub struct MockDriver {
    mock: Mock,
}

impl NativeDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn open<'a>(
        &'a self,
        connection_string: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn NativeConnection>, DriverError>> {
        Box::pin(async move {
            let mut script = self.mock.script.lock();
            script.connection_strings.push(connection_string.to_owned());

            if let Some((message, code, sqlstate)) = script.open_error.take() {
                return Err(driver_error(&message, code.as_deref(), sqlstate.as_deref()));
            }

            script.opened += 1;
            Ok(Box::new(MockConnection {
                mock: self.mock.clone(),
                closed: false,
            }) as Box<dyn NativeConnection>)
        })
    }
}

pub struct MockConnection {
    mock: Mock,
    closed: bool,
}

impl MockConnection {
    fn record(&self, call: &str) {
        self.mock.script.lock().calls.push(call.to_owned());
    }
}

impl NativeConnection for MockConnection {
    fn on_event(&mut self, listener: EventListener) {
        self.mock.script.lock().listener = Some(listener);
    }

    fn query<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [Option<String>],
    ) -> BoxFuture<'a, Result<Vec<ResultSet>, DriverError>> {
        Box::pin(async move {
            let (reply, listener) = {
                let mut script = self.mock.script.lock();
                script.queries.push((sql.to_owned(), params.to_vec()));

                let matches = |rule: &Rule| sql.starts_with(&rule.prefix);
                let position = script
                    .rules
                    .iter()
                    .position(|rule| rule.once && matches(rule))
                    .or_else(|| script.rules.iter().position(matches));
                let reply = match position {
                    Some(i) if script.rules[i].once => script.rules.remove(i).reply,
                    Some(i) => script.rules[i].reply.clone(),
                    None => Reply::Rows(vec![ResultSet::default()]),
                };
                (reply, script.listener.clone())
            };

            let result = reply.into_result();
            if let (Err(error), Some(listener)) = (&result, listener) {
                if error.is_connection_exception() {
                    listener(&DriverEvent::Error(driver_error(
                        &error.to_string(),
                        error.classification_code(),
                        error.sqlstate(),
                    )));
                }
            }
            result
        })
    }

    fn describe<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<StatementDescription, DriverError>> {
        Box::pin(async move {
            let results = self.query(sql, &[]).await?;
            Ok(StatementDescription {
                columns: results.into_iter().next().map(|r| r.columns).unwrap_or_default(),
                parameters: Vec::new(),
            })
        })
    }

    fn set_autocommit(&mut self, enabled: bool) -> BoxFuture<'_, Result<(), DriverError>> {
        self.record(&format!("autocommit={enabled}"));
        Box::pin(async { Ok(()) })
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), DriverError>> {
        self.record("commit");
        Box::pin(async { Ok(()) })
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), DriverError>> {
        self.record("rollback");
        Box::pin(async { Ok(()) })
    }

    fn close_sync(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.record("close");
        let listener = self.mock.script.lock().listener.clone();
        if let Some(listener) = listener {
            listener(&DriverEvent::End);
        }
    }
}

pub fn driver_error(message: &str, code: Option<&str>, sqlstate: Option<&str>) -> DriverError {
    let mut error = DriverError::new(message);
    if let Some(code) = code {
        error = error.with_code(code);
    }
    if let Some(sqlstate) = sqlstate {
        error = error.with_sqlstate(sqlstate);
    }
    error
}

/// A single `SELECT` result with every column reported under `oid`s.
pub fn result_set(columns: &[(&str, Oid)], rows: &[&[Option<&str>]]) -> ResultSet {
    ResultSet {
        command: Some("SELECT".into()),
        columns: columns
            .iter()
            .map(|(name, oid)| NativeColumn::new(*name, *oid, "mock"))
            .collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|v| v.map(str::to_owned)).collect())
            .collect(),
        rows_affected: 0,
    }
}

/// Rows as the `pg_type` catalog returns them: `typname, typtype, oid, typarray`.
pub fn catalog(rows: &[(&str, &str, i64, i64)]) -> ResultSet {
    let rows: Vec<Vec<Option<String>>> = rows
        .iter()
        .map(|(name, typtype, oid, array)| {
            vec![
                Some(name.to_string()),
                Some(typtype.to_string()),
                Some(oid.to_string()),
                Some(array.to_string()),
            ]
        })
        .collect();
    ResultSet {
        command: Some("SELECT".into()),
        columns: ["typname", "typtype", "oid", "typarray"]
            .iter()
            .map(|name| NativeColumn::new(*name, Oid(1043), "varchar"))
            .collect(),
        rows,
        rows_affected: 0,
    }
}
