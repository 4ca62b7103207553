//! Connection manager tests against a scripted native driver.
//!
//! No server is needed: `common::Mock` answers statements by prefix and
//! records every call, so these tests check exactly what the manager sends
//! and how it reacts to driver failures and events.

mod common;

use chrono::{FixedOffset, TimeZone, Utc};
use common::{catalog, result_set, Mock, Reply};
use rust_decimal::Decimal;
use sqlx_openedge_core::openedge::driver::{DriverEvent, ResultSet};
use sqlx_openedge_core::openedge::types::{TypeContext, TypeKey};
use sqlx_openedge_core::openedge::{
    codes, query, sql_codes, ConnectionStatus, DatabaseVersion, DialectKind, DriverError, Oid,
    OpenEdgeConnectOptions, OpenEdgeConnection, OpenEdgeError, OpenEdgeTransactionManager, OpenEdgeValueData,
    DYNAMIC_TYPES_QUERY,
};
use sqlx_openedge_core::sqlx_core::connection::{ConnectOptions, Connection};
use sqlx_openedge_core::sqlx_core::executor::Executor;
use sqlx_openedge_core::sqlx_core::row::Row;
use sqlx_openedge_core::sqlx_core::transaction::TransactionManager;
use std::collections::BTreeMap;
use std::sync::Arc;

fn plus_one() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

fn options(mock: &Mock, kind: DialectKind) -> OpenEdgeConnectOptions {
    mock.dialect(kind)
        .connect_options()
        .driver("Driver X")
        .database("sp")
        .username("SYSPROGRESS")
        .password("SYSPROGRESS")
}

/// Helper to establish a connection for tests
async fn connect(mock: &Mock, kind: DialectKind) -> OpenEdgeConnection {
    OpenEdgeConnection::establish(&options(mock, kind))
        .await
        .expect("Failed to connect to mock driver")
}

// ============================================================================
// Establishment
// ============================================================================

#[tokio::test]
async fn test_connection_string_uses_driver() {
    let mock = Mock::new();
    let _conn = connect(&mock, DialectKind::OpenEdge).await;

    assert_eq!(
        mock.connection_strings(),
        vec!["Driver=Driver X;HOST=localhost;PORT=20666;DATABASE=sp;UID=SYSPROGRESS;PASSWORD=SYSPROGRESS"]
    );
}

#[tokio::test]
async fn test_dsn_takes_precedence_over_driver() {
    let mock = Mock::new();
    let options = options(&mock, DialectKind::OpenEdge).dsn("sports").port(21000);
    let _conn = options.connect().await.expect("connect should succeed");

    let strings = mock.connection_strings();
    assert!(strings[0].starts_with("DSN=sports;HOST=localhost;PORT=21000;"), "{strings:?}");
    assert!(!strings[0].contains("Driver="));
}

#[tokio::test]
async fn test_missing_dsn_and_driver_is_a_configuration_error() {
    let mock = Mock::new();
    let options = mock.dialect(DialectKind::OpenEdge).connect_options().database("sp");

    let err = OpenEdgeConnection::establish(&options).await.unwrap_err();
    assert!(matches!(err, OpenEdgeError::Configuration(_)), "{err:?}");
    assert!(mock.connection_strings().is_empty(), "Driver should not be asked to open");
}

#[tokio::test]
async fn test_connect_failures_are_classified_by_code() {
    let cases: [(Option<&str>, fn(&OpenEdgeError) -> bool); 5] = [
        (Some(codes::CONNECTION_REFUSED), |e| matches!(e, OpenEdgeError::ConnectionRefused(_))),
        (Some(codes::HOST_NOT_FOUND), |e| matches!(e, OpenEdgeError::HostNotFound(_))),
        (Some(codes::HOST_UNREACHABLE), |e| matches!(e, OpenEdgeError::HostNotReachable(_))),
        (Some(codes::INVALID_PARAMETERS), |e| matches!(e, OpenEdgeError::InvalidConnection(_))),
        (None, |e| matches!(e, OpenEdgeError::Connection(_))),
    ];

    for (code, is_expected) in cases {
        let mock = Mock::new();
        mock.fail_open("cannot connect", code);

        let err = OpenEdgeConnection::establish(&options(&mock, DialectKind::OpenEdge))
            .await
            .unwrap_err();
        assert!(is_expected(&err), "code {code:?} classified as {err:?}");
        assert!(err.is_connection_error());
        assert_eq!(err.driver_error().map(|e| e.to_string()), Some("cannot connect".to_owned()));
    }
}

#[tokio::test]
async fn test_retryable_connect_failures() {
    let refused = OpenEdgeError::from_connect_failure(DriverError::new("x").with_code(codes::CONNECTION_REFUSED));
    let invalid = OpenEdgeError::from_connect_failure(DriverError::new("x").with_code(codes::INVALID_PARAMETERS));

    assert!(refused.is_retryable());
    assert!(!invalid.is_retryable());
    assert!(OpenEdgeError::timed_out("gave up").is_retryable());
}

#[tokio::test]
async fn test_openedge_connect_sends_nothing() {
    let mock = Mock::new();
    let conn = connect(&mock, DialectKind::OpenEdge).await;

    assert!(mock.queries().is_empty(), "OpenEdge has no session setup: {:?}", mock.queries());
    assert_eq!(conn.status(), ConnectionStatus::Valid);
}

#[tokio::test]
async fn test_postgres_session_init() {
    let mock = Mock::new();
    let options = options(&mock, DialectKind::Postgres).timezone(plus_one());
    let _conn = OpenEdgeConnection::establish(&options).await.unwrap();

    let queries = mock.queries();
    assert_eq!(
        queries[0],
        "SET standard_conforming_strings=on; SET client_min_messages TO warning; \
         SET TIME ZONE INTERVAL '+01:00' HOUR TO MINUTE;"
    );
}

#[tokio::test]
async fn test_keep_default_timezone_skips_time_zone() {
    let mock = Mock::new();
    let options = options(&mock, DialectKind::Postgres).keep_default_timezone(true);
    let _conn = OpenEdgeConnection::establish(&options).await.unwrap();

    assert_eq!(mock.queries()[0], "SET standard_conforming_strings=on;");
}

#[tokio::test]
async fn test_session_init_failure_closes_handle() {
    let mock = Mock::new();
    mock.respond(
        "SET",
        Reply::Fail {
            message: "bad session setting".into(),
            code: Some(codes::INVALID_PARAMETERS.into()),
            sqlstate: Some("HY000".into()),
        },
    );

    let err = OpenEdgeConnection::establish(&options(&mock, DialectKind::Postgres))
        .await
        .unwrap_err();

    assert!(matches!(err, OpenEdgeError::InvalidConnection(_)), "{err:?}");
    assert_eq!(mock.calls(), vec!["close"], "Handle should be closed exactly once");
}

// ============================================================================
// Validation and disconnect
// ============================================================================

#[tokio::test]
async fn test_driver_error_event_invalidates() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;
    let manager = Arc::clone(conn.connection_manager());

    assert!(manager.validate(&conn));
    assert!(conn.ping().await.is_ok());

    mock.emit(DriverEvent::Error(DriverError::new("link lost").with_sqlstate("08S01")));

    assert!(!manager.validate(&conn));
    assert_eq!(conn.status(), ConnectionStatus::Invalidated);
    assert!(conn.ping().await.is_err(), "Ping should fail after a driver error");
}

#[tokio::test]
async fn test_query_error_does_not_invalidate() {
    let mock = Mock::new();
    mock.respond("SELECT broken", Reply::fail("syntax error", "42000"));
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    let result = conn.execute_raw("SELECT broken").await;
    assert!(matches!(result, Err(OpenEdgeError::Query(_))));
    assert!(conn.is_valid(), "A statement error should not invalidate the connection");
}

#[tokio::test]
async fn test_connection_exception_during_query_invalidates() {
    let mock = Mock::new();
    mock.respond("SELECT", Reply::fail("communication link failure", "08S01"));
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    assert!(conn.execute_raw("SELECT 1").await.is_err());
    assert!(!conn.is_valid());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;
    let manager = Arc::clone(conn.connection_manager());

    manager.disconnect(&mut conn);
    manager.disconnect(&mut conn);
    assert_eq!(conn.status(), ConnectionStatus::Closed);
    assert!(!manager.validate(&conn));

    drop(conn);
    assert_eq!(mock.calls(), vec!["close"], "Handle should be closed exactly once");
}

#[tokio::test]
async fn test_connection_close() {
    let mock = Mock::new();
    let conn = connect(&mock, DialectKind::OpenEdge).await;

    let result = conn.close().await;
    assert!(result.is_ok(), "Close should succeed");
    assert_eq!(mock.calls(), vec!["close"]);
}

#[tokio::test]
async fn test_drop_closes_handle() {
    let mock = Mock::new();
    let conn = connect(&mock, DialectKind::OpenEdge).await;
    drop(conn);

    assert_eq!(mock.calls(), vec!["close"]);
}

// ============================================================================
// Dynamic types
// ============================================================================

fn postgres_catalog(mock: &Mock) {
    mock.respond(
        DYNAMIC_TYPES_QUERY,
        Reply::Rows(vec![catalog(&[
            ("hstore", "b", 16400, 16405),
            ("mood", "e", 16500, 16505),
            ("geometry", "b", 16600, 16605),
            ("int4range", "r", 3904, 3905),
        ])]),
    );
}

#[tokio::test]
async fn test_connect_loads_dynamic_types() {
    let mock = Mock::new();
    postgres_catalog(&mock);
    let conn = connect(&mock, DialectKind::Postgres).await;

    let registry = conn.connection_manager().type_registry();
    assert_eq!(registry.oids(TypeKey::HStore), vec![Oid(16400)]);
    assert_eq!(registry.array_oids(TypeKey::HStore), vec![Oid(16405)]);
    assert_eq!(registry.oids(TypeKey::Enum), vec![Oid(16500)]);
    assert_eq!(registry.oids(TypeKey::Geometry), vec![Oid(16600)]);
    assert_eq!(registry.key_for_oid(Oid(3904)), None, "Range types are not dynamic");

    let parsers = conn.connection_manager().parser_registry();
    assert!(parsers.is_bound(Oid(16400)));
    assert!(parsers.is_bound(Oid(16405)));
}

#[tokio::test]
async fn test_dynamic_types_skipped_below_minimum_version() {
    let mock = Mock::new();
    postgres_catalog(&mock);
    let options = options(&mock, DialectKind::Postgres).database_version(DatabaseVersion::new(8, 2, 0));
    let conn = OpenEdgeConnection::establish(&options).await.unwrap();

    assert!(
        !mock.queries().iter().any(|q| q == DYNAMIC_TYPES_QUERY),
        "Catalog should not be queried on 8.2"
    );
    assert!(conn.connection_manager().type_registry().dynamic_oids_empty());
}

#[tokio::test]
async fn test_dynamic_types_loaded_once_per_dialect() {
    let mock = Mock::new();
    postgres_catalog(&mock);
    let dialect = mock.dialect(DialectKind::Postgres);
    let options = dialect.connect_options().driver("Driver X");

    let _first = OpenEdgeConnection::establish(&options).await.unwrap();
    let _second = OpenEdgeConnection::establish(&options).await.unwrap();

    let catalog_queries = mock.queries().iter().filter(|q| *q == DYNAMIC_TYPES_QUERY).count();
    assert_eq!(catalog_queries, 1);
}

#[tokio::test]
async fn test_refresh_replaces_instead_of_accumulating() {
    let mock = Mock::new();
    postgres_catalog(&mock);
    let mut conn = connect(&mock, DialectKind::Postgres).await;

    mock.respond_once(
        DYNAMIC_TYPES_QUERY,
        Reply::Rows(vec![catalog(&[("hstore", "b", 17000, 17005)])]),
    );
    conn.refresh_type_parser().await.expect("refresh should succeed");

    let registry = Arc::clone(conn.connection_manager().type_registry());
    assert_eq!(registry.oids(TypeKey::HStore), vec![Oid(17000)]);
    assert!(registry.oids(TypeKey::Enum).is_empty(), "Enum codes from the first load must be gone");
    assert!(registry.oids(TypeKey::Geometry).is_empty());

    let parsers = conn.connection_manager().parser_registry();
    assert!(parsers.is_bound(Oid(17000)));
    assert!(!parsers.is_bound(Oid(16400)), "Stale bindings must be dropped");
}

#[tokio::test]
async fn test_refresh_unwraps_leading_set_result() {
    let mock = Mock::new();
    let set = ResultSet {
        command: Some("SET".into()),
        ..ResultSet::default()
    };
    mock.respond(
        DYNAMIC_TYPES_QUERY,
        Reply::Rows(vec![set, catalog(&[("hstore", "b", 16400, 16405)])]),
    );
    let conn = connect(&mock, DialectKind::Postgres).await;

    assert_eq!(
        conn.connection_manager().type_registry().oids(TypeKey::HStore),
        vec![Oid(16400)]
    );
}

#[tokio::test]
async fn test_refresh_failure_on_connect_is_not_fatal() {
    let mock = Mock::new();
    mock.respond(DYNAMIC_TYPES_QUERY, Reply::fail("permission denied for pg_type", "42501"));

    let conn = connect(&mock, DialectKind::Postgres).await;
    assert!(conn.is_valid());
    assert!(conn.connection_manager().type_registry().dynamic_oids_empty());
}

#[tokio::test]
async fn test_openedge_refresh_is_a_no_op() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    conn.refresh_type_parser().await.unwrap();
    assert!(mock.queries().is_empty());
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn test_fetch_routes_values_through_parsers() {
    let mock = Mock::new();
    mock.respond(
        "SELECT",
        Reply::Rows(vec![result_set(
            &[
                ("f", sql_codes::FLOAT),
                ("d", sql_codes::DOUBLE),
                ("amount", sql_codes::DECIMAL),
                ("name", sql_codes::VARCHAR),
                ("n", sql_codes::INTEGER),
            ],
            &[
                &[Some("NaN"), Some("-Infinity"), Some("12.50"), Some("Lift Tours"), Some("42")],
                &[Some("1.5"), Some("Infinity"), None, None, Some("7")],
            ],
        )]),
    );
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    let rows = conn.fetch_all("SELECT f, d, amount, name, n FROM PUB.t").await.unwrap();
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert!(first.try_get::<f64, _>("f").unwrap().is_nan());
    assert_eq!(first.try_get::<f64, _>("d").unwrap(), f64::NEG_INFINITY);
    assert_eq!(first.try_get::<Decimal, _>("amount").unwrap(), Decimal::new(1250, 2));
    assert_eq!(first.try_get::<String, _>("name").unwrap(), "Lift Tours");
    assert_eq!(first.try_get::<i32, _>("N").unwrap(), 42, "Column lookup falls back to case-insensitive");

    let second = &rows[1];
    assert_eq!(second.try_get::<f64, _>(0).unwrap(), 1.5);
    assert_eq!(second.try_get::<f64, _>(1).unwrap(), f64::INFINITY);
    assert_eq!(second.try_get::<Option<Decimal>, _>(2).unwrap(), None);
    assert_eq!(second.try_get::<Option<String>, _>(3).unwrap(), None);
}

#[tokio::test]
async fn test_timestamps_read_in_configured_timezone() {
    let mock = Mock::new();
    mock.respond(
        "SELECT",
        Reply::Rows(vec![result_set(
            &[("at", sql_codes::TIMESTAMP), ("on", sql_codes::DATE)],
            &[&[Some("2011-03-27 10:01:55.000"), Some("2011-03-27")]],
        )]),
    );
    let options = options(&mock, DialectKind::OpenEdge).timezone(plus_one());
    let mut conn = OpenEdgeConnection::establish(&options).await.unwrap();

    let row = conn.fetch_one("SELECT at, on FROM PUB.t").await.unwrap();
    let at: chrono::DateTime<Utc> = row.try_get("at").unwrap();
    assert_eq!(at, Utc.with_ymd_and_hms(2011, 3, 27, 9, 1, 55).unwrap());

    let on: String = row.try_get("on").unwrap();
    assert_eq!(on, "2011-03-27", "Date-only values are never shifted");
}

#[tokio::test]
async fn test_postgres_hstore_and_arrays_decode() {
    let mock = Mock::new();
    postgres_catalog(&mock);
    mock.respond(
        "SELECT attrs",
        Reply::Rows(vec![result_set(
            &[("attrs", Oid(16400)), ("tags", Oid(1015)), ("flags", Oid(1000))],
            &[&[Some(r#""a"=>"1", "b"=>NULL"#), Some(r#"{x,"y z"}"#), Some("{t,f,NULL}")]],
        )]),
    );
    let mut conn = connect(&mock, DialectKind::Postgres).await;

    let row = conn.fetch_one("SELECT attrs, tags, flags FROM t").await.unwrap();

    let attrs: BTreeMap<String, Option<String>> = row.try_get("attrs").unwrap();
    assert_eq!(attrs.get("a"), Some(&Some("1".to_owned())));
    assert_eq!(attrs.get("b"), Some(&None));

    let tags: Vec<String> = row.try_get("tags").unwrap();
    assert_eq!(tags, vec!["x", "y z"]);

    let flags = row.try_get_raw(2).map(|v| v.data().clone()).unwrap();
    assert_eq!(
        flags,
        OpenEdgeValueData::Array(vec![
            OpenEdgeValueData::Bool(true),
            OpenEdgeValueData::Bool(false),
            OpenEdgeValueData::Null,
        ])
    );
}

#[tokio::test]
async fn test_custom_parser_wins_over_default() {
    let mock = Mock::new();
    mock.respond(
        "SELECT",
        Reply::Rows(vec![result_set(&[("code", sql_codes::INTEGER)], &[&[Some("7")]])]),
    );
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;
    conn.connection_manager().parser_registry().install_custom(
        sql_codes::INTEGER,
        Arc::new(|raw: &str, _: &TypeContext| OpenEdgeValueData::Text(format!("#{raw}"))),
    );

    let row = conn.fetch_one("SELECT code FROM PUB.t").await.unwrap();
    assert_eq!(row.try_get::<String, _>(0).unwrap(), "#7");
}

#[tokio::test]
async fn test_custom_parser_survives_refresh() {
    let mock = Mock::new();
    postgres_catalog(&mock);
    mock.respond(
        "SELECT r FROM",
        Reply::Rows(vec![result_set(
            &[("r", Oid(3904)), ("h", Oid(16400))],
            &[&[Some("[1,2)"), Some("a=>b")]],
        )]),
    );
    let mut conn = connect(&mock, DialectKind::Postgres).await;
    let parsers = conn.connection_manager().parser_registry();
    for oid in [Oid(3904), Oid(16400)] {
        parsers.install_custom(
            oid,
            Arc::new(|raw: &str, _: &TypeContext| OpenEdgeValueData::Text(format!("custom:{raw}"))),
        );
    }

    conn.refresh_type_parser().await.expect("refresh should succeed");

    let parsers = conn.connection_manager().parser_registry();
    assert!(parsers.is_bound(Oid(3904)));
    let row = conn.fetch_one("SELECT r FROM range_t").await.unwrap();
    assert_eq!(row.try_get::<String, _>(0).unwrap(), "custom:[1,2)");
    assert_eq!(row.try_get::<String, _>(1).unwrap(), "custom:a=>b");
}

#[tokio::test]
async fn test_bound_parameters_are_rendered_per_dialect() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    query("INSERT INTO PUB.t VALUES (?, ?, ?, ?, ?)")
        .bind(true)
        .bind(Option::<i32>::None)
        .bind(f64::NAN)
        .bind(at)
        .bind(vec![0xde_u8, 0xad])
        .execute(&mut conn)
        .await
        .unwrap();

    assert_eq!(
        mock.params(0),
        vec![
            Some("1".to_owned()),
            None,
            Some("NaN".to_owned()),
            Some("2024-01-02 03:04:05.000".to_owned()),
            Some("DEAD".to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_execute_reports_rows_affected() {
    let mock = Mock::new();
    mock.respond(
        "UPDATE",
        Reply::Rows(vec![ResultSet {
            command: Some("UPDATE".into()),
            rows_affected: 3,
            ..ResultSet::default()
        }]),
    );
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    let done = conn.execute("UPDATE PUB.t SET x = 1").await.unwrap();
    assert_eq!(done.rows_affected(), 3);
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn test_transaction_begin_commit() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    let tx = conn.begin().await.expect("Begin should succeed");
    tx.commit().await.expect("Commit should succeed");

    assert_eq!(mock.calls(), vec!["autocommit=false", "commit", "autocommit=true"]);
}

#[tokio::test]
async fn test_nested_transactions_use_savepoints() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    OpenEdgeTransactionManager::begin(&mut conn, None).await.unwrap();
    OpenEdgeTransactionManager::begin(&mut conn, None).await.unwrap();
    OpenEdgeTransactionManager::begin(&mut conn, None).await.unwrap();
    assert_eq!(OpenEdgeTransactionManager::get_transaction_depth(&conn), 3);

    OpenEdgeTransactionManager::rollback(&mut conn).await.unwrap();
    OpenEdgeTransactionManager::commit(&mut conn).await.unwrap();
    OpenEdgeTransactionManager::rollback(&mut conn).await.unwrap();
    assert_eq!(OpenEdgeTransactionManager::get_transaction_depth(&conn), 0);

    assert_eq!(
        mock.queries(),
        vec![
            "SAVEPOINT sp1",
            "SAVEPOINT sp2",
            "ROLLBACK TO SAVEPOINT sp2",
            "RELEASE SAVEPOINT sp1",
        ]
    );
    assert_eq!(mock.calls(), vec!["autocommit=false", "rollback", "autocommit=true"]);
}

#[tokio::test]
async fn test_savepoint_begin_rejects_custom_statement() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    OpenEdgeTransactionManager::begin(&mut conn, None).await.unwrap();
    let statement = "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE";
    let result = OpenEdgeTransactionManager::begin(&mut conn, Some(statement.into())).await;
    assert!(result.is_err());
    assert_eq!(OpenEdgeTransactionManager::get_transaction_depth(&conn), 1);
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back_before_next_statement() {
    let mock = Mock::new();
    let mut conn = connect(&mock, DialectKind::OpenEdge).await;

    {
        let mut tx = conn.begin().await.unwrap();
        tx.execute_raw("INSERT INTO PUB.t VALUES (1)").await.unwrap();
    }
    assert_eq!(mock.calls(), vec!["autocommit=false"], "Rollback is deferred until the next use");

    conn.execute_raw("SELECT 1 FROM SYSPROGRESS.SYSCALCTABLE").await.unwrap();
    assert_eq!(mock.calls(), vec!["autocommit=false", "rollback", "autocommit=true"]);
    assert_eq!(OpenEdgeTransactionManager::get_transaction_depth(&conn), 0);
}

#[tokio::test]
async fn test_connection_debug_format() {
    let mock = Mock::new();
    let conn = connect(&mock, DialectKind::OpenEdge).await;

    let debug_str = format!("{:?}", conn);
    assert!(debug_str.contains("OpenEdgeConnection"), "Debug should show struct name");
    assert!(debug_str.contains("transaction_depth"), "Debug should show transaction_depth");
}
