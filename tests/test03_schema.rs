use sql_middleware_oracle::prelude::*;
use sql_middleware_oracle::test_utils::{ScriptedOracle, ScriptedSession};

async fn connect(driver: &ScriptedOracle) -> Result<OracleSource<ScriptedSession>, SqlMiddlewareDbError> {
    let options = OracleOptions::new("orcl".into(), "scott".into(), "tiger".into());
    OracleSource::connect(driver, options).await
}

fn text(s: &str) -> RowValues {
    RowValues::Text(s.to_string())
}

fn script_orders(driver: &ScriptedOracle) {
    driver.on_query(
        "all_tab_columns WHERE table_name = 'ORDERS'",
        vec![
            vec![text("ID"), text("NUMBER"), RowValues::Int(22), text("N")],
            vec![text("CODE"), text("VARCHAR2"), RowValues::Int(20), text("Y")],
            vec![text("CREATED"), text("DATE"), RowValues::Int(7), text("Y")],
        ],
    );
    driver.on_query(
        "ix.table_name = 'ORDERS'",
        vec![
            vec![text("CODE"), text("ORDERS_CODE_UK"), RowValues::Int(1)],
            vec![text("ID"), text("ORDERS_PK"), RowValues::Int(1)],
        ],
    );
}

#[tokio::test]
async fn describe_maps_types_and_prefers_id_as_primary_key() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.with_sequence("orders_seq", 0, 1);
    script_orders(&driver);
    let mut db = connect(&driver).await?;

    let columns = db.describe_table(&TableRef::new("orders")).await?;
    assert_eq!(columns.len(), 3);

    let id = columns.get("id").ok_or("missing id")?;
    assert_eq!(id.kind, AbstractType::Integer);
    assert!(!id.nullable);
    assert!(id.primary);

    let code = columns.get("code").ok_or("missing code")?;
    assert_eq!(code.kind, AbstractType::String);
    assert_eq!(code.length, Some(20));
    assert!(code.nullable);
    assert!(!code.primary);

    assert_eq!(columns.get("created").map(|c| c.kind), Some(AbstractType::Date));
    assert_eq!(columns.primary_key().map(|c| c.name.as_str()), Some("id"));
    assert_eq!(db.sequence_for("orders"), Some(Some("orders_seq")));
    Ok(())
}

#[tokio::test]
async fn first_unique_column_is_primary_without_an_id() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.on_query(
        "all_tab_columns WHERE table_name = 'COUNTRIES'",
        vec![
            vec![text("ISO"), text("CHAR"), RowValues::Int(2), text("N")],
            vec![text("NAME"), text("VARCHAR2"), RowValues::Int(80), text("Y")],
        ],
    );
    driver.on_query(
        "ix.table_name = 'COUNTRIES'",
        vec![vec![text("ISO"), text("COUNTRIES_PK"), RowValues::Int(1)]],
    );
    let mut db = connect(&driver).await?;

    let columns = db.describe_table(&TableRef::new("countries")).await?;
    assert_eq!(columns.primary_key().map(|c| c.name.as_str()), Some("iso"));
    assert_eq!(db.sequence_for("countries"), Some(None));
    Ok(())
}

#[tokio::test]
async fn describe_results_and_sequence_probe_are_cached() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.with_sequence("orders_seq", 0, 1);
    script_orders(&driver);
    let mut db = connect(&driver).await?;

    let first = db.describe_table(&TableRef::new("orders")).await?;
    let second = db.describe_table(&TableRef::new("orders")).await?;
    assert_eq!(first, second);
    assert_eq!(driver.count_matching("FROM all_tab_columns"), 1);
    assert_eq!(driver.count_matching("FROM all_ind_columns"), 1);
    assert_eq!(driver.count_matching("sequence_name = 'ORDERS_SEQ'"), 1);
    Ok(())
}

#[tokio::test]
async fn declared_sequence_is_trusted_without_probing() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    let mut db = connect(&driver).await?;

    let items = TableRef::new("items").with_sequence(Some("items_id_seq".into()));
    let columns = db.describe_table(&items).await?;
    assert!(columns.is_empty());
    assert_eq!(db.sequence_for("items"), Some(Some("items_id_seq")));
    assert_eq!(driver.count_matching("_sequences"), 0);
    // no columns, so no index lookup either
    assert_eq!(driver.count_matching("FROM all_ind_columns"), 0);
    Ok(())
}

#[tokio::test]
async fn schema_prefix_scopes_catalog_queries() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    let mut db = connect(&driver).await?;

    let staff = TableRef::new("hr.staff");
    assert_eq!(db.table_schema(&staff).as_deref(), Some("hr"));
    assert_eq!(db.full_table_name(&staff), "hr.staff");

    db.describe_table(&staff).await?;
    assert_eq!(
        driver.count_matching("FROM all_sequences WHERE sequence_name = 'STAFF_SEQ' AND sequence_owner = 'HR'"),
        1
    );
    assert_eq!(
        driver.count_matching("table_name = 'STAFF' AND owner = 'HR'"),
        1
    );
    // qualification is not part of the sequence-map key
    assert_eq!(db.sequence_for("staff"), Some(None));

    let ledger = TableRef::new("ledger").with_sequence(Some("acct.ledger_seq".into()));
    assert_eq!(db.table_schema(&ledger).as_deref(), Some("acct"));
    Ok(())
}

#[tokio::test]
async fn default_schema_is_the_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    let options = OracleOptions::new("orcl".into(), "scott".into(), "tiger".into())
        .with_schema(Some("sales".into()));
    let db = OracleSource::connect(&driver, options).await?;

    assert_eq!(db.table_schema(&TableRef::new("orders")).as_deref(), Some("SALES"));
    assert_eq!(db.full_table_name(&TableRef::new("orders")), "orders");
    Ok(())
}

#[tokio::test]
async fn catalog_failure_is_an_introspection_error() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.fail_on(
        "all_tab_columns WHERE table_name = 'BROKEN'",
        NativeError::with_code(942, "ORA-00942: table or view does not exist"),
    );
    let mut db = connect(&driver).await?;

    match db.describe_table(&TableRef::new("broken")).await {
        Err(SqlMiddlewareDbError::IntrospectionError(msg)) => assert!(msg.contains("ORA-00942")),
        other => panic!("expected introspection error, got {other:?}"),
    }
    assert!(matches!(
        db.describe_table(&TableRef::new("")).await,
        Err(SqlMiddlewareDbError::PreconditionViolation(_))
    ));
    Ok(())
}

#[tokio::test]
async fn list_tables_is_read_once() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.on_query(
        "FROM user_objects",
        vec![vec![text("ORDERS")], vec![text("ORDER_ITEMS")]],
    );
    let mut db = connect(&driver).await?;

    assert_eq!(db.list_tables().await?, vec!["orders", "order_items"]);
    assert_eq!(db.list_tables().await?, vec!["orders", "order_items"]);
    assert_eq!(driver.count_matching("FROM user_objects"), 1);
    Ok(())
}

#[tokio::test]
async fn index_reports_primary_key_columns() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.on_query(
        "WHERE cc.table_name = 'ORDER_LINES'",
        vec![
            vec![
                text("ORDER_LINES"),
                text("ORDER_ID"),
                text("ORDER_LINES_PK"),
                text("P"),
                text("ORDER_LINES_PK"),
                text("UNIQUE"),
            ],
            vec![
                text("ORDER_LINES"),
                text("LINE_NO"),
                text("ORDER_LINES_PK"),
                text("P"),
                text("ORDER_LINES_PK"),
                text("UNIQUE"),
            ],
            vec![
                text("ORDER_LINES"),
                text("ORDER_ID"),
                text("ORDER_LINES_ORDER_FK"),
                text("R"),
                RowValues::Null,
                RowValues::Null,
            ],
        ],
    );
    let mut db = connect(&driver).await?;

    let indexes = db.index(&TableRef::new("order_lines")).await?;
    let primary = indexes.primary.ok_or("missing primary key")?;
    assert_eq!(primary.columns, vec!["order_id", "line_no"]);
    assert!(primary.unique);

    let none = db.index(&TableRef::new("audit_log")).await?;
    assert_eq!(none, TableIndexes::default());
    Ok(())
}
