use sql_middleware_oracle::prelude::*;
use sql_middleware_oracle::test_utils::{ScriptedOracle, ScriptedSession};

async fn connect(driver: &ScriptedOracle) -> Result<OracleSource<ScriptedSession>, SqlMiddlewareDbError> {
    let options = OracleOptions::new("orcl".into(), "scott".into(), "tiger".into());
    OracleSource::connect(driver, options).await
}

fn text(s: &str) -> RowValues {
    RowValues::Text(s.to_string())
}

fn script_catalog(driver: &ScriptedOracle) {
    driver.on_query(
        "FROM all_cons_columns cc",
        vec![
            vec![text("ORDERS"), text("ORDERS_PK")],
            vec![text("CUSTOMERS"), text("CUSTOMERS_PK")],
            vec![text("CUSTOMERS"), text("CUSTOMERS_EMAIL_UK")],
        ],
    );
    driver.on_query(
        "SELECT table_name, constraint_name, r_constraint_name FROM all_constraints",
        vec![
            vec![text("ORDERS"), text("ORDERS_PK"), RowValues::Null],
            vec![text("ORDER_ITEMS"), text("ITEMS_ORDER_FK"), text("ORDERS_PK")],
            vec![text("SHIPMENTS"), text("SHIP_ORDER_FK"), text("ORDERS_PK")],
            vec![text("ORDERS"), text("ORDERS_CUST_FK"), text("CUSTOMERS_PK")],
            vec![text("NEWSLETTER"), text("NEWS_EMAIL_FK"), text("CUSTOMERS_EMAIL_UK")],
        ],
    );
}

fn refs(outcome: &ConstraintOutcome) -> Vec<(&str, &str)> {
    outcome
        .constraints
        .iter()
        .map(|c| (c.table.as_str(), c.constraint.as_str()))
        .collect()
}

#[tokio::test]
async fn list_finds_constraints_referencing_the_table_keys() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    script_catalog(&driver);
    let mut db = connect(&driver).await?;

    let outcome = db.constraint(ConstraintAction::List, "orders").await?;
    assert_eq!(
        refs(&outcome),
        vec![("ORDER_ITEMS", "ITEMS_ORDER_FK"), ("SHIPMENTS", "SHIP_ORDER_FK")]
    );

    let outcome = db.constraint(ConstraintAction::List, "customers").await?;
    assert_eq!(
        refs(&outcome),
        vec![("ORDERS", "ORDERS_CUST_FK"), ("NEWSLETTER", "NEWS_EMAIL_FK")]
    );
    assert_eq!(driver.count_matching("ALTER TABLE"), 0);
    Ok(())
}

#[tokio::test]
async fn catalog_is_read_once_across_tables() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    script_catalog(&driver);
    let mut db = connect(&driver).await?;

    db.constraint(ConstraintAction::List, "orders").await?;
    db.constraint(ConstraintAction::Disable, "customers").await?;
    db.constraint(ConstraintAction::Enable, "customers").await?;
    db.constraint(ConstraintAction::List, "invoices").await?;

    assert_eq!(driver.count_matching("FROM all_cons_columns"), 1);
    assert_eq!(driver.count_matching("r_constraint_name FROM all_constraints"), 1);
    Ok(())
}

#[tokio::test]
async fn disable_and_enable_issue_one_alter_per_constraint() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    script_catalog(&driver);
    let mut db = connect(&driver).await?;

    let outcome = db.constraint(ConstraintAction::Disable, "orders").await?;
    assert!(outcome.is_clean());
    let outcome = db.constraint(ConstraintAction::Enable, "orders").await?;
    assert!(outcome.is_clean());

    let alters: Vec<String> = driver
        .executed_sql()
        .into_iter()
        .filter(|sql| sql.starts_with("ALTER TABLE"))
        .collect();
    assert_eq!(
        alters,
        vec![
            "ALTER TABLE ORDER_ITEMS DISABLE CONSTRAINT ITEMS_ORDER_FK",
            "ALTER TABLE SHIPMENTS DISABLE CONSTRAINT SHIP_ORDER_FK",
            "ALTER TABLE ORDER_ITEMS ENABLE CONSTRAINT ITEMS_ORDER_FK",
            "ALTER TABLE SHIPMENTS ENABLE CONSTRAINT SHIP_ORDER_FK",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn failing_alter_does_not_stop_the_rest() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    script_catalog(&driver);
    driver.fail_on(
        "ALTER TABLE ORDER_ITEMS ENABLE",
        NativeError::with_code(2298, "ORA-02298: cannot validate - parent keys not found"),
    );
    let mut db = connect(&driver).await?;

    let outcome = db.constraint(ConstraintAction::Enable, "orders").await?;
    assert_eq!(outcome.constraints.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0.constraint, "ITEMS_ORDER_FK");
    assert!(outcome.failures[0].1.contains("ORA-02298"));
    assert_eq!(driver.count_matching("ENABLE CONSTRAINT"), 2);
    Ok(())
}

#[tokio::test]
async fn empty_table_and_unknown_action_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    script_catalog(&driver);
    let mut db = connect(&driver).await?;

    assert!(matches!(
        db.constraint(ConstraintAction::List, "").await,
        Err(SqlMiddlewareDbError::PreconditionViolation(_))
    ));
    assert_eq!(driver.count_matching("all_constraints"), 0);

    assert!(matches!(
        "drop".parse::<ConstraintAction>(),
        Err(SqlMiddlewareDbError::PreconditionViolation(_))
    ));
    assert_eq!("Disable".parse::<ConstraintAction>()?, ConstraintAction::Disable);
    Ok(())
}

#[tokio::test]
async fn catalog_failure_is_an_introspection_error() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedOracle::new();
    driver.fail_on(
        "FROM all_cons_columns",
        NativeError::with_code(1031, "ORA-01031: insufficient privileges"),
    );
    let mut db = connect(&driver).await?;

    assert!(matches!(
        db.constraint(ConstraintAction::List, "orders").await,
        Err(SqlMiddlewareDbError::IntrospectionError(_))
    ));
    Ok(())
}
