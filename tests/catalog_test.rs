//! Integration tests for the catalog and explain tools on SQLite.

mod common;

use common::{read_only_policy, seeded_database, write_policy};
use pg_mcp_server::error::ErrorKind;
use pg_mcp_server::models::{ConstraintType, TableKind};
use pg_mcp_server::tools::explain::{ExplainInput, ExplainToolHandler};
use pg_mcp_server::tools::schema::{
    DescribeTableInput, GetConstraintsInput, GetTableStatsInput, ListFunctionsInput,
    ListIndexesInput, ListSchemasInput, ListTablesInput, ListViewsInput, SchemaToolHandler,
};
use tokio_test::{assert_err, assert_ok};

fn explain_input(statement: &str) -> ExplainInput {
    ExplainInput::new(statement)
}

#[tokio::test]
async fn test_describe_table_columns_in_order() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let output = assert_ok!(
        handler
            .describe_table(DescribeTableInput {
                schema: "main".into(),
                table: "items".into(),
            })
            .await
    );
    let names: Vec<_> = output.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "qty"]);
    assert!(!output.columns[1].nullable);
    assert_eq!(output.columns[2].default.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_describe_missing_table_is_relation_not_found() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let err = assert_err!(
        handler
            .describe_table(DescribeTableInput {
                schema: "public".into(),
                table: "ghost".into(),
            })
            .await
    );
    assert_eq!(err.kind(), ErrorKind::RelationNotFound);
}

#[tokio::test]
async fn test_identifier_validation() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let err = assert_err!(
        handler
            .describe_table(DescribeTableInput {
                schema: "main".into(),
                table: "x".repeat(129),
            })
            .await
    );
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let err = assert_err!(
        handler
            .list_tables(ListTablesInput {
                schema: Some(String::new()),
            })
            .await
    );
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_list_tables_and_views() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let tables = assert_ok!(handler.list_tables(ListTablesInput::default()).await);
    assert_eq!(tables.count, 3);
    let stocked = tables.tables.iter().find(|t| t.name == "stocked").unwrap();
    assert_eq!(stocked.kind, TableKind::View);

    let views = assert_ok!(handler.list_views(ListViewsInput::default()).await);
    assert_eq!(views.count, 1);
    assert!(views.views[0].definition.contains("qty > 0"));
}

#[tokio::test]
async fn test_constraints_and_indexes() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let constraints = assert_ok!(
        handler
            .get_constraints(GetConstraintsInput {
                schema: "main".into(),
                table: "orders".into(),
            })
            .await
    );
    let kinds: Vec<_> = constraints
        .constraints
        .iter()
        .map(|c| c.constraint_type)
        .collect();
    assert_eq!(kinds, vec![ConstraintType::PrimaryKey, ConstraintType::ForeignKey]);

    let indexes = assert_ok!(
        handler
            .list_indexes(ListIndexesInput {
                schema: "main".into(),
                table: Some("orders".into()),
            })
            .await
    );
    assert_eq!(indexes.count, 1);
    assert_eq!(indexes.indexes[0].columns, vec!["item_id".to_string()]);

    let err = assert_err!(
        handler
            .get_constraints(GetConstraintsInput {
                schema: "main".into(),
                table: "ghost".into(),
            })
            .await
    );
    assert_eq!(err.kind(), ErrorKind::RelationNotFound);
}

#[tokio::test]
async fn test_list_schemas() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let schemas = assert_ok!(handler.list_schemas(ListSchemasInput::default()).await);
    assert!(schemas.schemas.iter().any(|s| s.name == "main"));
}

#[tokio::test]
async fn test_postgres_only_catalogs_are_unsupported() {
    let (_dir, handle) = seeded_database(0).await;
    let handler = SchemaToolHandler::new(handle);

    let err = assert_err!(handler.list_functions(ListFunctionsInput::default()).await);
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let err = assert_err!(
        handler
            .get_table_stats(GetTableStatsInput {
                schema: "main".into(),
                table: None,
            })
            .await
    );
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_explain_returns_plan_text() {
    let (_dir, handle) = seeded_database(3).await;
    let handler = ExplainToolHandler::new(handle, read_only_policy());

    let output = assert_ok!(
        handler
            .explain(explain_input("SELECT * FROM orders WHERE item_id = 1"))
            .await
    );
    assert_eq!(output.format, "text");
    assert!(output.plan.as_str().unwrap().contains("orders"));
}

#[tokio::test]
async fn test_explain_json_is_structured() {
    let (_dir, handle) = seeded_database(3).await;
    let handler = ExplainToolHandler::new(handle, read_only_policy());

    let mut input = explain_input("SELECT * FROM items");
    input.format = Some("json".into());

    let output = assert_ok!(handler.explain(input).await);
    assert!(output.plan.is_array());
}

#[tokio::test]
async fn test_explain_goes_through_safety_gate() {
    let (_dir, handle) = seeded_database(3).await;

    let read_only = ExplainToolHandler::new(handle.clone(), read_only_policy());
    let err = assert_err!(
        read_only
            .explain(explain_input("DELETE FROM items WHERE id = 1"))
            .await
    );
    assert_eq!(err.kind(), ErrorKind::SafetyRejected);

    let writer = ExplainToolHandler::new(handle, write_policy());
    let err = assert_err!(writer.explain(explain_input("DELETE FROM items")).await);
    assert_eq!(err.kind(), ErrorKind::SafetyRejected);

    let err = assert_err!(writer.explain(explain_input("DROP TABLE items")).await);
    assert_eq!(err.kind(), ErrorKind::SafetyRejected);
}
