//! Schema introspection module.
//!
//! Catalog queries never pass through the safety gate or the literal
//! substitution path: every user-supplied name is a bound parameter.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Database-specific implementations are in their respective
//! submodules (postgres, sqlite), each providing the same interface where the
//! backend has a matching catalog.

use crate::db::pool::DbPool;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, ConstraintInfo, ConstraintType, FunctionInfo, FunctionKind, IndexInfo,
    IndexMethod, ParallelSafety, SchemaInfo, SecurityMode, TableEntry, TableKind, TableStats,
    ViewInfo, Volatility,
};
use tracing::debug;

/// Schema used when a PostgreSQL tool call does not name one.
pub const DEFAULT_PG_SCHEMA: &str = "public";

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// Columns of a table in ordinal order.
    pub async fn describe_table(
        pool: &DbPool,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let columns = match pool {
            DbPool::Postgres(p) => postgres::describe_table(p, schema, table).await?,
            DbPool::SQLite(p) => sqlite::describe_table(p, schema, table).await?,
        };
        if columns.is_empty() {
            return Err(table_not_found(schema, table));
        }
        Ok(columns)
    }

    pub async fn list_tables(pool: &DbPool, schema: Option<&str>) -> DbResult<Vec<TableEntry>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_tables(p, schema.unwrap_or(DEFAULT_PG_SCHEMA)).await,
            DbPool::SQLite(p) => sqlite::list_tables(p, schema).await,
        }
    }

    pub async fn get_constraints(
        pool: &DbPool,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ConstraintInfo>> {
        Self::ensure_table_exists(pool, schema, table).await?;
        match pool {
            DbPool::Postgres(p) => postgres::get_constraints(p, schema, table).await,
            DbPool::SQLite(p) => sqlite::get_constraints(p, schema, table).await,
        }
    }

    pub async fn list_schemas(pool: &DbPool, include_system: bool) -> DbResult<Vec<SchemaInfo>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_schemas(p, include_system).await,
            DbPool::SQLite(p) => sqlite::list_schemas(p, include_system).await,
        }
    }

    pub async fn list_indexes(
        pool: &DbPool,
        schema: &str,
        table: Option<&str>,
    ) -> DbResult<Vec<IndexInfo>> {
        if let Some(table) = table {
            Self::ensure_table_exists(pool, schema, table).await?;
        }
        match pool {
            DbPool::Postgres(p) => postgres::list_indexes(p, schema, table).await,
            DbPool::SQLite(p) => sqlite::list_indexes(p, schema, table).await,
        }
    }

    pub async fn list_views(pool: &DbPool, schema: Option<&str>) -> DbResult<Vec<ViewInfo>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_views(p, schema).await,
            DbPool::SQLite(p) => sqlite::list_views(p, schema).await,
        }
    }

    /// PostgreSQL only.
    pub async fn list_functions(
        pool: &DbPool,
        schema: Option<&str>,
    ) -> DbResult<Vec<FunctionInfo>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_functions(p, schema).await,
            DbPool::SQLite(_) => Err(DbError::unsupported(
                "SQLite has no catalog of stored functions",
            )),
        }
    }

    /// PostgreSQL only.
    pub async fn get_table_stats(
        pool: &DbPool,
        schema: &str,
        table: Option<&str>,
    ) -> DbResult<Vec<TableStats>> {
        match pool {
            DbPool::Postgres(p) => {
                if let Some(table) = table {
                    Self::ensure_table_exists(pool, schema, table).await?;
                }
                postgres::get_table_stats(p, schema, table).await
            }
            DbPool::SQLite(_) => Err(DbError::unsupported(
                "SQLite does not track table statistics",
            )),
        }
    }

    async fn ensure_table_exists(pool: &DbPool, schema: &str, table: &str) -> DbResult<()> {
        let exists = match pool {
            DbPool::Postgres(p) => postgres::table_exists(p, schema, table).await?,
            DbPool::SQLite(p) => sqlite::table_exists(p, schema, table).await?,
        };
        if exists {
            Ok(())
        } else {
            Err(table_not_found(schema, table))
        }
    }
}

fn table_not_found(schema: &str, table: &str) -> DbError {
    DbError::not_found(
        format!("Table '{}' not found in schema '{}'", table, schema),
        format!("{}.{}", schema, table),
    )
}

// =============================================================================
// SQL Query Templates
// =============================================================================
//
// information_schema columns use domain types; they are cast to plain types so
// sqlx decodes them without type mismatches.

mod queries {
    pub mod postgres {
        pub const TABLE_EXISTS: &str = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                column_name::text AS column_name,
                data_type::text AS data_type,
                character_maximum_length::bigint AS max_length,
                (is_nullable = 'YES') AS nullable,
                column_default::text AS column_default
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT
                table_name::text AS table_name,
                table_type::text AS table_type
            FROM information_schema.tables
            WHERE table_schema = $1
            AND table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY table_name
            "#;

        pub const GET_CONSTRAINTS: &str = r#"
            SELECT
                con.conname::text AS name,
                con.contype::text AS contype,
                pg_get_constraintdef(con.oid) AS definition
            FROM pg_constraint con
            JOIN pg_class rel ON rel.oid = con.conrelid
            JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
            WHERE nsp.nspname = $1
            AND rel.relname = $2
            AND con.contype IN ('p', 'f', 'u', 'c')
            ORDER BY
                CASE con.contype WHEN 'p' THEN 0 WHEN 'f' THEN 1 WHEN 'u' THEN 2 ELSE 3 END,
                con.conname
            "#;

        pub const LIST_SCHEMAS: &str = r#"
            SELECT
                n.nspname::text AS name,
                pg_catalog.pg_get_userbyid(n.nspowner)::text AS owner
            FROM pg_namespace n
            WHERE $1
            OR (
                n.nspname NOT IN ('pg_catalog', 'information_schema')
                AND n.nspname NOT LIKE 'pg\_toast%'
                AND n.nspname NOT LIKE 'pg\_temp\_%'
            )
            ORDER BY n.nspname
            "#;

        pub const LIST_INDEXES: &str = r#"
            SELECT
                n.nspname::text AS schema_name,
                t.relname::text AS table_name,
                i.relname::text AS index_name,
                am.amname::text AS method,
                ix.indisunique AS is_unique,
                ix.indisprimary AS is_primary,
                ARRAY(
                    SELECT a.attname::text
                    FROM unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
                    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
                    ORDER BY k.ord
                ) AS columns,
                pg_get_indexdef(ix.indexrelid) AS definition,
                pg_relation_size(ix.indexrelid) AS size_bytes
            FROM pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_am am ON am.oid = i.relam
            WHERE n.nspname = $1
            AND ($2::text IS NULL OR t.relname = $2)
            ORDER BY t.relname, i.relname
            "#;

        pub const LIST_VIEWS: &str = r#"
            SELECT
                table_schema::text AS schema_name,
                table_name::text AS view_name,
                COALESCE(view_definition::text, '') AS definition,
                (is_updatable = 'YES') AS updatable,
                check_option::text AS check_option
            FROM information_schema.views
            WHERE ($1::text IS NULL AND table_schema NOT IN ('pg_catalog', 'information_schema'))
            OR table_schema = $1
            ORDER BY table_schema, table_name
            "#;

        pub const LIST_FUNCTIONS: &str = r#"
            SELECT
                n.nspname::text AS schema_name,
                p.proname::text AS function_name,
                COALESCE(pg_get_function_result(p.oid), 'void') AS return_type,
                pg_get_function_identity_arguments(p.oid) AS argument_types,
                p.prokind::text AS kind,
                l.lanname::text AS language,
                p.prosecdef AS security_definer,
                p.provolatile::text AS volatility,
                p.proparallel::text AS parallel,
                obj_description(p.oid, 'pg_proc') AS description
            FROM pg_proc p
            JOIN pg_namespace n ON n.oid = p.pronamespace
            JOIN pg_language l ON l.oid = p.prolang
            WHERE (
                $1::text IS NULL
                AND n.nspname NOT IN ('pg_catalog', 'information_schema')
                AND n.nspname NOT LIKE 'pg\_toast%'
                AND n.nspname NOT LIKE 'pg\_temp\_%'
            )
            OR n.nspname = $1
            ORDER BY n.nspname, p.proname
            "#;

        pub const GET_TABLE_STATS: &str = r#"
            SELECT
                s.schemaname::text AS schema_name,
                s.relname::text AS table_name,
                GREATEST(c.reltuples, 0)::bigint AS row_estimate,
                s.n_dead_tup AS dead_rows,
                pg_total_relation_size(s.relid) AS total_bytes,
                pg_table_size(s.relid) AS table_bytes,
                pg_indexes_size(s.relid) AS index_bytes,
                s.seq_scan AS seq_scans,
                COALESCE(s.idx_scan, 0) AS index_scans,
                s.last_vacuum,
                s.last_autovacuum,
                s.last_analyze,
                s.last_autoanalyze
            FROM pg_stat_user_tables s
            JOIN pg_class c ON c.oid = s.relid
            WHERE s.schemaname = $1
            AND ($2::text IS NULL OR s.relname = $2)
            ORDER BY s.relname
            "#;
    }

    pub mod sqlite {
        pub const TABLE_EXISTS: &str = r#"
            SELECT COUNT(*) FROM pragma_table_list(?1, ?2)
            WHERE type IN ('table', 'view')
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT name, type, "notnull", dflt_value
            FROM pragma_table_info(?1, ?2)
            ORDER BY cid
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT name, type FROM pragma_table_list
            WHERE schema = ?1
            AND type IN ('table', 'view')
            AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#;

        pub const LIST_DATABASES: &str = "SELECT name FROM pragma_database_list ORDER BY seq";

        pub const PRIMARY_KEY_COLUMNS: &str = r#"
            SELECT name FROM pragma_table_info(?1, ?2)
            WHERE pk > 0
            ORDER BY pk
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT id, "table", "from", "to", on_update, on_delete
            FROM pragma_foreign_key_list(?1, ?2)
            ORDER BY id, seq
            "#;

        pub const INDEX_LIST: &str = r#"
            SELECT name, "unique", origin
            FROM pragma_index_list(?1, ?2)
            ORDER BY name
            "#;

        pub const INDEX_COLUMNS: &str = r#"
            SELECT name FROM pragma_index_info(?1, ?2)
            ORDER BY seqno
            "#;

        pub const INDEX_SQL: &str = "SELECT sql FROM sqlite_schema WHERE type = 'index' AND name = ?1";

        pub const LIST_VIEWS: &str = r#"
            SELECT name, sql FROM sqlite_schema
            WHERE type = 'view'
            ORDER BY name
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::{PgPool, Row};

    pub async fn table_exists(pool: &PgPool, schema: &str, table: &str) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(queries::postgres::TABLE_EXISTS)
            .bind(schema)
            .bind(table)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    pub async fn describe_table(
        pool: &PgPool,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(schema)
            .bind(table)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let column = ColumnDescriptor::new(
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("data_type")?,
                    row.try_get::<bool, _>("nullable")?,
                )
                .with_max_length(row.try_get("max_length")?)
                .with_default(row.try_get("column_default")?);
                Ok(column)
            })
            .collect()
    }

    pub async fn list_tables(pool: &PgPool, schema: &str) -> DbResult<Vec<TableEntry>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        let tables = rows
            .iter()
            .map(|row| {
                Ok(TableEntry {
                    name: row.try_get("table_name")?,
                    kind: TableKind::parse(&row.try_get::<String, _>("table_type")?),
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = tables.len(), schema, "Listed PostgreSQL tables");
        Ok(tables)
    }

    pub async fn get_constraints(
        pool: &PgPool,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ConstraintInfo>> {
        let rows = sqlx::query(queries::postgres::GET_CONSTRAINTS)
            .bind(schema)
            .bind(table)
            .fetch_all(pool)
            .await?;

        let mut constraints = Vec::with_capacity(rows.len());
        for row in &rows {
            let code: String = row.try_get("contype")?;
            if let Some(constraint_type) = ConstraintType::from_pg_code(&code) {
                constraints.push(ConstraintInfo {
                    name: row.try_get("name")?,
                    constraint_type,
                    definition: row.try_get("definition")?,
                });
            }
        }
        Ok(constraints)
    }

    pub async fn list_schemas(pool: &PgPool, include_system: bool) -> DbResult<Vec<SchemaInfo>> {
        let rows = sqlx::query(queries::postgres::LIST_SCHEMAS)
            .bind(include_system)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(SchemaInfo {
                    name: row.try_get("name")?,
                    owner: row
                        .try_get::<Option<String>, _>("owner")?
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    pub async fn list_indexes(
        pool: &PgPool,
        schema: &str,
        table: Option<&str>,
    ) -> DbResult<Vec<IndexInfo>> {
        let rows = sqlx::query(queries::postgres::LIST_INDEXES)
            .bind(schema)
            .bind(table)
            .fetch_all(pool)
            .await?;

        let indexes = rows
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    schema: row.try_get("schema_name")?,
                    table: row.try_get("table_name")?,
                    name: row.try_get("index_name")?,
                    method: IndexMethod::parse(&row.try_get::<String, _>("method")?),
                    unique: row.try_get("is_unique")?,
                    primary: row.try_get("is_primary")?,
                    columns: row.try_get("columns")?,
                    definition: row.try_get("definition")?,
                    size_bytes: row.try_get("size_bytes")?,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = indexes.len(), schema, "Listed PostgreSQL indexes");
        Ok(indexes)
    }

    pub async fn list_views(pool: &PgPool, schema: Option<&str>) -> DbResult<Vec<ViewInfo>> {
        let rows = sqlx::query(queries::postgres::LIST_VIEWS)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ViewInfo {
                    schema: row.try_get("schema_name")?,
                    name: row.try_get("view_name")?,
                    definition: row.try_get::<String, _>("definition")?.trim().to_string(),
                    updatable: row.try_get("updatable")?,
                    check_option: row
                        .try_get::<Option<String>, _>("check_option")?
                        .unwrap_or_else(|| "NONE".to_string()),
                })
            })
            .collect()
    }

    pub async fn list_functions(
        pool: &PgPool,
        schema: Option<&str>,
    ) -> DbResult<Vec<FunctionInfo>> {
        let rows = sqlx::query(queries::postgres::LIST_FUNCTIONS)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let kind = FunctionKind::from_pg_code(&row.try_get::<String, _>("kind")?);
                let security = if row.try_get::<bool, _>("security_definer")? {
                    SecurityMode::Definer
                } else {
                    SecurityMode::Invoker
                };
                Ok(FunctionInfo {
                    schema: row.try_get("schema_name")?,
                    name: row.try_get("function_name")?,
                    return_type: row.try_get("return_type")?,
                    argument_types: row.try_get("argument_types")?,
                    kind,
                    language: row.try_get("language")?,
                    is_aggregate: kind == FunctionKind::Aggregate,
                    is_window: kind == FunctionKind::Window,
                    security,
                    volatility: Volatility::from_pg_code(&row.try_get::<String, _>("volatility")?),
                    parallel_safety: ParallelSafety::from_pg_code(
                        &row.try_get::<String, _>("parallel")?,
                    ),
                    description: row.try_get("description")?,
                })
            })
            .collect()
    }

    pub async fn get_table_stats(
        pool: &PgPool,
        schema: &str,
        table: Option<&str>,
    ) -> DbResult<Vec<TableStats>> {
        let rows = sqlx::query(queries::postgres::GET_TABLE_STATS)
            .bind(schema)
            .bind(table)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let total_bytes: i64 = row.try_get("total_bytes")?;
                let table_bytes: i64 = row.try_get("table_bytes")?;
                let index_bytes: i64 = row.try_get("index_bytes")?;
                Ok(TableStats {
                    schema: row.try_get("schema_name")?,
                    table: row.try_get("table_name")?,
                    row_estimate: row.try_get("row_estimate")?,
                    dead_rows: row.try_get("dead_rows")?,
                    total_bytes,
                    table_bytes,
                    index_bytes,
                    total_size: format_size(total_bytes),
                    table_size: format_size(table_bytes),
                    index_size: format_size(index_bytes),
                    seq_scans: row.try_get("seq_scans")?,
                    index_scans: row.try_get("index_scans")?,
                    last_vacuum: row.try_get::<Option<DateTime<Utc>>, _>("last_vacuum")?,
                    last_autovacuum: row.try_get::<Option<DateTime<Utc>>, _>("last_autovacuum")?,
                    last_analyze: row.try_get::<Option<DateTime<Utc>>, _>("last_analyze")?,
                    last_autoanalyze: row
                        .try_get::<Option<DateTime<Utc>>, _>("last_autoanalyze")?,
                })
            })
            .collect()
    }

    fn format_size(bytes: i64) -> String {
        crate::tools::schema::format_size(bytes.max(0) as u64)
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    /// SQLite names attached databases, not schemas; `public` maps to `main`.
    pub fn database_name(schema: Option<&str>) -> &str {
        match schema {
            None | Some("public") => "main",
            Some(name) => name,
        }
    }

    pub async fn table_exists(pool: &SqlitePool, schema: &str, table: &str) -> DbResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(queries::sqlite::TABLE_EXISTS)
            .bind(table)
            .bind(database_name(Some(schema)))
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn describe_table(
        pool: &SqlitePool,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::sqlite::DESCRIBE_COLUMNS)
            .bind(table)
            .bind(database_name(Some(schema)))
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let notnull: i64 = row.try_get("notnull")?;
                Ok(ColumnDescriptor::new(
                    row.try_get::<String, _>("name")?,
                    row.try_get::<String, _>("type")?,
                    notnull == 0,
                )
                .with_default(row.try_get("dflt_value")?))
            })
            .collect()
    }

    pub async fn list_tables(pool: &SqlitePool, schema: Option<&str>) -> DbResult<Vec<TableEntry>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .bind(database_name(schema))
            .fetch_all(pool)
            .await?;

        let tables = rows
            .iter()
            .map(|row| {
                Ok(TableEntry {
                    name: row.try_get("name")?,
                    kind: TableKind::parse(&row.try_get::<String, _>("type")?),
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    pub async fn get_constraints(
        pool: &SqlitePool,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ConstraintInfo>> {
        let db = database_name(Some(schema));
        let mut constraints = Vec::new();

        let pk_columns: Vec<String> = sqlx::query_scalar(queries::sqlite::PRIMARY_KEY_COLUMNS)
            .bind(table)
            .bind(db)
            .fetch_all(pool)
            .await?;
        if !pk_columns.is_empty() {
            constraints.push(ConstraintInfo {
                name: format!("{}_pkey", table),
                constraint_type: ConstraintType::PrimaryKey,
                definition: format!("PRIMARY KEY ({})", pk_columns.join(", ")),
            });
        }

        let fk_rows = sqlx::query(queries::sqlite::FOREIGN_KEYS)
            .bind(table)
            .bind(db)
            .fetch_all(pool)
            .await?;
        let mut foreign_keys: Vec<(i64, String, Vec<String>, Vec<String>, String, String)> =
            Vec::new();
        for row in &fk_rows {
            let id: i64 = row.try_get("id")?;
            let from: String = row.try_get("from")?;
            let to: Option<String> = row.try_get("to")?;
            match foreign_keys.last_mut() {
                Some(fk) if fk.0 == id => {
                    fk.2.push(from);
                    fk.3.extend(to);
                }
                _ => foreign_keys.push((
                    id,
                    row.try_get("table")?,
                    vec![from],
                    to.into_iter().collect(),
                    row.try_get("on_update")?,
                    row.try_get("on_delete")?,
                )),
            }
        }
        for (_, ref_table, from, to, on_update, on_delete) in foreign_keys {
            let mut definition = format!("FOREIGN KEY ({}) REFERENCES {}", from.join(", "), ref_table);
            if !to.is_empty() {
                definition.push_str(&format!("({})", to.join(", ")));
            }
            if on_update != "NO ACTION" {
                definition.push_str(&format!(" ON UPDATE {}", on_update));
            }
            if on_delete != "NO ACTION" {
                definition.push_str(&format!(" ON DELETE {}", on_delete));
            }
            constraints.push(ConstraintInfo {
                name: format!("{}_{}_fkey", table, from.join("_")),
                constraint_type: ConstraintType::ForeignKey,
                definition,
            });
        }

        for index in fetch_index_list(pool, db, table).await? {
            if index.origin == "u" {
                let columns = fetch_index_columns(pool, db, &index.name).await?;
                constraints.push(ConstraintInfo {
                    name: index.name,
                    constraint_type: ConstraintType::Unique,
                    definition: format!("UNIQUE ({})", columns.join(", ")),
                });
            }
        }

        Ok(constraints)
    }

    /// SQLite has no schema ownership; `owner` is empty.
    pub async fn list_schemas(pool: &SqlitePool, include_system: bool) -> DbResult<Vec<SchemaInfo>> {
        let names: Vec<String> = sqlx::query_scalar(queries::sqlite::LIST_DATABASES)
            .fetch_all(pool)
            .await?;

        Ok(names
            .into_iter()
            .filter(|name| include_system || name != "temp")
            .map(|name| SchemaInfo {
                name,
                owner: String::new(),
            })
            .collect())
    }

    pub async fn list_indexes(
        pool: &SqlitePool,
        schema: &str,
        table: Option<&str>,
    ) -> DbResult<Vec<IndexInfo>> {
        let db = database_name(Some(schema));
        let tables: Vec<String> = match table {
            Some(t) => vec![t.to_string()],
            None => list_tables(pool, Some(db))
                .await?
                .into_iter()
                .filter(|t| t.kind == TableKind::BaseTable)
                .map(|t| t.name)
                .collect(),
        };

        let mut indexes = Vec::new();
        for table_name in &tables {
            for index in fetch_index_list(pool, db, table_name).await? {
                let columns = fetch_index_columns(pool, db, &index.name).await?;
                let definition: Option<String> =
                    sqlx::query_scalar::<_, Option<String>>(queries::sqlite::INDEX_SQL)
                        .bind(&index.name)
                        .fetch_optional(pool)
                        .await?
                        .flatten();
                indexes.push(IndexInfo {
                    schema: db.to_string(),
                    table: table_name.clone(),
                    definition: definition.unwrap_or_else(|| {
                        format!("{} index on {} ({})", index.origin_label(), table_name, columns.join(", "))
                    }),
                    name: index.name,
                    method: IndexMethod::Btree,
                    unique: index.unique,
                    primary: index.origin == "pk",
                    columns,
                    size_bytes: None,
                });
            }
        }
        Ok(indexes)
    }

    /// Views of the main database.
    pub async fn list_views(pool: &SqlitePool, schema: Option<&str>) -> DbResult<Vec<ViewInfo>> {
        let db = database_name(schema);
        if db != "main" {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(queries::sqlite::LIST_VIEWS)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ViewInfo {
                    schema: db.to_string(),
                    name: row.try_get("name")?,
                    definition: row.try_get::<Option<String>, _>("sql")?.unwrap_or_default(),
                    updatable: false,
                    check_option: "NONE".to_string(),
                })
            })
            .collect()
    }

    struct IndexListEntry {
        name: String,
        unique: bool,
        /// `c` (CREATE INDEX), `u` (UNIQUE constraint) or `pk`
        origin: String,
    }

    impl IndexListEntry {
        fn origin_label(&self) -> &'static str {
            match self.origin.as_str() {
                "pk" => "primary key",
                "u" => "unique constraint",
                _ => "automatic",
            }
        }
    }

    async fn fetch_index_list(
        pool: &SqlitePool,
        db: &str,
        table: &str,
    ) -> DbResult<Vec<IndexListEntry>> {
        let rows = sqlx::query(queries::sqlite::INDEX_LIST)
            .bind(table)
            .bind(db)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(IndexListEntry {
                    name: row.try_get("name")?,
                    unique: row.try_get::<i64, _>("unique")? != 0,
                    origin: row.try_get("origin")?,
                })
            })
            .collect()
    }

    async fn fetch_index_columns(pool: &SqlitePool, db: &str, index: &str) -> DbResult<Vec<String>> {
        let columns: Vec<Option<String>> = sqlx::query_scalar(queries::sqlite::INDEX_COLUMNS)
            .bind(index)
            .bind(db)
            .fetch_all(pool)
            .await?;
        // Expression columns have no name
        Ok(columns
            .into_iter()
            .map(|c| c.unwrap_or_else(|| "<expression>".to_string()))
            .collect())
    }
}
