use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, Pool, Postgres, Row, TypeInfo};

use crate::config::Config;
use crate::resources::ResourceDescriptor;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(config: &Config) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Fetches the full ordered collection for a resource, projected to its
/// declared columns.
///
/// Identifiers in the generated SQL come exclusively from the static
/// registry, never from request input.
pub async fn fetch_collection(
    pool: &DbPool,
    resource: &ResourceDescriptor,
) -> Result<Vec<Value>, sqlx::Error> {
    let (Some(table), Some(order_by)) = (resource.table, resource.order_by) else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT {} FROM {} ORDER BY {} ASC",
        resource.columns.join(", "),
        table,
        order_by
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter()
        .map(|row| row_to_json(row, resource.columns))
        .collect()
}

/// Fetches a single record by the resource's singleton key, projected to its
/// declared columns. Returns `None` when no record matches.
pub async fn fetch_singleton(
    pool: &DbPool,
    resource: &ResourceDescriptor,
    id: i64,
) -> Result<Option<Value>, sqlx::Error> {
    let (Some(table), Some(key)) = (resource.table, resource.singleton_key) else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        resource.columns.join(", "),
        table,
        key
    );

    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.map(|r| row_to_json(&r, resource.columns)).transpose()
}

/// Converts a row to a JSON object whose key order equals the declared
/// projection. Relies on the select list matching `columns` positionally.
fn row_to_json(row: &PgRow, columns: &[&str]) -> Result<Value, sqlx::Error> {
    let mut object = Map::with_capacity(columns.len());
    for (idx, name) in columns.iter().enumerate() {
        object.insert(name.to_string(), column_to_value(row, idx)?);
    }
    Ok(Value::Object(object))
}

fn column_to_value(row: &PgRow, idx: usize) -> Result<Value, sqlx::Error> {
    let type_name = row.columns()[idx].type_info().name().to_string();

    let value = match type_name.as_str() {
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(Value::from),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::from),
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::from)
        }
        "TEXT[]" | "VARCHAR[]" => row
            .try_get::<Option<Vec<String>>, _>(idx)?
            .map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|ts| Value::from(ts.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|ts| Value::from(ts.format("%Y-%m-%dT%H:%M:%S").to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|date| Value::from(date.to_string())),
        other => {
            tracing::warn!(
                column = %row.columns()[idx].name(),
                column_type = %other,
                "Unhandled column type in projection, emitting null"
            );
            None
        }
    };

    Ok(value.unwrap_or(Value::Null))
}
