// ============================================================================
// Resource Registry
// ============================================================================
//
// Declarative whitelist of the resources the gateway serves. Adding or
// auditing a resource is a data change here, not a code change in the
// handler: queries, ordering, singleton lookup and CSV headers all derive
// from these descriptors.
//
// ============================================================================

use serde_json::{json, Value};

/// A whitelisted public resource and its column projection.
///
/// The projection is the confidentiality boundary between the internal store
/// and the public gateway: queries select exactly `columns`, never `*`.
#[derive(Debug)]
pub struct ResourceDescriptor {
    pub name: &'static str,
    /// Backing table; `None` for resources served from a static document.
    pub table: Option<&'static str>,
    /// Ordered set of projected columns.
    pub columns: &'static [&'static str],
    /// Fixed ascending sort key for collection listings.
    pub order_by: Option<&'static str>,
    /// Column matched against the `id` parameter for singleton lookup.
    pub singleton_key: Option<&'static str>,
    pub dataset_name: &'static str,
    pub dataset_description: &'static str,
}

pub const RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor {
        name: "articles",
        table: Some("articles"),
        columns: &["article_number", "title", "content", "chapter_id", "section_id"],
        order_by: Some("article_number"),
        singleton_key: Some("article_number"),
        dataset_name: "EU AI Act Articles",
        dataset_description: "Full text of the articles of Regulation (EU) 2024/1689.",
    },
    ResourceDescriptor {
        name: "recitals",
        table: Some("recitals"),
        columns: &["recital_number", "text"],
        order_by: Some("recital_number"),
        singleton_key: Some("recital_number"),
        dataset_name: "EU AI Act Recitals",
        dataset_description: "Recitals accompanying Regulation (EU) 2024/1689.",
    },
    ResourceDescriptor {
        name: "definitions",
        table: Some("definitions"),
        columns: &["id", "term", "definition", "article_number"],
        order_by: Some("id"),
        singleton_key: Some("id"),
        dataset_name: "EU AI Act Definitions",
        dataset_description: "Defined terms of Regulation (EU) 2024/1689 (Article 3).",
    },
    ResourceDescriptor {
        name: "chapters",
        table: Some("chapters"),
        columns: &["chapter_number", "title"],
        order_by: Some("chapter_number"),
        singleton_key: Some("chapter_number"),
        dataset_name: "EU AI Act Chapters",
        dataset_description: "Chapter structure of Regulation (EU) 2024/1689.",
    },
    ResourceDescriptor {
        name: "implementing-acts",
        table: Some("implementing_acts"),
        columns: &["id", "title", "act_type", "status", "adopted_at"],
        order_by: Some("id"),
        singleton_key: Some("id"),
        dataset_name: "EU AI Act Implementing Acts",
        dataset_description: "Implementing and delegated acts adopted under Regulation (EU) 2024/1689.",
    },
    ResourceDescriptor {
        name: "metadata",
        table: None,
        columns: &[],
        order_by: None,
        singleton_key: None,
        dataset_name: "EU AI Act API Metadata",
        dataset_description: "Description of the regulation and of this API surface.",
    },
];

/// Looks up a descriptor by its public name.
pub fn find(name: &str) -> Option<&'static ResourceDescriptor> {
    RESOURCES.iter().find(|r| r.name == name)
}

/// Whitelisted resource names, enumerated in invalid-resource error bodies.
pub fn allowed_names() -> Vec<&'static str> {
    RESOURCES.iter().map(|r| r.name).collect()
}

/// Every whitelisted resource with its projected columns, documented verbatim
/// in invalid-resource error bodies.
pub fn projection_summary() -> Value {
    Value::Array(
        RESOURCES
            .iter()
            .map(|r| json!({ "name": r.name, "columns": r.columns }))
            .collect(),
    )
}

/// Static, hand-authored descriptor of the regulation and the API surface.
/// Served for `resource=metadata` without touching the store.
pub fn metadata_document() -> Value {
    json!({
        "regulation": {
            "name": "Regulation (EU) 2024/1689",
            "shortName": "EU AI Act",
            "adopted": "2024-06-13",
            "inForce": "2024-08-01",
            "officialJournal": "OJ L, 2024/1689, 12.7.2024",
            "celex": "32024R1689",
        },
        "api": {
            "endpoint": "/api-data",
            "method": "GET",
            "parameters": {
                "resource": allowed_names(),
                "format": ["json", "csv"],
                "id": "optional integer, 1-10000; selects a single record where supported",
            },
            "formats": {
                "json": "schema.org Dataset envelope (default)",
                "csv": "tabular export, collections only",
            },
            "rateLimit": "100 requests per hour per client",
        },
        "resources": RESOURCES
            .iter()
            .filter(|r| r.table.is_some())
            .map(|r| {
                json!({
                    "name": r.name,
                    "description": r.dataset_description,
                    "columns": r.columns,
                })
            })
            .collect::<Vec<_>>(),
    })
}
