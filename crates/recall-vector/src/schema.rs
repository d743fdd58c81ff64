use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Row status written by ingestion; only `ready` rows are served.
pub const STATUS_READY: &str = "ready";
pub const STATUS_PENDING: &str = "pending";

pub fn vector_field(dim: i32) -> Field {
    Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true)
}

pub fn build_documents_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("partition_id", DataType::Utf8, false),
        Field::new("group_id", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("order_key", DataType::Int64, true),
        // JSON object of string -> string
        Field::new("metadata", DataType::Utf8, true),
        Field::new("embedding_status", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("embedded_at", DataType::Timestamp(TimeUnit::Millisecond, None), true),
        vector_field(dim),
    ]))
}
