use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One row per chunk: identity, payload text, JSON-encoded source metadata,
/// and the unit-norm embedding as a fixed-size float list.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}
