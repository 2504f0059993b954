use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Object,
    Array,
}

/// One field of an index schema as the search service understands it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub search_index: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl FieldSpec {
    fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            items: None,
            search_index: false,
            id: false,
            dimensions: None,
        }
    }

    fn searchable(mut self) -> Self {
        self.search_index = true;
        self
    }
}

/// Schema of a document-with-vector index.
///
/// Field order on the wire is `id`, `content`, `metadata`, `vectors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub id: FieldSpec,
    pub content: FieldSpec,
    pub metadata: FieldSpec,
    pub vectors: FieldSpec,
}

impl IndexSchema {
    pub fn for_dimensions(num_dimensions: usize) -> Self {
        let mut id = FieldSpec::of(FieldType::String).searchable();
        id.id = true;

        let mut vectors = FieldSpec::of(FieldType::Array).searchable();
        vectors.items = Some(Box::new(FieldSpec::of(FieldType::Number)));
        vectors.dimensions = Some(num_dimensions);

        Self {
            id,
            content: FieldSpec::of(FieldType::String).searchable(),
            metadata: FieldSpec::of(FieldType::Object).searchable(),
            vectors,
        }
    }

    pub fn vector_dimensions(&self) -> Option<usize> {
        self.vectors.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_wire_shape() {
        let schema = IndexSchema::for_dimensions(10);

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "id": {"type": "string", "searchIndex": true, "id": true},
                "content": {"type": "string", "searchIndex": true},
                "metadata": {"type": "object", "searchIndex": true},
                "vectors": {
                    "type": "array",
                    "items": {"type": "number"},
                    "searchIndex": true,
                    "dimensions": 10
                }
            })
        );
    }

    #[test]
    fn test_schema_is_rebuilt_identically() {
        assert_eq!(IndexSchema::for_dimensions(3), IndexSchema::for_dimensions(3));
        assert_eq!(IndexSchema::for_dimensions(3).vector_dimensions(), Some(3));
    }
}
