use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DocumentRecord;

/// Opaque metadata predicate. Passed to the search service uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Value);

impl Filter {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub vectors: Vec<f32>,
}

/// A single-page nearest-neighbor request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchRequest {
    pub vector_query: VectorQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub hits_per_page: usize,
}

impl VectorSearchRequest {
    pub fn new(query: Vec<f32>, k: usize) -> Self {
        Self {
            vector_query: VectorQuery { vectors: query },
            filter: None,
            hits_per_page: k,
        }
    }

    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_distance: Option<f64>,
}

/// Ranking metadata attached to a hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match: Option<TextMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: DocumentRecord,
    #[serde(default)]
    pub meta: HitMeta,
}

impl SearchHit {
    pub fn new(document: DocumentRecord, vector_distance: f64) -> Self {
        Self {
            document,
            meta: HitMeta {
                text_match: Some(TextMatch {
                    vector_distance: Some(vector_distance),
                }),
            },
        }
    }

    /// Distance as the service reported it, without narrowing.
    pub fn score(&self) -> Option<f64> {
        self.meta.text_match.as_ref()?.vector_distance
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}
