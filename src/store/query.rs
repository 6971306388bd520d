//! Query primitives for the remote document store
//!
//! Queries are serialized as JSON strings and sent as repeated `queries[]`
//! parameters, which is the query language the hosted store understands.

use serde_json::{json, Value};

/// A single query primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Attribute equals a value
    Equal(String, Value),
    /// Attribute is less than or equal to a value
    LessThanEqual(String, Value),
    /// Substring/fuzzy search on an attribute, as defined by the store
    Search(String, String),
    /// At least one nested query matches
    Or(Vec<Query>),
    /// Every nested query matches
    And(Vec<Query>),
    /// Ascending order by attribute
    OrderAsc(String),
    /// Descending order by attribute
    OrderDesc(String),
    /// Cap the number of returned documents
    Limit(u32),
    /// Skip a number of documents
    Offset(u32),
}

impl Query {
    /// Attribute equals a value
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::Equal(attribute.to_string(), value.into())
    }

    /// Attribute is less than or equal to a value
    pub fn less_than_equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::LessThanEqual(attribute.to_string(), value.into())
    }

    /// Substring search on an attribute
    pub fn search(attribute: &str, term: &str) -> Self {
        Query::Search(attribute.to_string(), term.to_string())
    }

    /// Disjunction of nested queries
    pub fn or(queries: Vec<Query>) -> Self {
        Query::Or(queries)
    }

    /// Conjunction of nested queries
    pub fn and(queries: Vec<Query>) -> Self {
        Query::And(queries)
    }

    /// Ascending order by attribute
    pub fn order_asc(attribute: &str) -> Self {
        Query::OrderAsc(attribute.to_string())
    }

    /// Descending order by attribute
    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc(attribute.to_string())
    }

    /// Cap the number of returned documents
    pub fn limit(count: u32) -> Self {
        Query::Limit(count)
    }

    /// Skip a number of documents
    pub fn offset(count: u32) -> Self {
        Query::Offset(count)
    }

    fn to_value(&self) -> Value {
        match self {
            Query::Equal(attribute, value) => json!({
                "method": "equal",
                "attribute": attribute,
                "values": [value],
            }),
            Query::LessThanEqual(attribute, value) => json!({
                "method": "lessThanEqual",
                "attribute": attribute,
                "values": [value],
            }),
            Query::Search(attribute, term) => json!({
                "method": "search",
                "attribute": attribute,
                "values": [term],
            }),
            Query::Or(queries) => json!({
                "method": "or",
                "queries": queries.iter().map(Query::to_value).collect::<Vec<_>>(),
            }),
            Query::And(queries) => json!({
                "method": "and",
                "queries": queries.iter().map(Query::to_value).collect::<Vec<_>>(),
            }),
            Query::OrderAsc(attribute) => json!({
                "method": "orderAsc",
                "attribute": attribute,
            }),
            Query::OrderDesc(attribute) => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(count) => json!({
                "method": "limit",
                "values": [count],
            }),
            Query::Offset(count) => json!({
                "method": "offset",
                "values": [count],
            }),
        }
    }

    /// Render the query as the JSON string the store expects
    pub fn render(&self) -> String {
        self.to_value().to_string()
    }

    /// Render a set of queries as repeated `queries[]` parameters
    pub fn to_params(queries: &[Query]) -> Vec<(String, String)> {
        queries
            .iter()
            .map(|q| ("queries[]".to_string(), q.render()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_renders_method_and_values() {
        let rendered = Query::equal("senderId", "u1").render();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["method"], "equal");
        assert_eq!(value["attribute"], "senderId");
        assert_eq!(value["values"][0], "u1");
    }

    #[test]
    fn nested_or_of_ands_renders_recursively() {
        let query = Query::or(vec![
            Query::and(vec![
                Query::equal("senderId", "a"),
                Query::equal("receiverId", "b"),
            ]),
            Query::and(vec![
                Query::equal("senderId", "b"),
                Query::equal("receiverId", "a"),
            ]),
        ]);

        let value: Value = serde_json::from_str(&query.render()).unwrap();
        assert_eq!(value["method"], "or");
        assert_eq!(value["queries"][0]["method"], "and");
        assert_eq!(value["queries"][1]["queries"][0]["values"][0], "b");
    }

    #[test]
    fn equal_keeps_the_value_type() {
        let value: Value = serde_json::from_str(&Query::equal("read", false).render()).unwrap();
        assert_eq!(value["values"][0], false);
    }

    #[test]
    fn params_repeat_the_queries_key() {
        let params = Query::to_params(&[Query::order_desc("timestamp"), Query::limit(100)]);
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|(k, _)| k == "queries[]"));
        assert!(params[1].1.contains("\"limit\""));
    }
}
