//! Publication record model.
//!
//! A [`Record`] is one search hit. The scraper produces them directly; the API
//! returns its own article shape, which loads into the same struct through serde
//! aliases so that saved files of either shape can be combined and exported.
//! Fields the model does not name are kept in [`Record::extra`] and written back
//! out untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Base URL for a document page, completed with the document id.
pub const IEEE_DOCUMENT_URL: &str = "https://ieeexplore.ieee.org/document/";

/// One publication hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Article title
    #[serde(default)]
    pub title: String,
    /// Author names in display order
    #[serde(default, deserialize_with = "de_authors")]
    pub authors: Vec<String>,
    /// Journal or conference name
    #[serde(default, alias = "publication_title")]
    pub journal: String,
    /// Abstract text
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    /// Publication year
    #[serde(default, alias = "publication_year", deserialize_with = "de_year")]
    pub year: i32,
    /// IEEE document (article) number
    #[serde(
        default,
        rename = "document",
        alias = "article_number",
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    /// Content type, e.g. "Journals" (API records only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Publisher (API records only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Any other fields present in the source document
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Document id if present and non-empty.
    pub fn document(&self) -> Option<&str> {
        self.document_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Link to the document page, only when an id is known.
    pub fn ieee_url(&self) -> Option<String> {
        self.document().map(|id| format!("{}{}", IEEE_DOCUMENT_URL, id))
    }

    /// Authors joined the way the spreadsheet shows them.
    pub fn authors_joined(&self) -> String {
        self.authors.join("; ")
    }
}

/// Outcome of one acquisition call.
///
/// Field names follow the IEEE API body so the API path can deserialize straight
/// into `ResultEnvelope<serde_json::Value>` without reshaping anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T = Record> {
    /// Number of matching records reported by the source
    #[serde(default)]
    pub total_records: u64,
    /// Number of records searched (API only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_searched: Option<u64>,
    /// Records in source order
    #[serde(default = "Vec::new")]
    pub articles: Vec<T>,
    /// Other top-level members of the API body
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> ResultEnvelope<T> {
    /// Envelope for a fully materialized list (scrape path).
    pub fn from_records(articles: Vec<T>) -> Self {
        Self {
            total_records: articles.len() as u64,
            total_searched: None,
            articles,
            extra: Map::new(),
        }
    }
}

/// Authors arrive either as a plain list (scraped) or nested as
/// `{"authors": [{"full_name": ...}]}` (API).
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorsRepr {
    List(Vec<String>),
    Nested {
        #[serde(default)]
        authors: Vec<ApiAuthor>,
    },
    Null(()),
}

#[derive(Deserialize)]
struct ApiAuthor {
    #[serde(default)]
    full_name: String,
}

fn de_authors<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match AuthorsRepr::deserialize(deserializer)? {
        AuthorsRepr::List(list) => list,
        AuthorsRepr::Nested { authors } => authors
            .into_iter()
            .map(|a| a.full_name)
            .filter(|name| !name.is_empty())
            .collect(),
        AuthorsRepr::Null(()) => Vec::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Str(String),
    Null(()),
}

fn de_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => i32::try_from(n).map_err(serde::de::Error::custom),
        Scalar::Str(s) if s.trim().is_empty() => Ok(0),
        Scalar::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Scalar::Null(()) => Ok(0),
    }
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => Some(n.to_string()),
        Scalar::Str(s) => Some(s),
        Scalar::Null(()) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scrape_shape_roundtrips_field_names() {
        let record = Record {
            title: "Nano optics".into(),
            authors: vec!["A. Author".into(), "B. Author".into()],
            journal: "IEEE Photonics".into(),
            abstract_text: "Light.".into(),
            year: 2019,
            document_id: Some("8123456".into()),
            ..Default::default()
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["document"], "8123456");
        assert_eq!(value["abstract"], "Light.");
        assert_eq!(value["year"], 2019);
        assert!(value.get("content_type").is_none());
    }

    #[test]
    fn test_api_article_loads_into_record() {
        let article = json!({
            "article_number": "9000001",
            "title": "H.264 over cellular",
            "publication_year": 2012,
            "publication_title": "IEEE Trans. Broadcasting",
            "content_type": "Journals",
            "publisher": "IEEE",
            "abstract": "Video.",
            "doi": "10.1109/x",
            "authors": {"authors": [{"full_name": "Jane Roe", "author_order": 1}]}
        });

        let record: Record = serde_json::from_value(article).expect("deserialize");
        assert_eq!(record.document(), Some("9000001"));
        assert_eq!(record.year, 2012);
        assert_eq!(record.journal, "IEEE Trans. Broadcasting");
        assert_eq!(record.authors, vec!["Jane Roe".to_string()]);
        assert_eq!(record.content_type.as_deref(), Some("Journals"));
        assert_eq!(record.extra.get("doi"), Some(&json!("10.1109/x")));
    }

    #[test]
    fn test_year_and_id_accept_strings_and_numbers() {
        let record: Record =
            serde_json::from_value(json!({"title": "t", "year": "2005", "document": 42}))
                .expect("deserialize");
        assert_eq!(record.year, 2005);
        assert_eq!(record.document_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_envelope_keeps_api_body_shape() {
        let body = json!({
            "total_records": 350,
            "total_searched": 5000000,
            "articles": [{"article_number": "1", "title": "t"}],
            "api_version": "1.0"
        });

        let envelope: ResultEnvelope<Value> =
            serde_json::from_value(body.clone()).expect("deserialize");
        assert_eq!(envelope.total_records, 350);
        assert_eq!(envelope.total_searched, Some(5_000_000));
        assert_eq!(serde_json::to_value(&envelope).expect("serialize"), body);
    }

    #[test]
    fn test_envelope_from_records_counts() {
        let envelope = ResultEnvelope::from_records(vec![Record::default(), Record::default()]);
        assert_eq!(envelope.total_records, 2);
        assert_eq!(envelope.total_searched, None);
    }

    #[test]
    fn test_ieee_url_only_for_non_empty_id() {
        let mut record = Record {
            document_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(record.ieee_url(), None);

        record.document_id = Some("123".into());
        assert_eq!(
            record.ieee_url().as_deref(),
            Some("https://ieeexplore.ieee.org/document/123")
        );
    }
}
