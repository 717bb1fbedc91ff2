//! Quick-create and raw feature POSTs.

use clap::ValueEnum;
use icycon_client::api::{
    AnalyticsSite, AsoApp, Backlink, ContentItem, CreateRequest, Directory, EmailContact,
    EmailFlow, EmailList, EmailTemplate, Faq, KeywordCluster, MarketplaceProduct, SocialPost,
    Translation,
};
use icycon_client::{ApiClient, ResponseBody};
use serde_json::{Map, Value};

use super::{CommandError, print_json};

/// Record kinds that can be quick-created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CreateKind {
    KeywordCluster,
    Directory,
    Content,
    Faq,
    Backlink,
    AnalyticsSite,
    Translation,
    SocialPost,
    EmailList,
    EmailTemplate,
    EmailFlow,
    EmailContact,
    AsoApp,
    MarketplaceProduct,
}

impl CreateKind {
    /// Check `fields` against the kind's payload shape and serialize it.
    ///
    /// Returns the endpoint and the canonical JSON body.
    fn payload(self, fields: Map<String, Value>) -> Result<(&'static str, Value), CommandError> {
        let fields = Value::Object(fields);
        match self {
            Self::KeywordCluster => canonical::<KeywordCluster>(fields),
            Self::Directory => canonical::<Directory>(fields),
            Self::Content => canonical::<ContentItem>(fields),
            Self::Faq => canonical::<Faq>(fields),
            Self::Backlink => canonical::<Backlink>(fields),
            Self::AnalyticsSite => canonical::<AnalyticsSite>(fields),
            Self::Translation => canonical::<Translation>(fields),
            Self::SocialPost => canonical::<SocialPost>(fields),
            Self::EmailList => canonical::<EmailList>(fields),
            Self::EmailTemplate => canonical::<EmailTemplate>(fields),
            Self::EmailFlow => canonical::<EmailFlow>(fields),
            Self::EmailContact => canonical::<EmailContact>(fields),
            Self::AsoApp => canonical::<AsoApp>(fields),
            Self::MarketplaceProduct => canonical::<MarketplaceProduct>(fields),
        }
    }
}

fn canonical<T: CreateRequest>(fields: Value) -> Result<(&'static str, Value), CommandError> {
    let payload: T = serde_json::from_value(fields)?;
    Ok((T::PATH, serde_json::to_value(&payload)?))
}

/// Parse `key=value` (string) and `key:=value` (raw JSON) arguments.
fn parse_fields(fields: &[String]) -> Result<Map<String, Value>, CommandError> {
    let mut map = Map::new();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| CommandError::InvalidField(field.clone()))?;

        let (key, value) = match key.strip_suffix(':') {
            Some(key) => (key, serde_json::from_str(value)?),
            None => (key, Value::String(value.to_string())),
        };

        if key.is_empty() {
            return Err(CommandError::InvalidField(field.clone()));
        }
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

/// Quick-create one record and print the backend's response.
///
/// # Errors
///
/// Returns an error if the fields do not fit the kind or the backend
/// rejects the record.
pub async fn create(
    client: &ApiClient,
    kind: CreateKind,
    fields: &[String],
) -> Result<(), CommandError> {
    let (path, body) = kind.payload(parse_fields(fields)?)?;
    tracing::info!(?kind, path, "Creating record");

    let response = client.post_feature_data(path, body).await?;
    print_response(response)
}

/// POST raw JSON to an endpoint and print the response.
///
/// # Errors
///
/// Returns an error if `payload` is not JSON or the backend rejects it.
pub async fn post(client: &ApiClient, endpoint: &str, payload: &str) -> Result<(), CommandError> {
    let payload: Value = serde_json::from_str(payload)?;
    let response = client.post_feature_data(endpoint, payload).await?;
    print_response(response)
}

fn print_response(response: ResponseBody) -> Result<(), CommandError> {
    match response {
        ResponseBody::Empty => print_json(&Value::Null),
        ResponseBody::Json(value) => print_json(&value),
        ResponseBody::Text(text) => print_json(&Value::String(text)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(fields: &[&str]) -> Vec<String> {
        fields.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_fields_strings_and_json() {
        let map = parse_fields(&args(&["title=Mug", "price:=9.5", "note=a=b"])).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"title": "Mug", "price": 9.5, "note": "a=b"})
        );
    }

    #[test]
    fn test_parse_fields_rejects_malformed() {
        assert!(matches!(
            parse_fields(&args(&["title"])),
            Err(CommandError::InvalidField(_))
        ));
        assert!(matches!(
            parse_fields(&args(&["=x"])),
            Err(CommandError::InvalidField(_))
        ));
        assert!(matches!(
            parse_fields(&args(&["price:=nine"])),
            Err(CommandError::Payload(_))
        ));
    }

    #[test]
    fn test_payload_maps_kind_to_endpoint() {
        let fields = parse_fields(&args(&["question=Q", "answer=A"])).unwrap();
        let (path, body) = CreateKind::Faq.payload(fields).unwrap();
        assert_eq!(path, "/api/seo/faqs/");
        assert_eq!(body, json!({"question": "Q", "answer": "A"}));
    }

    #[test]
    fn test_payload_uses_wire_name_for_content_type() {
        let fields = parse_fields(&args(&["url=https://x.io", "type=blog"])).unwrap();
        let (_, body) = CreateKind::Content.payload(fields).unwrap();
        assert_eq!(body, json!({"url": "https://x.io", "type": "blog"}));
    }

    #[test]
    fn test_payload_rejects_unknown_and_missing_fields() {
        let unknown = parse_fields(&args(&["question=Q", "answer=A", "extra=1"])).unwrap();
        assert!(CreateKind::Faq.payload(unknown).is_err());

        let missing = parse_fields(&args(&["question=Q"])).unwrap();
        assert!(CreateKind::Faq.payload(missing).is_err());
    }
}
