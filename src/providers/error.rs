use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Failed to parse JSON payload for '{id}'")]
    JsonParse {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse XML payload for '{id}'")]
    XmlParse {
        id: String,
        #[source]
        source: xmltree::ParseError,
    },

    #[error("Payload for '{id}' is missing required field '{field}'")]
    MissingField { id: String, field: &'static str },
}
