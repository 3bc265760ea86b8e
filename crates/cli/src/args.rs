//! Command-line arguments and their translation into an [`Exchange`].

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use bridge::{
    Address, Body, EndpointUri, Exchange, InvocationMetadata, Message, OperationName,
    ResponseClass, TypedValue, ValueType,
};
use clap::Parser;

/// Sends one message through the REST bridge and prints the response.
#[derive(Debug, Parser)]
#[command(name = "restbridge", version, about)]
pub struct Cli {
    /// Endpoint configuration file (JSON).
    #[arg(long, value_name = "PATH", env = "RESTBRIDGE_CONFIG")]
    pub config: PathBuf,

    /// Send to this address instead of the configured one.
    #[arg(long, value_name = "URL")]
    pub address: Option<String>,

    /// HTTP method for a direct call.
    #[arg(long, required_unless_present = "operation")]
    pub method: Option<String>,

    /// Path appended to the address.
    #[arg(long)]
    pub path: Option<String>,

    /// Raw query string, e.g. `a=1&b=2`.
    #[arg(long)]
    pub query: Option<String>,

    /// Character set the query string is encoded in.
    #[arg(long)]
    pub charset: Option<String>,

    /// Request header; may be repeated.
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body, sent as text.
    #[arg(long, conflicts_with = "args")]
    pub body: Option<String>,

    /// Operation to invoke through the configured resource interfaces.
    #[arg(long, conflicts_with = "method")]
    pub operation: Option<String>,

    /// Operation argument as a JSON value; may be repeated.
    #[arg(long = "arg", value_name = "JSON", requires = "operation")]
    pub args: Vec<String>,

    /// Value for the next variable of the interface path; may be repeated.
    #[arg(long = "path-value", value_name = "VALUE")]
    pub path_values: Vec<String>,

    /// Coerce the response entity to one value of this type.
    #[arg(long, value_name = "TYPE", value_parser = parse_value_type, conflicts_with = "collection")]
    pub scalar: Option<ValueType>,

    /// Decode the response entity as a JSON array of this element type.
    #[arg(long, value_name = "TYPE", value_parser = parse_value_type)]
    pub collection: Option<ValueType>,
}

impl Cli {
    /// Builds the exchange this invocation sends.
    pub fn exchange(&self, endpoint_uri: EndpointUri) -> anyhow::Result<Exchange> {
        let mut metadata = InvocationMetadata {
            http_path: self.path.clone(),
            http_query: self.query.clone(),
            charset: self.charset.clone(),
            path_values: (!self.path_values.is_empty()).then(|| self.path_values.clone()),
            ..InvocationMetadata::default()
        };
        if let Some(address) = &self.address {
            metadata.address_override =
                Some(Address::new(address.as_str()).ok_or_else(|| anyhow!("--address is empty"))?);
        }
        if let Some(ty) = self.scalar {
            metadata.response_class = Some(ResponseClass::Scalar(ty));
        }
        if let Some(ty) = self.collection {
            metadata.response_class = Some(ResponseClass::Collection);
            metadata.response_element_type = Some(ty);
        }

        let body = match &self.operation {
            Some(name) => {
                metadata.use_http_api = Some(false);
                metadata.operation_name = Some(
                    OperationName::new(name.as_str()).ok_or_else(|| anyhow!("--operation is empty"))?,
                );
                Body::Values(self.arguments()?)
            }
            None => {
                metadata.use_http_api = Some(true);
                metadata.http_method = self.method.clone();
                self.body.clone().map_or(Body::Empty, Body::Text)
            }
        };

        let mut message = Message::new().with_body(body).with_metadata(metadata);
        for (name, value) in &self.headers {
            message.headers.insert(name.clone(), value.clone());
        }
        Ok(Exchange::new(endpoint_uri, message))
    }

    fn arguments(&self) -> anyhow::Result<Vec<TypedValue>> {
        self.args
            .iter()
            .map(|raw| {
                serde_json::from_str(raw)
                    .map(TypedValue::from_json)
                    .with_context(|| format!("--arg '{raw}' is not valid JSON"))
            })
            .collect()
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("header name missing in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_value_type(raw: &str) -> Result<ValueType, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown type '{raw}' (text, integer, float, boolean, bytes, json)"))
}
