//! Translation service seam and the Azure Translator v3 client.

use reqwest::blocking::Client;
use serde_json::json;

use crate::config::TranslatorConfig;
use crate::error::{CoreError, Result};

use super::http;

pub trait Translator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String>;
}

pub struct AzureTranslator {
    client: Client,
    url: String,
    api_key: String,
    region: Option<String>,
}

impl AzureTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::config(
                "translation needs AZURE_TRANSLATOR_KEY (or [translator] in the config file)",
            ));
        }

        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: format!("{}/translate", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            region: config.region.clone().filter(|r| !r.trim().is_empty()),
        })
    }
}

impl Translator for AzureTranslator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let body = json!([{ "Text": text }]);

        let resp = http::send_with_retry(|| {
            let mut req = self
                .client
                .post(&self.url)
                .query(&[("api-version", "3.0"), ("from", from), ("to", to)])
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .json(&body);
            if let Some(region) = &self.region {
                req = req.header("Ocp-Apim-Subscription-Region", region);
            }
            req
        })?;

        parse_translation(&resp)
    }
}

/// First translation of the first input from a `/translate` response body.
pub fn parse_translation(body: &str) -> Result<String> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| CoreError::invalid_response("invalid JSON from translator"))?;

    v.get(0)
        .and_then(|item| item.get("translations"))
        .and_then(|t| t.get(0))
        .and_then(|t| t.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::invalid_response("missing [0].translations[0].text"))
}
