//! OCR service seam and the Azure AI Vision (Image Analysis 4.0) client.

use std::fs;
use std::path::Path;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::OcrConfig;
use crate::error::{CoreError, Result};
use crate::model::ocr::{BoundingBox, ExtractionResult, OcrLine};

use super::http;

pub trait OcrService {
    /// Recognized lines of one image, in reading order.
    fn recognize(&self, image_path: &Path) -> Result<ExtractionResult>;
}

pub struct AzureVisionClient {
    client: Client,
    url: String,
    api_key: String,
}

impl AzureVisionClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(CoreError::config(
                "OCR needs AZURE_VISION_ENDPOINT and AZURE_VISION_KEY (or [ocr] in the config file)",
            ));
        }

        let url = format!(
            "{}/computervision/imageanalysis:analyze?api-version={}&features=read",
            config.endpoint.trim_end_matches('/'),
            config.api_version
        );

        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url,
            api_key: config.api_key.clone(),
        })
    }
}

impl OcrService for AzureVisionClient {
    fn recognize(&self, image_path: &Path) -> Result<ExtractionResult> {
        let bytes = fs::read(image_path)?;

        let body = http::send_with_retry(|| {
            self.client
                .post(&self.url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .header("Content-Type", "application/octet-stream")
                .body(bytes.clone())
        })?;

        parse_analysis(image_path, &body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    read_result: Option<ReadResult>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    width: f64,
}

#[derive(Debug, Deserialize)]
struct ReadResult {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default)]
    lines: Vec<Line>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Line {
    text: String,
    #[serde(default)]
    bounding_polygon: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

/// Maps an analyze response body to an extraction; a missing read result is empty.
pub fn parse_analysis(image_path: &Path, body: &str) -> Result<ExtractionResult> {
    let resp: AnalyzeResponse = serde_json::from_str(body)
        .map_err(|e| CoreError::invalid_response(format!("image analysis: {e}")))?;

    let lines = resp
        .read_result
        .map(|r| r.blocks)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|b| b.lines)
        .map(|l| {
            let points: Vec<(f64, f64)> = l.bounding_polygon.iter().map(|p| (p.x, p.y)).collect();
            OcrLine {
                text: l.text,
                bounding_box: BoundingBox::from_points(&points),
            }
        })
        .collect();

    Ok(ExtractionResult {
        image_path: image_path.to_path_buf(),
        page_width: resp.metadata.map(|m| m.width),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_read_result() {
        let body = r#"{
            "modelVersion": "2023-10-01",
            "metadata": { "width": 1240, "height": 1754 },
            "readResult": {
                "blocks": [
                    { "lines": [
                        { "text": "personality [,p3:sn'æləti]",
                          "boundingPolygon": [{"x":60,"y":40},{"x":300,"y":41},{"x":300,"y":70},{"x":60,"y":69}],
                          "words": [] },
                        { "text": "Persönlichkeit",
                          "boundingPolygon": [{"x":420,"y":40},{"x":600,"y":40},{"x":600,"y":70},{"x":420,"y":70}] }
                    ] },
                    { "lines": [ { "text": "173" } ] }
                ]
            }
        }"#;

        let ex = parse_analysis(Path::new("p1.jpg"), body).unwrap();
        assert_eq!(ex.page_width, Some(1240.0));
        assert_eq!(ex.lines.len(), 3);
        assert_eq!(ex.lines[1].text, "Persönlichkeit");
        assert_eq!(ex.lines[1].bounding_box.unwrap().x, 420.0);
        assert!(ex.lines[2].bounding_box.is_none());
    }

    #[test]
    fn missing_read_result_is_empty() {
        let ex = parse_analysis(Path::new("blank.png"), r#"{"metadata":{"width":10,"height":10}}"#)
            .unwrap();
        assert!(ex.lines.is_empty());
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(matches!(
            parse_analysis(Path::new("x.png"), "<html>"),
            Err(CoreError::InvalidResponse(_))
        ));
    }

    #[test]
    fn client_requires_credentials() {
        assert!(matches!(
            AzureVisionClient::new(&OcrConfig::default()),
            Err(CoreError::Config(_))
        ));
    }
}
