// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Durable transfer records — exactly the fields written to `metadata.json`.
//
// Schema (one file per document):
//   {
//     "id":        UUID string,
//     "title":     string,
//     "createdAt": ISO-8601 timestamp,
//     "updatedAt": ISO-8601 timestamp,
//     "tags":      [string],
//     "pages": [{
//       "id":         UUID string,
//       "imagePath":  string (optional, relative to the document directory),
//       "rotation":   integer degrees,
//       "brightness": real,
//       "contrast":   real,
//       "ocrText":    string (optional)
//     }]
//   }

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Adjustments, DocumentId, PageId, Rotation};

/// Persisted form of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub brightness: f64,
    #[serde(default = "neutral_contrast")]
    pub contrast: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
}

fn neutral_contrast() -> f64 {
    1.0
}

impl PageRecord {
    /// The page's adjustments, clamped into their valid domains.
    pub fn adjustments(&self) -> Adjustments {
        Adjustments::new(self.rotation, self.brightness, self.contrast)
    }
}

/// Persisted form of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

impl DocumentRecord {
    /// Serialise to the pretty-printed metadata form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentRecord {
        let now = Utc::now();
        DocumentRecord {
            id: DocumentId::new(),
            title: "Invoice".into(),
            created_at: now,
            updated_at: now,
            tags: vec!["Tax".into()],
            pages: vec![
                PageRecord {
                    id: PageId::new(),
                    image_path: Some("a.jpg".into()),
                    rotation: Rotation::QUARTER,
                    brightness: 0.25,
                    contrast: 1.5,
                    ocr_text: Some("Total: $42".into()),
                },
                PageRecord {
                    id: PageId::new(),
                    image_path: None,
                    rotation: Rotation::NONE,
                    brightness: 0.0,
                    contrast: 1.0,
                    ocr_text: None,
                },
            ],
        }
    }

    #[test]
    fn uses_camel_case_field_names() {
        let json: serde_json::Value = serde_json::from_slice(&sample().to_json().unwrap()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        let page = &json["pages"][0];
        assert_eq!(page["imagePath"], "a.jpg");
        assert_eq!(page["rotation"], 90);
        assert_eq!(page["ocrText"], "Total: $42");
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let json: serde_json::Value = serde_json::from_slice(&sample().to_json().unwrap()).unwrap();
        let page = json["pages"][1].as_object().unwrap();
        assert!(!page.contains_key("imagePath"));
        assert!(!page.contains_key("ocrText"));
    }

    #[test]
    fn reads_metadata_with_nulls_and_second_precision_dates() {
        let raw = r#"{
            "id": "6f1c1f5e-8a3b-4c55-9d6e-0b1f2a3c4d5e",
            "title": "Lease",
            "createdAt": "2024-03-01T09:30:00Z",
            "updatedAt": "2024-03-02T10:00:00Z",
            "tags": [],
            "pages": [{
                "id": "0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d",
                "imagePath": null,
                "rotation": 180,
                "brightness": -0.5,
                "contrast": 0.75,
                "ocrText": null
            }]
        }"#;
        let record = DocumentRecord::from_json(raw.as_bytes()).unwrap();
        assert_eq!(record.title, "Lease");
        assert_eq!(record.pages[0].rotation, Rotation::HALF);
        assert_eq!(record.pages[0].image_path, None);
        assert!(record.updated_at > record.created_at);
    }
}
