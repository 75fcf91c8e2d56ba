//! Page-level content: metadata, global settings and the ordered blocks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::ContentBlock;

/// A whole page as the editor sees it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredContent {
    /// Page template discriminator (e.g. "review", "comparison")
    #[serde(default)]
    pub page_type: String,

    #[serde(default)]
    pub meta: PageMeta,

    #[serde(default)]
    pub global_settings: GlobalSettings,

    /// Blocks sorted by `meta.order`
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default)]
    pub show_table_of_contents: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_disclosure: Option<String>,
}

impl StructuredContent {
    pub fn new(page_type: impl Into<String>, meta: PageMeta) -> Self {
        Self {
            page_type: page_type.into(),
            meta,
            global_settings: GlobalSettings::default(),
            blocks: Vec::new(),
        }
    }

    pub fn block(&self, id: Uuid) -> Option<&ContentBlock> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn block_ids(&self) -> Vec<Uuid> {
        self.blocks.iter().map(|b| b.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_content() {
        let json = r#"{
            "pageType": "review",
            "meta": { "title": "Best Kettles", "slug": "best-kettles" },
            "blocks": [
                {
                    "meta": { "id": "7f0c1a2e-4b7d-4f6a-9a51-3c2d1e0f9b88", "order": 0 },
                    "type": "intro",
                    "headline": "Why kettles matter"
                }
            ]
        }"#;

        let content: StructuredContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.page_type, "review");
        assert_eq!(content.meta.slug, "best-kettles");
        assert!(!content.global_settings.show_table_of_contents);
        assert_eq!(content.blocks.len(), 1);
        assert_eq!(content.blocks[0].display_title(), "Why kettles matter");
        assert_eq!(content.index_of(content.blocks[0].id()), Some(0));
    }
}
