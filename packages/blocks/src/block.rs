//! # Content Blocks
//!
//! A block is one addressable, typed unit of page content. Every block is a
//! [`BlockMeta`] (identity and bookkeeping) plus a [`BlockData`] payload.
//!
//! The block type lives only in the `BlockData` discriminant. There is no
//! separate type field in the metadata, so the tag and the variant cannot
//! drift apart. On the wire the tag is the `"type"` key next to the variant
//! fields:
//!
//! ```json
//! {
//!   "meta": { "id": "…", "order": 0, "isAiGenerated": false },
//!   "type": "product_card",
//!   "name": "Acme Kettle",
//!   "pros": ["fast"],
//!   "cons": [],
//!   "cta_url": "https://example.com"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BlockPayloadError;

const TITLE_MAX_CHARS: usize = 60;

/// Block type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Intro,
    ProductCard,
    Step,
    Feature,
    TextSection,
    BlogSection,
    Conclusion,
    Hero,
    Quote,
    Image,
    Video,
    CallToAction,
    Testimonial,
    Pricing,
    Faq,
    ComparisonRow,
}

impl BlockType {
    pub const ALL: [BlockType; 16] = [
        BlockType::Intro,
        BlockType::ProductCard,
        BlockType::Step,
        BlockType::Feature,
        BlockType::TextSection,
        BlockType::BlogSection,
        BlockType::Conclusion,
        BlockType::Hero,
        BlockType::Quote,
        BlockType::Image,
        BlockType::Video,
        BlockType::CallToAction,
        BlockType::Testimonial,
        BlockType::Pricing,
        BlockType::Faq,
        BlockType::ComparisonRow,
    ];

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Intro => "intro",
            BlockType::ProductCard => "product_card",
            BlockType::Step => "step",
            BlockType::Feature => "feature",
            BlockType::TextSection => "text_section",
            BlockType::BlogSection => "blog_section",
            BlockType::Conclusion => "conclusion",
            BlockType::Hero => "hero",
            BlockType::Quote => "quote",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::CallToAction => "call_to_action",
            BlockType::Testimonial => "testimonial",
            BlockType::Pricing => "pricing",
            BlockType::Faq => "faq",
            BlockType::ComparisonRow => "comparison_row",
        }
    }

    /// Human readable name, used when a block has no title of its own
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Intro => "Intro",
            BlockType::ProductCard => "Product Card",
            BlockType::Step => "Step",
            BlockType::Feature => "Feature",
            BlockType::TextSection => "Text Section",
            BlockType::BlogSection => "Blog Section",
            BlockType::Conclusion => "Conclusion",
            BlockType::Hero => "Hero",
            BlockType::Quote => "Quote",
            BlockType::Image => "Image",
            BlockType::Video => "Video",
            BlockType::CallToAction => "Call to Action",
            BlockType::Testimonial => "Testimonial",
            BlockType::Pricing => "Pricing",
            BlockType::Faq => "FAQ",
            BlockType::ComparisonRow => "Comparison Row",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = BlockPayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BlockPayloadError::UnknownBlockType(s.to_string()))
    }
}

/// Identity and bookkeeping shared by every block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMeta {
    /// Stable identity across reorders. Never reassigned.
    pub id: Uuid,

    /// Position in the page. Recomputed by the document on every
    /// structural change.
    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub is_ai_generated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl BlockMeta {
    /// Fresh metadata with a new random id
    pub fn new(order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            is_ai_generated: false,
            last_edited_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroBlock {
    pub headline: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCardBlock {
    pub name: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub cta_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepBlock {
    pub step_number: u32,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBlock {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSectionBlock {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogSectionBlock {
    pub heading: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConclusionBlock {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroBlock {
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoBlock {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToActionBlock {
    pub headline: String,
    pub button_text: String,
    pub button_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestimonialBlock {
    pub quote: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBlock {
    pub plan_name: String,
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub cta_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<String>,
    #[serde(default)]
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqBlock {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRowBlock {
    pub label: String,
    #[serde(default)]
    pub values: Vec<String>,
    /// Index into `values` of the winning cell, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<usize>,
}

/// Variant-specific block payload, tagged by `"type"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockData {
    Intro(IntroBlock),
    ProductCard(ProductCardBlock),
    Step(StepBlock),
    Feature(FeatureBlock),
    TextSection(TextSectionBlock),
    BlogSection(BlogSectionBlock),
    Conclusion(ConclusionBlock),
    Hero(HeroBlock),
    Quote(QuoteBlock),
    Image(ImageBlock),
    Video(VideoBlock),
    CallToAction(CallToActionBlock),
    Testimonial(TestimonialBlock),
    Pricing(PricingBlock),
    Faq(FaqBlock),
    ComparisonRow(ComparisonRowBlock),
}

impl BlockData {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockData::Intro(_) => BlockType::Intro,
            BlockData::ProductCard(_) => BlockType::ProductCard,
            BlockData::Step(_) => BlockType::Step,
            BlockData::Feature(_) => BlockType::Feature,
            BlockData::TextSection(_) => BlockType::TextSection,
            BlockData::BlogSection(_) => BlockType::BlogSection,
            BlockData::Conclusion(_) => BlockType::Conclusion,
            BlockData::Hero(_) => BlockType::Hero,
            BlockData::Quote(_) => BlockType::Quote,
            BlockData::Image(_) => BlockType::Image,
            BlockData::Video(_) => BlockType::Video,
            BlockData::CallToAction(_) => BlockType::CallToAction,
            BlockData::Testimonial(_) => BlockType::Testimonial,
            BlockData::Pricing(_) => BlockType::Pricing,
            BlockData::Faq(_) => BlockType::Faq,
            BlockData::ComparisonRow(_) => BlockType::ComparisonRow,
        }
    }

    /// Parse a payload typed by hand (e.g. in a raw JSON editor)
    pub fn from_json(json: &str) -> Result<Self, BlockPayloadError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A block as stored in the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub meta: BlockMeta,

    #[serde(flatten)]
    pub data: BlockData,
}

impl ContentBlock {
    /// New block with a fresh id
    pub fn new(data: BlockData, order: u32) -> Self {
        Self {
            meta: BlockMeta::new(order),
            data,
        }
    }

    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    pub fn order(&self) -> u32 {
        self.meta.order
    }

    /// The block's tag, derived from its payload variant
    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }

    /// Stamp the edit time
    pub fn touch(&mut self) {
        self.meta.last_edited_at = Some(Utc::now());
    }

    /// Copy of this block under a new id, stamped as edited now
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.meta.id = Uuid::new_v4();
        copy.touch();
        copy
    }

    /// Title shown in block lists. Falls back to the type label when the
    /// block has nothing better to show.
    pub fn display_title(&self) -> String {
        let title = match &self.data {
            BlockData::Intro(b) => b.headline.clone(),
            BlockData::ProductCard(b) => b.name.clone(),
            BlockData::Step(b) => {
                if b.title.trim().is_empty() {
                    format!("Step {}", b.step_number)
                } else {
                    format!("Step {}: {}", b.step_number, b.title.trim())
                }
            }
            BlockData::Feature(b) => b.title.clone(),
            BlockData::TextSection(b) => b
                .heading
                .clone()
                .unwrap_or_else(|| first_line(&b.content)),
            BlockData::BlogSection(b) => b.heading.clone(),
            BlockData::Conclusion(b) => b.heading.clone().unwrap_or_default(),
            BlockData::Hero(b) => b.headline.clone(),
            BlockData::Quote(b) => first_line(&b.text),
            BlockData::Image(b) => b.caption.clone().unwrap_or_else(|| b.alt.clone()),
            BlockData::Video(b) => b.title.clone().unwrap_or_default(),
            BlockData::CallToAction(b) => b.headline.clone(),
            BlockData::Testimonial(b) => b.author.clone(),
            BlockData::Pricing(b) => b.plan_name.clone(),
            BlockData::Faq(b) => b.question.clone(),
            BlockData::ComparisonRow(b) => b.label.clone(),
        };

        let title = title.trim();
        if title.is_empty() {
            self.block_type().label().to_string()
        } else {
            truncate(title, TITLE_MAX_CHARS)
        }
    }

    /// Shallow-merge a partial update into a copy of this block.
    ///
    /// Data fields replace the corresponding top-level payload fields and
    /// the result is re-validated against the variant. The tag can never be
    /// changed through a patch, and `id` / `order` are not patchable.
    pub fn merge_patch(&self, patch: &BlockPatch) -> Result<ContentBlock, BlockPayloadError> {
        let current = self.block_type();

        if let Some(requested) = patch.meta.block_type {
            if requested != current {
                return Err(BlockPayloadError::TypeMismatch {
                    expected: current,
                    found: requested.to_string(),
                });
            }
        }

        let mut value = serde_json::to_value(&self.data)?;
        let object = value
            .as_object_mut()
            .ok_or(BlockPayloadError::NotAnObject)?;

        for (key, field) in &patch.fields {
            match key.as_str() {
                "type" => {
                    if field.as_str() != Some(current.as_str()) {
                        return Err(BlockPayloadError::TypeMismatch {
                            expected: current,
                            found: field.to_string(),
                        });
                    }
                }
                "id" | "order" | "meta" => {
                    return Err(BlockPayloadError::ReservedField(key.clone()));
                }
                _ => {
                    object.insert(key.clone(), field.clone());
                }
            }
        }

        let data: BlockData = serde_json::from_value(value)?;

        let mut merged = ContentBlock {
            meta: self.meta.clone(),
            data,
        };
        if let Some(flag) = patch.meta.is_ai_generated {
            merged.meta.is_ai_generated = flag;
        }
        merged.touch();
        Ok(merged)
    }

    /// Replace the whole payload, keeping identity. The new payload must
    /// carry the same tag.
    pub fn with_data(&self, data: BlockData) -> Result<ContentBlock, BlockPayloadError> {
        let current = self.block_type();
        if data.block_type() != current {
            return Err(BlockPayloadError::TypeMismatch {
                expected: current,
                found: data.block_type().to_string(),
            });
        }

        let mut replaced = ContentBlock {
            meta: self.meta.clone(),
            data,
        };
        replaced.touch();
        Ok(replaced)
    }
}

/// Partial update for a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default)]
    pub meta: MetaPatch,

    /// Top-level payload fields to overwrite
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Metadata part of a [`BlockPatch`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPatch {
    /// Accepted only when equal to the block's current tag
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<BlockType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ai_generated: Option<bool>,
}

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one payload field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn ai_generated(mut self, flag: bool) -> Self {
        self.meta.is_ai_generated = Some(flag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.meta == MetaPatch::default()
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
