//! # Block Type Registry
//!
//! Default payloads for every block type. Creating a block never fails:
//! an unrecognized tag produces a minimal text section.

use crate::block::*;

/// New block of the given type with placeholder content and a fresh id
pub fn create_default(block_type: BlockType, order: u32) -> ContentBlock {
    ContentBlock::new(default_data(block_type), order)
}

/// Like [`create_default`], keyed by wire tag. Unknown tags fall back to
/// `text_section`.
pub fn create_default_from_tag(tag: &str, order: u32) -> ContentBlock {
    let block_type = tag.parse().unwrap_or(BlockType::TextSection);
    create_default(block_type, order)
}

/// Placeholder payload for a block type
pub fn default_data(block_type: BlockType) -> BlockData {
    match block_type {
        BlockType::Intro => BlockData::Intro(IntroBlock {
            headline: "Introduction".to_string(),
            content: String::new(),
        }),
        BlockType::ProductCard => BlockData::ProductCard(ProductCardBlock {
            name: "New Product".to_string(),
            pros: Vec::new(),
            cons: Vec::new(),
            cta_url: String::new(),
            cta_text: None,
            description: None,
            image_url: None,
            price: None,
            rating: None,
            badge: None,
        }),
        BlockType::Step => BlockData::Step(StepBlock {
            step_number: 1,
            title: "New Step".to_string(),
            content: String::new(),
            image_url: None,
        }),
        BlockType::Feature => BlockData::Feature(FeatureBlock {
            title: "New Feature".to_string(),
            description: String::new(),
            icon: None,
        }),
        BlockType::TextSection => BlockData::TextSection(TextSectionBlock {
            content: String::new(),
            heading: None,
        }),
        BlockType::BlogSection => BlockData::BlogSection(BlogSectionBlock {
            heading: "New Section".to_string(),
            content: String::new(),
            image_url: None,
        }),
        BlockType::Conclusion => BlockData::Conclusion(ConclusionBlock {
            content: String::new(),
            heading: Some("Conclusion".to_string()),
            verdict: None,
        }),
        BlockType::Hero => BlockData::Hero(HeroBlock {
            headline: "Headline".to_string(),
            subheadline: None,
            background_image_url: None,
            cta_text: None,
            cta_url: None,
        }),
        BlockType::Quote => BlockData::Quote(QuoteBlock {
            text: String::new(),
            author: None,
            source: None,
        }),
        BlockType::Image => BlockData::Image(ImageBlock {
            url: String::new(),
            alt: String::new(),
            caption: None,
        }),
        BlockType::Video => BlockData::Video(VideoBlock {
            url: String::new(),
            title: None,
            caption: None,
        }),
        BlockType::CallToAction => BlockData::CallToAction(CallToActionBlock {
            headline: "Ready to get started?".to_string(),
            button_text: "Learn more".to_string(),
            button_url: String::new(),
            description: None,
        }),
        BlockType::Testimonial => BlockData::Testimonial(TestimonialBlock {
            quote: String::new(),
            author: "Customer".to_string(),
            role: None,
            avatar_url: None,
            rating: None,
        }),
        BlockType::Pricing => BlockData::Pricing(PricingBlock {
            plan_name: "Basic".to_string(),
            price: "$0".to_string(),
            features: Vec::new(),
            cta_url: String::new(),
            cta_text: None,
            billing_period: None,
            highlighted: false,
        }),
        BlockType::Faq => BlockData::Faq(FaqBlock {
            question: "New question?".to_string(),
            answer: String::new(),
        }),
        BlockType::ComparisonRow => BlockData::ComparisonRow(ComparisonRowBlock {
            label: "Feature".to_string(),
            values: Vec::new(),
            winner: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_requested_type() {
        for block_type in BlockType::ALL {
            let block = create_default(block_type, 3);
            assert_eq!(block.block_type(), block_type);
            assert_eq!(block.order(), 3);
            assert!(!block.meta.is_ai_generated);
        }
    }

    #[test]
    fn test_defaults_get_unique_ids() {
        let a = create_default(BlockType::Faq, 0);
        let b = create_default(BlockType::Faq, 0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_unknown_tag_falls_back_to_text_section() {
        let block = create_default_from_tag("carousel", 1);
        assert_eq!(block.block_type(), BlockType::TextSection);
        assert_eq!(block.order(), 1);

        let known = create_default_from_tag("call_to_action", 0);
        assert_eq!(known.block_type(), BlockType::CallToAction);
    }

    #[test]
    fn test_defaults_survive_wire_round_trip() {
        for block_type in BlockType::ALL {
            let block = create_default(block_type, 0);
            let json = serde_json::to_string(&block).unwrap();
            let back: ContentBlock = serde_json::from_str(&json).unwrap();
            assert_eq!(back, block);
        }
    }
}
