// src/schema/blocks.rs
//! Raw block records as returned by `GET /blocks/{id}/children`.
//!
//! The block body is a discriminated union keyed by `type`. A record whose
//! type is not listed here fails validation; there is no catch-all variant.

use super::properties::RawFileSource;
use super::ImagePolicy;
use crate::model::{
    plain_text, Block, ChildPageBlock, CodeBlock, ImageBlock, RichText, TextBlock, ToggleBlock,
    VideoBlock,
};
use crate::types::{ValidatedUrl, ValidationError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(default)]
    has_children: bool,
    /// Filled in by the fetcher for container blocks; never sent by the API.
    #[serde(default)]
    children: Vec<Value>,
    #[serde(flatten)]
    body: RawBlockBody,
}

#[derive(Debug, Deserialize)]
struct RawText {
    rich_text: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct RawCode {
    rich_text: Vec<RichText>,
    language: String,
    #[serde(default)]
    caption: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    #[serde(flatten)]
    source: RawFileSource,
    #[serde(default)]
    caption: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct RawChildPage {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawBlockBody {
    Paragraph {
        paragraph: RawText,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        heading_1: RawText,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        heading_2: RawText,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        heading_3: RawText,
    },
    Quote {
        quote: RawText,
    },
    Code {
        code: RawCode,
    },
    Image {
        image: RawMedia,
    },
    Video {
        video: RawMedia,
    },
    BulletedListItem {
        bulleted_list_item: RawText,
    },
    NumberedListItem {
        numbered_list_item: RawText,
    },
    Toggle {
        toggle: RawText,
    },
    ChildPage {
        child_page: RawChildPage,
    },
}

/// Whether a raw block has children the fetcher should descend into.
///
/// Malformed records answer `false`; they are rejected later by [`parse_block`].
pub fn wants_children(raw: &Value) -> bool {
    let is_container = raw
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| crate::constants::CONTAINER_BLOCK_TYPES.contains(&t));
    let has_children = raw
        .get("has_children")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    is_container && has_children
}

/// Validates one raw block, and recursively its `children`, into a [`Block`].
pub fn parse_block(raw: &Value, images: &ImagePolicy) -> Result<Block, ValidationError> {
    let RawBlock {
        id,
        has_children,
        children,
        body,
    } = RawBlock::deserialize(raw).map_err(|e| ValidationError::schema("", e.to_string()))?;
    if id.is_empty() {
        return Err(ValidationError::EmptyField("id"));
    }

    let text = |id: String, raw: RawText| TextBlock {
        id,
        rich_text: raw.rich_text,
    };

    let block = match body {
        RawBlockBody::Paragraph { paragraph } => Block::Paragraph(text(id, paragraph)),
        RawBlockBody::Heading1 { heading_1 } => Block::Heading1(text(id, heading_1)),
        RawBlockBody::Heading2 { heading_2 } => Block::Heading2(text(id, heading_2)),
        RawBlockBody::Heading3 { heading_3 } => Block::Heading3(text(id, heading_3)),
        RawBlockBody::Quote { quote } => Block::Quote(text(id, quote)),
        RawBlockBody::BulletedListItem { bulleted_list_item } => {
            Block::BulletedListItem(text(id, bulleted_list_item))
        }
        RawBlockBody::NumberedListItem { numbered_list_item } => {
            Block::NumberedListItem(text(id, numbered_list_item))
        }
        RawBlockBody::Code { code } => Block::Code(CodeBlock {
            id,
            rich_text: code.rich_text,
            language: code.language,
            caption: code.caption,
        }),
        RawBlockBody::Image { image } => {
            let url = image.source.into_url();
            let alt = plain_text(&image.caption).trim().to_string();
            images
                .check(&url, &alt)
                .map_err(|e| e.nested("image"))?;
            Block::Image(ImageBlock {
                id,
                url,
                alt,
                caption: image.caption,
            })
        }
        RawBlockBody::Video { video } => {
            let url = video.source.into_url();
            ValidatedUrl::parse(&url).map_err(|e| e.nested("url").nested("video"))?;
            Block::Video(VideoBlock {
                id,
                url,
                caption: video.caption,
            })
        }
        RawBlockBody::Toggle { toggle } => {
            if has_children && children.is_empty() {
                log::debug!("Toggle {} has children that were not fetched", id);
            }
            let children = children
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    parse_block(child, images).map_err(|e| e.nested(&format!("children[{}]", i)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Block::Toggle(ToggleBlock {
                id,
                rich_text: toggle.rich_text,
                children,
            })
        }
        RawBlockBody::ChildPage { child_page } => Block::ChildPage(ChildPageBlock {
            id,
            title: child_page.title,
        }),
    };

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paragraph(id: &str, text: &str) -> Value {
        json!({
            "object": "block",
            "id": id,
            "type": "paragraph",
            "has_children": false,
            "paragraph": {
                "rich_text": [{"type": "text", "plain_text": text, "href": null}],
                "color": "default"
            }
        })
    }

    fn image(url: &str, caption: &str) -> Value {
        json!({
            "id": "img",
            "type": "image",
            "has_children": false,
            "image": {
                "type": "external",
                "external": {"url": url},
                "caption": if caption.is_empty() {
                    json!([])
                } else {
                    json!([{"type": "text", "plain_text": caption, "href": null}])
                }
            }
        })
    }

    #[test]
    fn parses_a_paragraph() {
        let block = parse_block(&paragraph("p1", "hi"), &ImagePolicy::default()).unwrap();
        assert_eq!(
            block,
            Block::Paragraph(TextBlock {
                id: "p1".to_string(),
                rich_text: vec![RichText {
                    plain_text: "hi".to_string(),
                    href: None,
                    annotations: Default::default(),
                }],
            })
        );
    }

    #[test]
    fn unknown_block_types_are_rejected() {
        let raw = json!({"id": "x", "type": "unsupported", "unsupported": {}});
        let err = parse_block(&raw, &ImagePolicy::default()).unwrap_err();
        assert!(matches!(err, ValidationError::Schema { .. }));
        assert!(err.to_string().contains("unsupported"), "{}", err);
    }

    #[test]
    fn image_alt_text_comes_from_the_caption() {
        let policy = ImagePolicy::default();
        let block = parse_block(&image("https://img.example.com/a.png", "A cat"), &policy).unwrap();
        match block {
            Block::Image(img) => {
                assert_eq!(img.alt, "A cat");
                assert_eq!(img.url, "https://img.example.com/a.png");
            }
            other => panic!("expected image, got {:?}", other),
        }

        let err = parse_block(&image("https://img.example.com/a.png", ""), &policy).unwrap_err();
        assert!(err.to_string().starts_with("Schema mismatch at image"), "{}", err);
    }

    #[test]
    fn video_urls_must_be_http() {
        let video = |url: &str| {
            json!({
                "id": "v",
                "type": "video",
                "video": {"type": "external", "external": {"url": url}, "caption": []}
            })
        };
        let policy = ImagePolicy::default();

        match parse_block(&video("https://videos.example.com/clip.mp4"), &policy).unwrap() {
            Block::Video(v) => assert_eq!(v.url, "https://videos.example.com/clip.mp4"),
            other => panic!("expected video, got {:?}", other),
        }
        for bad in ["javascript:alert(1)", "data:video/mp4;base64,AAAA", "not a url"] {
            match parse_block(&video(bad), &policy).unwrap_err() {
                ValidationError::Schema { path, .. } => assert_eq!(path, "video.url"),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn blocks_need_an_id() {
        let err = parse_block(&paragraph("", "hi"), &ImagePolicy::default()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyField("id"));
    }

    #[test]
    fn toggle_children_are_validated_with_their_path() {
        let raw = json!({
            "id": "t",
            "type": "toggle",
            "has_children": true,
            "toggle": {"rich_text": []},
            "children": [paragraph("c0", "ok"), {"id": "c1", "type": "table"}]
        });
        let err = parse_block(&raw, &ImagePolicy::default()).unwrap_err();
        match err {
            ValidationError::Schema { path, .. } => assert_eq!(path, "children[1]"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn only_containers_with_children_are_descended() {
        let mut toggle = json!({"id": "t", "type": "toggle", "has_children": true});
        assert!(wants_children(&toggle));
        toggle["has_children"] = json!(false);
        assert!(!wants_children(&toggle));

        let mut para = paragraph("p", "x");
        para["has_children"] = json!(true);
        assert!(!wants_children(&para));
    }
}
