use super::RichText;
use crate::types::{ValidatedUrl, ValidationError};
use serde::{Deserialize, Serialize};

/// Blocks whose content is a single rich-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub id: String,
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub id: String,
    pub rich_text: Vec<RichText>,
    pub language: String,
    pub caption: Vec<RichText>,
}

/// An image. `alt` is the caption flattened to plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    pub id: String,
    pub url: String,
    pub alt: String,
    pub caption: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBlock {
    pub id: String,
    pub url: String,
    pub caption: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPageBlock {
    pub id: String,
    pub title: String,
}

/// A container block. `C` is [`Block`] before grouping and [`GroupedBlock`] after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBlock<C> {
    pub id: String,
    pub rich_text: Vec<RichText>,
    pub children: Vec<C>,
}

/// The two list flavours. Consecutive items of one kind form a single list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

/// One validated block, as delivered by the Notion block-children listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(TextBlock),
    #[serde(rename = "heading_1")]
    Heading1(TextBlock),
    #[serde(rename = "heading_2")]
    Heading2(TextBlock),
    #[serde(rename = "heading_3")]
    Heading3(TextBlock),
    Quote(TextBlock),
    Code(CodeBlock),
    Image(ImageBlock),
    Video(VideoBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    Toggle(ToggleBlock<Block>),
    ChildPage(ChildPageBlock),
}

impl Block {
    /// The list this block belongs to, if it is a list item.
    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            Block::BulletedListItem(_) => Some(ListKind::Bulleted),
            Block::NumberedListItem(_) => Some(ListKind::Numbered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub items: Vec<TextBlock>,
}

/// A block tree with every run of same-kind list items merged into one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupedBlock {
    Paragraph(TextBlock),
    #[serde(rename = "heading_1")]
    Heading1(TextBlock),
    #[serde(rename = "heading_2")]
    Heading2(TextBlock),
    #[serde(rename = "heading_3")]
    Heading3(TextBlock),
    Quote(TextBlock),
    Code(CodeBlock),
    Image(ImageBlock),
    Video(VideoBlock),
    BulletedList(ListBlock),
    NumberedList(ListBlock),
    Toggle(ToggleBlock<GroupedBlock>),
    ChildPage(ChildPageBlock),
}

impl GroupedBlock {
    pub fn list(kind: ListKind, items: Vec<TextBlock>) -> Self {
        match kind {
            ListKind::Bulleted => GroupedBlock::BulletedList(ListBlock { items }),
            ListKind::Numbered => GroupedBlock::NumberedList(ListBlock { items }),
        }
    }

    /// Checks the invariants a freshly parsed and grouped tree always holds:
    /// ids are present, lists are non-empty, media URLs are http(s). Used on
    /// values that come back from the cache.
    ///
    /// Image alt text and the prefix allow-list are configuration dependent
    /// and are only enforced when the block is first parsed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            GroupedBlock::Paragraph(b)
            | GroupedBlock::Heading1(b)
            | GroupedBlock::Heading2(b)
            | GroupedBlock::Heading3(b)
            | GroupedBlock::Quote(b) => require_id(&b.id),
            GroupedBlock::Code(b) => require_id(&b.id),
            GroupedBlock::ChildPage(b) => require_id(&b.id),
            GroupedBlock::Image(b) => {
                require_id(&b.id)?;
                ValidatedUrl::parse(&b.url).map_err(|e| e.nested("url").nested("image"))?;
                Ok(())
            }
            GroupedBlock::Video(b) => {
                require_id(&b.id)?;
                ValidatedUrl::parse(&b.url).map_err(|e| e.nested("url").nested("video"))?;
                Ok(())
            }
            GroupedBlock::BulletedList(list) | GroupedBlock::NumberedList(list) => {
                if list.items.is_empty() {
                    return Err(ValidationError::EmptyField("items"));
                }
                list.items.iter().enumerate().try_for_each(|(i, item)| {
                    require_id(&item.id).map_err(|e| e.nested(&format!("items[{}]", i)))
                })
            }
            GroupedBlock::Toggle(toggle) => {
                require_id(&toggle.id)?;
                toggle.children.iter().enumerate().try_for_each(|(i, child)| {
                    child
                        .validate()
                        .map_err(|e| e.nested(&format!("children[{}]", i)))
                })
            }
        }
    }

    /// The merged list and its kind, if this is a list aggregate.
    pub fn as_list(&self) -> Option<(ListKind, &ListBlock)> {
        match self {
            GroupedBlock::BulletedList(list) => Some((ListKind::Bulleted, list)),
            GroupedBlock::NumberedList(list) => Some((ListKind::Numbered, list)),
            _ => None,
        }
    }
}

fn require_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyField("id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(id: &str) -> TextBlock {
        TextBlock {
            id: id.to_string(),
            rich_text: vec![RichText::plain(id)],
        }
    }

    #[test]
    fn tags_use_notion_block_type_names() {
        let heading = serde_json::to_value(Block::Heading2(text("h"))).unwrap();
        assert_eq!(heading["type"], "heading_2");

        let list = serde_json::to_value(GroupedBlock::list(
            ListKind::Numbered,
            vec![text("a"), text("b")],
        ))
        .unwrap();
        assert_eq!(list["type"], "numbered_list");
        assert_eq!(list["items"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn toggle_children_nest_under_their_parent() {
        let toggle = GroupedBlock::Toggle(ToggleBlock {
            id: "t".to_string(),
            rich_text: vec![],
            children: vec![GroupedBlock::Paragraph(text("p"))],
        });
        let value = serde_json::to_value(&toggle).unwrap();
        assert_eq!(value["children"][0]["type"], json!("paragraph"));

        let back: GroupedBlock = serde_json::from_value(value).unwrap();
        assert_eq!(back, toggle);
    }

    #[test]
    fn only_list_items_have_a_list_kind() {
        assert_eq!(
            Block::BulletedListItem(text("a")).list_kind(),
            Some(ListKind::Bulleted)
        );
        assert_eq!(Block::Quote(text("q")).list_kind(), None);
    }

    #[test]
    fn grouped_trees_are_checked_all_the_way_down() {
        let image = |url: &str| {
            GroupedBlock::Image(ImageBlock {
                id: "i".to_string(),
                url: url.to_string(),
                alt: String::new(),
                caption: vec![],
            })
        };
        assert!(image("https://img.example.com/a.png").validate().is_ok());
        assert_eq!(
            image("ftp://evil/x.png").validate().map_err(|e| match e {
                ValidationError::Schema { path, .. } => path,
                other => other.to_string(),
            }),
            Err("image.url".to_string())
        );

        assert!(GroupedBlock::list(ListKind::Bulleted, vec![]).validate().is_err());
        assert!(GroupedBlock::list(ListKind::Numbered, vec![text("")]).validate().is_err());

        let toggle = GroupedBlock::Toggle(ToggleBlock {
            id: "t".to_string(),
            rich_text: vec![],
            children: vec![
                GroupedBlock::Paragraph(text("p")),
                GroupedBlock::Video(VideoBlock {
                    id: "v".to_string(),
                    url: "javascript:alert(1)".to_string(),
                    caption: vec![],
                }),
            ],
        });
        match toggle.validate().unwrap_err() {
            ValidationError::Schema { path, .. } => assert_eq!(path, "children[1].video.url"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
