// src/transform.rs
//! Raw block listings into grouped block trees.
//!
//! Two phases. Every record is validated first, so one bad block fails the
//! whole listing and no partial document is ever produced. The validated
//! tree is then grouped: each maximal run of same-kind list items becomes a
//! single list, and toggles are grouped independently at their own level.

use crate::model::{Block, GroupedBlock, ListKind, TextBlock, ToggleBlock};
use crate::schema::SchemaValidator;
use crate::types::ValidationError;
use serde_json::Value;

/// Validates then groups a listing of raw blocks.
pub fn transform_blocks(
    validator: &SchemaValidator,
    raw: &[Value],
) -> Result<Vec<GroupedBlock>, ValidationError> {
    let blocks = validate_blocks(validator, raw)?;
    Ok(group_blocks(blocks))
}

pub fn validate_blocks(
    validator: &SchemaValidator,
    raw: &[Value],
) -> Result<Vec<Block>, ValidationError> {
    validator.all("blocks", raw, SchemaValidator::block)
}

/// Merges consecutive list items of the same kind, in one left-to-right pass.
pub fn group_blocks(blocks: Vec<Block>) -> Vec<GroupedBlock> {
    let mut grouped = Vec::with_capacity(blocks.len());
    let mut run: Option<(ListKind, Vec<TextBlock>)> = None;

    for block in blocks {
        let block = match (block, run.as_mut()) {
            (Block::BulletedListItem(item), Some((ListKind::Bulleted, items)))
            | (Block::NumberedListItem(item), Some((ListKind::Numbered, items))) => {
                items.push(item);
                continue;
            }
            (block, _) => block,
        };

        if let Some((kind, items)) = run.take() {
            grouped.push(GroupedBlock::list(kind, items));
        }

        match block {
            Block::BulletedListItem(item) => run = Some((ListKind::Bulleted, vec![item])),
            Block::NumberedListItem(item) => run = Some((ListKind::Numbered, vec![item])),
            other => grouped.push(group_one(other)),
        }
    }

    if let Some((kind, items)) = run {
        grouped.push(GroupedBlock::list(kind, items));
    }
    grouped
}

fn group_one(block: Block) -> GroupedBlock {
    match block {
        Block::Paragraph(b) => GroupedBlock::Paragraph(b),
        Block::Heading1(b) => GroupedBlock::Heading1(b),
        Block::Heading2(b) => GroupedBlock::Heading2(b),
        Block::Heading3(b) => GroupedBlock::Heading3(b),
        Block::Quote(b) => GroupedBlock::Quote(b),
        Block::Code(b) => GroupedBlock::Code(b),
        Block::Image(b) => GroupedBlock::Image(b),
        Block::Video(b) => GroupedBlock::Video(b),
        Block::ChildPage(b) => GroupedBlock::ChildPage(b),
        Block::Toggle(toggle) => GroupedBlock::Toggle(ToggleBlock {
            id: toggle.id,
            rich_text: toggle.rich_text,
            children: group_blocks(toggle.children),
        }),
        // Only reached for a lone item; runs are handled by `group_blocks`.
        Block::BulletedListItem(item) => GroupedBlock::list(ListKind::Bulleted, vec![item]),
        Block::NumberedListItem(item) => GroupedBlock::list(ListKind::Numbered, vec![item]),
    }
}
