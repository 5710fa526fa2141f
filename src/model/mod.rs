//! Domain shapes produced by the content pipeline and handed to renderers.

mod block;
mod media;
mod post;
mod rich_text;

pub use block::{
    Block, ChildPageBlock, CodeBlock, GroupedBlock, ImageBlock, ListBlock, ListKind, TextBlock,
    ToggleBlock, VideoBlock,
};
pub use media::{MediaCategory, MediaItem};
pub use post::{adjacent_posts, has_date_prefix, Post, PostListItem, SortDirection};
pub use rich_text::{plain_text, Annotations, RichText};
