//! Output paginator
//!
//! Page windows for document listings and fixed-size slicing of long text
//! for a transport with a bounded message size.

use crate::menu::Menu;
use crate::runtime::Outbound;

/// Telegram's maximum single-message length, in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Default number of documents per page
pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// The `[start, end)` range of a result set currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u64,
    pub end: u64,
    pub page_size: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageWindow {
    /// Offset of the previous page, clamped at zero
    pub fn previous_offset(&self) -> u64 {
        self.start.saturating_sub(self.page_size)
    }

    pub fn next_offset(&self) -> u64 {
        self.start.saturating_add(self.page_size)
    }

    /// Human-readable position, 1-based like the listing header
    pub fn label(&self, total: u64) -> String {
        if self.start == self.end {
            format!("Showing 0 of {total}")
        } else {
            format!("Showing {}-{} of {total}", self.start + 1, self.end)
        }
    }
}

/// Compute the visible window for `offset` within `total` documents
pub fn paginate(total: u64, page_size: u64, offset: u64) -> PageWindow {
    let end_of_page = offset.saturating_add(page_size);
    PageWindow {
        start: offset.min(total),
        end: end_of_page.min(total),
        page_size,
        has_previous: offset > 0,
        has_next: end_of_page < total,
    }
}

/// Length as the transport counts it
pub fn transport_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Slice `text` into chunks of at most `max_chunk_size` UTF-16 code units
///
/// Plain fixed-size slicing: no word-boundary awareness. Chunks end on
/// character boundaries, so a surrogate pair is never split; the effective
/// minimum chunk size is therefore two units.
pub fn split_for_transport(text: &str, max_chunk_size: usize) -> Vec<String> {
    let max = max_chunk_size.max(2);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut units = 0;
    for c in text.chars() {
        let width = c.len_utf16();
        if units + width > max {
            chunks.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += width;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Shape a reply into transport-sized messages, menu on the last one only
pub fn shape(text: &str, menu: Option<Menu>, max_chunk_size: usize) -> Vec<Outbound> {
    let mut chunks = split_for_transport(text, max_chunk_size);
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    let last = chunks.len() - 1;
    let mut menu = menu;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| Outbound {
            text,
            menu: if i == last { menu.take() } else { None },
        })
        .collect()
}
