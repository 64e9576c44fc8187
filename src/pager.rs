use std::ops::Range;

use crate::reconcile::VisualNode;

/// Result of paginating a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub page_count: usize,
    /// 1-based; 0 only when there is nothing to show
    pub cur_page: usize,
    /// First page link in the visible window (1-based, inclusive)
    pub link_start: usize,
    /// Last page link in the visible window (inclusive); below `link_start`
    /// when there are no pages
    pub link_end: usize,
}

impl PageInfo {
    pub fn links(&self) -> Range<usize> {
        self.link_start..self.link_end + 1
    }
}

/// Clamp the current page and pick the window of page links around it
pub fn paginate(total: usize, page_size: usize, cur_page: usize, max_links: usize) -> PageInfo {
    let page_size = page_size.max(1);
    let max_links = max_links.max(1);
    let page_count = total.div_ceil(page_size);
    let cur_page = cur_page.max(1).min(page_count);

    let half = max_links / 2;
    let (link_start, link_end) = if page_count <= max_links {
        (1, page_count)
    } else if cur_page - 1 <= half {
        (1, max_links)
    } else if cur_page - 1 >= page_count - half {
        (page_count - max_links + 1, page_count)
    } else {
        let start = cur_page - half;
        (start, start + max_links - 1)
    };

    PageInfo { page_count, cur_page, link_start, link_end }
}

/// Index range of the page inside the filtered list; empty for page 0
pub fn page_range(total: usize, page_size: usize, cur_page: usize) -> Range<usize> {
    if cur_page == 0 {
        return 0..0;
    }
    let page_size = page_size.max(1);
    let start = ((cur_page - 1) * page_size).min(total);
    start..(start + page_size).min(total)
}

/// One entry of the pager bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerItem {
    Prev { disabled: bool },
    Page { number: usize, active: bool },
    Dots,
    Next { disabled: bool },
}

impl PagerItem {
    pub fn label(&self) -> String {
        match self {
            PagerItem::Prev { .. } => "← Prev".to_string(),
            PagerItem::Page { number, .. } => number.to_string(),
            PagerItem::Dots => "…".to_string(),
            PagerItem::Next { .. } => "Next →".to_string(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(
            self,
            PagerItem::Prev { disabled: true } | PagerItem::Next { disabled: true } | PagerItem::Dots
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PagerItem::Page { active: true, .. })
    }
}

impl VisualNode for PagerItem {
    fn serialize(&self) -> String {
        let state = if self.is_active() {
            "active"
        } else if self.is_disabled() {
            "disabled"
        } else {
            ""
        };
        format!("{}|{}", state, self.label())
    }
}

/// Build the pager bar: Prev, first page and dots, the link window, dots and
/// last page, Next
pub fn pager_items(info: &PageInfo, show_dots: bool) -> Vec<PagerItem> {
    let mut items = Vec::new();
    items.push(PagerItem::Prev { disabled: info.cur_page <= 1 });

    if info.link_start > 1 {
        items.push(PagerItem::Page { number: 1, active: info.cur_page == 1 });
        if info.link_start > 2 && show_dots {
            items.push(PagerItem::Dots);
        }
    }

    for number in info.links() {
        items.push(PagerItem::Page { number, active: number == info.cur_page });
    }

    if info.link_end != info.page_count {
        if info.link_end + 1 < info.page_count && show_dots {
            items.push(PagerItem::Dots);
        }
        items.push(PagerItem::Page { number: info.page_count, active: info.cur_page == info.page_count });
    }

    items.push(PagerItem::Next {
        disabled: info.cur_page == info.page_count || info.page_count == 0,
    });
    items
}
