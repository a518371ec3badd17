//! Visual parameters of a comment, derived only from its nesting depth.
//! Depth 0 is a top-level comment.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepthStyle {
    pub avatar: &'static str,
    pub text_size: &'static str,
    pub name_size: &'static str,
    pub shade: &'static str,
    pub padding: &'static str,
    pub gap: &'static str,
    /// Left offset of the comment row. Each level adds the parent's avatar
    /// width plus its gap, so replies line up under the parent's text.
    pub indent_px: u32,
}

impl DepthStyle {
    pub fn for_depth(depth: usize) -> Self {
        let top = depth == 0;
        Self {
            avatar: match depth {
                0 => "avatar-lg",
                1 => "avatar-md",
                _ => "avatar-sm",
            },
            text_size: if top { "text-sm" } else { "text-xs" },
            name_size: if top { "text-sm" } else { "text-xs" },
            shade: match depth {
                0 => "shade-0",
                1 => "shade-1",
                _ => "shade-2",
            },
            padding: if top { "pad-lg" } else { "pad-sm" },
            gap: if top { "gap-lg" } else { "gap-sm" },
            indent_px: indent_px(depth),
        }
    }
}

fn indent_px(depth: usize) -> u32 {
    match depth {
        0 => 0,
        1 => 44,
        // 68px at depth 2, then 28px per extra level.
        n => 68u32.saturating_add(((n - 2) as u32).saturating_mul(28)),
    }
}
