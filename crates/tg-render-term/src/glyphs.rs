//! Box-drawing glyph sets.

use serde::{Deserialize, Serialize};

/// Which character repertoire the renderer may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphMode {
    #[default]
    Unicode,
    Ascii,
}

impl GlyphMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unicode => "unicode",
            Self::Ascii => "ascii",
        }
    }
}

/// Characters for node boxes and connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxGlyphs {
    pub horizontal: char,
    pub vertical: char,
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub cross: char,
    pub t_up: char,
    pub arrow_right: char,
    pub arrow_up: char,
    pub arrow_down: char,
    pub ellipsis: char,
}

impl BoxGlyphs {
    /// Rounded light box drawing.
    pub const UNICODE_ROUNDED: Self = Self {
        horizontal: '─',
        vertical: '│',
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
        cross: '┼',
        t_up: '┴',
        arrow_right: '▶',
        arrow_up: '▲',
        arrow_down: '▼',
        ellipsis: '…',
    };

    pub const ASCII: Self = Self {
        horizontal: '-',
        vertical: '|',
        top_left: '+',
        top_right: '+',
        bottom_left: '+',
        bottom_right: '+',
        cross: '+',
        t_up: '+',
        arrow_right: '>',
        arrow_up: '^',
        arrow_down: 'v',
        ellipsis: '~',
    };

    #[must_use]
    pub const fn for_mode(mode: GlyphMode) -> Self {
        match mode {
            GlyphMode::Unicode => Self::UNICODE_ROUNDED,
            GlyphMode::Ascii => Self::ASCII,
        }
    }

    pub(crate) fn is_line(&self, ch: char) -> bool {
        ch == self.horizontal || ch == self.vertical || ch == self.cross
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_set_is_pure_ascii() {
        let g = BoxGlyphs::ASCII;
        for ch in [
            g.horizontal,
            g.vertical,
            g.top_left,
            g.top_right,
            g.bottom_left,
            g.bottom_right,
            g.cross,
            g.t_up,
            g.arrow_right,
            g.arrow_up,
            g.arrow_down,
            g.ellipsis,
        ] {
            assert!(ch.is_ascii(), "{ch:?}");
        }
    }

    #[test]
    fn mode_selects_set() {
        assert_eq!(BoxGlyphs::for_mode(GlyphMode::Ascii), BoxGlyphs::ASCII);
        assert_eq!(BoxGlyphs::for_mode(GlyphMode::Unicode).top_left, '╭');
        assert_eq!(GlyphMode::default().as_str(), "unicode");
    }
}
