//! Avatar glyphs offered by the wizard.

/// Glyph used when an assistant has no stored avatar.
pub const DEFAULT_AVATAR: &str = "\u{1f916}";

/// The fixed palette shown in the avatar step. The first entry is the
/// default selection.
pub const AVATAR_PALETTE: [&str; 16] = [
    "\u{1f916}", // 🤖
    "\u{1f9e0}", // 🧠
    "\u{2728}",  // ✨
    "\u{1f98a}", // 🦊
    "\u{1f419}", // 🐙
    "\u{1f3af}", // 🎯
    "\u{1f31f}", // 🌟
    "\u{1f52e}", // 🔮
    "\u{1f989}", // 🦉
    "\u{1f41d}", // 🐝
    "\u{1f3a8}", // 🎨
    "\u{1f680}", // 🚀
    "\u{1f4a1}", // 💡
    "\u{1f33f}", // 🌿
    "\u{1f431}", // 🐱
    "\u{1f984}", // 🦄
];

/// Resolve a stored or submitted glyph, falling back to [`DEFAULT_AVATAR`]
/// when it is missing or blank.
pub fn avatar_or_default(glyph: Option<&str>) -> &str {
    match glyph.map(str::trim) {
        Some(g) if !g.is_empty() => g,
        _ => DEFAULT_AVATAR,
    }
}

/// Look up a palette entry by 1-based position, as typed in the terminal
/// wizard.
pub fn palette_entry(position: usize) -> Option<&'static str> {
    position
        .checked_sub(1)
        .and_then(|idx| AVATAR_PALETTE.get(idx).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_starts_with_default() {
        assert_eq!(AVATAR_PALETTE[0], DEFAULT_AVATAR);
        assert_eq!(AVATAR_PALETTE.len(), 16);
    }

    #[test]
    fn blank_glyph_falls_back() {
        assert_eq!(avatar_or_default(None), DEFAULT_AVATAR);
        assert_eq!(avatar_or_default(Some("  ")), DEFAULT_AVATAR);
        assert_eq!(avatar_or_default(Some("\u{1f989}")), "\u{1f989}");
    }

    #[test]
    fn palette_positions_are_one_based() {
        assert_eq!(palette_entry(0), None);
        assert_eq!(palette_entry(1), Some(DEFAULT_AVATAR));
        assert_eq!(palette_entry(16), Some("\u{1f984}"));
        assert_eq!(palette_entry(17), None);
    }
}
