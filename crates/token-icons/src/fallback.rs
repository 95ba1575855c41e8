/// Placeholder shown when no icon resolves: initials on a colored circle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackGlyph {
    pub initials: String,
    /// `#rrggbb` background color.
    pub color: &'static str,
}

const PALETTE: &[&str] = &[
    "#6366f1", "#8b5cf6", "#ec4899", "#ef4444", "#f97316", "#eab308", "#22c55e", "#14b8a6",
    "#0ea5e9", "#64748b",
];

impl FallbackGlyph {
    /// Glyph for a symbol. The color depends only on the uppercased symbol.
    pub fn for_symbol(symbol: &str) -> Self {
        let upper = symbol.trim().to_uppercase();

        let mut initials: String = upper
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(2)
            .collect();
        if initials.is_empty() {
            initials.push('?');
        }

        // FNV-1a, stable across runs and platforms
        let hash = upper.bytes().fold(0xcbf29ce484222325u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x100000001b3)
        });
        let color = PALETTE[(hash % PALETTE.len() as u64) as usize];

        Self { initials, color }
    }
}

/// What to render for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconDisplay {
    Url(String),
    Glyph(FallbackGlyph),
}
