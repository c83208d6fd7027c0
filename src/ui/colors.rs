//! Shared color palette for the TUI.

use ratatui::style::Color;

// ── Agent kinds ─────────────────────────────────────────────────────
pub const KIND_LLM: Color = Color::Rgb(120, 180, 255);
pub const KIND_SEQUENTIAL: Color = Color::Rgb(80, 220, 120);
pub const KIND_PARALLEL: Color = Color::Rgb(200, 200, 80);
pub const KIND_LOOP: Color = Color::Rgb(230, 160, 60);
pub const KIND_REMOTE: Color = Color::Rgb(190, 130, 230);
pub const CYCLE: Color = Color::Rgb(180, 60, 60);
pub const TOOL: Color = Color::Rgb(160, 160, 160);

// ── Drag and drop ───────────────────────────────────────────────────
pub const DRAG_SOURCE: Color = Color::Rgb(100, 100, 100);
pub const DROP_CHILD_BG: Color = Color::Rgb(40, 90, 60);
pub const DROP_TOOL_BG: Color = Color::Rgb(40, 60, 110);
pub const DROP_INSERT: Color = Color::Rgb(255, 180, 50);

// ── Accent / chrome ─────────────────────────────────────────────────
pub const ACCENT_MUTED: Color = Color::Rgb(120, 120, 180);
pub const PENDING: Color = Color::Rgb(230, 160, 60);
pub const HIGHLIGHT_BG: Color = Color::Rgb(60, 55, 50);
pub const HIGHLIGHT_FG: Color = Color::Rgb(255, 220, 150);
