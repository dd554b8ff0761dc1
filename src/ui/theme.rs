//! Styling utilities for the chat UI.

use eframe::egui::{self, Color32};

const AUTHOR_COLORS: [Color32; 12] = [
    Color32::from_rgb(0xFF, 0x66, 0x66),
    Color32::from_rgb(0x66, 0xCC, 0xFF),
    Color32::from_rgb(0xFF, 0xCC, 0x66),
    Color32::from_rgb(0x99, 0xCC, 0x99),
    Color32::from_rgb(0xCC, 0x99, 0xFF),
    Color32::from_rgb(0xFF, 0x99, 0xCC),
    Color32::from_rgb(0x66, 0x99, 0xFF),
    Color32::from_rgb(0xFF, 0x99, 0x66),
    Color32::from_rgb(0x99, 0xFF, 0x99),
    Color32::from_rgb(0xFF, 0xCC, 0x99),
    Color32::from_rgb(0xCC, 0xFF, 0xFF),
    Color32::from_rgb(0xCC, 0xCC, 0xFF),
];

/// Stable display color for an author, hashed from their id so the same
/// person gets the same color everywhere.
pub fn author_color(author_id: &str) -> Color32 {
    let mut hash: u64 = 1469598103934665603u64;
    for b in author_id.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(1099511628211u64);
    }
    let idx = (hash as usize) % AUTHOR_COLORS.len();
    AUTHOR_COLORS[idx]
}

pub const ONLINE_GREEN: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);
pub const OFFLINE_GRAY: Color32 = Color32::from_gray(110);
pub const MUTED_TEXT: Color32 = Color32::from_gray(140);

/// Apply app-wide spacing and visuals.
pub fn apply_app_style(ctx: &egui::Context, theme: &str) {
    if theme == "light" {
        ctx.set_visuals(egui::Visuals::light());
    } else {
        ctx.set_visuals(egui::Visuals::dark());
    }
    ctx.style_mut(|style| {
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.button_padding = egui::vec2(10.0, 5.0);
    });
}

/// One-letter avatar badge colored by author id.
pub fn avatar_badge(ui: &mut egui::Ui, author_id: &str, full_name: &str) {
    let initial = full_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string());
    let color = author_color(author_id);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(24.0, 24.0), egui::Sense::hover());
    ui.painter().circle_filled(rect.center(), 12.0, color);
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        initial,
        egui::FontId::proportional(12.0),
        Color32::BLACK,
    );
}

/// Small presence dot, green when online.
pub fn presence_dot(ui: &mut egui::Ui, is_online: bool) {
    let color = if is_online { ONLINE_GREEN } else { OFFLINE_GRAY };
    let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
    ui.painter().circle_filled(rect.center(), 4.0, color);
}
