//! Conversation header: channel name and member count, or DM peer and
//! presence.

use eframe::egui;

use crate::protocol::ConversationMeta;
use crate::ui::theme;

pub fn render_header(ui: &mut egui::Ui, meta: Option<&ConversationMeta>, missing: bool) {
    ui.horizontal(|ui| {
        ui.add_space(4.0);
        match meta {
            Some(ConversationMeta::Channel {
                channel,
                member_count,
            }) => {
                let prefix = if channel.is_private { "🔒" } else { "#" };
                ui.heading(format!("{} {}", prefix, channel.name));
                let members = if *member_count == 1 {
                    "1 member".to_string()
                } else {
                    format!("{} members", member_count)
                };
                ui.label(egui::RichText::new(members).color(theme::MUTED_TEXT));
                if !channel.description.is_empty() {
                    ui.separator();
                    ui.label(
                        egui::RichText::new(&channel.description)
                            .italics()
                            .color(theme::MUTED_TEXT),
                    );
                }
            }
            Some(ConversationMeta::Direct { peer }) => {
                theme::avatar_badge(ui, &peer.id, &peer.full_name);
                ui.heading(&peer.full_name);
                theme::presence_dot(ui, peer.is_online);
                let status = if peer.is_online { "online" } else { "offline" };
                ui.label(egui::RichText::new(status).small().color(theme::MUTED_TEXT));
            }
            None if missing => {
                ui.heading("Conversation not found");
            }
            None => {
                ui.heading("");
            }
        }
    });
}
