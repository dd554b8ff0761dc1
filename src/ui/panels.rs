//! Sidebar: channel list, direct-message contacts, session controls.

use eframe::egui;

use crate::state::ClientState;
use crate::types::Conversation;
use crate::ui::theme;

/// Sidebar interactions, resolved by the app layer.
pub enum SidebarAction {
    Open(Conversation),
    CreateChannel,
    OpenSettings,
    SignOut,
}

pub fn render_sidebar(ui: &mut egui::Ui, state: &ClientState) -> Option<SidebarAction> {
    let mut action = None;
    let open = state.feed.as_ref().map(|f| f.conversation().clone());

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.heading("TeamChat");
    });
    if let Some(actor) = &state.actor {
        ui.horizontal(|ui| {
            theme::presence_dot(ui, true);
            ui.label(egui::RichText::new(&actor.full_name).small());
        });
    }
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("CHANNELS").small().weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("+").on_hover_text("Create channel").clicked() {
                        action = Some(SidebarAction::CreateChannel);
                    }
                });
            });
            for channel in &state.channels {
                let conversation = Conversation::channel(channel.id.clone());
                let selected = open.as_ref() == Some(&conversation);
                let prefix = if channel.is_private { "🔒" } else { "#" };
                let label = format!("{} {}", prefix, channel.name);
                if ui.selectable_label(selected, label).clicked() && !selected {
                    action = Some(SidebarAction::Open(conversation));
                }
            }

            ui.add_space(8.0);
            ui.label(egui::RichText::new("DIRECT MESSAGES").small().weak());
            for contact in &state.contacts {
                let conversation = Conversation::direct(contact.id.clone());
                let selected = open.as_ref() == Some(&conversation);
                ui.horizontal(|ui| {
                    theme::presence_dot(ui, contact.is_online);
                    if ui.selectable_label(selected, &contact.full_name).clicked() && !selected {
                        action = Some(SidebarAction::Open(conversation));
                    }
                });
            }
        });

    ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("Settings").clicked() {
                action = Some(SidebarAction::OpenSettings);
            }
            if ui.button("Sign out").clicked() {
                action = Some(SidebarAction::SignOut);
            }
        });
        ui.separator();
    });

    action
}
