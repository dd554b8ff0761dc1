//! Modal dialogs: create channel, profile settings, delete confirmation.

use eframe::egui;

use crate::forms::{CreateChannelForm, DeleteTarget, SettingsForm};
use crate::state::ClientState;
use crate::validation;

pub enum DialogAction {
    CreateChannel {
        name: String,
        description: String,
        is_private: bool,
    },
    UpdateProfile {
        full_name: String,
    },
    DeleteMessage {
        id: String,
        author_id: String,
    },
}

pub fn render_create_channel(
    ctx: &egui::Context,
    form: &mut CreateChannelForm,
) -> Option<DialogAction> {
    if !form.open {
        return None;
    }
    let mut action = None;
    let mut open = form.open;

    egui::Window::new("Create channel")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut form.name);
            ui.label("Description");
            ui.text_edit_singleline(&mut form.description);
            ui.checkbox(&mut form.is_private, "Private channel");

            if let Some(error) = &form.error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let create = ui.add_enabled(!form.busy, egui::Button::new("Create"));
                if form.busy {
                    ui.spinner();
                }
                if create.clicked() {
                    let name = form.name.trim().to_string();
                    match validation::validate_channel_name(&name) {
                        Ok(()) => {
                            form.error = None;
                            form.busy = true;
                            action = Some(DialogAction::CreateChannel {
                                name,
                                description: form.description.trim().to_string(),
                                is_private: form.is_private,
                            });
                        }
                        Err(e) => form.error = Some(e),
                    }
                }
            });
        });

    if !open {
        form.reset();
    }
    action
}

pub fn render_settings(ctx: &egui::Context, form: &mut SettingsForm) -> Option<DialogAction> {
    if !form.open {
        return None;
    }
    let mut action = None;
    let mut open = form.open;

    egui::Window::new("Profile settings")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Display name");
            ui.text_edit_singleline(&mut form.full_name);

            if let Some(error) = &form.error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let save = ui.add_enabled(!form.saving, egui::Button::new("Save"));
                if form.saving {
                    ui.spinner();
                }
                if save.clicked() {
                    let full_name = form.full_name.trim().to_string();
                    match validation::validate_display_name(&full_name) {
                        Ok(()) => {
                            form.error = None;
                            form.saving = true;
                            action = Some(DialogAction::UpdateProfile { full_name });
                        }
                        Err(e) => form.error = Some(e),
                    }
                }
            });
        });

    form.open = open;
    action
}

/// Confirmation prompt before a message is deleted.
pub fn render_delete_confirm(
    ctx: &egui::Context,
    confirm_delete: &mut Option<DeleteTarget>,
) -> Option<DialogAction> {
    let Some(target) = confirm_delete.clone() else {
        return None;
    };
    let mut action = None;

    egui::Window::new("Delete message")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Delete this message? This cannot be undone.");
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("Delete").clicked() {
                    action = Some(DialogAction::DeleteMessage {
                        id: target.id.clone(),
                        author_id: target.author_id.clone(),
                    });
                }
                if ui.button("Cancel").clicked() {
                    *confirm_delete = None;
                }
            });
        });

    action
}

/// Transient notices stacked in the bottom-right corner.
pub fn render_notices(ctx: &egui::Context, state: &ClientState) {
    if state.notices.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("notices"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
        .show(ctx, |ui| {
            for (text, _) in &state.notices {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(text);
                });
            }
        });
}
