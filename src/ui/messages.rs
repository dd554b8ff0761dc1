//! Central feed rendering: date separators, author headers, inline editing,
//! and the scroll-follow policy.

use chrono::{Datelike, Local, NaiveDate, Utc};
use eframe::egui;

use crate::feed::{should_show_author_header, SCROLL_FOLLOW_THRESHOLD};
use crate::forms::{ComposeState, DeleteTarget, EditDraft};
use crate::state::ClientState;
use crate::types::{Conversation, Message};
use crate::ui::theme;
use crate::validation;

/// Feed interactions that need a backend round trip.
pub enum MessageAction {
    SaveEdit {
        id: String,
        author_id: String,
        content: String,
    },
}

/// Render the open conversation's feed inside the central panel.
///
/// Measures the viewport distance from the bottom each frame (the follow
/// policy reads it on the next insert) and honors one-shot scroll requests.
pub fn render_feed(
    ui: &mut egui::Ui,
    state: &mut ClientState,
    compose: &mut ComposeState,
) -> Option<MessageAction> {
    let scroll_request = std::mem::take(&mut state.scroll_to_bottom);
    let actor_id = state.actor_id().unwrap_or_default().to_string();

    let Some(feed) = state.feed.as_mut() else {
        ui.centered_and_justified(|ui| {
            ui.label("Select a channel or a person to start chatting");
        });
        return None;
    };

    if state.conversation_missing {
        ui.centered_and_justified(|ui| {
            ui.label("This conversation no longer exists.");
        });
        return None;
    }

    if feed.loading {
        ui.centered_and_justified(|ui| {
            ui.spinner();
        });
        return None;
    }

    if feed.is_empty() {
        let prompt = empty_state_prompt(feed.conversation());
        ui.centered_and_justified(|ui| {
            ui.label(egui::RichText::new(prompt).color(theme::MUTED_TEXT));
        });
        return None;
    }

    let mut action = None;
    let today = Utc::now().date_naive();

    let output = egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            ui.add_space(4.0);
            for (date, group) in feed.group_by_date() {
                render_date_separator(ui, date, today);
                for (index, message) in group.iter().enumerate() {
                    let own = message.author.id == actor_id;
                    if let Some(draft) = compose.editing.as_mut().filter(|e| e.id == message.id) {
                        if let Some(done) = render_edit_row(ui, draft) {
                            match done {
                                EditOutcome::Save(act) => action = Some(act),
                                EditOutcome::Cancel => {}
                            }
                            compose.editing = None;
                        }
                        continue;
                    }
                    render_message(
                        ui,
                        message,
                        should_show_author_header(group, index),
                        own,
                        compose,
                    );
                }
            }
            ui.add_space(4.0);
            if scroll_request {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    // Follow policy input: how far the viewport sits above the bottom.
    let distance = (output.content_size.y
        - (output.state.offset.y + output.inner_rect.height()))
    .max(0.0);
    state.scroll_from_bottom = distance;
    if distance < SCROLL_FOLLOW_THRESHOLD {
        feed.mark_at_bottom();
    }

    if feed.pending_new_messages {
        let pos = output.inner_rect.right_bottom() - egui::vec2(160.0, 40.0);
        egui::Area::new(ui.id().with("pending_new_messages"))
            .fixed_pos(pos)
            .show(ui.ctx(), |ui| {
                if ui.button("⬇ New messages").clicked() {
                    state.scroll_to_bottom = true;
                    if let Some(feed) = state.feed.as_mut() {
                        feed.mark_at_bottom();
                    }
                }
            });
    }

    action
}

fn empty_state_prompt(conversation: &Conversation) -> &'static str {
    match conversation {
        Conversation::Channel { .. } => "Be the first to send a message in this channel!",
        Conversation::Direct { .. } => "Start a conversation!",
    }
}

fn render_date_separator(ui: &mut egui::Ui, date: NaiveDate, today: NaiveDate) {
    let label = if date == today {
        "Today".to_string()
    } else if date.succ_opt() == Some(today) {
        "Yesterday".to_string()
    } else if date.year() == today.year() {
        date.format("%B %e").to_string()
    } else {
        date.format("%B %e, %Y").to_string()
    };
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.separator();
        ui.label(egui::RichText::new(label).small().color(theme::MUTED_TEXT));
        ui.separator();
    });
    ui.add_space(4.0);
}

fn render_message(
    ui: &mut egui::Ui,
    message: &Message,
    show_header: bool,
    own: bool,
    compose: &mut ComposeState,
) {
    if show_header {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            theme::avatar_badge(ui, &message.author.id, &message.author.full_name);
            ui.label(
                egui::RichText::new(&message.author.full_name)
                    .strong()
                    .color(theme::author_color(&message.author.id)),
            );
            let time = message.created_at.with_timezone(&Local).format("%H:%M");
            ui.label(
                egui::RichText::new(time.to_string())
                    .small()
                    .color(theme::MUTED_TEXT),
            );
        });
    }

    ui.horizontal_wrapped(|ui| {
        ui.add_space(32.0);
        let body = ui.add(
            egui::Label::new(&message.content)
                .wrap()
                .sense(egui::Sense::click()),
        );
        if message.edited {
            ui.label(
                egui::RichText::new("(edited)")
                    .small()
                    .color(theme::MUTED_TEXT),
            );
        }
        if own {
            body.context_menu(|ui| {
                if ui.button("Edit").clicked() {
                    compose.editing = Some(EditDraft {
                        id: message.id.clone(),
                        author_id: message.author.id.clone(),
                        draft: message.content.clone(),
                    });
                    ui.close_menu();
                }
                if ui.button("Delete").clicked() {
                    compose.confirm_delete = Some(DeleteTarget {
                        id: message.id.clone(),
                        author_id: message.author.id.clone(),
                    });
                    ui.close_menu();
                }
            });
        }
    });
}

enum EditOutcome {
    Save(MessageAction),
    Cancel,
}

fn render_edit_row(ui: &mut egui::Ui, draft: &mut EditDraft) -> Option<EditOutcome> {
    let mut outcome = None;
    ui.horizontal(|ui| {
        ui.add_space(32.0);
        ui.add(
            egui::TextEdit::multiline(&mut draft.draft)
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
    });
    ui.horizontal(|ui| {
        ui.add_space(32.0);
        let valid = validation::validate_message_content(&draft.draft).is_ok();
        if ui.add_enabled(valid, egui::Button::new("Save")).clicked() {
            outcome = Some(EditOutcome::Save(MessageAction::SaveEdit {
                id: draft.id.clone(),
                author_id: draft.author_id.clone(),
                content: draft.draft.trim().to_string(),
            }));
        }
        if ui.button("Cancel").clicked() {
            outcome = Some(EditOutcome::Cancel);
        }
    });
    outcome
}

/// Render the composer. Returns message content once submitted and valid.
pub fn render_composer(
    ui: &mut egui::Ui,
    compose: &mut ComposeState,
    conversation_open: bool,
) -> Option<String> {
    let mut send = None;
    ui.add_space(4.0);
    ui.horizontal(|ui| {
        let enabled = conversation_open && !compose.sending;
        let edit = egui::TextEdit::singleline(&mut compose.input)
            .hint_text("Type a message")
            .desired_width(ui.available_width() - 70.0);
        let response = ui.add_enabled(enabled, edit);
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let clicked = ui
            .add_enabled(enabled, egui::Button::new("Send"))
            .clicked();
        if enabled && (submitted || clicked) {
            match validation::validate_message_content(&compose.input) {
                Ok(()) => {
                    compose.error = None;
                    compose.sending = true;
                    send = Some(compose.input.trim().to_string());
                    response.request_focus();
                }
                Err(e) => compose.error = Some(e),
            }
        }
    });
    if let Some(error) = &compose.error {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }
    ui.add_space(4.0);
    send
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_prompts_differ_by_conversation_kind() {
        assert_eq!(
            empty_state_prompt(&Conversation::channel("general")),
            "Be the first to send a message in this channel!"
        );
        assert_eq!(
            empty_state_prompt(&Conversation::direct("bob")),
            "Start a conversation!"
        );
    }
}
