//! Per-frame update: drain backend events, render, translate UI actions
//! into backend actions.

use std::time::Duration;

use eframe::egui;
use tracing::warn;

use crate::app::TeamChatApp;
use crate::config;
use crate::events::process_events;
use crate::protocol::BackendAction;
use crate::ui;

const NOTICE_MAX_AGE_SECS: u64 = 4;

impl eframe::App for TeamChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        process_events(
            &self.event_rx,
            &mut self.state,
            &mut self.forms,
            &self.action_tx,
        );
        self.state.purge_old_notices(NOTICE_MAX_AGE_SECS);

        if self.state.is_signed_in() {
            self.render_main(ctx);
        } else if let Some(action) = ui::render_auth(ctx, &mut self.forms.auth) {
            self.submit_auth(action);
        }

        ui::render_notices(ctx, &self.state);

        // Keep draining backend events even while idle.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl TeamChatApp {
    fn submit_auth(&mut self, action: ui::AuthAction) {
        let url = self.forms.auth.backend_url.trim_end_matches('/').to_string();
        if url != self.settings.backend_url && !url.is_empty() {
            self.settings.backend_url = url.clone();
            self.send(BackendAction::Configure { base_url: url });
        }

        let (email, password) = match &action {
            ui::AuthAction::SignIn { email, password }
            | ui::AuthAction::SignUp {
                email, password, ..
            } => (email.clone(), password.clone()),
        };
        self.settings.email = email.clone();
        if let Err(e) = config::save_settings(&self.settings) {
            warn!("could not save settings: {}", e);
        }
        if self.forms.auth.remember {
            config::store_saved_password(&email, &password);
        } else {
            config::clear_saved_password(&email);
        }

        match action {
            ui::AuthAction::SignIn { email, password } => {
                self.send(BackendAction::SignIn { email, password });
            }
            ui::AuthAction::SignUp {
                email,
                password,
                full_name,
            } => {
                self.send(BackendAction::SignUp {
                    email,
                    password,
                    full_name,
                });
            }
        }
    }

    fn render_main(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .default_width(220.0)
            .show(ctx, |ui| {
                if let Some(action) = ui::render_sidebar(ui, &self.state) {
                    self.handle_sidebar(action);
                }
            });

        egui::TopBottomPanel::top("conversation_header").show(ctx, |ui| {
            ui::render_header(ui, self.state.meta.as_ref(), self.state.conversation_missing);
        });

        egui::TopBottomPanel::bottom("composer").show(ctx, |ui| {
            let open = self.state.feed.is_some() && !self.state.conversation_missing;
            if let Some(content) = ui::render_composer(ui, &mut self.forms.compose, open) {
                if let Some(feed) = &self.state.feed {
                    self.action_tx
                        .send(BackendAction::SendMessage {
                            conversation: feed.conversation().clone(),
                            content,
                        })
                        .ok();
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(ui::MessageAction::SaveEdit {
                id,
                author_id,
                content,
            }) = ui::render_feed(ui, &mut self.state, &mut self.forms.compose)
            {
                if let Some(feed) = &self.state.feed {
                    self.action_tx
                        .send(BackendAction::EditMessage {
                            conversation: feed.conversation().clone(),
                            id,
                            author_id,
                            content,
                        })
                        .ok();
                }
            }
        });

        self.render_dialogs(ctx);
    }

    fn handle_sidebar(&mut self, action: ui::SidebarAction) {
        match action {
            ui::SidebarAction::Open(conversation) => {
                self.state.open_conversation(conversation.clone());
                self.forms.compose = Default::default();
                self.send(BackendAction::OpenConversation(conversation));
            }
            ui::SidebarAction::CreateChannel => {
                self.forms.create_channel.open = true;
            }
            ui::SidebarAction::OpenSettings => {
                if let Some(actor) = &self.state.actor {
                    self.forms.settings.full_name = actor.full_name.clone();
                }
                self.forms.settings.open = true;
            }
            ui::SidebarAction::SignOut => {
                self.send(BackendAction::SignOut);
            }
        }
    }

    fn render_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(ui::DialogAction::CreateChannel {
            name,
            description,
            is_private,
        }) = ui::render_create_channel(ctx, &mut self.forms.create_channel)
        {
            self.send(BackendAction::CreateChannel {
                name,
                description,
                is_private,
            });
        }

        if let Some(ui::DialogAction::UpdateProfile { full_name }) =
            ui::render_settings(ctx, &mut self.forms.settings)
        {
            self.send(BackendAction::UpdateProfile { full_name });
        }

        if let Some(ui::DialogAction::DeleteMessage { id, author_id }) =
            ui::render_delete_confirm(ctx, &mut self.forms.compose.confirm_delete)
        {
            // The row's author rides along so the backend can check it
            // against the signed-in actor before mutating anything.
            if let Some(feed) = &self.state.feed {
                self.action_tx
                    .send(BackendAction::DeleteMessage {
                        conversation: feed.conversation().clone(),
                        id,
                        author_id,
                    })
                    .ok();
            }
            self.forms.compose.confirm_delete = None;
        }
    }
}
