//! Sign-in and sign-up screens.

use eframe::egui;

use crate::forms::{AuthForm, AuthMode};
use crate::validation;

/// What the auth screen wants done this frame.
pub enum AuthAction {
    SignIn { email: String, password: String },
    SignUp {
        email: String,
        password: String,
        full_name: String,
    },
}

/// Render the centered auth card. Returns the submit action once the form
/// validates.
pub fn render_auth(ctx: &egui::Context, form: &mut AuthForm) -> Option<AuthAction> {
    let mut action = None;

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.add_space(ui.available_height() * 0.2);
        ui.vertical_centered(|ui| {
            ui.heading("TeamChat");
            ui.add_space(4.0);
            match form.mode {
                AuthMode::SignIn => ui.label("Sign in to your workspace"),
                AuthMode::SignUp => ui.label("Create your account"),
            };
            ui.add_space(12.0);

            let card_width = 320.0_f32.min(ui.available_width() - 16.0);
            ui.allocate_ui(egui::vec2(card_width, 0.0), |ui| {
                egui::Grid::new("auth_fields")
                    .num_columns(2)
                    .spacing([8.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Server");
                        ui.add(
                            egui::TextEdit::singleline(&mut form.backend_url)
                                .desired_width(f32::INFINITY),
                        );
                        ui.end_row();

                        if form.mode == AuthMode::SignUp {
                            ui.label("Name");
                            ui.add(
                                egui::TextEdit::singleline(&mut form.full_name)
                                    .hint_text("Full name")
                                    .desired_width(f32::INFINITY),
                            );
                            ui.end_row();
                        }

                        ui.label("Email");
                        ui.add(
                            egui::TextEdit::singleline(&mut form.email)
                                .hint_text("you@example.com")
                                .desired_width(f32::INFINITY),
                        );
                        ui.end_row();

                        ui.label("Password");
                        let password = egui::TextEdit::singleline(&mut form.password)
                            .password(true)
                            .desired_width(f32::INFINITY);
                        let submitted = ui.add(password).lost_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        ui.end_row();
                        if submitted && !form.busy {
                            action = submit(form);
                        }
                    });

                ui.add_space(4.0);
                ui.checkbox(&mut form.remember, "Remember me");

                if let Some(error) = &form.error {
                    ui.add_space(4.0);
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let label = match form.mode {
                        AuthMode::SignIn => "Sign in",
                        AuthMode::SignUp => "Create account",
                    };
                    let button = ui.add_enabled(!form.busy, egui::Button::new(label));
                    if button.clicked() {
                        action = submit(form);
                    }
                    if form.busy {
                        ui.spinner();
                    }
                });

                ui.add_space(8.0);
                match form.mode {
                    AuthMode::SignIn => {
                        if ui.link("No account? Sign up").clicked() {
                            form.mode = AuthMode::SignUp;
                            form.error = None;
                        }
                    }
                    AuthMode::SignUp => {
                        if ui.link("Have an account? Sign in").clicked() {
                            form.mode = AuthMode::SignIn;
                            form.error = None;
                        }
                    }
                }
            });
        });
    });

    action
}

fn submit(form: &mut AuthForm) -> Option<AuthAction> {
    if let Err(e) = validate(form) {
        form.error = Some(e);
        return None;
    }
    form.error = None;
    form.busy = true;
    Some(match form.mode {
        AuthMode::SignIn => AuthAction::SignIn {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        },
        AuthMode::SignUp => AuthAction::SignUp {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            full_name: form.full_name.trim().to_string(),
        },
    })
}

fn validate(form: &AuthForm) -> Result<(), String> {
    validation::validate_email(form.email.trim())?;
    validation::validate_password(&form.password)?;
    if form.mode == AuthMode::SignUp {
        validation::validate_display_name(form.full_name.trim())?;
    }
    Ok(())
}
