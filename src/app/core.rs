//! App construction and backend thread wiring.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{error, info};

use crate::backend::{run_backend, BackendConfig};
use crate::config::{self, Settings};
use crate::forms::Forms;
use crate::protocol::{BackendAction, GuiEvent};
use crate::state::ClientState;
use crate::ui::theme;

pub struct TeamChatApp {
    pub(crate) state: ClientState,
    pub(crate) forms: Forms,
    pub(crate) settings: Settings,
    pub(crate) action_tx: Sender<BackendAction>,
    pub(crate) event_rx: Receiver<GuiEvent>,
}

impl TeamChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = config::load_settings().unwrap_or_default();
        theme::apply_app_style(&cc.egui_ctx, &settings.theme);

        let (action_tx, action_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let backend_config = BackendConfig {
            base_url: settings.backend_url.clone(),
            anon_key: settings.anon_key.clone(),
        };
        std::thread::spawn(move || run_backend(backend_config, action_rx, event_tx));
        info!("backend thread started");

        let mut forms = Forms::default();
        forms.auth.backend_url = settings.backend_url.clone();
        forms.auth.email = settings.email.clone();
        if !settings.email.is_empty() {
            if let Some(password) = config::load_saved_password(&settings.email) {
                forms.auth.password = password;
                forms.auth.remember = true;
            }
        }

        Self {
            state: ClientState::new(),
            forms,
            settings,
            action_tx,
            event_rx,
        }
    }

    pub(crate) fn send(&self, action: BackendAction) {
        if let Err(e) = self.action_tx.send(action) {
            error!("backend channel closed: {}", e);
        }
    }
}
