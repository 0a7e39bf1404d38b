//! Application core — event loop, action dispatch, twin command execution.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use pintwin_core::{CoreError, Twin};

use crate::action::Action;
use crate::component::Component;
use crate::components::Dashboard;
use crate::data_bridge;
use crate::event::{Event, EventReader};
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    twin: Twin,
    dashboard: Dashboard,
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    bridge_cancel: CancellationToken,
}

impl App {
    pub fn new(twin: Twin) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            twin,
            dashboard: Dashboard::new(),
            running: true,
            action_tx,
            action_rx,
            bridge_cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop. This is the heart of the TUI.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.dashboard.init(self.action_tx.clone())?;

        tokio::spawn(data_bridge::run_data_bridge(
            self.twin.clone(),
            self.action_tx.clone(),
            self.bridge_cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250),
            Duration::from_millis(33),
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.dashboard.render(frame, frame.area()))?;
                }
            }
        }

        self.bridge_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }
        self.dashboard.handle_key_event(key)
    }

    /// Process a single action — update app state, run board commands,
    /// and propagate to the dashboard.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            _ => self.dispatch_command(action),
        }

        if let Some(follow_up) = self.dashboard.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    /// Execute board commands on the twin. Remote outcomes surface through
    /// the diagnostics channel; local rejections are reported here.
    fn dispatch_command(&self, action: &Action) {
        let twin = self.twin.clone();
        let tx = self.action_tx.clone();

        match action.clone() {
            Action::TogglePin(id) => {
                tokio::spawn(async move {
                    report_local(&tx, twin.toggle_pin(&id).await);
                });
            }
            Action::SetPinMode(id, mode) => {
                tokio::spawn(async move {
                    report_local(&tx, twin.set_pin_mode(&id, mode).await);
                });
            }
            Action::SetPinPull(id, pull) => {
                tokio::spawn(async move {
                    report_local(&tx, twin.set_pin_pull(&id, pull).await);
                });
            }
            Action::SetPwm {
                pin,
                freq_hz,
                duty_pct,
            } => {
                tokio::spawn(async move {
                    report_local(&tx, twin.set_pwm(&pin, freq_hz, duty_pct).await);
                });
            }
            Action::SetPwmLive {
                pin,
                freq_hz,
                duty_pct,
            } => {
                twin.set_pwm_debounced(pin, freq_hz, duty_pct);
            }
            Action::SetWifi { ssid, password } => {
                tokio::spawn(async move {
                    let password = SecretString::from(password);
                    report_local(&tx, twin.set_wifi_credentials(&ssid, &password).await);
                });
            }
            Action::SetBleName(name) => {
                tokio::spawn(async move {
                    report_local(&tx, twin.set_ble_name(&name).await);
                });
            }
            Action::SetBleAdvertising(enable) => {
                tokio::spawn(async move {
                    report_local(&tx, twin.set_ble_advertising(enable).await);
                });
            }
            Action::ConsoleSubmit(text) => {
                tokio::spawn(async move {
                    report_local(&tx, twin.send_console_command(&text).await);
                });
            }
            Action::RefreshNow => {
                tokio::spawn(async move {
                    twin.refresh().await;
                });
            }
            Action::StartPolling => {
                twin.start_polling();
                let _ = tx.send(Action::Diagnostic("[SYSTEM] Polling resumed".into()));
            }
            _ => {}
        }
    }
}

/// Surface locally-rejected commands in the activity pane. Remote
/// failures already arrive through the twin's diagnostics channel.
fn report_local(tx: &mpsc::UnboundedSender<Action>, result: Result<(), CoreError>) {
    if let Err(e) = result {
        if e.is_local() {
            let _ = tx.send(Action::Diagnostic(format!("[ERROR] {e}")));
        }
    }
}
