//! Keyboard, mouse and scroll input.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Direction, Switcher};
use crate::error::SwitcherError;
use crate::host::{Host, Scope};
use crate::preview::PreviewId;

/// Keyboard actions, as resolved by the host's keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    Next,
    Previous,
    NextWindowOfApp,
    PreviousWindowOfApp,
    Activate,
    Cancel,
    ShowDesktop,
    CloseWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    Key(KeyAction),
    Scroll(ScrollDirection),
    Click(PreviewId),
    /// The switcher's modifier keys were let go.
    ModifiersReleased,
}

impl Switcher {
    /// Handle one input event.
    ///
    /// Input arriving while the switcher closes is dropped. Navigation is
    /// ignored while a gesture is in progress.
    pub fn handle_input(
        &mut self,
        host: &mut dyn Host,
        event: InputEvent,
    ) -> Result<(), SwitcherError> {
        self.ensure_alive()?;
        if self.closing {
            debug!("Ignoring {:?} while closing", event);
            return Ok(());
        }
        let gesturing = self.gesture.is_some();

        match event {
            InputEvent::Key(KeyAction::Next) | InputEvent::Scroll(ScrollDirection::Down) => {
                if gesturing {
                    return Ok(());
                }
                self.next(host)
            }
            InputEvent::Key(KeyAction::Previous) | InputEvent::Scroll(ScrollDirection::Up) => {
                if gesturing {
                    return Ok(());
                }
                self.previous(host)
            }
            InputEvent::Key(KeyAction::NextWindowOfApp) if !gesturing => {
                self.ensure_navigable("next_window_of_app")?;
                self.step_within_app(host, Direction::Next)
            }
            InputEvent::Key(KeyAction::PreviousWindowOfApp) if !gesturing => {
                self.ensure_navigable("previous_window_of_app")?;
                self.step_within_app(host, Direction::Previous)
            }
            InputEvent::Key(KeyAction::NextWindowOfApp | KeyAction::PreviousWindowOfApp) => Ok(()),
            InputEvent::Key(KeyAction::Activate) | InputEvent::ModifiersReleased => {
                self.activate_selected(host)
            }
            InputEvent::Key(KeyAction::Cancel) => self.activate_without_selection(host),
            InputEvent::Key(KeyAction::ShowDesktop) => self.show_desktop(host),
            InputEvent::Key(KeyAction::CloseWindow) => {
                if let Some(window) = self.selected_window().map(|w| w.id) {
                    debug!("Requesting close of window {}", window);
                    host.request_close(window);
                }
                Ok(())
            }
            InputEvent::Click(preview) => self.click(host, preview),
        }
    }

    /// Select the clicked preview and activate it.
    fn click(&mut self, host: &mut dyn Host, preview: PreviewId) -> Result<(), SwitcherError> {
        if let Some(index) = self.previews.iter().position(|p| p.id() == preview) {
            if self.gesture.is_none() {
                self.select(host, index)?;
            }
            return self.activate_selected(host);
        }

        if let Scope::App(app) = self.focus.clone() {
            if let Some(child) = self.children.get_mut(&app) {
                if let Some(index) = child.previews.iter().position(|p| p.id() == preview) {
                    if child.gesture.is_none() {
                        child.select(host, index)?;
                    }
                    return self.activate_selected(host);
                }
            }
        }
        debug!("Click on unknown preview {:?}", preview);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::headless::HeadlessHost;
    use crate::switcher::{CloseReason, OpenRequest, SwitcherMode, SwitcherState};
    use crate::Window;

    fn open(host: &mut HeadlessHost, windows: Vec<Window>) -> Switcher {
        Switcher::open(host, Arc::default(), OpenRequest::new(windows)).unwrap()
    }

    fn three() -> Vec<Window> {
        vec![
            Window::new(1, "One", "editor"),
            Window::new(2, "Two", "terminal"),
            Window::new(3, "Three", "editor"),
        ]
    }

    #[test]
    fn test_keys_and_scroll_navigate() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());

        switcher.handle_input(&mut host, InputEvent::Key(KeyAction::Next)).unwrap();
        assert_eq!(switcher.selected_index(), Some(1));
        switcher
            .handle_input(&mut host, InputEvent::Scroll(ScrollDirection::Down))
            .unwrap();
        assert_eq!(switcher.selected_index(), Some(2));
        switcher
            .handle_input(&mut host, InputEvent::Scroll(ScrollDirection::Up))
            .unwrap();
        assert_eq!(switcher.selected_index(), Some(1));
    }

    #[test]
    fn test_next_window_of_app_in_window_mode() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());

        switcher
            .handle_input(&mut host, InputEvent::Key(KeyAction::NextWindowOfApp))
            .unwrap();
        assert_eq!(switcher.selected_index(), Some(2));
        switcher
            .handle_input(&mut host, InputEvent::Key(KeyAction::PreviousWindowOfApp))
            .unwrap();
        assert_eq!(switcher.selected_index(), Some(0));
    }

    #[test]
    fn test_next_window_of_app_drives_sub_switcher() {
        let mut host = HeadlessHost::new();
        let mut switcher = Switcher::open(
            &mut host,
            Arc::default(),
            OpenRequest::new(three()).in_mode(SwitcherMode::Applications),
        )
        .unwrap();
        let editor = crate::AppKey::new("editor");
        assert_eq!(switcher.focus(), &Scope::App(editor.clone()));

        switcher
            .handle_input(&mut host, InputEvent::Key(KeyAction::NextWindowOfApp))
            .unwrap();
        let child = switcher.child(&editor).unwrap();
        assert_eq!(child.selected_index(), Some(1));
        assert_eq!(switcher.selected_window().map(|w| w.id), Some(3));
        assert_eq!(host.title(), Some("Three"));
    }

    #[test]
    fn test_modifiers_released_activates() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());
        switcher.handle_input(&mut host, InputEvent::Key(KeyAction::Next)).unwrap();
        switcher.handle_input(&mut host, InputEvent::ModifiersReleased).unwrap();

        assert_eq!(switcher.state(), SwitcherState::Closing);
        assert_eq!(switcher.close_reason(), Some(CloseReason::ActivateSelected));
        assert_eq!(host.requests().activate, vec![2]);

        // Closing swallows further input
        switcher.handle_input(&mut host, InputEvent::Key(KeyAction::Next)).unwrap();
        assert_eq!(switcher.selected_index(), Some(1));
    }

    #[test]
    fn test_cancel_does_not_activate() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());
        switcher.handle_input(&mut host, InputEvent::Key(KeyAction::Cancel)).unwrap();
        assert_eq!(switcher.close_reason(), Some(CloseReason::NoActivation));
        assert!(host.requests().activate.is_empty());
    }

    #[test]
    fn test_click_selects_and_activates() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());
        let third = switcher.previews()[2].id();
        switcher.handle_input(&mut host, InputEvent::Click(third)).unwrap();
        assert_eq!(host.requests().activate, vec![3]);
    }

    #[test]
    fn test_close_window_requests_close() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());
        switcher
            .handle_input(&mut host, InputEvent::Key(KeyAction::CloseWindow))
            .unwrap();
        assert_eq!(host.requests().close, vec![1]);
        assert_eq!(switcher.state(), SwitcherState::Idle);
    }

    #[test]
    fn test_show_desktop_minimizes_everything() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());
        switcher
            .handle_input(&mut host, InputEvent::Key(KeyAction::ShowDesktop))
            .unwrap();
        assert_eq!(host.requests().minimize, vec![1, 2, 3]);
        assert!(switcher.windows().iter().all(|w| w.minimized));
        assert!(host.requests().activate.is_empty());
    }

    #[test]
    fn test_navigation_ignored_while_gesturing() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, three());
        switcher.gesture_begin(&mut host, 0.0).unwrap();
        switcher.handle_input(&mut host, InputEvent::Key(KeyAction::Next)).unwrap();
        assert_eq!(switcher.current_index(), 0.0);
        assert_eq!(switcher.state(), SwitcherState::Gesturing);
    }

    #[test]
    fn test_input_event_serialization() {
        let json = serde_json::to_string(&InputEvent::Key(KeyAction::NextWindowOfApp)).unwrap();
        assert_eq!(json, r#"{"key":"next_window_of_app"}"#);
        let parsed: InputEvent = serde_json::from_str(r#"{"scroll":"up"}"#).unwrap();
        assert_eq!(parsed, InputEvent::Scroll(ScrollDirection::Up));
    }
}
