//! Edit/preview toggle plus the actions that need a rendered preview first.
//!
//! Print and export both operate on the preview. When one is requested from
//! the edit form, the view switches to preview and the action is parked
//! until the renderer reports that a preview frame has actually been drawn.

use log::{debug, info};

use crate::model::ViewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Print,
    Export,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    mode: ViewMode,
    /// Mode of the last frame the renderer finished drawing.
    committed: Option<ViewMode>,
    parked: Option<Action>,
}

impl ViewState {
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_preview(&self) -> bool {
        self.mode == ViewMode::Preview
    }

    pub fn parked(&self) -> Option<Action> {
        self.parked
    }

    /// Flips the mode. The last commit belonged to the old mode, so it is cleared.
    pub fn toggle(&mut self) {
        self.mode = self.mode.flipped();
        self.committed = None;
        if self.mode == ViewMode::Edit && self.parked.take().is_some() {
            debug!("Dropped parked action on leaving preview");
        }
        info!("View mode is now {:?}", self.mode);
    }

    /// Returns the action when a preview frame is already on screen.
    /// Otherwise switches to preview and parks it for [`ViewState::committed`].
    pub fn request(&mut self, action: Action) -> Option<Action> {
        if self.mode == ViewMode::Preview && self.committed == Some(ViewMode::Preview) {
            return Some(action);
        }
        if self.mode != ViewMode::Preview {
            self.mode = ViewMode::Preview;
            self.committed = None;
            info!("Switched to preview for {:?}", action);
        }
        self.parked = Some(action);
        None
    }

    /// Called by the renderer once a frame in `mode` has been drawn.
    /// Releases a parked action on the first preview commit.
    pub fn committed(&mut self, mode: ViewMode) -> Option<Action> {
        self.committed = Some(mode);
        if mode == ViewMode::Preview && self.mode == ViewMode::Preview {
            self.parked.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_edit() {
        assert_eq!(ViewState::default().mode(), ViewMode::Edit);
    }

    #[test]
    fn toggle_twice_restores_mode() {
        let mut view = ViewState::default();
        let before = view.clone();
        view.toggle();
        assert!(view.is_preview());
        view.toggle();
        assert_eq!(view, before);
    }

    #[test]
    fn action_from_edit_waits_for_preview_commit() {
        let mut view = ViewState::default();
        view.committed(ViewMode::Edit);

        assert_eq!(view.request(Action::Export), None);
        assert!(view.is_preview());
        assert_eq!(view.parked(), Some(Action::Export));

        // A late edit-frame commit must not release it.
        assert_eq!(view.committed(ViewMode::Edit), None);
        assert_eq!(view.committed(ViewMode::Preview), Some(Action::Export));
        assert_eq!(view.parked(), None);
        assert_eq!(view.committed(ViewMode::Preview), None);
    }

    #[test]
    fn action_in_rendered_preview_runs_immediately() {
        let mut view = ViewState::default();
        view.toggle();
        view.committed(ViewMode::Preview);
        assert_eq!(view.request(Action::Print), Some(Action::Print));
        assert_eq!(view.parked(), None);
    }

    #[test]
    fn preview_not_yet_drawn_still_parks() {
        let mut view = ViewState::default();
        view.toggle();
        assert_eq!(view.request(Action::Print), None);
        assert_eq!(view.committed(ViewMode::Preview), Some(Action::Print));
    }

    #[test]
    fn preview_commit_does_not_survive_a_round_trip() {
        let mut view = ViewState::default();
        view.toggle();
        view.committed(ViewMode::Preview);
        view.toggle();
        view.toggle();
        // Back in preview, but nothing has been drawn since.
        assert_eq!(view.request(Action::Export), None);
        assert_eq!(view.parked(), Some(Action::Export));
        assert_eq!(view.committed(ViewMode::Preview), Some(Action::Export));
    }

    #[test]
    fn leaving_preview_drops_parked_action() {
        let mut view = ViewState::default();
        view.request(Action::Print);
        view.toggle();
        assert_eq!(view.parked(), None);
        view.toggle();
        assert_eq!(view.committed(ViewMode::Preview), None);
    }
}
