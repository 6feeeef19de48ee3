use std::time::Instant;

use super::App;

// Implementation block for tick-related logic in the App.
impl App {
    /// Called on every tick of the event loop.
    ///
    /// Applies collaborator results that arrived since the last tick and
    /// expires the toast.
    pub fn on_tick(&mut self) {
        self.controller.tick(Instant::now());
    }
}
