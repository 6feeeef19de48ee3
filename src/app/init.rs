use std::time::Duration;

use log::debug;

use super::App;
use crate::controller::SettingsController;

impl App {
    /// Creates the console state and mounts the first tab.
    ///
    /// Must be called from within the tokio runtime, since mounting spawns the
    /// initial load.
    pub fn new(mut controller: SettingsController, tick_rate: Duration) -> Self {
        debug!("Initializing App, tick rate {:?}", tick_rate);
        controller.start();
        Self {
            should_quit: false,
            controller,
            cursors: [0; 4],
            overlay: None,
            status_message: String::from("Tab to switch panels, r to reload, q to quit"),
            tick_rate,
        }
    }
}
