use crate::api::types::HealthReport;
use crate::app::refresh::WidgetPayload;
use crossterm::event::Event as CrosstermEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input event
    Terminal(CrosstermEvent),

    /// A widget fetch finished. `generation` is the feed generation the
    /// fetch was issued under.
    WidgetData {
        widget_id: String,
        generation: u64,
        result: Result<WidgetPayload, String>,
    },

    /// Periodic API health check result
    Health(HealthReport),

    /// Scheduler tick
    Tick,
}
