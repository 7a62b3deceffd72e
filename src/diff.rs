use crate::types::*;

/// Typed events between two reads. With no previous status every field is
/// reported.
pub(crate) fn status_events(previous: Option<&Status>, current: &Status) -> Vec<Event> {
    let mut events = Vec::new();

    if previous.map(|p| p.current) != Some(current.current) {
        events.push(Event::TemperatureChanged { temp: current.current });
    }
    if previous.map(|p| p.target) != Some(current.target) {
        events.push(Event::TargetTemperatureChanged { temp: current.target });
    }

    let prev_mode = previous.and_then(|p| p.mode().ok());
    if let Ok(mode) = current.mode()
        && prev_mode != Some(mode)
    {
        events.push(Event::ModeChanged { mode });
    }

    let prev_config = previous.map(|p| p.configuration.values()).unwrap_or(&[]);
    for (index, &new) in current.configuration.values().iter().enumerate() {
        let old = prev_config.get(index).copied();
        if old != Some(new) {
            events.push(Event::ConfigurationChanged { index, old, new });
        }
    }

    events
}
