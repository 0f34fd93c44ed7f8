//! Sample entities and page envelopes.

use ctrlpanel_api_models::{Controller, EntityId, ErrorBody, Event, EventType, PageEnvelope};

/// Controller `id` with serial `SN-{id}` and GUID `guid-{id}`.
#[must_use]
pub fn controller(id: EntityId) -> Controller {
    Controller {
        id,
        serial_number: format!("SN-{id}"),
        guid: Some(format!("guid-{id}")),
        vehicle_number: None,
    }
}

/// Controllers `1..=count`.
#[must_use]
pub fn controllers(count: usize) -> Vec<Controller> {
    (1..=count)
        .map(|id| controller(EntityId::try_from(id).unwrap_or(EntityId::MAX)))
        .collect()
}

/// Event type `id` with code `E{id:02}`.
#[must_use]
pub fn event_type(id: EntityId) -> EventType {
    EventType {
        id,
        event_code: format!("E{id:02}"),
        comment: Some(format!("event type {id}")),
    }
}

/// Event `id` of type 1 from controller 1 at `event_time`.
#[must_use]
pub fn event(id: EntityId, event_time: &str) -> Event {
    Event {
        id,
        event_type: event_type(1),
        controller: controller(1),
        event_time: event_time.to_string(),
        server_time: None,
        comment: Some(format!("event {id}")),
    }
}

/// Envelope holding `content` as the only page.
#[must_use]
pub fn single_page<T>(content: Vec<T>) -> PageEnvelope<T> {
    let total_pages = u32::from(!content.is_empty());
    PageEnvelope {
        content,
        total_pages,
        ..PageEnvelope::empty()
    }
}

/// Structured backend error body.
#[must_use]
pub fn error_body(code: &str, message: &str) -> ErrorBody {
    ErrorBody {
        code: code.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controllers_are_numbered_from_one() {
        let list = controllers(3);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].serial_number, "SN-1");
        assert_eq!(list[2].guid.as_deref(), Some("guid-3"));
    }

    #[test]
    fn single_page_counts_pages() {
        assert_eq!(single_page(vec![event_type(1)]).total_pages, 1);
        assert_eq!(single_page::<EventType>(Vec::new()).total_pages, 0);
    }
}
