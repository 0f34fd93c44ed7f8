//! Resource descriptors shared by the API client and the controllers.

use std::fmt::Debug;

use ctrlpanel_api_models::{
    Controller, ControllerDraft, EntityId, Event, EventDraft, EventType, EventTypeDraft,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::query::Sort;

/// The three backend resources managed by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `/controllers`
    Controllers,
    /// `/event-types`
    EventTypes,
    /// `/events`
    Events,
}

impl ResourceKind {
    /// All kinds in navigation order.
    pub const ALL: [Self; 3] = [Self::Controllers, Self::EventTypes, Self::Events];

    /// Collection path segment below the API base.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Controllers => "controllers",
            Self::EventTypes => "event-types",
            Self::Events => "events",
        }
    }

    /// Singular route segment used by form screens.
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Controllers => "controller",
            Self::EventTypes => "event-type",
            Self::Events => "event",
        }
    }

    /// Lower-case plural label for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Controllers => "controllers",
            Self::EventTypes => "event types",
            Self::Events => "events",
        }
    }

    /// Lower-case singular label for messages.
    #[must_use]
    pub const fn item_label(self) -> &'static str {
        match self {
            Self::Controllers => "controller",
            Self::EventTypes => "event type",
            Self::Events => "event",
        }
    }

    /// Deleting an entity of this kind also deletes every event referencing it.
    #[must_use]
    pub const fn cascades_to_events(self) -> bool {
        matches!(self, Self::Controllers | Self::EventTypes)
    }

    /// Resolve a kind from its collection segment.
    #[must_use]
    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection() == segment)
    }
}

/// Static description of one backend resource.
pub trait Resource: Send + Sync + 'static {
    /// Which resource this is.
    const KIND: ResourceKind;
    /// Read model returned by list and get.
    type Item: DeserializeOwned + Serialize + Clone + Debug + Send + Sync;
    /// Write payload accepted by create and update.
    type Draft: Serialize + Clone + Debug + Send + Sync;

    /// Sort applied when a list screen opens.
    fn default_sort() -> Sort;

    /// Filter fields the list endpoint understands.
    #[must_use]
    fn filter_fields() -> &'static [&'static str] {
        &[]
    }

    /// Backend identifier of an item.
    fn item_id(item: &Self::Item) -> EntityId;
}

/// Controllers resource.
#[derive(Debug, Clone, Copy)]
pub struct Controllers;

/// Event types resource.
#[derive(Debug, Clone, Copy)]
pub struct EventTypes;

/// Events resource.
#[derive(Debug, Clone, Copy)]
pub struct Events;

/// Filter fields accepted by the events list endpoint.
pub const EVENT_FILTER_FIELDS: [&str; 6] = [
    "eventTypeComment",
    "controllerSerialNumber",
    "comment",
    "controllerVehicleNumber",
    "startDate",
    "endDate",
];

impl Resource for Controllers {
    const KIND: ResourceKind = ResourceKind::Controllers;
    type Item = Controller;
    type Draft = ControllerDraft;

    fn default_sort() -> Sort {
        Sort::asc("serialNumber")
    }

    fn item_id(item: &Self::Item) -> EntityId {
        item.id
    }
}

impl Resource for EventTypes {
    const KIND: ResourceKind = ResourceKind::EventTypes;
    type Item = EventType;
    type Draft = EventTypeDraft;

    fn default_sort() -> Sort {
        Sort::asc("eventCode")
    }

    fn item_id(item: &Self::Item) -> EntityId {
        item.id
    }
}

impl Resource for Events {
    const KIND: ResourceKind = ResourceKind::Events;
    type Item = Event;
    type Draft = EventDraft;

    fn default_sort() -> Sort {
        Sort::desc("eventTime")
    }

    fn filter_fields() -> &'static [&'static str] {
        &EVENT_FILTER_FIELDS
    }

    fn item_id(item: &Self::Item) -> EntityId {
        item.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_round_trips() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_collection(kind.collection()), Some(kind));
        }
        assert_eq!(ResourceKind::from_collection("users"), None);
    }

    #[test]
    fn only_referenced_resources_cascade() {
        assert!(ResourceKind::Controllers.cascades_to_events());
        assert!(ResourceKind::EventTypes.cascades_to_events());
        assert!(!ResourceKind::Events.cascades_to_events());
    }

    #[test]
    fn default_sorts_match_list_screens() {
        assert_eq!(Controllers::default_sort().to_string(), "serialNumber,asc");
        assert_eq!(EventTypes::default_sort().to_string(), "eventCode,asc");
        assert_eq!(Events::default_sort().to_string(), "eventTime,desc");
        assert!(Controllers::filter_fields().is_empty());
        assert_eq!(Events::filter_fields().len(), 6);
    }
}
