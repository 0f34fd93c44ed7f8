//! Fixed route table of the panel's screens.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use ctrlpanel_api_models::EntityId;

use crate::resource::ResourceKind;

/// A named screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing screen.
    Home,
    /// Paginated list of one resource.
    List(ResourceKind),
    /// Empty form for a new entity.
    Create(ResourceKind),
    /// Form bound to an existing entity.
    Edit(ResourceKind, EntityId),
    /// Events per day.
    Statistics,
}

impl Route {
    /// Every route without an id parameter.
    #[must_use]
    pub fn fixed() -> Vec<Self> {
        let mut routes = vec![Self::Home];
        routes.extend(ResourceKind::ALL.map(Self::List));
        routes.extend(ResourceKind::ALL.map(Self::Create));
        routes.push(Self::Statistics);
        routes
    }

    /// Path of the screen, e.g. `/edit-controller/4`.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::List(kind) => format!("/{}", kind.collection()),
            Self::Create(kind) => format!("/add-{}", kind.singular()),
            Self::Edit(kind, id) => format!("/edit-{}/{id}", kind.singular()),
            Self::Statistics => "/statistics".to_string(),
        }
    }
}

impl Display for Route {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::Home);
        }
        let rest = trimmed
            .strip_prefix('/')
            .ok_or_else(|| format!("route '{path}' must start with '/'"))?;
        if rest == "statistics" {
            return Ok(Self::Statistics);
        }
        if let Some(kind) = ResourceKind::from_collection(rest) {
            return Ok(Self::List(kind));
        }
        if let Some(singular) = rest.strip_prefix("add-")
            && let Some(kind) = kind_by_singular(singular)
        {
            return Ok(Self::Create(kind));
        }
        if let Some(edit) = rest.strip_prefix("edit-")
            && let Some((singular, id)) = edit.split_once('/')
            && let Some(kind) = kind_by_singular(singular)
        {
            let id = id
                .parse::<EntityId>()
                .map_err(|_| format!("route '{path}' has an invalid id"))?;
            return Ok(Self::Edit(kind, id));
        }
        Err(format!("unknown route '{path}'"))
    }
}

fn kind_by_singular(segment: &str) -> Option<ResourceKind> {
    ResourceKind::ALL
        .into_iter()
        .find(|kind| kind.singular() == segment)
}
