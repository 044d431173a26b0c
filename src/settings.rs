//! User-facing settings and feature flags.
//!
//! Display density, list-vs-card mode, page size, ad-spot intervals, and
//! feature flags. The feed core reads these but never mutates them — except
//! the two explicit display toggles bound to keys. Loaded from an optional
//! JSON file with environment overrides for the endpoint.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::feed::{FeedKind, FeedQuery};

/// Minimum terminal columns a card needs to stay readable.
const MIN_CARD_WIDTH: u16 = 28;

/// Card grid density. Denser settings allow more columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Eco,
    Roomy,
    Cozy,
}

impl Density {
    /// Upper bound on grid columns for this density.
    pub fn max_columns(&self) -> usize {
        match self {
            Density::Eco => 4,
            Density::Roomy => 3,
            Density::Cozy => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Density::Eco => "eco",
            Density::Roomy => "roomy",
            Density::Cozy => "cozy",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Settings {
    pub density: Density,
    /// Single-column list mode instead of the card grid.
    pub list_mode: bool,
    pub page_size: usize,
    /// One promoted item after every this-many posts. 0 disables ads.
    pub ad_interval: usize,
    /// Squad feeds use their own, typically tighter, interval.
    pub squad_ad_interval: usize,
    pub disable_ads: bool,
    /// Feature flag: sharing copies the link directly instead of opening
    /// the share menu.
    pub copy_link_share: bool,
    /// Emit analytics events (to the log sink).
    pub analytics: bool,
    pub api_base: String,
    pub api_token: Option<String>,
    /// Squad to include in the feed rotation, by handle.
    pub squad: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            density: Density::default(),
            list_mode: false,
            page_size: 10,
            ad_interval: 5,
            squad_ad_interval: 2,
            disable_ads: false,
            copy_link_share: false,
            analytics: true,
            api_base: "https://api.devfeed.local".to_string(),
            api_token: None,
            squad: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` when it exists, then apply environment
    /// overrides (`DEVFEED_API`, `DEVFEED_TOKEN`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path)?;
                serde_json::from_str(&raw)?
            }
            _ => Self::default(),
        };
        if let Ok(api) = std::env::var("DEVFEED_API") {
            settings.api_base = api;
        }
        if let Ok(token) = std::env::var("DEVFEED_TOKEN") {
            settings.api_token = Some(token);
        }
        Ok(settings)
    }

    /// Grid column count for the current display settings and terminal
    /// width. List mode is always a single column; otherwise the density
    /// bounds how many minimum-width cards fit.
    pub fn columns_for(&self, width: u16) -> usize {
        if self.list_mode {
            return 1;
        }
        let fit = (width / MIN_CARD_WIDTH) as usize;
        fit.clamp(1, self.density.max_columns())
    }

    /// The ad-spot interval for a feed, honoring the squad override and the
    /// kill switch.
    pub fn ad_interval_for(&self, query: &FeedQuery) -> usize {
        if self.disable_ads {
            return 0;
        }
        match query.kind {
            FeedKind::Squad(_) => self.squad_ad_interval,
            _ => self.ad_interval,
        }
    }

    pub fn cycle_density(&mut self) {
        self.density = match self.density {
            Density::Eco => Density::Roomy,
            Density::Roomy => Density::Cozy,
            Density::Cozy => Density::Eco,
        };
    }

    pub fn toggle_list_mode(&mut self) {
        self.list_mode = !self.list_mode;
    }
}
