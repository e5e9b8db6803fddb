//! Per-controller response policy.
//!
//! A [`ControllerConfig`] is resolved once when routes are registered and then
//! shared read-only by every request. Child controllers start from a clone of
//! their parent and override what they need.

use std::{collections::BTreeSet, fmt, sync::Arc, time::Duration};

use crate::config::{DEFAULT_JSONP_PARAMETER, Settings};
use crate::domain::version::VersionSpec;

use super::envelope::{EnvelopeBuilder, ExposureHooks, NoopHooks};

#[derive(Clone)]
pub struct ControllerConfig {
    pub version: VersionSpec,
    pub caching: CachingRules,
    pub jsonp: JsonpConfig,
    pub hooks: Arc<dyn ExposureHooks>,
    pub serializers_enabled: bool,
    pub show_exception_message: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            version: VersionSpec::default(),
            caching: CachingRules::default(),
            jsonp: JsonpConfig::default(),
            hooks: Arc::new(NoopHooks),
            serializers_enabled: true,
            show_exception_message: false,
        }
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("version", &self.version)
            .field("caching", &self.caching)
            .field("jsonp", &self.jsonp)
            .field("serializers_enabled", &self.serializers_enabled)
            .field("show_exception_message", &self.show_exception_message)
            .finish_non_exhaustive()
    }
}

impl ControllerConfig {
    /// Root configuration seeded from the global settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            version: settings.api.version.clone(),
            caching: CachingRules {
                enabled: settings.caching.enabled,
                actions: BTreeSet::new(),
                cache_for: settings.caching.max_age,
            },
            jsonp: JsonpConfig {
                enabled: settings.jsonp.enabled,
                parameter: settings.jsonp.parameter.clone(),
                only: BTreeSet::new(),
            },
            hooks: Arc::new(NoopHooks),
            serializers_enabled: settings.api.serializers_enabled,
            show_exception_message: settings.errors.show_exception_message,
        }
    }

    /// Configuration for a controller inheriting from this one.
    pub fn child(&self) -> Self {
        self.clone()
    }

    pub fn with_version(mut self, version: VersionSpec) -> Self {
        self.version = version;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ExposureHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Mark `actions` as cached, optionally replacing the max-age.
    pub fn caches<I, A>(mut self, actions: I, cache_for: Option<Duration>) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.caching
            .actions
            .extend(actions.into_iter().map(Into::into));
        if let Some(cache_for) = cache_for {
            self.caching.cache_for = cache_for;
        }
        self
    }

    pub fn jsonp(mut self, options: JsonpOptions) -> Self {
        self.jsonp.apply(options);
        self
    }

    pub fn envelope_builder(&self) -> EnvelopeBuilder {
        EnvelopeBuilder::new(self.hooks.clone(), self.serializers_enabled)
    }
}

#[derive(Debug, Clone)]
pub struct CachingRules {
    /// Global switch; individual actions still have to opt in.
    pub enabled: bool,
    pub actions: BTreeSet<String>,
    pub cache_for: Duration,
}

impl Default for CachingRules {
    fn default() -> Self {
        Self {
            enabled: false,
            actions: BTreeSet::new(),
            cache_for: Duration::from_secs(15 * 60),
        }
    }
}

impl CachingRules {
    pub fn applies_to(&self, action: &str) -> bool {
        self.enabled && self.actions.contains(action)
    }

    pub fn cache_control(&self) -> String {
        format!("max-age={}", self.cache_for.as_secs())
    }
}

#[derive(Debug, Clone)]
pub struct JsonpConfig {
    pub enabled: bool,
    pub parameter: String,
    /// Actions eligible for wrapping; empty means every action.
    pub only: BTreeSet<String>,
}

impl Default for JsonpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            parameter: DEFAULT_JSONP_PARAMETER.to_string(),
            only: BTreeSet::new(),
        }
    }
}

impl JsonpConfig {
    pub fn applies_to(&self, action: &str) -> bool {
        self.enabled && (self.only.is_empty() || self.only.contains(action))
    }

    fn apply(&mut self, options: JsonpOptions) {
        self.enabled = options.enable;
        if let Some(parameter) = options.parameter {
            self.parameter = parameter;
        }
        self.only = options.only.into_iter().collect();
    }
}

/// Arguments to [`ControllerConfig::jsonp`].
#[derive(Debug, Clone)]
pub struct JsonpOptions {
    pub enable: bool,
    /// Keeps the inherited parameter name when `None`.
    pub parameter: Option<String>,
    pub only: Vec<String>,
}

impl Default for JsonpOptions {
    fn default() -> Self {
        Self {
            enable: true,
            parameter: None,
            only: Vec::new(),
        }
    }
}

impl JsonpOptions {
    pub fn disabled() -> Self {
        Self {
            enable: false,
            ..Self::default()
        }
    }

    pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn only<I, A>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.only = actions.into_iter().map(Into::into).collect();
        self
    }
}
