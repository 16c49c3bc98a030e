use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where a metric's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    /// A property read directly off the window object.
    Window,
    /// A property of the document root element, falling back to `body`.
    Document,
    /// Computed from other metrics.
    Derived,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetricKind::Window => "window",
            MetricKind::Document => "document",
            MetricKind::Derived => "derived",
        })
    }
}

/// Properties the host exposes on the window object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowProperty {
    InnerHeight,
    InnerWidth,
    OuterHeight,
    OuterWidth,
    ScreenX,
    ScreenY,
}

/// Properties the host exposes on a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementProperty {
    ClientHeight,
    ClientWidth,
    ScrollTop,
    ScrollLeft,
    ScrollHeight,
    ScrollWidth,
}

/// The document elements metrics are read from, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentElement {
    /// `document.documentElement`
    Root,
    /// `document.body`
    Body,
}

impl DocumentElement {
    pub const FALLBACK_ORDER: [DocumentElement; 2] = [DocumentElement::Root, DocumentElement::Body];
}

/// Resolved source of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    Window(WindowProperty),
    Document(ElementProperty),
    Derived(&'static [Metric]),
}

/// Every measurement the service exposes.
///
/// Names serialize in camelCase (`innerHeight`, `scrollHRatio`, ...) and the
/// same spelling is accepted by [`FromStr`], which is how configuration
/// refers to metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    InnerHeight,
    InnerWidth,
    OuterHeight,
    OuterWidth,
    ScreenX,
    ScreenY,
    ClientHeight,
    ClientWidth,
    ScrollTop,
    ScrollLeft,
    ScrollHeight,
    ScrollWidth,
    ScrollRight,
    ScrollBottom,
    ScrollHRatio,
    ScrollVRatio,
}

const HORIZONTAL_DEPS: &[Metric] = &[Metric::ScrollLeft, Metric::ScrollWidth, Metric::ClientWidth];
const VERTICAL_DEPS: &[Metric] = &[Metric::ScrollTop, Metric::ScrollHeight, Metric::ClientHeight];

impl Metric {
    pub const COUNT: usize = 16;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::InnerHeight,
        Metric::InnerWidth,
        Metric::OuterHeight,
        Metric::OuterWidth,
        Metric::ScreenX,
        Metric::ScreenY,
        Metric::ClientHeight,
        Metric::ClientWidth,
        Metric::ScrollTop,
        Metric::ScrollLeft,
        Metric::ScrollHeight,
        Metric::ScrollWidth,
        Metric::ScrollRight,
        Metric::ScrollBottom,
        Metric::ScrollHRatio,
        Metric::ScrollVRatio,
    ];

    /// Position in [`Metric::ALL`]; used for dense per-metric tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Metric::InnerHeight => "innerHeight",
            Metric::InnerWidth => "innerWidth",
            Metric::OuterHeight => "outerHeight",
            Metric::OuterWidth => "outerWidth",
            Metric::ScreenX => "screenX",
            Metric::ScreenY => "screenY",
            Metric::ClientHeight => "clientHeight",
            Metric::ClientWidth => "clientWidth",
            Metric::ScrollTop => "scrollTop",
            Metric::ScrollLeft => "scrollLeft",
            Metric::ScrollHeight => "scrollHeight",
            Metric::ScrollWidth => "scrollWidth",
            Metric::ScrollRight => "scrollRight",
            Metric::ScrollBottom => "scrollBottom",
            Metric::ScrollHRatio => "scrollHRatio",
            Metric::ScrollVRatio => "scrollVRatio",
        }
    }

    pub const fn source(self) -> MetricSource {
        match self {
            Metric::InnerHeight => MetricSource::Window(WindowProperty::InnerHeight),
            Metric::InnerWidth => MetricSource::Window(WindowProperty::InnerWidth),
            Metric::OuterHeight => MetricSource::Window(WindowProperty::OuterHeight),
            Metric::OuterWidth => MetricSource::Window(WindowProperty::OuterWidth),
            Metric::ScreenX => MetricSource::Window(WindowProperty::ScreenX),
            Metric::ScreenY => MetricSource::Window(WindowProperty::ScreenY),
            Metric::ClientHeight => MetricSource::Document(ElementProperty::ClientHeight),
            Metric::ClientWidth => MetricSource::Document(ElementProperty::ClientWidth),
            Metric::ScrollTop => MetricSource::Document(ElementProperty::ScrollTop),
            Metric::ScrollLeft => MetricSource::Document(ElementProperty::ScrollLeft),
            Metric::ScrollHeight => MetricSource::Document(ElementProperty::ScrollHeight),
            Metric::ScrollWidth => MetricSource::Document(ElementProperty::ScrollWidth),
            Metric::ScrollRight | Metric::ScrollHRatio => MetricSource::Derived(HORIZONTAL_DEPS),
            Metric::ScrollBottom | Metric::ScrollVRatio => MetricSource::Derived(VERTICAL_DEPS),
        }
    }

    pub const fn kind(self) -> MetricKind {
        match self.source() {
            MetricSource::Window(_) => MetricKind::Window,
            MetricSource::Document(_) => MetricKind::Document,
            MetricSource::Derived(_) => MetricKind::Derived,
        }
    }

    /// Metrics this one is computed from. Empty for non-derived metrics.
    pub const fn dependencies(self) -> &'static [Metric] {
        match self.source() {
            MetricSource::Derived(deps) => deps,
            _ => &[],
        }
    }

    /// Derived metrics that must be invalidated when `self` changes.
    pub fn dependents(self) -> impl Iterator<Item = Metric> {
        Metric::ALL
            .into_iter()
            .filter(move |m| m.dependencies().contains(&self))
    }
}

impl From<WindowProperty> for Metric {
    fn from(property: WindowProperty) -> Self {
        match property {
            WindowProperty::InnerHeight => Metric::InnerHeight,
            WindowProperty::InnerWidth => Metric::InnerWidth,
            WindowProperty::OuterHeight => Metric::OuterHeight,
            WindowProperty::OuterWidth => Metric::OuterWidth,
            WindowProperty::ScreenX => Metric::ScreenX,
            WindowProperty::ScreenY => Metric::ScreenY,
        }
    }
}

impl From<ElementProperty> for Metric {
    fn from(property: ElementProperty) -> Self {
        match property {
            ElementProperty::ClientHeight => Metric::ClientHeight,
            ElementProperty::ClientWidth => Metric::ClientWidth,
            ElementProperty::ScrollTop => Metric::ScrollTop,
            ElementProperty::ScrollLeft => Metric::ScrollLeft,
            ElementProperty::ScrollHeight => Metric::ScrollHeight,
            ElementProperty::ScrollWidth => Metric::ScrollWidth,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigError::UnknownProperty {
                name: s.to_owned(),
            })
    }
}
