//! Browser binding for windoc.
//!
//! On `wasm32` this exposes the `WindowMetrics` class to JS, bound to the
//! real `window` through [`BrowserWindow`]. Other targets only get the
//! config and id helpers the binding is built on.

#[cfg(target_arch = "wasm32")]
mod api;
#[cfg(target_arch = "wasm32")]
mod browser;

use windoc_core::{ConfigError, ServiceConfig, SubscriptionId};

#[cfg(target_arch = "wasm32")]
pub use api::{WindowMetrics, is_server_rendered, microtask_run_loop, start};
#[cfg(target_arch = "wasm32")]
pub use browser::BrowserWindow;

/// Parse the optional JSON config passed to the JS constructor. Missing or
/// blank input means the default config.
pub fn parse_config(json: Option<&str>) -> Result<ServiceConfig, ConfigError> {
    match json {
        Some(json) if !json.trim().is_empty() => ServiceConfig::from_json(json),
        _ => Ok(ServiceConfig::default()),
    }
}

/// Subscription ids as JS numbers. Ids past `u32::MAX` saturate.
pub fn to_js_id(id: SubscriptionId) -> u32 {
    u32::try_from(id.0).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_config_uses_defaults() {
        assert_eq!(parse_config(None).unwrap(), ServiceConfig::default());
        assert_eq!(parse_config(Some("  ")).unwrap(), ServiceConfig::default());
    }

    #[test]
    fn config_errors_surface_before_binding() {
        let err = parse_config(Some(r#"{"windowProperties": ["scrollLeft"]}"#))
            .and_then(|config| config.validate().map(|_| config));
        assert!(matches!(err, Err(ConfigError::NotAWindowProperty { .. })));
    }

    #[test]
    fn subscription_ids_fit_js_numbers() {
        assert_eq!(to_js_id(SubscriptionId(7)), 7);
        assert_eq!(to_js_id(SubscriptionId(u64::MAX)), u32::MAX);
    }
}
