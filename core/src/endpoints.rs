//! Registry of the logical endpoints exposed by the macropad firmware.
//!
//! Paths are relative to the configured device base URL, which carries the
//! `/api` prefix. The registry is a set of constants; parameterized paths are
//! produced by `macro_path`.

use url::Url;

use crate::http::HttpMethod;

pub const CONFIG_COMPONENTS: &str = "/config/components";
pub const CONFIG_ACTIONS: &str = "/config/actions";
pub const CONFIG_EXAMPLE: &str = "/config/example";
pub const CONFIG_INFO: &str = "/config/info";
pub const CONFIG_LEDS: &str = "/config/leds";
pub const CONFIG_REPORTS: &str = "/config/reports";
pub const CONFIG_DISPLAY: &str = "/config/display";
pub const MACROS: &str = "/macros";
pub const WIFI_SCAN: &str = "/wifi/scan";
pub const WIFI_CONFIG: &str = "/wifi/config";
pub const WIFI_STATUS: &str = "/wifi/status";

const MACRO_PREFIX: &str = "/macros/";

/// Domain category an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointGroup {
    ConfigComponents,
    ConfigActions,
    ConfigLeds,
    ConfigDisplay,
    ConfigGeneral,
    Macros,
    Wifi,
    Status,
}

/// A logical server resource plus the method used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn group(&self) -> EndpointGroup {
        group_of(&self.path)
    }

    /// Full request URL under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }
}

/// Path of a single stored macro. The id is percent-encoded as a single
/// path segment, so `/`, `?` and `#` stay inside it.
pub fn macro_path(id: &str) -> String {
    let Ok(mut url) = Url::parse("http://device/macros") else {
        return format!("{MACRO_PREFIX}{id}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(id);
    }
    url.path().to_string()
}

/// Extract the (still encoded) macro id from a `/macros/{id}` path.
pub fn macro_id(path: &str) -> Option<&str> {
    path.strip_prefix(MACRO_PREFIX).filter(|id| !id.is_empty())
}

pub fn group_of(path: &str) -> EndpointGroup {
    match path {
        CONFIG_COMPONENTS => EndpointGroup::ConfigComponents,
        CONFIG_ACTIONS => EndpointGroup::ConfigActions,
        CONFIG_LEDS => EndpointGroup::ConfigLeds,
        CONFIG_DISPLAY => EndpointGroup::ConfigDisplay,
        WIFI_STATUS => EndpointGroup::Status,
        WIFI_SCAN | WIFI_CONFIG => EndpointGroup::Wifi,
        MACROS => EndpointGroup::Macros,
        p if macro_id(p).is_some() => EndpointGroup::Macros,
        _ => EndpointGroup::ConfigGeneral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let ep = Endpoint::get(CONFIG_LEDS);
        assert_eq!(ep.url("http://192.168.4.1/api/"), "http://192.168.4.1/api/config/leds");
        assert_eq!(ep.url("http://192.168.4.1/api"), "http://192.168.4.1/api/config/leds");
    }

    #[test]
    fn macro_paths_round_trip_their_id() {
        let path = macro_path("3_volume");
        assert_eq!(path, "/macros/3_volume");
        assert_eq!(macro_id(&path), Some("3_volume"));
        assert_eq!(macro_id(MACROS), None);
        assert_eq!(macro_id("/macros/"), None);
    }

    #[test]
    fn macro_ids_are_encoded_as_one_segment() {
        assert_eq!(macro_path("a/b?c#d e"), "/macros/a%2Fb%3Fc%23d%20e");
        assert_eq!(macro_path("50%"), "/macros/50%25");
        assert_eq!(macro_id(&macro_path("a/b")), Some("a%2Fb"));
        assert_eq!(
            Endpoint::delete(macro_path("x?y")).url("http://pad/api"),
            "http://pad/api/macros/x%3Fy"
        );
    }

    #[test]
    fn endpoints_are_grouped_by_domain() {
        assert_eq!(Endpoint::get(CONFIG_COMPONENTS).group(), EndpointGroup::ConfigComponents);
        assert_eq!(Endpoint::get(CONFIG_INFO).group(), EndpointGroup::ConfigGeneral);
        assert_eq!(Endpoint::get(macro_path("x")).group(), EndpointGroup::Macros);
        assert_eq!(Endpoint::get(WIFI_STATUS).group(), EndpointGroup::Status);
        assert_eq!(Endpoint::post(WIFI_CONFIG).group(), EndpointGroup::Wifi);
    }
}
