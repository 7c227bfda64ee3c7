//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server resources (hotupdate.js)

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotupdate.js.
    pub struct HotUpdateVars {
        pub ws_port: u16,
        pub max_reconnect_attempts: u32,
    }

    impl TemplateVars for HotUpdateVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__BREEZE_WS_PORT__", &self.ws_port.to_string())
                .replace(
                    "__BREEZE_MAX_RECONNECT__",
                    &self.max_reconnect_attempts.to_string(),
                )
        }
    }

    /// Hot update client JavaScript with WebSocket port injection.
    pub const HOTUPDATE_JS: Template<HotUpdateVars> =
        Template::new(include_str!("serve/hotupdate.js"));
}
