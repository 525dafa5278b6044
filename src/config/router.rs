use {
    crate::{Error, Result},
    serde::Deserialize,
};

///
/// Configuration for dispatch behavior that is not expressed in code.
///
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Body of the plain-text 404 written when no route matches.
    /// The default `not_found_message` is "Not Found".
    #[serde(default = "RouterConfig::default_not_found_message")]
    pub not_found_message: String,

    /// When set, sealing the router registers a GET route at this path that
    /// serves the route enumeration as JSON. Meant for development only.
    /// By default `routes_endpoint` is None.
    #[serde(default)]
    pub routes_endpoint: Option<String>,
}

impl RouterConfig {
    fn default_not_found_message() -> String {
        "Not Found".into()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.routes_endpoint
            && !endpoint.starts_with('/')
        {
            return Err(Error::config(format!(
                "router.routes_endpoint must start with '/', got '{endpoint}'"
            )));
        }
        Ok(())
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            not_found_message: Self::default_not_found_message(),
            routes_endpoint: None,
        }
    }
}
