//! URL and UI location classification

use super::policy::SessionPolicy;

const ID_PLACEHOLDER: &str = ":id";

/// Classifies request URLs and UI locations against the session policy
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    exempt_paths: Vec<String>,
    public_prefixes: Vec<String>,
    sign_in_route: String,
    sign_up_route: String,
}

impl RouteClassifier {
    pub fn new(policy: &SessionPolicy) -> Self {
        let public_prefixes = policy
            .public_routes
            .iter()
            .map(|route| {
                route
                    .strip_suffix(ID_PLACEHOLDER)
                    .unwrap_or(route)
                    .to_string()
            })
            .collect();

        Self {
            exempt_paths: policy.auth_exempt_paths.clone(),
            public_prefixes,
            sign_in_route: policy.sign_in_route.clone(),
            sign_up_route: policy.sign_up_route.clone(),
        }
    }

    /// Whether a request URL must never take part in refresh logic
    pub fn is_auth_exempt(&self, url: &str) -> bool {
        self.exempt_paths
            .iter()
            .any(|exempt| url.contains(exempt.as_str()))
    }

    /// Whether a UI location stays reachable without a session
    ///
    /// The root route matches only itself; every other prefix matches any
    /// location that starts with it.
    pub fn is_public_location(&self, path: &str) -> bool {
        self.public_prefixes.iter().any(|prefix| {
            if prefix == "/" {
                path == "/"
            } else {
                path.starts_with(prefix.as_str())
            }
        })
    }

    /// Whether a UI location is the sign-in or sign-up screen
    pub fn is_auth_screen(&self, path: &str) -> bool {
        path.starts_with(self.sign_in_route.as_str())
            || path.starts_with(self.sign_up_route.as_str())
    }

    /// Whether teardown should move the user away from `path`
    pub fn needs_sign_in_redirect(&self, path: &str) -> bool {
        !self.is_public_location(path) && !self.is_auth_screen(path)
    }

    pub fn sign_in_route(&self) -> &str {
        &self.sign_in_route
    }
}
