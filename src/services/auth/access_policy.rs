//! Static request-target → requirement rules.
//!
//! Rules are evaluated in order and the first match wins; a request that matches
//! nothing requires authentication. Ownership ("is this my resource?") is not a
//! rule here: handlers check it against the resolved principal.

use axum::http::Method;

use crate::services::auth::role::Role;

/// What a request target demands from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    AnyRole(Vec<Role>),
}

impl Requirement {
    pub fn any_role(roles: &[Role]) -> Self {
        Self::AnyRole(roles.to_vec())
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Requirement::Public)
    }

    /// `None` for anonymous callers.
    pub fn is_satisfied_by(&self, role: Option<Role>) -> bool {
        match (self, role) {
            (Requirement::Public, _) => true,
            (_, None) => false,
            (Requirement::Authenticated, Some(_)) => true,
            (Requirement::AnyRole(roles), Some(role)) => roles.contains(&role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` or `{name}`: exactly one segment.
    Any,
}

/// Path pattern: `/projects`, `/projects/*`, `/projects/{id}/pdf`, `/admin/**`.
///
/// A trailing `/**` matches the base path and anything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    prefix: bool,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let (body, prefix) = match pattern.strip_suffix("/**") {
            Some(body) => (body, true),
            None => (pattern, false),
        };

        let segments = split_path(body)
            .map(|s| {
                if s == "*" || (s.starts_with('{') && s.ends_with('}')) {
                    Segment::Any
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self { segments, prefix }
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();

        if parts.len() < self.segments.len() {
            return false;
        }
        if !self.prefix && parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| match segment {
                Segment::Any => true,
                Segment::Literal(lit) => lit == part,
            })
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    patterns: Vec<PathPattern>,
    /// `None` matches every method.
    methods: Option<Vec<Method>>,
    requirement: Requirement,
}

impl AccessRule {
    pub fn new(patterns: &[&str], methods: Option<&[Method]>, requirement: Requirement) -> Self {
        Self {
            patterns: patterns.iter().map(|p| PathPattern::parse(p)).collect(),
            methods: methods.map(<[Method]>::to_vec),
            requirement,
        }
    }

    pub fn any_method(patterns: &[&str], requirement: Requirement) -> Self {
        Self::new(patterns, None, requirement)
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let method_ok = self
            .methods
            .as_ref()
            .is_none_or(|methods| methods.contains(method));
        method_ok && self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    fallback: Requirement,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self {
            rules,
            fallback: Requirement::Authenticated,
        }
    }

    pub fn requirement(&self, method: &Method, path: &str) -> &Requirement {
        // CORS preflight never carries credentials.
        if method == Method::OPTIONS {
            return &Requirement::Public;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(AccessRule::requirement)
            .unwrap_or(&self.fallback)
    }

    /// The platform's rule set.
    pub fn platform_default() -> Self {
        use Role::{Admin, Porteur};

        let owners = Requirement::any_role(&[Admin, Porteur]);

        Self::new(vec![
            // Fully public
            AccessRule::any_method(&["/auth/**"], Requirement::Public),
            AccessRule::new(
                &["/health", "/status"],
                Some(&[Method::GET, Method::HEAD]),
                Requirement::Public,
            ),
            AccessRule::any_method(&["/articles/**"], Requirement::Public),
            // Administration
            AccessRule::any_method(&["/admin/**"], Requirement::any_role(&[Admin])),
            // Must precede the public `/projects/*` read rule.
            AccessRule::any_method(&["/projects/my"], owners.clone()),
            // Read-only public catalog
            AccessRule::new(
                &[
                    "/projects",
                    "/projects/search",
                    "/projects/stats",
                    "/projects/*",
                    "/projects/*/similar",
                    "/projects/*/pdf",
                ],
                Some(&[Method::GET, Method::HEAD]),
                Requirement::Public,
            ),
            // Project mutation (ownership is checked by the handler)
            AccessRule::new(
                &["/projects", "/projects/upload"],
                Some(&[Method::POST]),
                owners.clone(),
            ),
            AccessRule::new(
                &["/projects/**"],
                Some(&[Method::PUT, Method::PATCH, Method::DELETE]),
                owners.clone(),
            ),
            AccessRule::any_method(&["/porteur/**"], owners),
            // Investments: any signed-in role
            AccessRule::any_method(&["/investments/**"], Requirement::Authenticated),
        ])
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(policy: &AccessPolicy, method: Method, path: &str) -> Requirement {
        policy.requirement(&method, path).clone()
    }

    #[test]
    fn pattern_matching() {
        let exact = PathPattern::parse("/projects");
        assert!(exact.matches("/projects"));
        assert!(exact.matches("/projects/"));
        assert!(!exact.matches("/projects/1"));

        let one = PathPattern::parse("/projects/{id}/pdf");
        assert!(one.matches("/projects/42/pdf"));
        assert!(!one.matches("/projects/42"));
        assert!(!one.matches("/projects/42/pdf/extra"));

        let prefix = PathPattern::parse("/admin/**");
        assert!(prefix.matches("/admin"));
        assert!(prefix.matches("/admin/users/bob/enabled"));
        assert!(!prefix.matches("/administrator"));
    }

    #[test]
    fn auth_and_health_are_public() {
        let policy = AccessPolicy::platform_default();

        assert!(req(&policy, Method::POST, "/auth/login").is_public());
        assert!(req(&policy, Method::GET, "/auth/validate").is_public());
        assert!(req(&policy, Method::GET, "/health").is_public());
        assert!(req(&policy, Method::GET, "/articles/latest").is_public());
        // Only reads of /health are public.
        assert_eq!(
            req(&policy, Method::POST, "/health"),
            Requirement::Authenticated
        );
    }

    #[test]
    fn project_reads_public_mutations_role_gated() {
        let policy = AccessPolicy::platform_default();
        let owners = Requirement::any_role(&[Role::Admin, Role::Porteur]);

        assert!(req(&policy, Method::GET, "/projects").is_public());
        assert!(req(&policy, Method::GET, "/projects/12").is_public());
        assert!(req(&policy, Method::GET, "/projects/12/similar").is_public());

        assert_eq!(req(&policy, Method::POST, "/projects"), owners);
        assert_eq!(req(&policy, Method::PUT, "/projects/12"), owners);
        assert_eq!(req(&policy, Method::DELETE, "/projects/12"), owners);
    }

    #[test]
    fn first_match_wins_for_my_projects() {
        let policy = AccessPolicy::platform_default();

        // `/projects/*` would make this public if it were evaluated first.
        assert_eq!(
            req(&policy, Method::GET, "/projects/my"),
            Requirement::any_role(&[Role::Admin, Role::Porteur])
        );
    }

    #[test]
    fn admin_and_investments() {
        let policy = AccessPolicy::platform_default();

        assert_eq!(
            req(&policy, Method::GET, "/admin/users"),
            Requirement::any_role(&[Role::Admin])
        );
        assert_eq!(
            req(&policy, Method::POST, "/investments"),
            Requirement::Authenticated
        );
    }

    #[test]
    fn unmatched_is_default_deny() {
        let policy = AccessPolicy::platform_default();

        assert_eq!(
            req(&policy, Method::GET, "/users/me"),
            Requirement::Authenticated
        );
        assert_eq!(
            req(&policy, Method::GET, "/something/else"),
            Requirement::Authenticated
        );
    }

    #[test]
    fn preflight_is_public() {
        let policy = AccessPolicy::platform_default();
        assert!(req(&policy, Method::OPTIONS, "/admin/users").is_public());
    }

    #[test]
    fn requirement_satisfaction() {
        let admin_only = Requirement::any_role(&[Role::Admin]);

        assert!(Requirement::Public.is_satisfied_by(None));
        assert!(!Requirement::Authenticated.is_satisfied_by(None));
        assert!(Requirement::Authenticated.is_satisfied_by(Some(Role::User)));
        assert!(admin_only.is_satisfied_by(Some(Role::Admin)));
        assert!(!admin_only.is_satisfied_by(Some(Role::Porteur)));
        assert!(!admin_only.is_satisfied_by(None));
    }
}
