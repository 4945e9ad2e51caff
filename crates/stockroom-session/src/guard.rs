//! Route guards: navigational admission control over the session snapshot.
//!
//! A guard holds no state of its own. Every call to [`RouteGuard::evaluate`]
//! is a fresh function of the snapshot and the requested location, and the
//! only effect it has is the redirect instruction it returns.

use serde::{Deserialize, Serialize};
use stockroom_core::{
  role::{DEFAULT_REQUIRED, Role},
  session::SessionSnapshot,
};

// ─── Routes ──────────────────────────────────────────────────────────────────

/// The locations guards redirect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardRoutes {
  pub login:      String,
  /// Screen shown to authenticated subjects whose role is `intruso`.
  pub restricted: String,
  /// Default authenticated landing route.
  pub landing:    String,
}

impl Default for GuardRoutes {
  fn default() -> Self {
    Self {
      login:      "/auth/login".to_owned(),
      restricted: "/unauthorized".to_owned(),
      landing:    "/dashboard".to_owned(),
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardPolicy {
  Member,
  Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
  /// Session or profile still resolving.
  Pending,
  DeniedUnauthenticated,
  DeniedRole,
  /// Role is sufficient but the subject sits on the restricted-area screen.
  Relocated,
  Admitted,
}

/// Where to send the navigator, and where to come back to afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
  pub to:        String,
  pub return_to: Option<String>,
}

impl Redirect {
  /// The target as a single URL, carrying the return path as `redirect`.
  pub fn location(&self) -> String {
    match &self.return_to {
      Some(back) => format!("{}?redirect={}", self.to, urlencoding::encode(back)),
      None => self.to.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GuardDecision {
  RenderPlaceholder,
  Redirect(Redirect),
  Render,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardOutcome {
  pub state:    GuardState,
  pub decision: GuardDecision,
}

impl GuardOutcome {
  fn pending() -> Self {
    Self { state: GuardState::Pending, decision: GuardDecision::RenderPlaceholder }
  }

  fn admitted() -> Self { Self { state: GuardState::Admitted, decision: GuardDecision::Render } }

  fn redirect(state: GuardState, to: &str, return_to: Option<&str>) -> Self {
    Self {
      state,
      decision: GuardDecision::Redirect(Redirect {
        to:        to.to_owned(),
        return_to: return_to.map(str::to_owned),
      }),
    }
  }

  pub fn redirect_target(&self) -> Option<&Redirect> {
    match &self.decision {
      GuardDecision::Redirect(r) => Some(r),
      _ => None,
    }
  }
}

// ─── Guard ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RouteGuard {
  policy:   GuardPolicy,
  required: Role,
  routes:   GuardRoutes,
}

impl RouteGuard {
  /// Member guard requiring `membro`.
  pub fn member(routes: GuardRoutes) -> Self { Self::member_requiring(DEFAULT_REQUIRED, routes) }

  pub fn member_requiring(required: Role, routes: GuardRoutes) -> Self {
    Self { policy: GuardPolicy::Member, required, routes }
  }

  /// Manager guard: admits `gerente` only.
  pub fn manager(routes: GuardRoutes) -> Self {
    Self { policy: GuardPolicy::Manager, required: Role::Gerente, routes }
  }

  pub fn policy(&self) -> GuardPolicy { self.policy }

  pub fn routes(&self) -> &GuardRoutes { &self.routes }

  pub fn evaluate(&self, snapshot: &SessionSnapshot, location: &str) -> GuardOutcome {
    if snapshot.state.is_pending() {
      return GuardOutcome::pending();
    }
    if snapshot.subject().is_none() {
      return GuardOutcome::redirect(
        GuardState::DeniedUnauthenticated,
        &self.routes.login,
        Some(location),
      );
    }
    if snapshot.profile_pending {
      return GuardOutcome::pending();
    }

    let role = snapshot.role();
    match self.policy {
      GuardPolicy::Member => self.evaluate_member(role, location),
      GuardPolicy::Manager => self.evaluate_manager(role),
    }
  }

  fn evaluate_member(&self, role: Role, location: &str) -> GuardOutcome {
    if path_of(location) == self.routes.restricted {
      return if role.satisfies(Role::Membro) {
        GuardOutcome::redirect(GuardState::Relocated, &self.routes.landing, None)
      } else {
        GuardOutcome::admitted()
      };
    }
    if role.satisfies(self.required) {
      GuardOutcome::admitted()
    } else {
      GuardOutcome::redirect(GuardState::DeniedRole, self.fallback(role), None)
    }
  }

  fn evaluate_manager(&self, role: Role) -> GuardOutcome {
    if role == Role::Gerente {
      GuardOutcome::admitted()
    } else {
      GuardOutcome::redirect(GuardState::DeniedRole, self.fallback(role), None)
    }
  }

  fn fallback(&self, role: Role) -> &str {
    match role {
      Role::Intruso => &self.routes.restricted,
      _ => &self.routes.landing,
    }
  }
}

/// Location without query string or fragment.
fn path_of(location: &str) -> &str {
  location.split(['?', '#']).next().unwrap_or(location)
}

#[cfg(test)]
mod tests {
  use stockroom_core::{profile::Profile, session::SessionState, subject::SubjectId};

  use super::*;

  fn with_role(role: Role) -> SessionSnapshot {
    let id = SubjectId::new("u-1");
    SessionSnapshot {
      state:           SessionState::Authenticated(id.clone()),
      profile:         Some(Profile { role, ..Profile::initial(id) }),
      profile_pending: false,
    }
  }

  fn member() -> RouteGuard { RouteGuard::member(GuardRoutes::default()) }

  fn manager() -> RouteGuard { RouteGuard::manager(GuardRoutes::default()) }

  #[test]
  fn loading_never_redirects() {
    for guard in [member(), manager()] {
      for snap in [SessionSnapshot::loading(), SessionSnapshot::uninitialized()] {
        let out = guard.evaluate(&snap, "/assets");
        assert_eq!(out.state, GuardState::Pending);
        assert_eq!(out.decision, GuardDecision::RenderPlaceholder);
      }
    }
  }

  #[test]
  fn profile_resolution_is_pending() {
    let snap = SessionSnapshot::authenticating("u-1".into());
    assert_eq!(member().evaluate(&snap, "/assets").state, GuardState::Pending);
  }

  #[test]
  fn anonymous_goes_to_login_with_return_path() {
    let out = member().evaluate(&SessionSnapshot::anonymous(), "/assets/42");
    assert_eq!(out.state, GuardState::DeniedUnauthenticated);
    let r = out.redirect_target().unwrap();
    assert_eq!(r.to, "/auth/login");
    assert_eq!(r.return_to.as_deref(), Some("/assets/42"));
    assert_eq!(r.location(), "/auth/login?redirect=%2Fassets%2F42");
  }

  #[test]
  fn anonymous_admin_request_goes_to_login() {
    let out = manager().evaluate(&SessionSnapshot::anonymous(), "/admin");
    let r = out.redirect_target().unwrap();
    assert_eq!(r.to, "/auth/login");
    assert_eq!(r.return_to.as_deref(), Some("/admin"));
  }

  #[test]
  fn member_guard_sends_intruso_to_restricted_area() {
    let out = member().evaluate(&with_role(Role::Intruso), "/assets");
    assert_eq!(out.state, GuardState::DeniedRole);
    assert_eq!(out.redirect_target().unwrap().to, "/unauthorized");
  }

  #[test]
  fn member_guard_renders_restricted_area_for_intruso() {
    let out = member().evaluate(&with_role(Role::Intruso), "/unauthorized");
    assert_eq!(out.state, GuardState::Admitted);
  }

  #[test]
  fn member_guard_admits_membro_and_gerente() {
    assert_eq!(member().evaluate(&with_role(Role::Membro), "/assets").state, GuardState::Admitted);
    assert_eq!(member().evaluate(&with_role(Role::Gerente), "/assets").state, GuardState::Admitted);
  }

  #[test]
  fn authorised_roles_leave_restricted_area() {
    for role in [Role::Membro, Role::Gerente] {
      let out = member().evaluate(&with_role(role), "/unauthorized?from=menu");
      assert_eq!(out.state, GuardState::Relocated);
      assert_eq!(out.redirect_target().unwrap().to, "/dashboard");
    }
  }

  #[test]
  fn member_guard_with_stricter_requirement() {
    let guard = RouteGuard::member_requiring(Role::Gerente, GuardRoutes::default());
    let out = guard.evaluate(&with_role(Role::Membro), "/reports");
    assert_eq!(out.state, GuardState::DeniedRole);
    assert_eq!(out.redirect_target().unwrap().to, "/dashboard");
  }

  #[test]
  fn manager_guard_admits_only_gerente() {
    assert_eq!(manager().evaluate(&with_role(Role::Gerente), "/admin").state, GuardState::Admitted);

    let membro = manager().evaluate(&with_role(Role::Membro), "/admin");
    assert_eq!(membro.state, GuardState::DeniedRole);
    assert_eq!(membro.redirect_target().unwrap().to, "/dashboard");

    let intruso = manager().evaluate(&with_role(Role::Intruso), "/admin");
    assert_eq!(intruso.state, GuardState::DeniedRole);
    assert_eq!(intruso.redirect_target().unwrap().to, "/unauthorized");
  }

  #[test]
  fn evaluation_is_idempotent() {
    let snap = with_role(Role::Membro);
    assert_eq!(manager().evaluate(&snap, "/admin"), manager().evaluate(&snap, "/admin"));
  }
}
