use crate::db::PrincipalStore;
use crate::types::{AppError, AuthenticatedIdentity, Result, Role, Task};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Coarse route classes used by the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Reachable without any identity.
    Public,
    /// Any registered principal.
    Member,
    /// Administrators only.
    Admin,
}

impl RouteClass {
    /// Roles accepted for this class, `None` when no identity is required.
    pub fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            RouteClass::Public => None,
            RouteClass::Member => Some(&[Role::User, Role::Admin]),
            RouteClass::Admin => Some(&[Role::Admin]),
        }
    }
}

/// Role check for a route class.
///
/// Missing identity on a protected class is `Unauthenticated` (401); an
/// identity whose role is not in the table is `RoleForbidden` (403).
pub fn check_role(class: RouteClass, identity: Option<&AuthenticatedIdentity>) -> Result<()> {
    let Some(allowed) = class.allowed_roles() else {
        return Ok(());
    };

    match identity {
        None => Err(AppError::Unauthenticated),
        Some(identity) if allowed.contains(&identity.role) => Ok(()),
        Some(identity) => {
            warn!(principal = %identity.name, role = %identity.role, ?class, "role check failed");
            Err(AppError::RoleForbidden)
        }
    }
}

/// Route layer applying [`check_role`] before the handler runs.
///
/// Install with `middleware::from_fn_with_state(RouteClass::Member, require_role)`
/// on a route group that sits inside the authentication layer. Because it
/// runs before the handler, a caller failing the role check never learns
/// whether the addressed resource exists.
pub async fn require_role(
    State(class): State<RouteClass>,
    req: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    check_role(class, req.extensions().get::<AuthenticatedIdentity>())?;
    Ok(next.run(req).await)
}

/// Ownership check: only the task's current executor may act.
///
/// A task without an executor, or whose executor no longer resolves,
/// authorizes nobody. Names are compared exactly.
pub async fn ensure_executor(
    principals: &dyn PrincipalStore,
    task: &Task,
    acting_name: &str,
) -> Result<()> {
    let Some(executor_id) = task.executor_id else {
        warn!(task_id = task.id, principal = %acting_name, "task has no executor");
        return Err(AppError::AccessDenied);
    };

    let executor = principals.find_by_id(executor_id).await?;
    match executor {
        Some(executor) if executor.name == acting_name => {
            debug!(task_id = task.id, principal = %acting_name, "executor check passed");
            Ok(())
        }
        _ => {
            warn!(task_id = task.id, principal = %acting_name, "not the executor");
            Err(AppError::AccessDenied)
        }
    }
}
