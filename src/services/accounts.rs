use crate::auth::jwt::JwtCodec;
use crate::auth::password::PasswordHasher;
use crate::db::Stores;
use crate::types::{
    AppError, LoginRequest, NewPrincipal, PersonView, RegisterRequest, Result, Role,
    TokenResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

const USERNAME_MIN_CHARS: usize = 2;
const USERNAME_MAX_CHARS: usize = 100;
const BAD_LOGIN_MESSAGE: &str = "Incorrect credentials";

/// Registration, login and the people directory.
#[derive(Clone)]
pub struct AccountService {
    stores: Stores,
    codec: Arc<JwtCodec>,
    hasher: Arc<dyn PasswordHasher>,
}

fn validate_registration(req: &RegisterRequest) -> Result<()> {
    let mut problems = Vec::new();

    let name_len = req.username.trim().chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&name_len) {
        problems.push(format!(
            "username must be between {} and {} characters",
            USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
        ));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        problems.push("email must be a valid address".to_string());
    }
    if req.password.is_empty() {
        problems.push("password must not be empty".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(problems.join(", ")))
    }
}

impl AccountService {
    pub fn new(stores: Stores, codec: Arc<JwtCodec>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            stores,
            codec,
            hasher,
        }
    }

    /// Registers a new `USER` principal and returns a credential for it.
    ///
    /// The email is checked before the name, so a request clashing on both
    /// reports the email.
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse> {
        validate_registration(&req)?;

        if self
            .stores
            .principals
            .find_by_email(&req.email)
            .await?
            .is_some()
        {
            warn!("registration rejected: email already in use");
            return Err(AppError::DuplicateEmail(req.email));
        }
        if self
            .stores
            .principals
            .find_by_name(&req.username)
            .await?
            .is_some()
        {
            warn!(principal = %req.username, "registration rejected: name already in use");
            return Err(AppError::DuplicateName(req.username));
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let principal = self
            .stores
            .principals
            .save(NewPrincipal {
                name: req.username,
                password_hash,
                role: Role::User,
                email: req.email,
            })
            .await?;

        info!(principal = %principal.name, id = principal.id, "principal registered");
        Ok(TokenResponse {
            jwt_token: self.codec.issue(&principal.name)?,
        })
    }

    /// Exchanges a name and password for a fresh credential.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse> {
        let principal = self
            .stores
            .principals
            .find_by_name(&req.username)
            .await?
            .ok_or_else(|| {
                warn!(principal = %req.username, "login failed: unknown principal");
                AppError::Auth(BAD_LOGIN_MESSAGE.to_string())
            })?;

        if !self.hasher.verify(&req.password, &principal.password_hash)? {
            warn!(principal = %principal.name, "login failed: wrong password");
            return Err(AppError::Auth(BAD_LOGIN_MESSAGE.to_string()));
        }

        info!(principal = %principal.name, "login succeeded");
        Ok(TokenResponse {
            jwt_token: self.codec.issue(&principal.name)?,
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<PersonView> {
        self.stores
            .principals
            .find_by_email(email)
            .await?
            .map(PersonView::from)
            .ok_or_else(|| AppError::PrincipalNotFound(email.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<PersonView>> {
        let people = self.stores.principals.find_all().await?;
        Ok(people.into_iter().map(PersonView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Argon2Hasher;
    use crate::db::{MemoryStore, PrincipalStore};
    use rstest::rstest;

    fn service() -> (AccountService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(
            Stores::shared(store.clone()),
            Arc::new(JwtCodec::new("accounts-test-secret-32-characters", 60)),
            Arc::new(Argon2Hasher),
        );
        (service, store)
    }

    fn registration(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_issues_token() {
        let (service, store) = service();

        let token = service
            .register(registration("alice", "alice@example.com", "s3cret"))
            .await
            .unwrap();

        let stored = store.find_by_name("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "s3cret");
        assert_eq!(stored.role, Role::User);
        assert_eq!(
            service.codec.verify(&token.jwt_token).unwrap(),
            "alice".to_string()
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (service, store) = service();
        service
            .register(registration("alice", "shared@example.com", "one"))
            .await
            .unwrap();

        let second = service
            .register(registration("alicia", "shared@example.com", "two"))
            .await;

        assert!(matches!(second, Err(AppError::DuplicateEmail(_))));
        assert!(store.find_by_name("alicia").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let (service, _) = service();
        service
            .register(registration("alice", "a1@example.com", "one"))
            .await
            .unwrap();

        let second = service
            .register(registration("alice", "a2@example.com", "two"))
            .await;

        assert!(matches!(second, Err(AppError::DuplicateName(_))));
    }

    #[rstest]
    #[case("a", "a@example.com", "pw")]
    #[case("alice", "not-an-email", "pw")]
    #[case("alice", "a@example.com", "")]
    #[tokio::test]
    async fn test_invalid_registration(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
    ) {
        let (service, store) = service();

        let result = service
            .register(registration(username, email, password))
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(PrincipalStore::find_all(store.as_ref())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_login() {
        let (service, _) = service();
        service
            .register(registration("bob", "bob@example.com", "hunter2"))
            .await
            .unwrap();

        let ok = service
            .login(LoginRequest {
                username: "bob".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(service.codec.verify(&ok.jwt_token).unwrap(), "bob");

        let wrong = service
            .login(LoginRequest {
                username: "bob".to_string(),
                password: "hunter3".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::Auth(_))));

        let unknown = service
            .login(LoginRequest {
                username: "nobody".to_string(),
                password: "hunter2".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_directory_lookup() {
        let (service, _) = service();
        service
            .register(registration("carol", "carol@example.com", "pw"))
            .await
            .unwrap();

        let person = service.find_by_email("carol@example.com").await.unwrap();
        assert_eq!(person.username, "carol");
        assert_eq!(service.list().await.unwrap().len(), 1);
        assert!(matches!(
            service.find_by_email("ghost@example.com").await,
            Err(AppError::PrincipalNotFound(_))
        ));
    }
}
