use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{now_timestamp, strip_hidden, ServiceError};
use crate::auth::{PasswordHasher, Principal, Role, TokenService};
use crate::database::models::User;
use crate::database::{Record, Store, StoreError};
use crate::filter::Filter;
use crate::policy::PolicyError;
use crate::types::{Operation, ResourceType};
use crate::validation::schemas::{
    ChangePasswordInput, ForgotPasswordInput, LoginInput, RegisterInput, CHANGE_PASSWORD, FORGOT_PASSWORD, LOGIN,
    REGISTER, UPDATE_PROFILE,
};

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// A freshly authenticated user and the token that proves it
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Value,
    pub token: String,
}

/// Registration, login and the caller's own account
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    passwords: PasswordHasher,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, passwords: PasswordHasher) -> Self {
        Self { store, tokens, passwords }
    }

    pub async fn register(&self, body: &Value) -> Result<Session, ServiceError> {
        let input: RegisterInput = REGISTER.validate_into(body)?;

        if self.store.exists(ResourceType::User, &by_email(&input.email)).await? {
            return Err(email_taken());
        }

        let digest = self.passwords.hash(&input.password).await?;
        let id = Uuid::new_v4();
        let now = now_timestamp();
        let role = input.role.unwrap_or(Role::Tenant);

        let mut record = Record::new();
        record.insert("id".to_string(), json!(id.to_string()));
        record.insert("email".to_string(), json!(input.email));
        record.insert("password".to_string(), json!(digest));
        record.insert("firstName".to_string(), json!(input.first_name));
        record.insert("lastName".to_string(), json!(input.last_name));
        record.insert("phone".to_string(), json!(input.phone));
        record.insert("role".to_string(), json!(role.as_str()));
        record.insert("isActive".to_string(), json!(true));
        record.insert("createdAt".to_string(), json!(now));
        record.insert("updatedAt".to_string(), json!(now));

        let created = match self.store.insert(ResourceType::User, record).await {
            Ok(created) => created,
            Err(StoreError::Duplicate(_)) => return Err(email_taken()),
            Err(e) => return Err(e.into()),
        };

        let principal = Principal { id, email: input.email, role };
        let token = self.tokens.issue(&principal)?;
        info!("New user registered: {} as {}", principal.email, role);

        Ok(Session { user: strip_hidden(ResourceType::User, created), token })
    }

    /// Unknown email, wrong password and a deactivated account look the same to the caller
    pub async fn login(&self, body: &Value) -> Result<Session, ServiceError> {
        let input: LoginInput = LOGIN.validate_into(body)?;

        let Some(row) = self.store.find_one(ResourceType::User, &by_email(&input.email)).await? else {
            self.passwords.verify_dummy(&input.password).await;
            warn!("Login failed for unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        let user = User::from_value(row.clone()).map_err(|e| ServiceError::Internal(e.to_string()))?;
        if !self.passwords.verify(&input.password, &user.password).await {
            warn!("Login failed for {}: wrong password", user.email);
            return Err(ServiceError::InvalidCredentials);
        }
        if !user.is_active {
            warn!("Login refused for deactivated account {}", user.email);
            return Err(ServiceError::InvalidCredentials);
        }

        let principal = principal_of(&user)?;
        let token = self.tokens.issue(&principal)?;
        info!("User logged in: {}", user.email);

        Ok(Session { user: strip_hidden(ResourceType::User, row), token })
    }

    pub async fn profile(&self, principal: &Principal) -> Result<Value, ServiceError> {
        self.store
            .find_one(ResourceType::User, &by_id(principal))
            .await?
            .map(|user| strip_hidden(ResourceType::User, user))
            .ok_or_else(|| user_not_found(Operation::Read))
    }

    pub async fn update_profile(&self, principal: &Principal, body: &Value) -> Result<Value, ServiceError> {
        let mut changes = UPDATE_PROFILE.validate(body)?;
        changes.insert("updatedAt".to_string(), json!(now_timestamp()));

        let updated = self
            .store
            .update(ResourceType::User, &by_id(principal), changes)
            .await?
            .ok_or_else(|| user_not_found(Operation::Update))?;

        info!("User profile updated: {}", principal.email);
        Ok(strip_hidden(ResourceType::User, updated))
    }

    pub async fn change_password(&self, principal: &Principal, body: &Value) -> Result<(), ServiceError> {
        let input: ChangePasswordInput = CHANGE_PASSWORD.validate_into(body)?;

        let row = self
            .store
            .find_one(ResourceType::User, &by_id(principal))
            .await?
            .ok_or_else(|| user_not_found(Operation::Update))?;
        let user = User::from_value(row).map_err(|e| ServiceError::Internal(e.to_string()))?;

        if !self.passwords.verify(&input.current_password, &user.password).await {
            warn!("Password change rejected for {}: current password mismatch", principal.email);
            return Err(ServiceError::Rejected("Current password is incorrect".to_string()));
        }

        let digest = self.passwords.hash(&input.new_password).await?;
        let mut changes = Record::new();
        changes.insert("password".to_string(), json!(digest));
        changes.insert("updatedAt".to_string(), json!(now_timestamp()));

        self.store
            .update(ResourceType::User, &by_id(principal), changes)
            .await?
            .ok_or_else(|| user_not_found(Operation::Update))?;

        info!("Password changed for user: {}", principal.email);
        Ok(())
    }

    /// Same answer whether or not the account exists
    pub async fn forgot_password(&self, body: &Value) -> Result<&'static str, ServiceError> {
        let input: ForgotPasswordInput = FORGOT_PASSWORD.validate_into(body)?;
        if self.store.exists(ResourceType::User, &by_email(&input.email)).await? {
            info!("Password reset requested for an existing account");
        }
        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    /// Tokens are stateless; logging out only records the event
    pub fn logout(&self, principal: &Principal) {
        info!("User logged out: {}", principal.email);
    }
}

fn by_email(email: &str) -> Filter {
    Filter::new().eq("email", email.trim().to_lowercase())
}

fn by_id(principal: &Principal) -> Filter {
    Filter::new().eq("id", principal.id.to_string())
}

fn principal_of(user: &User) -> Result<Principal, ServiceError> {
    let id = Uuid::parse_str(&user.id).map_err(|e| ServiceError::Internal(format!("bad user id: {}", e)))?;
    Ok(Principal { id, email: user.email.clone(), role: user.role })
}

fn email_taken() -> ServiceError {
    ServiceError::Conflict("User already exists with this email".to_string())
}

fn user_not_found(operation: Operation) -> ServiceError {
    PolicyError::NotFoundOrForbidden { resource: ResourceType::User, operation }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{seed, MemoryStore};

    async fn service() -> AuthService {
        let hasher = PasswordHasher::new(4);
        let store = MemoryStore::new();
        seed::seed(&store, &hasher).await.unwrap();
        let tokens = TokenService::new("test-secret", 1).unwrap();
        AuthService::new(Arc::new(store), tokens, hasher)
    }

    fn registration(email: &str) -> Value {
        json!({
            "email": email,
            "password": "password123",
            "firstName": "Rita",
            "lastName": "Renter"
        })
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service().await;
        let session = service.register(&registration("Rita@Example.com")).await.unwrap();
        assert_eq!(session.user["email"], "rita@example.com");
        assert_eq!(session.user["role"], "TENANT");
        assert!(session.user.get("password").is_none());

        let principal = service.tokens.authenticate(&session.token).unwrap();
        assert_eq!(principal.role, Role::Tenant);

        let login = service
            .login(&json!({ "email": "rita@example.com", "password": "password123" }))
            .await
            .unwrap();
        assert_eq!(login.user["id"], session.user["id"]);
    }

    #[tokio::test]
    async fn register_rejects_existing_email() {
        let service = service().await;
        let err = service.register(&registration("tenant1@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "User already exists with this email");
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let service = service().await;
        let err = service
            .register(&json!({ "email": "x@example.com", "password": "short", "firstName": "X", "lastName": "Y" }))
            .await
            .unwrap_err();
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.errors[0].field, "password");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let service = service().await;
        let wrong = service
            .login(&json!({ "email": "admin@example.com", "password": "nope" }))
            .await
            .unwrap_err();
        let unknown = service
            .login(&json!({ "email": "ghost@example.com", "password": "nope" }))
            .await
            .unwrap_err();
        assert!(matches!(wrong, ServiceError::InvalidCredentials));
        assert!(matches!(unknown, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn deactivated_account_cannot_login() {
        let service = service().await;
        let mut changes = Record::new();
        changes.insert("isActive".to_string(), json!(false));
        service
            .store
            .update(ResourceType::User, &by_email("tenant2@example.com"), changes)
            .await
            .unwrap();

        let err = service
            .login(&json!({ "email": "tenant2@example.com", "password": "tenant123" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn change_password_checks_current() {
        let service = service().await;
        let session = service
            .login(&json!({ "email": "landlord@example.com", "password": "landlord123" }))
            .await
            .unwrap();
        let me = service.tokens.authenticate(&session.token).unwrap();

        let err = service
            .change_password(&me, &json!({ "currentPassword": "wrong", "newPassword": "landlord456" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Current password is incorrect");

        service
            .change_password(&me, &json!({ "currentPassword": "landlord123", "newPassword": "landlord456" }))
            .await
            .unwrap();
        assert!(service
            .login(&json!({ "email": "landlord@example.com", "password": "landlord456" }))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn forgot_password_never_discloses_existence() {
        let service = service().await;
        let known = service.forgot_password(&json!({ "email": "admin@example.com" })).await.unwrap();
        let unknown = service.forgot_password(&json!({ "email": "nobody@example.com" })).await.unwrap();
        assert_eq!(known, unknown);
    }

    #[tokio::test]
    async fn profile_update_ignores_role() {
        let service = service().await;
        let session = service
            .login(&json!({ "email": "tenant1@example.com", "password": "tenant123" }))
            .await
            .unwrap();
        let me = service.tokens.authenticate(&session.token).unwrap();

        let updated = service
            .update_profile(&me, &json!({ "firstName": "Michael", "role": "ADMIN" }))
            .await
            .unwrap();
        assert_eq!(updated["firstName"], "Michael");
        assert_eq!(updated["role"], "TENANT");
        assert_eq!(service.profile(&me).await.unwrap()["firstName"], "Michael");
    }
}
