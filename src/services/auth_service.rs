// src/services/auth_service.rs

use actix_web::HttpRequest;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::new_id;
use crate::models::user::{PublicUser, UserModel, UserType};
use crate::services::validation::{is_valid_email, is_valid_phone, non_blank, FieldErrors};
use crate::state::AuthSettings;
use crate::store::UserStore;

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Which account of that email the token belongs to.
    pub kind: UserType,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
}

/// Registration payload. Student-only and teacher-only fields are dropped
/// for the other type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(rename = "type")]
    pub kind: UserType,
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub subjects: Option<Vec<String>>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub experience: Option<String>,
    pub qualification: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(rename = "type")]
    pub kind: UserType,
}

/// A successful login: the account and a fresh access token.
#[derive(Debug)]
pub struct Session {
    pub user: PublicUser,
    pub access_token: String,
}

/// Verifies a plain password against a hashed password.
pub fn verify_password(plain_password: &str, hashed_password: &str) -> bool {
    verify(plain_password, hashed_password).unwrap_or(false)
}

/// Hashes a password using bcrypt.
pub fn get_password_hash(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Creates an access token (JWT) with the provided claims and optional expiration duration.
/// If no expiration delta is provided, the token will expire in 15 minutes.
pub fn create_access_token(
    mut claims: Claims,
    expires_delta: Option<Duration>,
    secret_key: &str,
) -> Result<String, JwtError> {
    let expire = Utc::now() + expires_delta.unwrap_or_else(|| Duration::minutes(15));
    claims.exp = expire.timestamp() as usize;
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret_key.as_ref()))
}

/// Verifies a JWT token and returns the decoded claims if valid.
pub fn verify_jwt_token(token: &str, secret_key: &str) -> Result<Claims, JwtError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the request's bearer token to its claims.
pub fn authenticate(req: &HttpRequest, settings: &AuthSettings) -> AppResult<Claims> {
    let token = bearer_token(req).ok_or_else(|| {
        AppError::Unauthorized("Authorization header missing or invalid".into())
    })?;
    verify_jwt_token(token, &settings.secret_key)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Field rules of the registration forms, checked in each form's field order.
pub fn validate_registration(form: &RegisterForm) -> AppResult<()> {
    fn filled(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
    let name = form.name.trim();
    let phone = filled(&form.phone);
    let city = filled(&form.city);
    let has_subject = form
        .subjects
        .as_ref()
        .map_or(false, |subjects| subjects.iter().any(|s| !s.trim().is_empty()));

    let mut errors = FieldErrors::new();
    errors
        .check(name.chars().count() >= 2, "Name must be at least 2 characters long")
        .check(is_valid_email(form.email.trim()), "Please enter a valid email address")
        .check(phone.map_or(false, is_valid_phone), "Please enter a valid phone number (10 digits)");

    match form.kind {
        UserType::Student => {
            errors
                .check(filled(&form.class_name).is_some(), "Please select your class")
                .check(has_subject, "Please select at least one subject");
        }
        UserType::Teacher => {
            let experience = filled(&form.experience).and_then(|e| e.parse::<u32>().ok());
            errors
                .check(has_subject, "Please select at least one subject")
                .check(experience.is_some(), "Please enter a valid experience (in years)")
                .check(filled(&form.qualification).is_some(), "Please select your qualification");
        }
    }

    errors
        .check(city.map_or(false, |c| c.chars().count() >= 2), "City must be at least 2 characters long")
        .check(form.password.chars().count() >= 6, "Password must be at least 6 characters long")
        .check(
            form.confirm_password.as_ref().map_or(true, |c| *c == form.password),
            "Passwords do not match",
        );
    errors.finish()
}

/// Creates an account. The same email may hold one student and one teacher account.
pub async fn register(
    users: &dyn UserStore,
    settings: &AuthSettings,
    form: RegisterForm,
) -> AppResult<PublicUser> {
    validate_registration(&form)?;

    let email = normalize_email(&form.email);
    if users.find_by_email(&email, form.kind).await?.is_some() {
        log::warn!("Duplicate {} registration for {}", form.kind, email);
        return Err(AppError::bad_request("User with this email already exists"));
    }

    let is_student = form.kind == UserType::Student;
    let now = Utc::now();
    let user = UserModel {
        id: new_id(),
        kind: form.kind,
        email,
        password: get_password_hash(&form.password, settings.bcrypt_cost)?,
        name: form.name.trim().to_string(),
        phone: non_blank(form.phone),
        city: non_blank(form.city),
        subjects: form
            .subjects
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| non_blank(Some(s)))
            .collect(),
        class_name: non_blank(form.class_name).filter(|_| is_student),
        experience: non_blank(form.experience).filter(|_| !is_student),
        qualification: non_blank(form.qualification).filter(|_| !is_student),
        created_at: now,
        updated_at: now,
    };

    users.insert(&user).await?;
    log::info!("Registered {} {} ({})", user.kind, user.id, user.email);
    Ok(user.into())
}

/// Checks credentials for the account of the given type and issues a token.
pub async fn login(
    users: &dyn UserStore,
    settings: &AuthSettings,
    form: LoginForm,
) -> AppResult<Session> {
    let email = normalize_email(&form.email);
    let user = users
        .find_by_email(&email, form.kind)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    if !verify_password(&form.password, &user.password) {
        log::warn!("Failed {} login for {}", form.kind, email);
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let claims = Claims {
        sub: user.id.clone(),
        kind: user.kind,
        exp: 0, // This field will be set in create_access_token.
    };
    let access_token = create_access_token(
        claims,
        Some(Duration::minutes(settings.access_token_expire_minutes)),
        &settings.secret_key,
    )?;

    Ok(Session { user: user.into(), access_token })
}

/// The account a token was issued for.
pub async fn current_user(users: &dyn UserStore, claims: &Claims) -> AppResult<PublicUser> {
    match users.find_by_id(&claims.sub).await? {
        Some(user) if user.kind == claims.kind => Ok(user.into()),
        _ => Err(AppError::not_found("User not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryUserStore;

    fn settings() -> AuthSettings {
        AuthSettings {
            secret_key: "test-secret".into(),
            access_token_expire_minutes: 60,
            bcrypt_cost: 4,
        }
    }

    fn form(kind: UserType, email: &str) -> RegisterForm {
        RegisterForm {
            kind,
            name: "Asha Rao".into(),
            email: email.into(),
            password: "password123".into(),
            confirm_password: None,
            phone: Some("98765 43210".into()),
            city: Some("Pune".into()),
            subjects: Some(vec!["Maths".into(), " ".into()]),
            class_name: Some("10".into()),
            experience: Some("5".into()),
            qualification: Some("M.Sc".into()),
        }
    }

    #[tokio::test]
    async fn register_hashes_and_keeps_type_specific_fields() {
        let users = MemoryUserStore::default();
        let student = register(&users, &settings(), form(UserType::Student, " Asha@Example.com "))
            .await
            .unwrap();
        assert_eq!(student.email, "asha@example.com");
        assert_eq!(student.class_name.as_deref(), Some("10"));
        assert!(student.experience.is_none());
        assert_eq!(student.subjects, vec!["Maths"]);

        let stored = users.find_by_id(&student.id).await.unwrap().unwrap();
        assert_ne!(stored.password, "password123");
        assert!(verify_password("password123", &stored.password));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected_per_type() {
        let users = MemoryUserStore::default();
        register(&users, &settings(), form(UserType::Student, "asha@example.com")).await.unwrap();

        let err = register(&users, &settings(), form(UserType::Student, "ASHA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "User with this email already exists"));

        let teacher = register(&users, &settings(), form(UserType::Teacher, "asha@example.com"))
            .await
            .unwrap();
        assert_eq!(teacher.experience.as_deref(), Some("5"));
        assert!(teacher.class_name.is_none());
    }

    #[tokio::test]
    async fn invalid_forms_never_reach_the_store() {
        let users = MemoryUserStore::default();
        let mut bad = form(UserType::Student, "not-an-email");
        bad.password = "123".into();
        bad.confirm_password = Some("1234".into());

        match register(&users, &settings(), bad).await {
            Err(AppError::Validation { message, errors }) => {
                assert_eq!(message, "Please enter a valid email address");
                assert_eq!(errors.len(), 3);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(users.list(None).await.unwrap().is_empty());
    }

    fn messages(form: &RegisterForm) -> Vec<String> {
        match validate_registration(form) {
            Ok(()) => Vec::new(),
            Err(AppError::Validation { errors, .. }) => errors,
            Err(other) => panic!("expected validation error, got {other:?}"),
        }
    }

    fn bare(kind: UserType) -> RegisterForm {
        RegisterForm {
            phone: None,
            city: None,
            subjects: None,
            class_name: None,
            experience: None,
            qualification: None,
            ..form(kind, "asha@example.com")
        }
    }

    #[test]
    fn bare_student_form_lists_missing_fields_in_form_order() {
        assert_eq!(
            messages(&bare(UserType::Student)),
            vec![
                "Please enter a valid phone number (10 digits)",
                "Please select your class",
                "Please select at least one subject",
                "City must be at least 2 characters long",
            ]
        );
    }

    #[test]
    fn bare_teacher_form_lists_missing_fields_in_form_order() {
        assert_eq!(
            messages(&bare(UserType::Teacher)),
            vec![
                "Please enter a valid phone number (10 digits)",
                "Please select at least one subject",
                "Please enter a valid experience (in years)",
                "Please select your qualification",
                "City must be at least 2 characters long",
            ]
        );
    }

    #[test]
    fn each_registration_rule_rejects_its_field() {
        let cases: &[(UserType, fn(&mut RegisterForm), &str)] = &[
            (UserType::Student, |f| f.name = " A ".into(), "Name must be at least 2 characters long"),
            (UserType::Student, |f| f.email = "asha@".into(), "Please enter a valid email address"),
            (UserType::Student, |f| f.phone = Some("12345".into()), "Please enter a valid phone number (10 digits)"),
            (UserType::Student, |f| f.class_name = Some("  ".into()), "Please select your class"),
            (UserType::Student, |f| f.subjects = Some(vec![" ".into()]), "Please select at least one subject"),
            (UserType::Teacher, |f| f.subjects = Some(Vec::new()), "Please select at least one subject"),
            (UserType::Teacher, |f| f.experience = Some("-1".into()), "Please enter a valid experience (in years)"),
            (UserType::Teacher, |f| f.experience = Some("five".into()), "Please enter a valid experience (in years)"),
            (UserType::Teacher, |f| f.qualification = None, "Please select your qualification"),
            (UserType::Teacher, |f| f.city = Some(" P ".into()), "City must be at least 2 characters long"),
            (UserType::Teacher, |f| f.password = "12345".into(), "Password must be at least 6 characters long"),
            (UserType::Teacher, |f| f.confirm_password = Some("other".into()), "Passwords do not match"),
        ];

        for &(kind, edit, expected) in cases {
            let mut f = form(kind, "asha@example.com");
            edit(&mut f);
            assert_eq!(messages(&f), vec![expected], "{kind} form");
        }
    }

    #[test]
    fn fields_of_the_other_type_are_not_required() {
        let mut student = form(UserType::Student, "asha@example.com");
        student.experience = None;
        student.qualification = None;
        assert!(messages(&student).is_empty());

        let mut teacher = form(UserType::Teacher, "ravi@example.com");
        teacher.class_name = None;
        teacher.experience = Some(" 0 ".into());
        assert!(messages(&teacher).is_empty());
    }

    #[tokio::test]
    async fn login_distinguishes_missing_user_from_bad_password() {
        let users = MemoryUserStore::default();
        register(&users, &settings(), form(UserType::Teacher, "ravi@example.com")).await.unwrap();

        let missing = login(
            &users,
            &settings(),
            LoginForm { email: "ravi@example.com".into(), password: "password123".into(), kind: UserType::Student },
        )
        .await
        .unwrap_err();
        assert!(matches!(missing, AppError::Unauthorized(ref m) if m == "User not found"));

        let wrong = login(
            &users,
            &settings(),
            LoginForm { email: "ravi@example.com".into(), password: "nope".into(), kind: UserType::Teacher },
        )
        .await
        .unwrap_err();
        assert!(matches!(wrong, AppError::Unauthorized(ref m) if m == "Invalid email or password"));
    }

    #[tokio::test]
    async fn login_token_resolves_to_the_account() {
        let users = MemoryUserStore::default();
        let teacher = register(&users, &settings(), form(UserType::Teacher, "ravi@example.com"))
            .await
            .unwrap();

        let session = login(
            &users,
            &settings(),
            LoginForm { email: "Ravi@Example.com".into(), password: "password123".into(), kind: UserType::Teacher },
        )
        .await
        .unwrap();

        let claims = verify_jwt_token(&session.access_token, "test-secret").unwrap();
        assert_eq!(claims.sub, teacher.id);
        assert_eq!(current_user(&users, &claims).await.unwrap().id, teacher.id);
        assert!(verify_jwt_token(&session.access_token, "other-secret").is_err());
    }
}
