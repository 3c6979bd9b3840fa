/// Rider registration

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::session::{complete_registration, FullNameInput};
use crate::domain::{FullName, NewUser, User};
use crate::error::AppError;
use crate::middleware::SessionVerifier;
use crate::validators::{check_password, parse_email, parse_name, parse_optional_name, FieldErrors};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterUserRequest {
    pub fullname: FullNameInput,
    pub email: String,
    pub password: String,
}

impl RegisterUserRequest {
    /// Validate every field, returning the draft and the plaintext password.
    pub fn into_draft(self) -> Result<(NewUser, String), AppError> {
        let mut errors = FieldErrors::new();

        let firstname = errors.check(parse_name("fullname.firstname", &self.fullname.firstname));
        let lastname = errors.check(parse_optional_name(
            "fullname.lastname",
            self.fullname.lastname.as_deref(),
        ));
        let email = errors.check(parse_email(&self.email));
        errors.check(check_password(&self.password));

        let draft = match (firstname, lastname, email) {
            (Some(firstname), Some(lastname), Some(email)) => Some(NewUser {
                fullname: FullName {
                    firstname,
                    lastname,
                },
                email,
            }),
            _ => None,
        };

        Ok((errors.into_result(draft)?, self.password))
    }
}

/// POST /users/register
///
/// # Errors
/// - 400: Validation errors, listed per field
/// - 400: Email already in use
/// - 500: Internal server error
pub async fn register_user(
    form: web::Json<RegisterUserRequest>,
    verifier: web::Data<SessionVerifier<User>>,
) -> Result<HttpResponse, AppError> {
    let (draft, password) = form.into_inner().into_draft()?;
    complete_registration(draft, password, verifier.get_ref()).await
}
