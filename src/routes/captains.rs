/// Captain registration

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::session::{complete_registration, FullNameInput};
use crate::domain::{Captain, FullName, NewCaptain};
use crate::error::AppError;
use crate::middleware::SessionVerifier;
use crate::validators::{
    check_password, parse_email, parse_name, parse_vehicle, FieldErrors, VehicleFields,
};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct VehicleInput {
    pub color: String,
    pub plate: String,
    pub capacity: Option<i64>,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterCaptainRequest {
    pub fullname: FullNameInput,
    pub email: String,
    pub password: String,
    pub vehicle: VehicleInput,
}

impl RegisterCaptainRequest {
    /// Validate every field, returning the draft and the plaintext password.
    ///
    /// Unlike riders, captains must give a last name.
    pub fn into_draft(self) -> Result<(NewCaptain, String), AppError> {
        let mut errors = FieldErrors::new();

        let firstname = errors.check(parse_name("fullname.firstname", &self.fullname.firstname));
        let lastname = errors.check(parse_name(
            "fullname.lastname",
            self.fullname.lastname.as_deref().unwrap_or(""),
        ));
        let email = errors.check(parse_email(&self.email));
        errors.check(check_password(&self.password));
        let vehicle = parse_vehicle(
            VehicleFields {
                color: &self.vehicle.color,
                plate: &self.vehicle.plate,
                capacity: self.vehicle.capacity,
                vehicle_type: &self.vehicle.vehicle_type,
            },
            &mut errors,
        );

        let draft = match (firstname, lastname, email, vehicle) {
            (Some(firstname), Some(lastname), Some(email), Some(vehicle)) => Some(NewCaptain {
                fullname: FullName {
                    firstname,
                    lastname: Some(lastname),
                },
                email,
                vehicle,
            }),
            _ => None,
        };

        Ok((errors.into_result(draft)?, self.password))
    }
}

/// POST /captains/register
///
/// # Errors
/// - 400: Validation errors, listed per field
/// - 400: Email already in use
/// - 500: Internal server error
pub async fn register_captain(
    form: web::Json<RegisterCaptainRequest>,
    verifier: web::Data<SessionVerifier<Captain>>,
) -> Result<HttpResponse, AppError> {
    let (draft, password) = form.into_inner().into_draft()?;
    complete_registration(draft, password, verifier.get_ref()).await
}
