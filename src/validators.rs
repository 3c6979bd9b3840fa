/// Input validators
///
/// Field rules for registration and login payloads. Each rule returns the
/// cleaned value or a `ValidationError`; `FieldErrors` collects every failure
/// of a request so the client gets the whole list at once.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::{Vehicle, VehicleType};
use crate::error::{AppError, ValidationError};

pub const MIN_EMAIL_LENGTH: usize = 5;
pub const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
pub const MIN_NAME_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 64;
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// bcrypt ignores everything past the 72nd byte.
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MIN_VEHICLE_FIELD_LENGTH: usize = 3;
pub const MAX_VEHICLE_FIELD_LENGTH: usize = 32;
pub const MIN_CAPACITY: i64 = 1;
pub const MAX_CAPACITY: i64 = 64;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Accumulates rule failures across the fields of one request.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<ValidationError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value on success, record the failure otherwise.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Err` with every recorded failure, if there were any.
    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }

    /// Like [`finish`](Self::finish), but hands back the value built from the
    /// checked fields.
    pub fn into_result<T>(self, value: Option<T>) -> Result<T, AppError> {
        self.finish()?;
        value.ok_or_else(|| AppError::Internal("validated input produced no value".to_string()))
    }
}

/// Trimmed, lower-cased email.
pub fn parse_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    let field = "email".to_string();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort(field, MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) || has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::InvalidFormat(field));
    }

    Ok(trimmed.to_lowercase())
}

/// A required name part (`fullname.firstname`, or `fullname.lastname` for captains).
pub fn parse_name(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    check_length(field, trimmed, MIN_NAME_LENGTH, MAX_NAME_LENGTH)?;
    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// An optional name part: absent or blank is fine, otherwise same rules as
/// [`parse_name`].
pub fn parse_optional_name(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => parse_name(field, name).map(Some),
    }
}

/// Length rules only; the password is hashed verbatim (no trimming).
///
/// The upper bound is in bytes, not characters, so two accepted passwords
/// always differ somewhere bcrypt looks.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    let field = "password";
    if password.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(field.to_string(), MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooManyBytes(field.to_string(), MAX_PASSWORD_BYTES));
    }
    Ok(())
}

/// Raw vehicle fields as posted by a registering captain.
pub struct VehicleFields<'a> {
    pub color: &'a str,
    pub plate: &'a str,
    pub capacity: Option<i64>,
    pub vehicle_type: &'a str,
}

pub fn parse_vehicle(fields: VehicleFields<'_>, errors: &mut FieldErrors) -> Option<Vehicle> {
    let color = errors.check(parse_vehicle_text("vehicle.color", fields.color));
    let plate = errors.check(parse_vehicle_text("vehicle.plate", fields.plate));
    let capacity = errors.check(parse_capacity(fields.capacity));
    let vehicle_type = errors.check(parse_vehicle_type(fields.vehicle_type));

    Some(Vehicle {
        color: color?,
        plate: plate?,
        capacity: capacity?,
        vehicle_type: vehicle_type?,
    })
}

fn parse_vehicle_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    check_length(field, trimmed, MIN_VEHICLE_FIELD_LENGTH, MAX_VEHICLE_FIELD_LENGTH)?;
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_capacity(capacity: Option<i64>) -> Result<i32, ValidationError> {
    let field = "vehicle.capacity".to_string();
    match capacity {
        None => Err(ValidationError::EmptyField(field)),
        Some(c) if c < MIN_CAPACITY => Err(ValidationError::BelowMinimum(field, MIN_CAPACITY)),
        Some(c) if c > MAX_CAPACITY => Err(ValidationError::AboveMaximum(field, MAX_CAPACITY)),
        Some(c) => Ok(c as i32),
    }
}

fn parse_vehicle_type(value: &str) -> Result<VehicleType, ValidationError> {
    let field = "vehicle.vehicleType";
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    trimmed
        .to_lowercase()
        .parse::<VehicleType>()
        .map_err(|_| ValidationError::NotAllowed(field.to_string(), VehicleType::ALLOWED))
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort(field.to_string(), min));
    }
    if len > max {
        return Err(ValidationError::TooLong(field.to_string(), max));
    }
    Ok(())
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    // Local part longer than RFC 5321 allows
    if let Some(at_pos) = email.find('@') {
        if email[..at_pos].len() > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}

fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    let special_char_count = name
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '.' | '\''))
        .count();

    special_char_count > 5
}
