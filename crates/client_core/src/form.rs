//! Create/edit session for a single record.

use std::fmt;

use shared::domain::{
    Car, Coordinates, HumanBeing, HumanBeingCreateRequest, HumanBeingId, HumanBeingUpdateRequest,
    Mood, WeaponType,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{ClientResult, RecordApi};

pub const MAX_COORDINATE_X: i64 = 15;
pub const MAX_COORDINATE_Y: f64 = 277.0;
pub const MAX_IMPACT_SPEED: f64 = 664.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    Name,
    CoordinateX,
    CoordinateY,
    ImpactSpeed,
    WeaponType,
    CarName,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CoordinateX => "coordinates.x",
            Self::CoordinateY => "coordinates.y",
            Self::ImpactSpeed => "impactSpeed",
            Self::WeaponType => "weaponType",
            Self::CarName => "car.name",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Editable inputs as the user typed them. Numeric fields stay textual until
/// validation so that "required" and "not a number" can be told apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    pub name: String,
    pub x: String,
    pub y: String,
    pub real_hero: bool,
    pub has_toothpick: Option<bool>,
    pub car: Option<Car>,
    pub mood: Option<Mood>,
    pub impact_speed: String,
    pub soundtrack_name: String,
    pub weapon_type: Option<WeaponType>,
}

impl FormDraft {
    pub fn from_record(record: &HumanBeing) -> Self {
        Self {
            name: record.name.clone(),
            x: record.coordinates.x.to_string(),
            y: record.coordinates.y.to_string(),
            real_hero: record.real_hero,
            has_toothpick: record.has_toothpick,
            car: record.car.clone(),
            mood: record.mood,
            impact_speed: record.impact_speed.to_string(),
            soundtrack_name: record.soundtrack_name.clone(),
            weapon_type: Some(record.weapon_type),
        }
    }

    /// Checks the client-side constraints and builds the request payload.
    /// Every failing field is reported, not just the first.
    pub fn validate(&self) -> Result<HumanBeingCreateRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new(FormField::Name, "Name is required"));
        }

        let x = required_field(&self.x, FormField::CoordinateX, "X", &mut errors)
            .and_then(|raw| match raw.parse::<i64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(FieldError::new(
                        FormField::CoordinateX,
                        "X must be a whole number",
                    ));
                    None
                }
            })
            .filter(|value| {
                let ok = *value <= MAX_COORDINATE_X;
                if !ok {
                    errors.push(FieldError::new(FormField::CoordinateX, "X cannot exceed 15"));
                }
                ok
            });

        let y = required_field(&self.y, FormField::CoordinateY, "Y", &mut errors)
            .and_then(|raw| parse_decimal(raw, FormField::CoordinateY, "Y", &mut errors))
            .filter(|value| {
                let ok = *value <= MAX_COORDINATE_Y;
                if !ok {
                    errors.push(FieldError::new(FormField::CoordinateY, "Y cannot exceed 277"));
                }
                ok
            });

        let impact_speed = required_field(
            &self.impact_speed,
            FormField::ImpactSpeed,
            "Impact speed",
            &mut errors,
        )
        .and_then(|raw| parse_decimal(raw, FormField::ImpactSpeed, "Impact speed", &mut errors))
        .filter(|value| {
            let ok = *value <= MAX_IMPACT_SPEED;
            if !ok {
                errors.push(FieldError::new(
                    FormField::ImpactSpeed,
                    "Impact speed cannot exceed 664",
                ));
            }
            ok
        });

        if self.weapon_type.is_none() {
            errors.push(FieldError::new(FormField::WeaponType, "Weapon type is required"));
        }

        if matches!(&self.car, Some(car) if car.name.trim().is_empty()) {
            errors.push(FieldError::new(FormField::CarName, "Car name is required"));
        }

        match (x, y, impact_speed, self.weapon_type) {
            (Some(x), Some(y), Some(impact_speed), Some(weapon_type)) if errors.is_empty() => {
                Ok(HumanBeingCreateRequest {
                    name: name.to_string(),
                    coordinates: Coordinates { x, y },
                    real_hero: self.real_hero,
                    has_toothpick: self.has_toothpick,
                    car: self.car.clone().map(|car| Car {
                        name: car.name.trim().to_string(),
                        cool: car.cool,
                    }),
                    mood: self.mood,
                    impact_speed,
                    soundtrack_name: self.soundtrack_name.trim().to_string(),
                    weapon_type,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required_field<'a>(
    raw: &'a str,
    field: FormField,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
        return None;
    }
    Some(raw)
}

fn parse_decimal(
    raw: &str,
    field: FormField,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.push(FieldError::new(field, format!("{label} must be a number")));
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(HumanBeingCreateRequest),
    Update(HumanBeingId, HumanBeingUpdateRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(Vec<FieldError>),
    Saved(HumanBeing),
    /// The backend rejected the request; the session stays open.
    Failed(String),
}

#[derive(Debug, Default)]
pub struct FormController {
    open: bool,
    editing: Option<HumanBeing>,
    submitting: bool,
    errors: Vec<FieldError>,
    last_error: Option<String>,
}

impl FormController {
    pub fn open_create(&mut self) -> FormDraft {
        self.reset();
        self.open = true;
        FormDraft::default()
    }

    pub fn open_edit(&mut self, record: HumanBeing) -> FormDraft {
        self.reset();
        let draft = FormDraft::from_record(&record);
        self.editing = Some(record);
        self.open = true;
        draft
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn editing(&self) -> Option<&HumanBeing> {
        self.editing.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Human Being"
        } else {
            "Create Human Being"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Update"
        } else {
            "Create"
        }
    }

    /// Validates `draft` and decides between create and update. On success the
    /// controller is marked as submitting until [`FormController::finish`].
    pub fn prepare(&mut self, draft: &FormDraft) -> Result<Submission, Vec<FieldError>> {
        let fields = match draft.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(errors);
            }
        };
        self.errors.clear();
        self.last_error = None;
        self.submitting = true;

        Ok(match &self.editing {
            Some(record) => {
                Submission::Update(record.id, HumanBeingUpdateRequest::new(record.id, fields))
            }
            None => Submission::Create(fields),
        })
    }

    pub fn finish(&mut self, result: ClientResult<HumanBeing>) -> SubmitOutcome {
        self.submitting = false;
        match result {
            Ok(record) => {
                info!(id = %record.id, "record saved");
                self.reset();
                SubmitOutcome::Saved(record)
            }
            Err(err) => {
                let message = err.user_message();
                warn!(error = %message, "record submission failed");
                self.last_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub async fn submit(&mut self, api: &dyn RecordApi, draft: &FormDraft) -> SubmitOutcome {
        let submission = match self.prepare(draft) {
            Ok(submission) => submission,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };
        let result = match &submission {
            Submission::Create(request) => api.create(request).await,
            Submission::Update(id, request) => api.update(*id, request).await,
        };
        self.finish(result)
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
