use crate::domain::{
    entities::{Action, Blueprint, Recipe},
    error::DomainError,
};

/// Centralized domain validation.
///
/// Entities carry their own rules; this is the single entry point the
/// application layer calls before anything executes.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_recipe(recipe: &Recipe) -> Result<(), DomainError> {
        recipe.validate()
    }

    pub fn validate_blueprint(blueprint: &Blueprint) -> Result<(), DomainError> {
        blueprint.validate()
    }

    pub fn validate_action(action: &Action) -> Result<(), DomainError> {
        action.validate()
    }
}
