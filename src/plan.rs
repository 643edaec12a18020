//! Schema-driven planning shared by every resource.

use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ProviderError> {
    value
        .as_object()
        .ok_or_else(|| ProviderError::Validation(format!("{what} must be an object")))
}

fn attribute_value<'a>(object: &'a Map<String, Value>, name: &str) -> &'a Value {
    object.get(name).unwrap_or(&Value::Null)
}

/// Plan a resource change from prior state to proposed state.
///
/// - No prior state: create. Every non-null configurable attribute is added.
/// - Null proposed state: destroy. Every non-null prior attribute is removed.
/// - Otherwise each configurable attribute is compared; a change to a
///   `force_new` attribute requires replacement. Computed attributes keep their
///   prior value unless the resource is replaced.
pub fn plan(
    schema: &Schema,
    prior_state: Option<&Value>,
    proposed_state: &Value,
) -> Result<PlanResult, ProviderError> {
    let prior_state = prior_state.filter(|state| !state.is_null());

    let Some(prior_state) = prior_state else {
        if proposed_state.is_null() {
            return Ok(PlanResult::no_change(Value::Null));
        }
        return plan_create(schema, proposed_state);
    };

    if proposed_state.is_null() {
        return plan_destroy(prior_state);
    }

    plan_update(schema, prior_state, proposed_state)
}

fn plan_create(schema: &Schema, proposed_state: &Value) -> Result<PlanResult, ProviderError> {
    let proposed = as_object(proposed_state, "proposed state")?;
    let changes = schema
        .block
        .attributes
        .iter()
        .filter(|(_, attr)| attr.flags.is_configurable())
        .filter_map(|(name, _)| {
            proposed
                .get(name)
                .filter(|value| !value.is_null())
                .map(|value| AttributeChange::added(name.clone(), value.clone()))
        })
        .collect();

    Ok(PlanResult::with_changes(proposed_state.clone(), changes, false))
}

fn plan_destroy(prior_state: &Value) -> Result<PlanResult, ProviderError> {
    let prior = as_object(prior_state, "prior state")?;
    let changes = prior
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| AttributeChange::removed(name.clone(), value.clone()))
        .collect();

    Ok(PlanResult::with_changes(Value::Null, changes, false))
}

fn plan_update(
    schema: &Schema,
    prior_state: &Value,
    proposed_state: &Value,
) -> Result<PlanResult, ProviderError> {
    let prior = as_object(prior_state, "prior state")?;
    let proposed = as_object(proposed_state, "proposed state")?;

    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.block.attributes {
        if !attr.flags.is_configurable() {
            continue;
        }
        let before = attribute_value(prior, name);
        let after = attribute_value(proposed, name);

        // A provider-filled value is not a diff when the user leaves it unset.
        if attr.flags.computed && after.is_null() {
            continue;
        }
        if before != after {
            requires_replace |= attr.force_new;
            changes.push(AttributeChange::modified(
                name.clone(),
                before.clone(),
                after.clone(),
            ));
        }
    }

    let mut planned = proposed.clone();
    for (name, attr) in &schema.block.attributes {
        if !attr.flags.computed || !attribute_value(proposed, name).is_null() {
            continue;
        }
        let value = if requires_replace {
            Value::Null
        } else {
            attribute_value(prior, name).clone()
        };
        planned.insert(name.clone(), value);
    }

    let planned = Value::Object(planned);
    if changes.is_empty() {
        Ok(PlanResult::no_change(planned))
    } else {
        Ok(PlanResult::with_changes(planned, changes, requires_replace))
    }
}
