use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::error::TypeError;
use crate::constants::TITLE_MAX_LENGTH;
use crate::schema::Uuid;

pub type FormData = HashMap<String, Value>;

pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    fn get(&self, key: &str) -> Result<&Value, TypeError> {
        match self.inner.get(key) {
            Some(Value::Null) | None => Err(TypeError::new(key, "This field is required")),
            Some(value) => Ok(value),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.get(key)?.as_str() {
            Some(v) if v.trim().is_empty() => Err(TypeError::new(key, "This field may not be blank")),
            Some(v) => Ok(v.to_string()),
            None => Err(TypeError::new(key, "Not a valid string")),
        }
    }

    /// Accepts JSON integers and integer strings, the way form posts arrive.
    pub fn get_positive_int(&self, key: &str) -> Result<i32, TypeError> {
        let value = self.get(key)?;
        let number = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match number {
            Some(n) if n >= 1 && n <= i32::MAX as i64 => Ok(n as i32),
            Some(_) => Err(TypeError::new(key, "Ensure this value is a positive integer")),
            None => Err(TypeError::new(key, "A valid integer is required")),
        }
    }

    pub fn get_list(&self, key: &str) -> Result<&Vec<Value>, TypeError> {
        match self.get(key)?.as_array() {
            Some(list) => Ok(list),
            None => Err(TypeError::new(key, "Expected a list of items")),
        }
    }

    pub fn get_optional<T, F>(&self, key: &str, getter: F) -> Result<Option<T>, TypeError>
    where
        F: Fn(&Self, &str) -> Result<T, TypeError>,
    {
        if self.contains(key) {
            getter(self, key).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// One `(ingredient, amount)` pair of a write payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionWrite {
    pub ingredient_id: Uuid,
    pub amount: f64,
}

impl TryFrom<&Value> for CompositionWrite {
    type Error = TypeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let item = value
            .as_object()
            .ok_or_else(|| TypeError::new("ingredients", "Each item must be an object"))?;

        let ingredient_id = match item.get("id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .filter(|id| *id >= 1 && *id <= i32::MAX as i64)
        .ok_or_else(|| TypeError::new("ingredients", "Each item needs a valid ingredient id"))?;

        let amount = match item.get("amount") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| TypeError::new("ingredients", "Each item needs a numeric amount"))?;

        if !amount.is_finite() || amount <= 0. {
            return Err(TypeError::new(
                "ingredients",
                "Ingredient amount must be greater than zero",
            ));
        }

        Ok(Self {
            ingredient_id: ingredient_id as Uuid,
            amount,
        })
    }
}

fn parse_compositions(form: &Form, key: &str) -> Result<Vec<CompositionWrite>, TypeError> {
    let list = form.get_list(key)?;
    if list.is_empty() {
        return Err(TypeError::new(key, "At least one ingredient is required"));
    }

    let parts = list
        .iter()
        .map(CompositionWrite::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    if parts.iter().any(|p| !seen.insert(p.ingredient_id)) {
        return Err(TypeError::new(key, "Ingredients must not repeat"));
    }

    Ok(parts)
}

fn parse_title(form: &Form, key: &str) -> Result<String, TypeError> {
    let title = form.get_str(key)?;
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(TypeError::new(
            key,
            &format!("Ensure this field has no more than {TITLE_MAX_LENGTH} characters"),
        ));
    }
    Ok(title)
}

/// Body of `POST /recipes`. Only identifiers and scalars; the author comes
/// from the session.
#[derive(Debug, Clone)]
pub struct RecipeWrite {
    pub title: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub ingredients: Vec<CompositionWrite>,
}

impl TryFrom<Form> for RecipeWrite {
    type Error = TypeError;

    fn try_from(form: Form) -> Result<Self, Self::Error> {
        Ok(Self {
            ingredients: parse_compositions(&form, "ingredients")?,
            image: form.get_str("image")?,
            title: parse_title(&form, "title")?,
            text: form.get_str("text")?,
            cooking_time: form.get_positive_int("cooking_time")?,
        })
    }
}

/// Body of `PATCH /recipes/{id}`. Absent fields are left untouched; a present
/// ingredient list replaces the stored one.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<CompositionWrite>>,
}

impl TryFrom<Form> for RecipePatch {
    type Error = TypeError;

    fn try_from(form: Form) -> Result<Self, Self::Error> {
        Ok(Self {
            ingredients: form.get_optional("ingredients", parse_compositions)?,
            image: form.get_optional("image", Form::get_str)?,
            title: form.get_optional("title", parse_title)?,
            text: form.get_optional("text", Form::get_str)?,
            cooking_time: form.get_optional("cooking_time", Form::get_positive_int)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(value: Value) -> Form {
        let data: FormData = serde_json::from_value(value).unwrap();
        Form::from_data(data)
    }

    fn valid_body() -> Value {
        json!({
            "title": "Pancakes",
            "text": "Mix and fry",
            "cooking_time": 20,
            "image": "data:image/png;base64,AAAA",
            "ingredients": [{"id": 1, "amount": 200}, {"id": 2, "amount": 100.5}],
        })
    }

    #[test]
    fn parses_complete_write_payload() {
        let recipe = RecipeWrite::try_from(form(valid_body())).unwrap();

        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(
            recipe.ingredients,
            vec![
                CompositionWrite { ingredient_id: 1, amount: 200. },
                CompositionWrite { ingredient_id: 2, amount: 100.5 },
            ]
        );
    }

    #[test]
    fn rejects_non_positive_cooking_time() {
        for bad in [json!(0), json!(-5), json!(1.5), json!("abc")] {
            let mut body = valid_body();
            body["cooking_time"] = bad;

            let err = RecipeWrite::try_from(form(body)).unwrap_err();
            assert_eq!(err.field(), "cooking_time");
        }
    }

    #[test]
    fn rejects_missing_fields() {
        for key in ["title", "text", "image", "cooking_time", "ingredients"] {
            let mut body = valid_body();
            body.as_object_mut().unwrap().remove(key);

            let err = RecipeWrite::try_from(form(body)).unwrap_err();
            assert_eq!(err.field(), key);
        }
    }

    #[test]
    fn rejects_bad_ingredient_lists() {
        let cases = [
            json!([]),
            json!([{"id": 1, "amount": 0}]),
            json!([{"id": 1, "amount": -3}]),
            json!([{"id": 1}]),
            json!([{"amount": 5}]),
            json!([{"id": 1, "amount": 5}, {"id": 1, "amount": 7}]),
            json!({"id": 1, "amount": 5}),
        ];

        for bad in cases {
            let mut body = valid_body();
            body["ingredients"] = bad;

            let err = RecipeWrite::try_from(form(body)).unwrap_err();
            assert_eq!(err.field(), "ingredients");
        }
    }

    #[test]
    fn rejects_overlong_title() {
        let mut body = valid_body();
        body["title"] = json!("x".repeat(TITLE_MAX_LENGTH + 1));

        assert!(RecipeWrite::try_from(form(body)).is_err());
    }

    #[test]
    fn patch_keeps_absent_fields_empty() {
        let patch = RecipePatch::try_from(form(json!({"title": "Waffles"}))).unwrap();

        assert_eq!(patch.title.as_deref(), Some("Waffles"));
        assert!(patch.ingredients.is_none());
        assert!(patch.cooking_time.is_none());
    }

    #[test]
    fn patch_validates_present_ingredients() {
        let err = RecipePatch::try_from(form(json!({
            "ingredients": [{"id": 1, "amount": 150}, {"id": 2, "amount": 0}],
        })))
        .unwrap_err();

        assert_eq!(err.field(), "ingredients");
    }

    #[test]
    fn patch_rejects_explicit_null() {
        assert!(RecipePatch::try_from(form(json!({"title": null}))).is_err());
    }
}
