//! Built-in functions
//!
//! Only the string, sequence and higher-order helpers that selectors need to
//! reshape a value before it is compared.

use super::EvalError;
use super::eval::{
    Evaluator, Item, collapse, field, push_flat, stringify, to_sequence, truthy,
};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Map,
    Filter,
    Match,
    Split,
    Replace,
    Contains,
    SubstringBefore,
    SubstringAfter,
    String,
    Lowercase,
    Uppercase,
    Trim,
    Join,
    Count,
    Exists,
    Not,
    Boolean,
    Keys,
    Lookup,
}

/// Name, builtin, minimum and maximum argument count
const BUILTINS: &[(&str, Builtin, usize, usize)] = &[
    ("map", Builtin::Map, 2, 2),
    ("filter", Builtin::Filter, 2, 2),
    ("match", Builtin::Match, 2, 3),
    ("split", Builtin::Split, 2, 3),
    ("replace", Builtin::Replace, 3, 4),
    ("contains", Builtin::Contains, 2, 2),
    ("substringBefore", Builtin::SubstringBefore, 2, 2),
    ("substringAfter", Builtin::SubstringAfter, 2, 2),
    ("string", Builtin::String, 0, 1),
    ("lowercase", Builtin::Lowercase, 1, 1),
    ("uppercase", Builtin::Uppercase, 1, 1),
    ("trim", Builtin::Trim, 1, 1),
    ("join", Builtin::Join, 1, 2),
    ("count", Builtin::Count, 1, 1),
    ("exists", Builtin::Exists, 1, 1),
    ("not", Builtin::Not, 1, 1),
    ("boolean", Builtin::Boolean, 1, 1),
    ("keys", Builtin::Keys, 1, 1),
    ("lookup", Builtin::Lookup, 2, 2),
];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(n, ..)| *n == name)
            .map(|(_, builtin, ..)| *builtin)
    }

    pub fn name(self) -> &'static str {
        self.entry().0
    }

    fn arity(self) -> (usize, usize) {
        let (_, _, min, max) = self.entry();
        (min, max)
    }

    fn entry(self) -> (&'static str, Builtin, usize, usize) {
        BUILTINS
            .iter()
            .copied()
            .find(|(_, builtin, ..)| *builtin == self)
            .unwrap_or(("unknown", self, 0, 0))
    }

    /// All names the evaluator resolves without a binding
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|(name, ..)| *name)
    }
}

impl Evaluator<'_> {
    pub(super) fn call_builtin<'e>(
        &self,
        builtin: Builtin,
        args: Vec<Item<'e>>,
        ctx: &Item<'e>,
    ) -> Result<Item<'e>, EvalError> {
        let (min, max) = builtin.arity();
        let count = args.len();
        if count < min || count > max {
            return Err(EvalError::Arity {
                function: builtin.name(),
                expected: if min == max {
                    min.to_string()
                } else {
                    format!("{} to {}", min, max)
                },
                found: count,
            });
        }

        let name = builtin.name();
        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(Item::Undefined);

        match builtin {
            Builtin::Map => {
                let sequence = next();
                let function = next();
                self.map(sequence, &function, ctx)
            }
            Builtin::Filter => {
                let sequence = next();
                let function = next();
                self.filter_with(sequence, &function, ctx)
            }
            Builtin::Match => {
                let Some(input) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                let pattern = next();
                let limit = limit_arg(next(), name)?.unwrap_or(usize::MAX);
                let Item::Regex(regex) = pattern else {
                    return Err(EvalError::TypeMismatch(
                        "$match expects a regex pattern".to_string(),
                    ));
                };

                let mut matches = Vec::new();
                for captures in regex.captures_iter(&input).take(limit) {
                    let Some(whole) = captures.get(0) else {
                        continue;
                    };
                    let groups: Vec<&str> = captures
                        .iter()
                        .skip(1)
                        .map(|group| group.map(|m| m.as_str()).unwrap_or_default())
                        .collect();
                    matches.push(Item::Json(json!({
                        "match": whole.as_str(),
                        "index": whole.start(),
                        "groups": groups,
                    })));
                }
                Ok(collapse(matches))
            }
            Builtin::Split => {
                let Some(input) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                let separator = next();
                let limit = limit_arg(next(), name)?.unwrap_or(usize::MAX);

                let parts: Vec<String> = match separator {
                    Item::Json(Value::String(sep)) if sep.is_empty() => {
                        input.chars().map(String::from).collect()
                    }
                    Item::Json(Value::String(sep)) => {
                        input.split(sep.as_str()).map(String::from).collect()
                    }
                    Item::Regex(regex) => regex.split(&input).map(String::from).collect(),
                    _ => {
                        return Err(EvalError::TypeMismatch(
                            "$split expects a string or regex separator".to_string(),
                        ));
                    }
                };

                Ok(Item::Json(Value::Array(
                    parts.into_iter().take(limit).map(Value::String).collect(),
                )))
            }
            Builtin::Replace => {
                let Some(input) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                let pattern = next();
                let replacement = string_arg(next(), name)?.ok_or_else(|| {
                    EvalError::TypeMismatch("$replace expects a replacement string".to_string())
                })?;
                let limit = limit_arg(next(), name)?;

                let replaced = match pattern {
                    Item::Json(Value::String(p)) if !p.is_empty() => match limit {
                        Some(n) => input.replacen(&p, &replacement, n),
                        None => input.replace(&p, &replacement),
                    },
                    Item::Regex(regex) => regex
                        .replacen(&input, limit.unwrap_or(0), replacement.as_str())
                        .into_owned(),
                    _ => {
                        return Err(EvalError::TypeMismatch(
                            "$replace expects a non-empty string or regex pattern".to_string(),
                        ));
                    }
                };
                Ok(Item::Json(Value::String(replaced)))
            }
            Builtin::Contains => {
                let Some(input) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                let found = match next() {
                    Item::Json(Value::String(p)) => input.contains(p.as_str()),
                    Item::Regex(regex) => regex.is_match(&input),
                    _ => {
                        return Err(EvalError::TypeMismatch(
                            "$contains expects a string or regex pattern".to_string(),
                        ));
                    }
                };
                Ok(Item::Json(Value::Bool(found)))
            }
            Builtin::SubstringBefore | Builtin::SubstringAfter => {
                let Some(input) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                let needle = string_arg(next(), name)?.unwrap_or_default();
                let result = match input.find(&needle) {
                    Some(at) if builtin == Builtin::SubstringBefore => input[..at].to_string(),
                    Some(at) => input[at + needle.len()..].to_string(),
                    None => input,
                };
                Ok(Item::Json(Value::String(result)))
            }
            Builtin::String => {
                let value = if count == 0 { ctx.clone() } else { next() };
                if value.is_undefined() {
                    return Ok(Item::Undefined);
                }
                Ok(Item::Json(Value::String(stringify(&value)?)))
            }
            Builtin::Lowercase | Builtin::Uppercase | Builtin::Trim => {
                let Some(input) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                let result = match builtin {
                    Builtin::Lowercase => input.to_lowercase(),
                    Builtin::Uppercase => input.to_uppercase(),
                    _ => input.split_whitespace().collect::<Vec<_>>().join(" "),
                };
                Ok(Item::Json(Value::String(result)))
            }
            Builtin::Join => {
                let sequence = next();
                if sequence.is_undefined() {
                    return Ok(Item::Undefined);
                }
                let separator = string_arg(next(), name)?.unwrap_or_default();
                let mut parts = Vec::new();
                for item in to_sequence(sequence) {
                    match item {
                        Item::Json(Value::String(s)) => parts.push(s),
                        _ => {
                            return Err(EvalError::TypeMismatch(
                                "$join expects an array of strings".to_string(),
                            ));
                        }
                    }
                }
                Ok(Item::Json(Value::String(parts.join(&separator))))
            }
            Builtin::Count => Ok(Item::Json(Value::from(to_sequence(next()).len()))),
            Builtin::Exists => Ok(Item::Json(Value::Bool(!next().is_undefined()))),
            Builtin::Not | Builtin::Boolean => {
                let value = next();
                if value.is_undefined() {
                    return Ok(Item::Undefined);
                }
                let result = truthy(&value);
                Ok(Item::Json(Value::Bool(if builtin == Builtin::Not {
                    !result
                } else {
                    result
                })))
            }
            Builtin::Keys => {
                let mut keys: Vec<String> = Vec::new();
                for item in to_sequence(next()) {
                    if let Item::Json(Value::Object(map)) = item {
                        for key in map.keys() {
                            if !keys.contains(key) {
                                keys.push(key.clone());
                            }
                        }
                    }
                }
                Ok(collapse(
                    keys.into_iter()
                        .map(|k| Item::Json(Value::String(k)))
                        .collect(),
                ))
            }
            Builtin::Lookup => {
                let object = next();
                let Some(key) = string_arg(next(), name)? else {
                    return Ok(Item::Undefined);
                };
                Ok(field(&object, &key))
            }
        }
    }

    fn map<'e>(
        &self,
        sequence: Item<'e>,
        function: &Item<'e>,
        ctx: &Item<'e>,
    ) -> Result<Item<'e>, EvalError> {
        let arity = callable_arity(function)?;
        let items = to_sequence(sequence);
        let array = as_array(&items);

        let mut out = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let result = self.apply(function, callback_args(item, idx, &array, arity), ctx)?;
            if !result.is_undefined() {
                out.push(result);
            }
        }
        Ok(collapse(out))
    }

    fn filter_with<'e>(
        &self,
        sequence: Item<'e>,
        function: &Item<'e>,
        ctx: &Item<'e>,
    ) -> Result<Item<'e>, EvalError> {
        let arity = callable_arity(function)?;
        let items = to_sequence(sequence);
        let array = as_array(&items);

        let mut kept = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let verdict = self.apply(function, callback_args(item, idx, &array, arity), ctx)?;
            if truthy(&verdict) {
                push_flat(&mut kept, item.clone());
            }
        }
        Ok(collapse(kept))
    }
}

fn callable_arity(function: &Item<'_>) -> Result<usize, EvalError> {
    match function {
        Item::Function(callable) => Ok(callable.arity()),
        _ => Err(EvalError::NotCallable(
            "higher-order argument".to_string(),
        )),
    }
}

fn as_array<'e>(items: &[Item<'e>]) -> Item<'e> {
    Item::Json(Value::Array(
        items.iter().cloned().filter_map(Item::into_json).collect(),
    ))
}

/// `(value, index, array)` truncated to what the callback declares
fn callback_args<'e>(item: &Item<'e>, idx: usize, array: &Item<'e>, arity: usize) -> Vec<Item<'e>> {
    [item.clone(), Item::Json(Value::from(idx)), array.clone()]
        .into_iter()
        .take(arity.max(1))
        .collect()
}

fn string_arg(item: Item<'_>, function: &str) -> Result<Option<String>, EvalError> {
    match item {
        Item::Undefined => Ok(None),
        Item::Json(Value::String(s)) => Ok(Some(s)),
        _ => Err(EvalError::TypeMismatch(format!(
            "${} expects a string argument",
            function
        ))),
    }
}

fn limit_arg(item: Item<'_>, function: &str) -> Result<Option<usize>, EvalError> {
    match item {
        Item::Undefined => Ok(None),
        Item::Json(Value::Number(n)) => match n.as_f64() {
            Some(f) if f >= 0.0 => Ok(Some(f.floor() as usize)),
            _ => Err(EvalError::TypeMismatch(format!(
                "${} limit must be a non-negative number",
                function
            ))),
        },
        _ => Err(EvalError::TypeMismatch(format!(
            "${} limit must be a number",
            function
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Builtin::from_name("substringAfter"), Some(Builtin::SubstringAfter));
        assert_eq!(Builtin::from_name("nope"), None);
        assert_eq!(Builtin::Map.name(), "map");
    }

    #[test]
    fn test_every_builtin_has_a_name() {
        assert_eq!(Builtin::names().count(), BUILTINS.len());
        for (name, builtin, min, max) in BUILTINS {
            assert_eq!(Builtin::from_name(name), Some(*builtin));
            assert!(min <= max, "bad arity for {}", name);
        }
    }

    #[test]
    fn test_callback_args_truncate() {
        let item = Item::Json(json!("a"));
        let array = Item::Json(json!(["a"]));
        assert_eq!(callback_args(&item, 0, &array, 1).len(), 1);
        assert_eq!(callback_args(&item, 0, &array, 2).len(), 2);
        assert_eq!(callback_args(&item, 0, &array, 5).len(), 3);
    }
}
