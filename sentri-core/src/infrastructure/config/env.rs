// sentri-core/src/infrastructure/config/env.rs

use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

use crate::infrastructure::error::InfrastructureError;

fn re_env_var() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Replaces every `${VAR}` inside string scalars with the process environment value.
pub fn substitute_env(value: &mut Value) -> Result<(), InfrastructureError> {
    substitute_with(value, "", &|name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an explicit lookup. Errors name the YAML path
/// of the offending scalar (`a.b[0]`).
pub fn substitute_with(
    value: &mut Value,
    path: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<(), InfrastructureError> {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = expand(s, path, lookup)?;
            }
        }
        Value::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                let key = match key {
                    Value::String(k) => k.clone(),
                    other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
                };
                let child_path = if path.is_empty() {
                    key
                } else {
                    format!("{path}.{key}")
                };
                substitute_with(child, &child_path, lookup)?;
            }
        }
        Value::Sequence(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                substitute_with(child, &format!("{path}[{i}]"), lookup)?;
            }
        }
        Value::Tagged(tagged) => substitute_with(&mut tagged.value, path, lookup)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

fn expand(
    text: &str,
    path: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String, InfrastructureError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re_env_var().captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let var = name.as_str().trim();
        let resolved = lookup(var).ok_or_else(|| InfrastructureError::EnvVarMissing {
            var: var.to_string(),
            path: if path.is_empty() { "<root>".into() } else { path.to_string() },
        })?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(&resolved);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn env(name: &str) -> Option<String> {
        match name {
            "DATA_DIR" => Some("/srv/data".into()),
            "USER" => Some("etl".into()),
            _ => None,
        }
    }

    #[test]
    fn test_expands_nested_scalars() -> Result<()> {
        let mut v: Value = serde_yaml::from_str(
            "source:\n  csv:\n    file_path: ${DATA_DIR}/sales.csv\nlist: [a, '${USER}-${USER}']\n",
        )?;
        substitute_with(&mut v, "", &env)?;
        assert_eq!(v["source"]["csv"]["file_path"], Value::from("/srv/data/sales.csv"));
        assert_eq!(v["list"][1], Value::from("etl-etl"));
        Ok(())
    }

    #[test]
    fn test_missing_variable_names_path() -> Result<()> {
        let mut v: Value = serde_yaml::from_str("output:\n  plugins: [{ path: '${NOPE}' }]\n")?;
        let err = substitute_with(&mut v, "", &env).unwrap_err();
        match err {
            InfrastructureError::EnvVarMissing { var, path } => {
                assert_eq!(var, "NOPE");
                assert_eq!(path, "output.plugins[0].path");
            }
            other => anyhow::bail!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_plain_strings_untouched() -> Result<()> {
        let mut v: Value = serde_yaml::from_str("a: 'cost $5 {x}'\nb: 3\n")?;
        substitute_with(&mut v, "", &env)?;
        assert_eq!(v["a"], Value::from("cost $5 {x}"));
        Ok(())
    }
}
