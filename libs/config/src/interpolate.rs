use lazy_static::lazy_static;
use regex::{Captures, Regex};

// Interpolation follows the shell parameter expansion rules:
// https://pubs.opengroup.org/onlinepubs/000095399/basedefs/xbd_chap08.html

lazy_static! {
  pub static ref ENVIRONMENT_VARIABLE_INTERPOLATION_REGEX: Regex = Regex::new(
    r"(?x)
        \$\$|
        \$([[:word:].]+)|
        \$\{([[:word:].]+)(?:(:?-|:?\?)([^}]*))?\}",
  )
  .unwrap();
}

type Warnings = Vec<String>;
type Errors = Vec<String>;

/// Replaces `$VAR`, `${VAR}`, `${VAR:-default}`, `${VAR-default}`, `${VAR:?error}` and
/// `${VAR?error}` with values from `get_env_value`. `$$` is a literal `$`.
pub fn interpolate(
  input: &str,
  get_env_value: impl Fn(&str) -> Option<String>,
) -> Result<(String, Warnings), Errors> {
  let mut errors = Vec::new();
  let mut warnings = Vec::new();

  let interpolated = ENVIRONMENT_VARIABLE_INTERPOLATION_REGEX
    .replace_all(input, |caps: &Captures| {
      let flags = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
      let def_or_err = caps
        .get(4)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .to_string();

      let name = match caps.get(1).or_else(|| caps.get(2)) {
        Some(m) => m.as_str(),
        None => return "$".to_string(),
      };
      let val = get_env_value(name);

      match flags {
        ":-" => match val {
          Some(v) if !v.is_empty() => v,
          _ => def_or_err,
        },
        "-" => val.unwrap_or(def_or_err),
        ":?" => match val {
          Some(v) if !v.is_empty() => v,
          _ => {
            errors.push(format!(
              "Non-empty env var required in config. name = {:?}, error = {:?}",
              name, def_or_err
            ));
            String::new()
          }
        },
        "?" => val.unwrap_or_else(|| {
          errors.push(format!(
            "Missing env var required in config. name = {:?}, error = {:?}",
            name, def_or_err
          ));
          String::new()
        }),
        _ => val.unwrap_or_else(|| {
          warnings.push(format!("Unknown env var in config. name = {:?}", name));
          String::new()
        }),
      }
    })
    .into_owned();

  if errors.is_empty() {
    Ok((interpolated, warnings))
  } else {
    Err(errors)
  }
}
