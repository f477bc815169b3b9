pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Base input for a command: `--input` file, else piped stdin, else `{}` so
/// every serde default applies.
pub fn load_value(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        debug!(path, "reading inputs from file");
        return file::read_value(path);
    }
    match stdin::read_stdin()? {
        Some(value) => {
            debug!("reading inputs from stdin");
            Ok(value)
        }
        None => Ok(Value::Object(Default::default())),
    }
}

/// Typed variant of [`load_value`].
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<T, Box<dyn std::error::Error>> {
    Ok(serde_json::from_value(load_value(path)?)?)
}
