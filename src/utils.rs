use crate::config::ConfigError;
use crate::store::csv_store::HISTORY_FILE_NAME;
use std::path::PathBuf;

const DATA_DIR_NAME: &str = "weather_history";

/// Per-user directory holding the history file, e.g. `~/.local/share/weather_history`.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .ok_or(ConfigError::DataDirResolution)
        .map(|p| p.join(DATA_DIR_NAME))
}

pub fn default_history_path() -> Result<PathBuf, ConfigError> {
    get_data_dir().map(|dir| dir.join(HISTORY_FILE_NAME))
}

/// Capitalizes the first letter of every word and lower-cases the rest,
/// where a word is any run of letters ("light rain" -> "Light Rain").
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("light rain"), "Light Rain");
        assert_eq!(title_case("OVERCAST clouds"), "Overcast Clouds");
        assert_eq!(title_case("thunderstorm with heavy-rain"), "Thunderstorm With Heavy-Rain");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_default_history_path_file_name() {
        if let Ok(path) = default_history_path() {
            assert!(path.ends_with("weather_history/weather_export.csv"));
        }
    }
}
